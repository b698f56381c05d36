use clap::Parser;
use pairwatch::cli::{Cli, Commands};
use pairwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, falling back to the example only when the file is absent
    let (config, used_example) = Config::load_or_example(&cli.config)?;
    if used_example {
        eprintln!("Warning: {} not found, using example configuration", cli.config);
    }

    // Initialize telemetry
    pairwatch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting pair analytics");
            args.execute(config).await?;
        }
        Commands::Collect(args) => {
            tracing::info!("Starting collection");
            args.execute(config).await?;
        }
        Commands::Analyze(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            config.validate()?;
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
