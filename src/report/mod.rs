//! Report rendering
//!
//! Renderers consume an [`AnalyticsReport`] and never feed anything back into the
//! analytics.

use crate::analytics::{AnalyticsReport, Readiness, SignalStatus};
use parking_lot::Mutex;
use std::io::Write;

/// Consumer of analytics output
pub trait Renderer: Send + Sync {
    fn render(&self, report: &AnalyticsReport) -> anyhow::Result<()>;
}

/// One structured log line per pass
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, report: &AnalyticsReport) -> anyhow::Result<()> {
        let aligned = report.aligned.as_ready().map_or(0, Vec::len);
        let adf_p = report.stationarity.as_ready().map(|r| r.p_value);

        match &report.signal {
            SignalStatus::Ready { zscore, signal } => tracing::info!(
                pair = %format!("{}/{}", report.symbol_a, report.symbol_b),
                aligned,
                zscore = %format!("{:.3}", zscore),
                signal = %signal,
                adf_p = ?adf_p,
                elapsed_us = report.elapsed_micros,
                "Analytics pass"
            ),
            SignalStatus::Unavailable { reason } => tracing::info!(
                pair = %format!("{}/{}", report.symbol_a, report.symbol_b),
                aligned,
                signal = "unavailable",
                reason = %reason,
                adf_p = ?adf_p,
                elapsed_us = report.elapsed_micros,
                "Analytics pass"
            ),
        }
        Ok(())
    }
}

/// Newline-delimited JSON
pub struct JsonRenderer {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonRenderer {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, report: &AnalyticsReport) -> anyhow::Result<()> {
        let line = serde_json::to_string(report)?;
        let mut out = self.out.lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}

/// Human-readable summary table on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct TableRenderer;

impl Renderer for TableRenderer {
    fn render(&self, report: &AnalyticsReport) -> anyhow::Result<()> {
        println!("{}", format_table(report));
        Ok(())
    }
}

/// Format a report as a table for CLI output
pub fn format_table(report: &AnalyticsReport) -> String {
    let aligned = match &report.aligned {
        Readiness::Ready(samples) => samples.len().to_string(),
        Readiness::Waiting(reason) => format!("waiting ({})", reason),
    };

    let spread = match &report.spread {
        Readiness::Ready(series) => match series.points.last() {
            Some(p) => format!(
                "Spread:           {:.6}\nMean:             {:.6}\nStd:              {:.6}\nWindow:           {} ({} degenerate)",
                p.spread, p.mean, p.std, series.window, series.degenerate_windows
            ),
            None => format!(
                "Window:           {} ({} degenerate)",
                series.window, series.degenerate_windows
            ),
        },
        Readiness::Waiting(reason) => format!("Spread:           waiting ({})", reason),
    };

    let signal = match &report.signal {
        SignalStatus::Ready { zscore, signal } => {
            format!("Z-Score:          {:+.3}\nSignal:           {}", zscore, signal)
        }
        SignalStatus::Unavailable { reason } => format!(
            "Z-Score:          unavailable ({})\nSignal:           {}",
            reason,
            report.signal.signal()
        ),
    };

    let stationarity = match &report.stationarity {
        Readiness::Ready(adf) => format!(
            "ADF Statistic:    {:.4}\np-value:          {:.4}\nCritical 1/5/10%: {:.4} / {:.4} / {:.4}\nLag / Obs:        {} / {}\nStationary:       {}",
            adf.statistic,
            adf.p_value,
            adf.critical_values.one_pct,
            adf.critical_values.five_pct,
            adf.critical_values.ten_pct,
            adf.used_lag,
            adf.nobs,
            if adf.is_stationary { "yes" } else { "no" }
        ),
        Readiness::Waiting(reason) => format!("ADF:              waiting ({})", reason),
    };

    format!(
        r#"
══════════════════════════════════════════════════════
               {} / {}
══════════════════════════════════════════════════════
Generated:        {}
Aligned Samples:  {}

SPREAD
───────────────────────────────────────────────────────
{}
{}

STATIONARITY
───────────────────────────────────────────────────────
{}
══════════════════════════════════════════════════════
"#,
        report.symbol_a,
        report.symbol_b,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        aligned,
        spread,
        signal,
        stationarity,
    )
}
