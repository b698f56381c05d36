//! Ordinary least squares for small dense designs

/// Fitted regression
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// Number of regressors
    pub fn k(&self) -> usize {
        self.params.len()
    }

    /// t-statistic of coefficient `i`
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.k() as f64
    }
}

/// Fit `y = X b + e` by the normal equations
///
/// `rows` are the design rows. Returns `None` when the design is rank deficient,
/// there are no residual degrees of freedom, or the fit is exact (zero residual
/// variance makes every standard error zero).
pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Option<OlsFit> {
    let n = y.len();
    let k = rows.first()?.len();
    if rows.len() != n || k == 0 || n <= k {
        return None;
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in rows.iter().zip(y) {
        for a in 0..k {
            xty[a] += row[a] * target;
            for b in a..k {
                xtx[a][b] += row[a] * row[b];
            }
        }
    }
    for a in 0..k {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
    }

    let inverse = invert(xtx)?;
    let params: Vec<f64> = (0..k)
        .map(|a| (0..k).map(|b| inverse[a][b] * xty[b]).sum())
        .collect();

    let ssr: f64 = rows
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&params).map(|(x, p)| x * p).sum();
            (target - fitted).powi(2)
        })
        .sum();

    let sigma2 = ssr / (n - k) as f64;
    let std_errors: Vec<f64> = (0..k).map(|a| (sigma2 * inverse[a][a]).sqrt()).collect();

    // Residuals at rounding level of y mean an exact fit
    let yy: f64 = y.iter().map(|v| v * v).sum();
    let usable = ssr.is_finite()
        && ssr > yy * 1e-20
        && params.iter().all(|p| p.is_finite())
        && std_errors.iter().all(|se| se.is_finite() && *se > 0.0);

    usable.then_some(OlsFit {
        params,
        std_errors,
        ssr,
        nobs: n,
    })
}

/// Gauss-Jordan inversion with partial pivoting
fn invert(mut m: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
    let k = m.len();
    let scale = m
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let tolerance = scale * 1e-12;

    let mut inv: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..k {
        let pivot_row = (col..k).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot_row][col].abs() <= tolerance {
            return None;
        }
        m.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = m[col][col];
        for j in 0..k {
            m[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for row in 0..k {
            if row == col {
                continue;
            }
            let factor = m[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..k {
                m[row][j] -= factor * m[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }

    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_coefficients() {
        // y = 1 + 2 x1 - x2 + small deterministic wiggle
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let x1 = i as f64;
                let x2 = ((i * 7) % 11) as f64;
                vec![1.0, x1, x2]
            })
            .collect();
        let y: Vec<f64> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| 1.0 + 2.0 * r[1] - r[2] + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();

        let fit = fit(&rows, &y).unwrap();
        assert!((fit.params[0] - 1.0).abs() < 0.05);
        assert!((fit.params[1] - 2.0).abs() < 1e-3);
        assert!((fit.params[2] + 1.0).abs() < 1e-2);
        assert_eq!(fit.nobs, 30);
        assert!(fit.ssr > 0.0);
        assert!(fit.t_value(1) > 100.0);
    }

    #[test]
    fn test_collinear_design_is_none() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        assert!(fit(&rows, &y).is_none());
    }

    #[test]
    fn test_exact_fit_is_none() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 3.0 + 0.5 * i as f64).collect();
        assert!(fit(&rows, &y).is_none());
    }

    #[test]
    fn test_needs_residual_degrees_of_freedom() {
        let rows = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        assert!(fit(&rows, &[0.0, 1.0]).is_none());
    }

    #[test]
    fn test_invert_identity_like() {
        let inv = invert(vec![vec![4.0, 7.0], vec![2.0, 6.0]]).unwrap();
        // inverse of [[4,7],[2,6]] = 1/10 * [[6,-7],[-2,4]]
        assert!((inv[0][0] - 0.6).abs() < 1e-12);
        assert!((inv[0][1] + 0.7).abs() < 1e-12);
        assert!((inv[1][0] + 0.2).abs() < 1e-12);
        assert!((inv[1][1] - 0.4).abs() < 1e-12);
    }
}
