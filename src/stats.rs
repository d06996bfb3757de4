//! Small descriptive statistics helpers shared by the analyzers
//!
//! Mean and standard deviation delegate to `statrs`; every helper returns a
//! finite value (0.0) instead of NaN for empty or degenerate input.

use statrs::statistics::Statistics;

/// Variance estimator used for baseline thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceEstimator {
    /// n - 1 denominator
    Sample,
    /// n denominator
    Population,
}

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Standard deviation with the given estimator, 0.0 when undefined
pub fn std_dev(values: &[f64], estimator: VarianceEstimator) -> f64 {
    let sd = match estimator {
        VarianceEstimator::Sample if values.len() >= 2 => values.iter().std_dev(),
        VarianceEstimator::Population if !values.is_empty() => values.iter().population_std_dev(),
        _ => return 0.0,
    };
    if sd.is_finite() {
        sd
    } else {
        0.0
    }
}

/// Pearson correlation coefficient between two paired series
///
/// Returns 0.0 when fewer than two pairs exist or either series has zero
/// variance. Only the common prefix is used if lengths differ.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);

    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let covariance: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();
    let spread_x = xs.iter().map(|x| (x - mean_x).powi(2)).sum::<f64>().sqrt();
    let spread_y = ys.iter().map(|y| (y - mean_y).powi(2)).sum::<f64>().sqrt();

    if spread_x == 0.0 || spread_y == 0.0 {
        return 0.0;
    }

    (covariance / (spread_x * spread_y)).clamp(-1.0, 1.0)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
