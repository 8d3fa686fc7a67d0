//! Percentile bootstrap of the Pearson correlation between two columns.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{mean, paired_columns, pearson, percentile, StatsError};
use crate::dataset::Table;

/// What to do with resamples whose correlation is undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NanPolicy {
    /// Keep NaN entries; estimate and interval become NaN if any is present.
    #[default]
    Propagate,
    /// Drop NaN entries before the mean and percentiles.
    Exclude,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub iterations: usize,
    /// Fixed seed for reproducible runs; entropy otherwise.
    pub seed: Option<u64>,
    pub nan_policy: NanPolicy,
    /// Two-sided confidence level, 0.95 gives the [2.5, 97.5] percentiles.
    pub confidence: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            nan_policy: NanPolicy::Propagate,
            confidence: 0.95,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapResult {
    pub point_estimate: f64,
    pub ci: (f64, f64),
    /// One correlation per iteration, in draw order, NaNs included.
    pub distribution: Vec<f64>,
    /// Rows where both columns had a value.
    pub valid_rows: usize,
    /// Resamples whose correlation was undefined.
    pub nan_resamples: usize,
}

/// Bootstraps `corr(predictor, target)` over the rows of `table` where both
/// columns hold a number.
pub fn bootstrap(
    table: &Table,
    target: &str,
    predictor: &str,
    cfg: &BootstrapConfig,
) -> Result<BootstrapResult, StatsError> {
    let (xs, ys) = paired_columns(table, predictor, target)?;
    bootstrap_pairs(&xs, &ys, cfg)
}

/// Bootstraps the correlation of already paired samples.
pub fn bootstrap_pairs(
    x: &[f64],
    y: &[f64],
    cfg: &BootstrapConfig,
) -> Result<BootstrapResult, StatsError> {
    let n = x.len().min(y.len());
    if n < 2 || cfg.iterations == 0 {
        return Err(StatsError::InsufficientData { rows: n });
    }
    if !(cfg.confidence > 0.0 && cfg.confidence < 1.0) {
        return Err(StatsError::InvalidConfidence(cfg.confidence));
    }

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut rx = vec![0.0; n];
    let mut ry = vec![0.0; n];
    let mut distribution = Vec::with_capacity(cfg.iterations);
    for _ in 0..cfg.iterations {
        for j in 0..n {
            let k = rng.gen_range(0..n);
            rx[j] = x[k];
            ry[j] = y[k];
        }
        distribution.push(pearson(&rx, &ry));
    }

    let nan_resamples = distribution.iter().filter(|r| r.is_nan()).count();
    let alpha = 1.0 - cfg.confidence;
    let (point_estimate, ci) = match cfg.nan_policy {
        NanPolicy::Propagate if nan_resamples > 0 => (f64::NAN, (f64::NAN, f64::NAN)),
        _ => {
            let mut finite: Vec<f64> = distribution.iter().copied().filter(|r| !r.is_nan()).collect();
            finite.sort_by(f64::total_cmp);
            (
                mean(&finite),
                (percentile(&finite, alpha / 2.0), percentile(&finite, 1.0 - alpha / 2.0)),
            )
        }
    };
    if nan_resamples > 0 {
        tracing::debug!(nan_resamples, iterations = cfg.iterations, policy = ?cfg.nan_policy, "degenerate resamples");
    }

    Ok(BootstrapResult {
        point_estimate,
        ci,
        distribution,
        valid_rows: n,
        nan_resamples,
    })
}
