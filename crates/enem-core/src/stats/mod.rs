//! Correlation, percentiles and the bootstrap estimator.

mod bootstrap;
mod correlation;
mod error;
mod percentile;

pub use bootstrap::{bootstrap, bootstrap_pairs, BootstrapConfig, BootstrapResult, NanPolicy};
pub use correlation::{correlate, mean, paired_columns, pearson, std_dev};
pub use error::StatsError;
pub use percentile::percentile;
