//! CLI command handlers, one file per command.

mod analyze;
mod correlations;
mod fetch;
mod income;
mod status;
mod work;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use correlations::run_correlations;
pub use fetch::{run_fetch, FetchArgs};
pub use income::run_income;
pub use status::run_status;
pub use work::run_work;
