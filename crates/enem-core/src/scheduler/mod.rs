//! Multi-round batch scheduler over exam years.
//!
//! Every round attempts each still-pending year once; a year that succeeds is
//! never attempted again. Between rounds the scheduler waits the policy's
//! delay (cancellable). After the last round every pending year is marked
//! failed. Per-year errors never abort the batch; only cancellation does.

mod error;
mod progress;
mod report;
mod run;
mod task;

pub use error::YearError;
pub use progress::ProgressStats;
pub use report::{BatchReport, DatasetInfo};
pub use run::RetryScheduler;
pub use task::{TaskStatus, YearOutcome, YearTask};

use crate::control::CancelToken;
use crate::convert::ConvertReport;

/// One year's full fetch → extract → sniff → convert run.
///
/// Called from the blocking thread pool; implementations may block.
pub trait YearProcessor: Send + Sync + 'static {
    fn process(&self, year: u16, cancel: &CancelToken) -> Result<ConvertReport, YearError>;
}
