use std::io;
use thiserror::Error;

use crate::archive::ExtractError;
use crate::control::Cancelled;
use crate::convert::ConvertError;
use crate::fetch::FetchError;

/// Why one attempt at one year failed.
#[derive(Debug, Error)]
pub enum YearError {
    #[error("bad archive URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("scratch directory: {0}")]
    Io(#[from] io::Error),
    #[error("worker task failed: {0}")]
    Worker(String),
    #[error("cancelled")]
    Cancelled,
}

impl From<Cancelled> for YearError {
    fn from(_: Cancelled) -> Self {
        YearError::Cancelled
    }
}

impl YearError {
    /// True when the attempt stopped because the batch was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            YearError::Cancelled
                | YearError::Fetch(FetchError::Cancelled)
                | YearError::Convert(ConvertError::Cancelled)
        )
    }
}
