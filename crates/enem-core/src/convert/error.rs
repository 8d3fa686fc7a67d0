use std::io;
use thiserror::Error;

use super::codec::CodecFailure;
use crate::dataset::ShapeError;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("read CSV: {0}")]
    Read(#[from] csv::Error),
    #[error("line {line}: {found} fields, header has {expected}")]
    Malformed {
        line: u64,
        found: usize,
        expected: usize,
    },
    #[error("table shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("every columnar engine failed: {}", summarize(.attempts))]
    WriteFailed { attempts: Vec<CodecFailure> },
    #[error("read-back verification failed: {0}")]
    VerificationFailed(String),
    #[error("conversion cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn summarize(attempts: &[CodecFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.codec, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}
