use thiserror::Error;

use crate::dataset::ShapeError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatsError {
    #[error("insufficient data: {rows} valid rows")]
    InsufficientData { rows: usize },
    #[error("column {0} not found")]
    MissingColumn(String),
    #[error("confidence level {0} is outside (0, 1)")]
    InvalidConfidence(f64),
    #[error("derived table is malformed: {0}")]
    Shape(#[from] ShapeError),
}
