//! Defines the error types for the metrics module.
use crate::execution::EngineError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// The column is absent from the resolved `table.column_types` metadata.
    #[error("No column type reported for column '{column}'")]
    ColumnTypeNotFound { column: String },
    #[error("Missing metric dependency: {0}")]
    MissingDependency(&'static str),
    #[error("Metric domain has no 'column' key")]
    MissingColumn,
    #[error("Value kwarg '{key}' must be a boolean or null, got {value}")]
    InvalidValueKwarg { key: String, value: String },
    #[error("Unable to parse '{value}' at row {row} as a date/time")]
    UnparseableDatetime { row: usize, value: String },
    #[error("Cannot take the difference of {current} and {previous} at row {row}")]
    UnsupportedDifference { row: usize, current: &'static str, previous: &'static str },
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}
