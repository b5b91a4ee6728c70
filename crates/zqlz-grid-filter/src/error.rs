//! Error types for grid filtering

use thiserror::Error;

use crate::types::FilterValue;

/// Errors surfaced by the filtering engine
#[derive(Error, Debug)]
pub enum GridFilterError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Filter coordinator has shut down")]
    CoordinatorClosed,
}

/// Raised by a [`ContentFilterFactory`](crate::ContentFilterFactory) that cannot
/// turn a filter value into a content filter.
///
/// The coordinator never propagates these: the affected column fails open and
/// the error is reported to the row owner as a diagnostic.
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("{factory} filter does not accept {value:?}")]
    UnsupportedValue { factory: String, value: FilterValue },

    #[error("Invalid filter value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for grid filter operations
pub type Result<T> = std::result::Result<T, GridFilterError>;

/// Result type returned by content filter factories
pub type FactoryResult<T> = std::result::Result<T, FactoryError>;
