//! ZQLZ Grid Filter - per-column content filtering for data grids
//!
//! Each grid column can carry its own content filter; the grid shows only the
//! rows every active column filter accepts. This crate provides:
//!
//! - [`ContentFilter`] / [`ContentFilterFactory`] - pluggable cell matching,
//!   with case-insensitive substring matching as the default
//! - [`OperatorFilterFactory`] - comparison, string, null, range and list
//!   operators from the table viewer's filter panel
//! - [`ColumnFilter`] - one column's raw value and the filter built from it
//! - [`FilterEvaluator`] / [`CombinedPredicate`] - AND-combination of column
//!   filters into a row predicate
//! - [`FilterCoordinator`] - debounces edits and republishes the predicate to
//!   a [`RowCollectionOwner`] such as [`FilteredRows`]

mod column_filter;
mod config;
mod content_filter;
mod coordinator;
mod error;
mod evaluator;
mod events;
mod operators;
mod owner;
mod types;

pub use column_filter::{ColumnFilter, FilterUpdate};
pub use config::{FilterConfig, FilterSettings, DEFAULT_EVALUATION_DELAY, MAX_EVALUATION_DELAY};
pub use content_filter::{
    default_factory, BooleanFilter, BooleanFilterFactory, ContentFilter, ContentFilterFactory,
    SharedContentFilter, SharedFactory, SubstringFilter, SubstringFilterFactory,
};
pub use coordinator::{FilterCoordinator, FilterHandle};
pub use error::{FactoryError, FactoryResult, GridFilterError, Result};
pub use evaluator::{CombinedPredicate, FilterEvaluator};
pub use events::{ColumnStatus, CoordinatorState, CoordinatorStatus, FilterEvent};
pub use operators::{FilterOperator, OperatorFilter, OperatorFilterFactory};
pub use owner::{FilterDiagnostic, FilteredRows, RowCollectionOwner};
pub use types::{CellValue, ColumnKey, FilterRow, FilterValue};
