//! The receiving side of published predicates

use std::time::Duration;

use parking_lot::RwLock;

use crate::evaluator::CombinedPredicate;
use crate::types::{ColumnKey, FilterRow, FilterValue};

/// Problems the coordinator reports instead of failing
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDiagnostic {
    /// A factory could not build a filter; the column is left unconstrained
    FactoryFailed {
        column: ColumnKey,
        factory: String,
        value: FilterValue,
        message: String,
    },
    /// An event referenced a column that is not registered
    UnknownColumn { column: ColumnKey },
    /// A delay change was out of range and ignored
    InvalidEvaluationDelay { requested: Duration, maximum: Duration },
}

impl std::fmt::Display for FilterDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FactoryFailed {
                column,
                factory,
                message,
                ..
            } => write!(f, "{} filter failed for column {}: {}", factory, column, message),
            Self::UnknownColumn { column } => write!(f, "column {} is not registered", column),
            Self::InvalidEvaluationDelay { requested, maximum } => write!(
                f,
                "evaluation delay {:?} exceeds maximum of {:?}",
                requested, maximum
            ),
        }
    }
}

/// Owner of the visible row collection.
///
/// Called from the coordinator's task. Implementations must tolerate being
/// handed an equivalent predicate more than once, and must not block.
pub trait RowCollectionOwner: Send + Sync + 'static {
    /// Replace the predicate deciding which rows are visible
    fn set_filter_predicate(&self, predicate: CombinedPredicate);

    fn report_diagnostic(&self, diagnostic: FilterDiagnostic) {
        tracing::warn!(%diagnostic, "Grid filter diagnostic");
    }
}

/// In-memory row collection that keeps the indices of rows passing the
/// current predicate.
///
/// Replacing the rows re-applies the last predicate, so the owner stays
/// consistent across row changes without involving the coordinator.
pub struct FilteredRows<R> {
    state: RwLock<FilteredRowsState<R>>,
}

struct FilteredRowsState<R> {
    rows: Vec<R>,
    predicate: CombinedPredicate,
    filtered_row_indices: Vec<usize>,
    is_filtering: bool,
}

impl<R: FilterRow> FilteredRowsState<R> {
    fn refilter(&mut self) {
        self.is_filtering = !self.predicate.is_accept_all();
        if self.is_filtering {
            self.filtered_row_indices = self.predicate.filter_indices(&self.rows);
        } else {
            self.filtered_row_indices.clear();
        }
    }
}

impl<R: FilterRow> FilteredRows<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            state: RwLock::new(FilteredRowsState {
                rows,
                predicate: CombinedPredicate::accept_all(),
                filtered_row_indices: Vec::new(),
                is_filtering: false,
            }),
        }
    }

    /// Replace the rows and re-derive the visible set with the current predicate
    pub fn set_rows(&self, rows: Vec<R>) {
        let mut state = self.state.write();
        state.rows = rows;
        state.refilter();
    }

    pub fn is_filtering(&self) -> bool {
        self.state.read().is_filtering
    }

    /// The predicate last handed over by the coordinator
    pub fn predicate(&self) -> CombinedPredicate {
        self.state.read().predicate.clone()
    }

    pub fn total_count(&self) -> usize {
        self.state.read().rows.len()
    }

    pub fn visible_count(&self) -> usize {
        let state = self.state.read();
        if state.is_filtering {
            state.filtered_row_indices.len()
        } else {
            state.rows.len()
        }
    }

    /// Indices into the full row list of every visible row
    pub fn visible_indices(&self) -> Vec<usize> {
        let state = self.state.read();
        if state.is_filtering {
            state.filtered_row_indices.clone()
        } else {
            (0..state.rows.len()).collect()
        }
    }

    /// Map a display position to its index in the full row list
    pub fn actual_row_index(&self, display_row: usize) -> Option<usize> {
        let state = self.state.read();
        if state.is_filtering {
            state.filtered_row_indices.get(display_row).copied()
        } else {
            (display_row < state.rows.len()).then_some(display_row)
        }
    }
}

impl<R: FilterRow + Clone> FilteredRows<R> {
    pub fn visible_rows(&self) -> Vec<R> {
        let state = self.state.read();
        if state.is_filtering {
            state
                .filtered_row_indices
                .iter()
                .map(|&idx| state.rows[idx].clone())
                .collect()
        } else {
            state.rows.clone()
        }
    }
}

impl<R> RowCollectionOwner for FilteredRows<R>
where
    R: FilterRow + Send + Sync + 'static,
{
    fn set_filter_predicate(&self, predicate: CombinedPredicate) {
        let mut state = self.state.write();
        state.predicate = predicate;
        state.refilter();
        tracing::debug!(
            visible = state.filtered_row_indices.len(),
            total = state.rows.len(),
            filtering = state.is_filtering,
            "Row filter applied"
        );
    }
}
