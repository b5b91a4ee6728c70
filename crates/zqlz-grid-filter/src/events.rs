//! Grid notifications consumed by the filter coordinator, and the status it
//! reports back

use std::time::Duration;

use crate::content_filter::SharedFactory;
use crate::types::{ColumnKey, FilterValue};

/// Notifications from the grid.
///
/// The coordinator reacts to these in arrival order; it never polls the grid.
#[derive(Clone)]
pub enum FilterEvent {
    /// A column joined the grid. `None` selects the coordinator's default
    /// factory. Re-adding a registered column swaps its factory and keeps
    /// the value already typed.
    ColumnAdded {
        column: ColumnKey,
        factory: Option<SharedFactory>,
    },

    /// A column left the grid; its constraint disappears with it
    ColumnRemoved { column: ColumnKey },

    /// The user edited a column's filter control
    FilterValueEdited { column: ColumnKey, value: FilterValue },

    /// Include or exclude a column from filtering without unregistering it
    ColumnEnabled { column: ColumnKey, enabled: bool },

    /// Turn the whole filtering subsystem on or off
    FilteringEnabled(bool),

    /// New debounce delay; applies from the next edit on
    EvaluationDelayChanged(Duration),

    /// Reset every column's value to empty and re-evaluate immediately
    ClearFilters,

    /// Re-evaluate immediately, bypassing the debounce
    Refresh,
}

impl std::fmt::Debug for FilterEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnAdded { column, factory } => f
                .debug_struct("ColumnAdded")
                .field("column", column)
                .field("factory", &factory.as_ref().map(|factory| factory.name()))
                .finish(),
            Self::ColumnRemoved { column } => f
                .debug_struct("ColumnRemoved")
                .field("column", column)
                .finish(),
            Self::FilterValueEdited { column, value } => f
                .debug_struct("FilterValueEdited")
                .field("column", column)
                .field("value", value)
                .finish(),
            Self::ColumnEnabled { column, enabled } => f
                .debug_struct("ColumnEnabled")
                .field("column", column)
                .field("enabled", enabled)
                .finish(),
            Self::FilteringEnabled(enabled) => {
                f.debug_tuple("FilteringEnabled").field(enabled).finish()
            }
            Self::EvaluationDelayChanged(delay) => {
                f.debug_tuple("EvaluationDelayChanged").field(delay).finish()
            }
            Self::ClearFilters => write!(f, "ClearFilters"),
            Self::Refresh => write!(f, "Refresh"),
        }
    }
}

/// Where the coordinator is in its debounce cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Filtering is off; the owner holds the accept-all predicate
    Disabled,
    /// The owner's predicate reflects every edit received so far
    Idle,
    /// An edit arrived and the debounce delay has not yet elapsed
    PendingEvaluation,
}

/// Per-column view returned by [`FilterHandle::status`](crate::FilterHandle::status)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatus {
    pub column: ColumnKey,
    pub value: FilterValue,
    pub factory: String,
    pub enabled: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorStatus {
    pub state: CoordinatorState,
    pub evaluation_delay: Duration,
    /// Registered columns in registration order
    pub columns: Vec<ColumnStatus>,
}

impl CoordinatorStatus {
    pub fn column(&self, column: ColumnKey) -> Option<&ColumnStatus> {
        self.columns.iter().find(|status| status.column == column)
    }

    pub fn active_columns(&self) -> usize {
        self.columns.iter().filter(|status| status.active).count()
    }
}
