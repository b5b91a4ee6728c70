//! Combining column filters into a single row predicate

use std::sync::Arc;

use crate::column_filter::ColumnFilter;
use crate::content_filter::SharedContentFilter;
use crate::types::{ColumnKey, FilterRow};

/// AND-reduction over column filters.
///
/// Stateless; any number of threads may evaluate the same snapshot of
/// filters concurrently as long as nobody mutates it meanwhile.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// True iff every enabled column filter accepts `row`.
    /// With no enabled filters every row passes.
    pub fn combine<'a, I, R>(filters: I, row: &R) -> bool
    where
        I: IntoIterator<Item = &'a ColumnFilter>,
        R: FilterRow + ?Sized,
    {
        filters
            .into_iter()
            .filter(|filter| filter.is_enabled())
            .all(|filter| filter.evaluate(row))
    }

    /// Capture the currently active filters as a predicate that later
    /// changes to the filters do not affect
    pub fn snapshot<'a, I>(filters: I) -> CombinedPredicate
    where
        I: IntoIterator<Item = &'a ColumnFilter>,
    {
        let columns: Vec<ColumnPredicate> = filters
            .into_iter()
            .filter(|filter| filter.is_active())
            .filter_map(|filter| {
                filter.content_filter().map(|content_filter| ColumnPredicate {
                    key: filter.key(),
                    filter: content_filter.clone(),
                })
            })
            .collect();

        CombinedPredicate {
            columns: columns.into(),
        }
    }
}

#[derive(Clone)]
struct ColumnPredicate {
    key: ColumnKey,
    filter: SharedContentFilter,
}

/// Row predicate published to the owner of the visible rows.
///
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct CombinedPredicate {
    columns: Arc<[ColumnPredicate]>,
}

impl CombinedPredicate {
    /// The predicate used while filtering is off
    pub fn accept_all() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
        }
    }

    pub fn is_accept_all(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns constraining rows in this snapshot
    pub fn active_columns(&self) -> impl Iterator<Item = ColumnKey> + '_ {
        self.columns.iter().map(|column| column.key)
    }

    pub fn matches<R: FilterRow + ?Sized>(&self, row: &R) -> bool {
        self.columns.iter().all(|column| {
            row.cell(&column.key)
                .is_some_and(|content| column.filter.matches(content))
        })
    }

    /// Indices of the rows this predicate keeps, in row order
    pub fn filter_indices<R: FilterRow>(&self, rows: &[R]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(*row))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn into_fn<R>(self) -> impl Fn(&R) -> bool + Send + Sync + 'static
    where
        R: FilterRow + ?Sized + 'static,
    {
        move |row: &R| self.matches(row)
    }
}

impl Default for CombinedPredicate {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl std::fmt::Debug for CombinedPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedPredicate")
            .field(
                "columns",
                &self.columns.iter().map(|c| c.key).collect::<Vec<_>>(),
            )
            .finish()
    }
}
