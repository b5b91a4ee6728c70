//! Per-column filter state

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::content_filter::{SharedContentFilter, SharedFactory};
use crate::error::FactoryError;
use crate::types::{ColumnKey, FilterRow, FilterValue};

/// Outcome of changing a column's filter value or factory
#[derive(Debug)]
pub enum FilterUpdate {
    /// Same value as before; nothing was recomputed
    Unchanged,
    /// The content filter was rebuilt
    Changed,
    /// The factory failed; the value is kept and the column imposes no
    /// constraint until the next successful rebuild
    FailedOpen(FactoryError),
}

impl FilterUpdate {
    pub fn is_changed(&self) -> bool {
        !matches!(self, FilterUpdate::Unchanged)
    }
}

/// One column's filter: the raw value the user typed and the content filter
/// its factory built from it.
pub struct ColumnFilter {
    key: ColumnKey,
    value: FilterValue,
    content_filter: Option<SharedContentFilter>,
    factory: SharedFactory,
    enabled: bool,
}

impl ColumnFilter {
    pub fn new(key: ColumnKey, factory: SharedFactory) -> Self {
        Self {
            key,
            value: FilterValue::Empty,
            content_filter: None,
            factory,
            enabled: true,
        }
    }

    pub fn key(&self) -> ColumnKey {
        self.key
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    pub fn factory(&self) -> &SharedFactory {
        &self.factory
    }

    pub fn content_filter(&self) -> Option<&SharedContentFilter> {
        self.content_filter.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this column currently constrains rows
    pub fn is_active(&self) -> bool {
        self.enabled && self.content_filter.is_some()
    }

    /// Store a new raw value and rebuild the content filter.
    /// Setting the current value again is a no-op.
    pub fn set_value(&mut self, value: FilterValue) -> FilterUpdate {
        if value == self.value {
            return FilterUpdate::Unchanged;
        }
        self.value = value;
        self.rebuild()
    }

    /// Swap the factory and reinterpret the stored value through it
    pub fn set_factory(&mut self, factory: SharedFactory) -> FilterUpdate {
        self.factory = factory;
        self.rebuild()
    }

    /// Include or exclude the column from filtering. Returns whether the flag changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    /// True when the column has no content filter, or its cell in `row`
    /// exists and is accepted. A missing cell never matches an active filter.
    pub fn evaluate<R: FilterRow + ?Sized>(&self, row: &R) -> bool {
        match &self.content_filter {
            None => true,
            Some(filter) => row
                .cell(&self.key)
                .is_some_and(|content| filter.matches(content)),
        }
    }

    /// Recompute the content filter from the stored value and factory.
    /// A factory that panics is treated as a failed factory.
    pub fn rebuild(&mut self) -> FilterUpdate {
        let factory = &self.factory;
        let value = &self.value;
        let created = panic::catch_unwind(AssertUnwindSafe(|| factory.create(value)))
            .unwrap_or_else(|payload| {
                Err(FactoryError::Other(anyhow::anyhow!(
                    "factory panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        match created {
            Ok(filter) => {
                self.content_filter = filter;
                FilterUpdate::Changed
            }
            Err(err) => {
                self.content_filter = None;
                FilterUpdate::FailedOpen(err)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

impl std::fmt::Debug for ColumnFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnFilter")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("factory", &self.factory.name())
            .field("has_content_filter", &self.content_filter.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::content_filter::{default_factory, BooleanFilterFactory};
    use crate::error::FactoryResult;
    use crate::types::CellValue;

    fn row(key: ColumnKey, value: impl Into<CellValue>) -> HashMap<ColumnKey, CellValue> {
        HashMap::from([(key, value.into())])
    }

    #[test]
    fn empty_filter_accepts_everything() {
        let key = ColumnKey::new();
        let filter = ColumnFilter::new(key, default_factory());
        assert!(!filter.is_active());
        assert!(filter.evaluate(&row(key, "anything")));
        assert!(filter.evaluate(&HashMap::<ColumnKey, CellValue>::new()));
    }

    #[test]
    fn missing_cell_fails_an_active_filter() {
        let key = ColumnKey::new();
        let mut filter = ColumnFilter::new(key, default_factory());
        filter.set_value("jo".into());
        assert!(filter.evaluate(&row(key, "John")));
        assert!(!filter.evaluate(&row(ColumnKey::new(), "John")));
    }

    #[test]
    fn same_value_does_not_rebuild() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory: SharedFactory = Arc::new(
            move |value: &FilterValue| -> FactoryResult<Option<SharedContentFilter>> {
                counter.fetch_add(1, Ordering::SeqCst);
                default_factory().create(value)
            },
        );

        let mut filter = ColumnFilter::new(ColumnKey::new(), factory);
        assert!(filter.set_value("a".into()).is_changed());
        assert!(!filter.set_value("a".into()).is_changed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factory_failure_fails_open_and_keeps_value() {
        let key = ColumnKey::new();
        let mut filter = ColumnFilter::new(key, Arc::new(BooleanFilterFactory));
        let update = filter.set_value("sometimes".into());
        assert!(matches!(update, FilterUpdate::FailedOpen(FactoryError::InvalidValue(_))));
        assert_eq!(filter.value(), &FilterValue::from("sometimes"));
        assert!(!filter.is_active());
        assert!(filter.evaluate(&row(key, false)));
    }

    #[test]
    fn panicking_factory_fails_open() {
        let key = ColumnKey::new();
        let factory: SharedFactory = Arc::new(
            |value: &FilterValue| -> FactoryResult<Option<SharedContentFilter>> {
                if value.is_blank() {
                    return Ok(None);
                }
                panic!("lookup table missing")
            },
        );

        let mut filter = ColumnFilter::new(key, factory);
        let update = filter.set_value("jo".into());
        match update {
            FilterUpdate::FailedOpen(FactoryError::Other(err)) => {
                assert_eq!(err.to_string(), "factory panicked: lookup table missing");
            }
            other => panic!("unexpected update: {:?}", other),
        }
        assert_eq!(filter.value(), &FilterValue::from("jo"));
        assert!(!filter.is_active());
        assert!(filter.evaluate(&row(key, "Mike")));
    }

    #[test]
    fn new_factory_reinterprets_stored_value() {
        let key = ColumnKey::new();
        let mut filter = ColumnFilter::new(key, default_factory());
        filter.set_value("true".into());
        // Substring: "true" is contained in "untrue"
        assert!(filter.evaluate(&row(key, "untrue")));

        assert!(filter.set_factory(Arc::new(BooleanFilterFactory)).is_changed());
        assert!(!filter.evaluate(&row(key, "untrue")));
        assert!(filter.evaluate(&row(key, true)));
    }

    #[test]
    fn disabled_column_is_not_active_but_still_evaluates() {
        let key = ColumnKey::new();
        let mut filter = ColumnFilter::new(key, default_factory());
        filter.set_value("x".into());
        assert!(filter.set_enabled(false));
        assert!(!filter.set_enabled(false));
        assert!(!filter.is_active());
        assert!(!filter.evaluate(&row(key, "y")));
    }
}
