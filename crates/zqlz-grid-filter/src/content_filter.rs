//! Content filters and the factories that build them
//!
//! A [`ContentFilter`] decides whether one cell matches; a
//! [`ContentFilterFactory`] turns the raw value typed into a column's filter
//! control into such a filter. Returning `Ok(None)` from a factory means the
//! column imposes no constraint.
//!
//! Plain closures implement both traits, so custom predicates need no
//! wrapper types:
//!
//! ```rust,ignore
//! let even_only: SharedFactory = Arc::new(|value: &FilterValue| {
//!     Ok(match value {
//!         FilterValue::Bool(true) => Some(Arc::new(|cell: &CellValue| {
//!             cell.as_f64().is_some_and(|n| n % 2.0 == 0.0)
//!         }) as SharedContentFilter),
//!         _ => None,
//!     })
//! });
//! ```

use std::sync::Arc;

use crate::error::{FactoryError, FactoryResult};
use crate::types::{parse_bool, CellValue, FilterValue};

/// Predicate over a single cell's content.
///
/// Implementations must be deterministic and must not panic for any content.
pub trait ContentFilter: Send + Sync {
    fn matches(&self, content: &CellValue) -> bool;
}

pub type SharedContentFilter = Arc<dyn ContentFilter>;

impl<F> ContentFilter for F
where
    F: Fn(&CellValue) -> bool + Send + Sync,
{
    fn matches(&self, content: &CellValue) -> bool {
        self(content)
    }
}

/// Builds content filters from raw filter values.
///
/// Called synchronously whenever a filter value changes, so it must be cheap
/// and free of I/O. A panic inside `create` is caught and handled like an
/// error: only the column being rebuilt fails open.
pub trait ContentFilterFactory: Send + Sync {
    fn create(&self, value: &FilterValue) -> FactoryResult<Option<SharedContentFilter>>;

    /// Name used in diagnostics
    fn name(&self) -> &str {
        "custom"
    }
}

pub type SharedFactory = Arc<dyn ContentFilterFactory>;

impl<F> ContentFilterFactory for F
where
    F: Fn(&FilterValue) -> FactoryResult<Option<SharedContentFilter>> + Send + Sync,
{
    fn create(&self, value: &FilterValue) -> FactoryResult<Option<SharedContentFilter>> {
        self(value)
    }
}

/// The factory used for columns registered without one
pub fn default_factory() -> SharedFactory {
    Arc::new(SubstringFilterFactory)
}

/// Case-insensitive substring match against the cell's display text
#[derive(Debug, Clone)]
pub struct SubstringFilter {
    needle: String,
}

impl SubstringFilter {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }
}

impl ContentFilter for SubstringFilter {
    fn matches(&self, content: &CellValue) -> bool {
        match content {
            CellValue::Null => false,
            CellValue::Text(text) => text.to_lowercase().contains(&self.needle),
            other => other.to_string().to_lowercase().contains(&self.needle),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringFilterFactory;

impl ContentFilterFactory for SubstringFilterFactory {
    fn create(&self, value: &FilterValue) -> FactoryResult<Option<SharedContentFilter>> {
        if value.is_blank() {
            return Ok(None);
        }

        match value {
            FilterValue::Text(text) => Ok(Some(Arc::new(SubstringFilter::new(text)))),
            FilterValue::Bool(flag) => Ok(Some(Arc::new(SubstringFilter::new(&flag.to_string())))),
            _ => Err(FactoryError::UnsupportedValue {
                factory: self.name().to_string(),
                value: value.clone(),
            }),
        }
    }

    fn name(&self) -> &str {
        "substring"
    }
}

/// Checkbox equality: the cell's boolean view must equal the expected state.
/// Cells with no boolean reading (NULL, arbitrary text) never match.
#[derive(Debug, Clone, Copy)]
pub struct BooleanFilter {
    expected: bool,
}

impl BooleanFilter {
    pub fn new(expected: bool) -> Self {
        Self { expected }
    }
}

impl ContentFilter for BooleanFilter {
    fn matches(&self, content: &CellValue) -> bool {
        content.as_bool() == Some(self.expected)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanFilterFactory;

impl ContentFilterFactory for BooleanFilterFactory {
    fn create(&self, value: &FilterValue) -> FactoryResult<Option<SharedContentFilter>> {
        if value.is_blank() {
            return Ok(None);
        }

        let expected = match value {
            FilterValue::Bool(flag) => *flag,
            FilterValue::Text(text) => parse_bool(text).ok_or_else(|| {
                FactoryError::InvalidValue(format!("'{}' is not a checkbox state", text))
            })?,
            _ => {
                return Err(FactoryError::UnsupportedValue {
                    factory: self.name().to_string(),
                    value: value.clone(),
                });
            }
        };

        Ok(Some(Arc::new(BooleanFilter::new(expected))))
    }

    fn name(&self) -> &str {
        "boolean"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(factory: &dyn ContentFilterFactory, value: impl Into<FilterValue>) -> SharedContentFilter {
        factory
            .create(&value.into())
            .expect("factory should accept value")
            .expect("value should produce a filter")
    }

    #[test]
    fn substring_is_case_insensitive() {
        let filter = build(&SubstringFilterFactory, "JO");
        assert!(filter.matches(&CellValue::from("John")));
        assert!(filter.matches(&CellValue::from("mojo")));
        assert!(!filter.matches(&CellValue::from("Mike")));
    }

    #[test]
    fn substring_uses_display_text_of_non_text_cells() {
        let filter = build(&SubstringFilterFactory, "42");
        assert!(filter.matches(&CellValue::Int(1420)));
        assert!(filter.matches(&CellValue::Decimal("0.42".into())));
        assert!(!filter.matches(&CellValue::Float(4.2)));
    }

    #[test]
    fn substring_never_matches_null() {
        let filter = build(&SubstringFilterFactory, "nu");
        assert!(!filter.matches(&CellValue::Null));
    }

    #[test]
    fn blank_values_produce_no_filter() {
        for value in [FilterValue::Empty, FilterValue::from(""), FilterValue::from(" \t ")] {
            assert!(SubstringFilterFactory.create(&value).unwrap().is_none());
            assert!(BooleanFilterFactory.create(&value).unwrap().is_none());
        }
    }

    #[test]
    fn substring_rejects_ranges() {
        let err = SubstringFilterFactory
            .create(&FilterValue::Range {
                from: "a".into(),
                to: "z".into(),
            })
            .err()
            .expect("range should be rejected");
        assert!(matches!(err, FactoryError::UnsupportedValue { ref factory, .. } if factory == "substring"));
    }

    #[test]
    fn boolean_filter_matches_checkbox_state() {
        let checked = build(&BooleanFilterFactory, true);
        assert!(checked.matches(&CellValue::Bool(true)));
        assert!(checked.matches(&CellValue::from("yes")));
        assert!(checked.matches(&CellValue::Int(1)));
        assert!(!checked.matches(&CellValue::Bool(false)));
        assert!(!checked.matches(&CellValue::Null));

        let unchecked = build(&BooleanFilterFactory, "False");
        assert!(unchecked.matches(&CellValue::Bool(false)));
    }

    #[test]
    fn boolean_factory_rejects_unparseable_text() {
        let result = BooleanFilterFactory.create(&FilterValue::from("maybe"));
        assert!(matches!(result, Err(FactoryError::InvalidValue(_))));
    }

    #[test]
    fn closures_act_as_filters_and_factories() {
        let factory = |value: &FilterValue| -> FactoryResult<Option<SharedContentFilter>> {
            let Some(min) = value.as_text().and_then(|t| t.parse::<f64>().ok()) else {
                return Ok(None);
            };
            Ok(Some(Arc::new(move |cell: &CellValue| {
                cell.as_f64().is_some_and(|n| n >= min)
            }) as SharedContentFilter))
        };

        let filter = build(&factory, "10");
        assert!(filter.matches(&CellValue::Int(10)));
        assert!(!filter.matches(&CellValue::Float(9.5)));
        assert_eq!(factory.name(), "custom");
    }
}
