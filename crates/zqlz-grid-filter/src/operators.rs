//! Operator-driven content filters
//!
//! Mirrors the operator set of the table viewer's filter panel, evaluated
//! against in-memory cells instead of rendered into a WHERE clause. Text
//! comparisons are case-insensitive; ordering comparisons are numeric when
//! both sides parse as numbers. NULL cells only match [`FilterOperator::IsNull`].

use std::cmp::Ordering;
use std::sync::Arc;

use crate::content_filter::{ContentFilter, ContentFilterFactory, SharedContentFilter};
use crate::error::{FactoryError, FactoryResult};
use crate::types::{CellValue, FilterValue};

/// Filter operators available to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterOperator {
    // Equality operators
    Equal,
    NotEqual,

    // Comparison operators
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // String operators
    #[default]
    Contains,
    DoesNotContain,
    BeginsWith,
    DoesNotBeginWith,
    EndsWith,
    DoesNotEndWith,

    // NULL/Empty operators
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,

    // Range operators
    IsBetween,
    IsNotBetween,

    // List operators
    IsInList,
    IsNotInList,
}

impl FilterOperator {
    /// Label shown in the filter panel; also the factory name in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Contains => "contains",
            Self::DoesNotContain => "does not contain",
            Self::BeginsWith => "begins with",
            Self::DoesNotBeginWith => "does not begin with",
            Self::EndsWith => "ends with",
            Self::DoesNotEndWith => "does not end with",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::IsEmpty => "is empty",
            Self::IsNotEmpty => "is not empty",
            Self::IsBetween => "is between",
            Self::IsNotBetween => "is not between",
            Self::IsInList => "is in list",
            Self::IsNotInList => "is not in list",
        }
    }

    /// False for operators that constrain a column with no value typed
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty
        )
    }

    /// Between operators take a [`FilterValue::Range`]
    pub fn requires_two_values(&self) -> bool {
        matches!(self, Self::IsBetween | Self::IsNotBetween)
    }
}

/// A compiled operator filter. Operands are lowercased once at construction.
#[derive(Debug, Clone)]
pub struct OperatorFilter {
    operator: FilterOperator,
    value: String,
    value2: String,
    items: Vec<String>,
}

impl OperatorFilter {
    pub fn new(operator: FilterOperator, value: &str, value2: Option<&str>) -> Self {
        let items = if matches!(
            operator,
            FilterOperator::IsInList | FilterOperator::IsNotInList
        ) {
            value.split(',').map(|s| s.trim().to_lowercase()).collect()
        } else {
            Vec::new()
        };

        Self {
            operator,
            value: value.to_lowercase(),
            value2: value2.unwrap_or(value).to_lowercase(),
            items,
        }
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }
}

impl ContentFilter for OperatorFilter {
    fn matches(&self, content: &CellValue) -> bool {
        if content.is_null() {
            return self.operator == FilterOperator::IsNull;
        }

        let cell = content.to_string().to_lowercase();
        match self.operator {
            FilterOperator::Equal => cell == self.value,
            FilterOperator::NotEqual => cell != self.value,

            FilterOperator::LessThan => compare(content, &cell, &self.value).is_lt(),
            FilterOperator::LessThanOrEqual => compare(content, &cell, &self.value).is_le(),
            FilterOperator::GreaterThan => compare(content, &cell, &self.value).is_gt(),
            FilterOperator::GreaterThanOrEqual => compare(content, &cell, &self.value).is_ge(),

            FilterOperator::Contains => cell.contains(&self.value),
            FilterOperator::DoesNotContain => !cell.contains(&self.value),
            FilterOperator::BeginsWith => cell.starts_with(&self.value),
            FilterOperator::DoesNotBeginWith => !cell.starts_with(&self.value),
            FilterOperator::EndsWith => cell.ends_with(&self.value),
            FilterOperator::DoesNotEndWith => !cell.ends_with(&self.value),

            FilterOperator::IsNull => false,
            FilterOperator::IsNotNull => true,
            FilterOperator::IsEmpty => cell.is_empty(),
            FilterOperator::IsNotEmpty => !cell.is_empty(),

            FilterOperator::IsBetween => {
                compare(content, &cell, &self.value).is_ge()
                    && compare(content, &cell, &self.value2).is_le()
            }
            FilterOperator::IsNotBetween => {
                compare(content, &cell, &self.value).is_lt()
                    || compare(content, &cell, &self.value2).is_gt()
            }

            FilterOperator::IsInList => self.items.contains(&cell),
            FilterOperator::IsNotInList => !self.items.contains(&cell),
        }
    }
}

/// Compare a cell against a bound, numerically when both sides are numbers.
/// `cell_lower` is the cell's lowercased display text.
fn compare(content: &CellValue, cell_lower: &str, bound: &str) -> Ordering {
    match (content.as_f64(), bound.trim().parse::<f64>()) {
        (Some(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => cell_lower.cmp(bound),
    }
}

/// Factory producing [`OperatorFilter`]s for a fixed operator
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorFilterFactory {
    operator: FilterOperator,
}

impl OperatorFilterFactory {
    pub fn new(operator: FilterOperator) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }
}

impl ContentFilterFactory for OperatorFilterFactory {
    fn create(&self, value: &FilterValue) -> FactoryResult<Option<SharedContentFilter>> {
        // NULL/Empty operators filter even when nothing was typed
        if !self.operator.requires_value() {
            return Ok(Some(Arc::new(OperatorFilter::new(self.operator, "", None))));
        }

        if value.is_blank() {
            return Ok(None);
        }

        let filter = match value {
            FilterValue::Text(text) => OperatorFilter::new(self.operator, text, None),
            FilterValue::Bool(flag) => OperatorFilter::new(self.operator, &flag.to_string(), None),
            FilterValue::Range { from, to } if self.operator.requires_two_values() => {
                OperatorFilter::new(self.operator, from, Some(to))
            }
            _ => {
                return Err(FactoryError::UnsupportedValue {
                    factory: self.name().to_string(),
                    value: value.clone(),
                });
            }
        };

        Ok(Some(Arc::new(filter)))
    }

    fn name(&self) -> &str {
        self.operator.label()
    }
}
