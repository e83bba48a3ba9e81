//! Row filters
//!
//! A `Filter` is handed to a data source unchanged. The paginator and the
//! hierarchy assembler never look inside one; only `DataSource`
//! implementations interpret it.

use serde_json::Value;

/// Predicate selecting rows of a collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Every row matches
    #[default]
    All,
    /// Every listed field equals the given value (AND). A `null` value
    /// matches rows where the field is null or absent.
    Eq(Vec<(String, Value)>),
    /// The field is null, absent or the empty string
    NullOrEmpty(String),
    /// Raw boolean expression forwarded verbatim to the backend
    Raw(String),
}

impl Filter {
    /// Filter matching a single field/value pair
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(vec![(field.into(), value.into())])
    }

    /// Add another equality condition, turning `All` into `Eq`
    pub fn and_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        match self {
            Self::All => Self::eq(field, value),
            Self::Eq(mut pairs) => {
                pairs.push((field.into(), value.into()));
                Self::Eq(pairs)
            }
            other => other,
        }
    }

    /// Filter matching rows whose field is null or empty
    pub fn null_or_empty(field: impl Into<String>) -> Self {
        Self::NullOrEmpty(field.into())
    }

    /// Raw backend expression
    pub fn raw(expr: impl Into<String>) -> Self {
        Self::Raw(expr.into())
    }

    /// Check if this filter selects everything
    pub fn is_all(&self) -> bool {
        match self {
            Self::All => true,
            Self::Eq(pairs) => pairs.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_builder() {
        let filter = Filter::eq("status", "published").and_eq("author_id", 3);
        assert_eq!(
            filter,
            Filter::Eq(vec![
                ("status".to_string(), json!("published")),
                ("author_id".to_string(), json!(3)),
            ])
        );
    }

    #[test]
    fn test_and_eq_on_all() {
        assert_eq!(Filter::All.and_eq("id", 1), Filter::eq("id", 1));
    }

    #[test]
    fn test_and_eq_leaves_raw_untouched() {
        let raw = Filter::raw("id > 3");
        assert_eq!(raw.clone().and_eq("id", 1), raw);
    }

    #[test]
    fn test_is_all() {
        assert!(Filter::All.is_all());
        assert!(Filter::Eq(Vec::new()).is_all());
        assert!(!Filter::eq("id", 1).is_all());
        assert!(!Filter::null_or_empty("parent_id").is_all());
    }
}
