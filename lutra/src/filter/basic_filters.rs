use crate::collection::Document;
use crate::common::Value;
use crate::errors::LutraResult;
use crate::filter::FilterProvider;
use std::any::Any;
use std::fmt::Display;
use std::ops::Bound;

/// `$eq` — matches documents whose field equals the given value.
pub(crate) struct EqualsFilter {
    field: String,
    value: Value,
}

impl EqualsFilter {
    pub fn new(field: String, value: Value) -> Self {
        EqualsFilter { field, value }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field, self.value)
    }
}

impl FilterProvider for EqualsFilter {
    fn apply(&self, doc: &Document) -> LutraResult<bool> {
        // a missing path never matches, including equality with Null
        Ok(doc.get(&self.field) == Some(&self.value))
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn index_range(&self) -> Option<(Bound<Value>, Bound<Value>)> {
        Some((
            Bound::Included(self.value.clone()),
            Bound::Included(self.value.clone()),
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$ne` — matches documents whose field exists and differs from the value.
pub(crate) struct NotEqualsFilter {
    field: String,
    value: Value,
}

impl NotEqualsFilter {
    pub fn new(field: String, value: Value) -> Self {
        NotEqualsFilter { field, value }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field, self.value)
    }
}

impl FilterProvider for NotEqualsFilter {
    fn apply(&self, doc: &Document) -> LutraResult<bool> {
        match doc.get(&self.field) {
            Some(value) => Ok(value != &self.value),
            None => Ok(false),
        }
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::Filter;

    #[test]
    fn test_equals_matches() {
        let filter = Filter::new(EqualsFilter::new("count".into(), Value::Int(5)));
        assert!(filter.apply(&doc! { count: 5 }).unwrap());
        assert!(!filter.apply(&doc! { count: 6 }).unwrap());
        assert!(!filter.apply(&doc! { other: 5 }).unwrap());
    }

    #[test]
    fn test_equals_on_nested_path() {
        let filter = Filter::new(EqualsFilter::new("a.b".into(), Value::Int(1)));
        assert!(filter.apply(&doc! { a: { b: 1 } }).unwrap());
        assert!(!filter.apply(&doc! { a: { b: 2 } }).unwrap());
    }

    #[test]
    fn test_equals_numeric_cross_type() {
        let filter = Filter::new(EqualsFilter::new("count".into(), Value::Int(5)));
        assert!(filter.apply(&doc! { count: 5.0 }).unwrap());
    }

    #[test]
    fn test_not_equals_requires_field() {
        let filter = Filter::new(NotEqualsFilter::new("count".into(), Value::Int(5)));
        assert!(filter.apply(&doc! { count: 6 }).unwrap());
        assert!(!filter.apply(&doc! { count: 5 }).unwrap());
        assert!(!filter.apply(&doc! { other: 1 }).unwrap());
    }

    #[test]
    fn test_equals_is_index_coverable() {
        let filter = EqualsFilter::new("count".into(), Value::Int(5));
        assert!(filter.index_range().is_some());
        let filter = NotEqualsFilter::new("count".into(), Value::Int(5));
        assert!(filter.index_range().is_none());
    }
}
