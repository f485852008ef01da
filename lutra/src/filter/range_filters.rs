use crate::collection::Document;
use crate::common::Value;
use crate::errors::LutraResult;
use crate::filter::FilterProvider;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::Bound;

/// Evaluates a typed comparison against the document's field value.
///
/// Cross-type comparisons (other than Int/Double) and missing paths do not
/// match; they are never an error.
fn compare_field(doc: &Document, field: &str, value: &Value) -> Option<Ordering> {
    doc.get(field).and_then(|v| v.compare_to(value))
}

macro_rules! range_filter {
    ($name:ident, $op:literal, $pattern:pat, $lower:expr, $upper:expr) => {
        pub(crate) struct $name {
            field: String,
            value: Value,
        }

        impl $name {
            pub fn new(field: String, value: Value) -> Self {
                $name { field, value }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "({} {} {})", self.field, $op, self.value)
            }
        }

        impl FilterProvider for $name {
            fn apply(&self, doc: &Document) -> LutraResult<bool> {
                Ok(matches!(
                    compare_field(doc, &self.field, &self.value),
                    Some($pattern)
                ))
            }

            fn field_name(&self) -> Option<&str> {
                Some(&self.field)
            }

            fn index_range(&self) -> Option<(Bound<Value>, Bound<Value>)> {
                let lower: fn(Value) -> Bound<Value> = $lower;
                let upper: fn(Value) -> Bound<Value> = $upper;
                Some((lower(self.value.clone()), upper(self.value.clone())))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

range_filter!(
    GreaterThanFilter,
    ">",
    Ordering::Greater,
    Bound::Excluded,
    |_| Bound::Unbounded
);
range_filter!(
    GreaterEqualFilter,
    ">=",
    Ordering::Greater | Ordering::Equal,
    Bound::Included,
    |_| Bound::Unbounded
);
range_filter!(
    LesserThanFilter,
    "<",
    Ordering::Less,
    |_| Bound::Unbounded,
    Bound::Excluded
);
range_filter!(
    LesserEqualFilter,
    "<=",
    Ordering::Less | Ordering::Equal,
    |_| Bound::Unbounded,
    Bound::Included
);
