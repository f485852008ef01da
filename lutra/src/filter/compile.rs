use crate::collection::{Document, ObjectId};
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, LutraError, LutraResult};
use crate::filter::{
    all, and, or, EqualsFilter, Filter, GreaterEqualFilter, GreaterThanFilter, LesserEqualFilter,
    LesserThanFilter, NotEqualsFilter, RegexFilter,
};
use regex::Regex;

/// Compiles a Mongo-style filter document into a [Filter] tree.
///
/// The document's shape encodes the logic:
///
/// * `{}` matches every document
/// * `{field: value}` is equality
/// * `{field: {"$gte": a, "$lt": b}}` combines operators on one field with an
///   implicit AND; supported operators are `$eq`, `$ne`, `$gt`, `$gte`,
///   `$lt`, `$lte` and `$regex`
/// * `{"$and": [f1, f2]}` / `{"$or": [f1, f2]}` combine sub-filters
/// * multiple top-level fields combine with an implicit AND
///
/// # Errors
///
/// Returns [ErrorKind::InvalidFilter] for unknown operators, malformed
/// `$and`/`$or` operands, or an invalid `$regex` pattern. Parse failures
/// happen before any document is examined.
pub fn compile(filter_doc: &Document) -> LutraResult<Filter> {
    let mut filters = Vec::new();

    for (key, value) in filter_doc.iter() {
        if let Some(operator) = key.strip_prefix('$') {
            filters.push(compile_logical(operator, value)?);
        } else {
            filters.push(compile_field(key, value)?);
        }
    }

    Ok(combine_and(filters))
}

fn combine_and(mut filters: Vec<Filter>) -> Filter {
    match filters.len() {
        0 => all(),
        1 => filters.remove(0),
        _ => and(filters),
    }
}

fn compile_logical(operator: &str, value: &Value) -> LutraResult<Filter> {
    let branches = match value.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => {
            log::error!("${} requires a non-empty array of filters", operator);
            return Err(LutraError::new(
                &format!("${} requires a non-empty array of filters", operator),
                ErrorKind::InvalidFilter,
            ));
        }
    };

    let mut sub_filters = Vec::with_capacity(branches.len());
    for branch in branches {
        let sub_doc = branch.as_document().ok_or_else(|| {
            log::error!("${} branches must be filter documents", operator);
            LutraError::new(
                &format!("${} branches must be filter documents", operator),
                ErrorKind::InvalidFilter,
            )
        })?;
        sub_filters.push(compile(sub_doc)?);
    }

    match operator {
        "and" => Ok(and(sub_filters)),
        "or" => Ok(or(sub_filters)),
        other => {
            log::error!("Unknown logical operator ${}", other);
            Err(LutraError::new(
                &format!("Unknown logical operator ${}", other),
                ErrorKind::InvalidFilter,
            ))
        }
    }
}

fn compile_field(field: &str, value: &Value) -> LutraResult<Filter> {
    if let Some(operators) = operator_document(value) {
        let mut filters = Vec::with_capacity(operators.len());
        for (op_key, op_value) in operators.iter() {
            filters.push(operator_filter(field, op_key, op_value)?);
        }
        Ok(combine_and(filters))
    } else {
        Ok(Filter::new(EqualsFilter::new(
            field.to_string(),
            normalize_comparison_value(field, value),
        )))
    }
}

/// A non-empty nested document whose keys all start with `$` is an operator
/// document; anything else (including `{}`) is an equality operand.
fn operator_document(value: &Value) -> Option<&Document> {
    match value.as_document() {
        Some(doc) if !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')) => Some(doc),
        _ => None,
    }
}

fn operator_filter(field: &str, operator: &str, value: &Value) -> LutraResult<Filter> {
    let field = field.to_string();
    let value = normalize_comparison_value(&field, value);
    match operator {
        "$eq" => Ok(Filter::new(EqualsFilter::new(field, value))),
        "$ne" => Ok(Filter::new(NotEqualsFilter::new(field, value))),
        "$gt" => Ok(Filter::new(GreaterThanFilter::new(field, value))),
        "$gte" => Ok(Filter::new(GreaterEqualFilter::new(field, value))),
        "$lt" => Ok(Filter::new(LesserThanFilter::new(field, value))),
        "$lte" => Ok(Filter::new(LesserEqualFilter::new(field, value))),
        "$regex" => {
            let pattern = value.as_string().ok_or_else(|| {
                log::error!("$regex pattern must be a string for field {}", field);
                LutraError::new(
                    &format!("$regex pattern must be a string for field {}", field),
                    ErrorKind::InvalidFilter,
                )
            })?;
            let regex = Regex::new(pattern).map_err(|err| {
                log::error!("Invalid $regex pattern for field {}: {}", field, err);
                LutraError::new(
                    &format!("Invalid $regex pattern for field {}: {}", field, err),
                    ErrorKind::InvalidFilter,
                )
            })?;
            Ok(Filter::new(RegexFilter::new(field, regex)))
        }
        other => {
            log::error!("Unknown filter operator {} for field {}", other, field);
            Err(LutraError::new(
                &format!("Unknown filter operator {} for field {}", other, field),
                ErrorKind::InvalidFilter,
            ))
        }
    }
}

/// Comparisons against `_id` accept the 24-hex string form; it is normalized
/// to an [ObjectId] so stored ids match.
fn normalize_comparison_value(field: &str, value: &Value) -> Value {
    if field == DOC_ID {
        if let Some(text) = value.as_string() {
            if let Ok(id) = ObjectId::parse_str(text) {
                return Value::ObjectId(id);
            }
        }
    }
    value.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::is_all_filter;

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = compile(&Document::new()).unwrap();
        assert!(is_all_filter(&filter));
    }

    #[test]
    fn test_bare_equality() {
        let filter = compile(&doc! { count: 5 }).unwrap();
        assert!(filter.apply(&doc! { count: 5 }).unwrap());
        assert!(!filter.apply(&doc! { count: 6 }).unwrap());
    }

    #[test]
    fn test_operator_document() {
        let filter = compile(&doc! { count: { "$gte": 50, "$lt": 51 } }).unwrap();
        assert!(filter.apply(&doc! { count: 50 }).unwrap());
        assert!(!filter.apply(&doc! { count: 51 }).unwrap());
        assert!(!filter.apply(&doc! { count: 49 }).unwrap());
    }

    #[test]
    fn test_multiple_fields_imply_and() {
        let filter = compile(&doc! { a: 1, b: { "$gt": 0 } }).unwrap();
        assert!(filter.apply(&doc! { a: 1, b: 1 }).unwrap());
        assert!(!filter.apply(&doc! { a: 1, b: 0 }).unwrap());
        assert!(!filter.apply(&doc! { a: 2, b: 1 }).unwrap());
    }

    #[test]
    fn test_logical_operators() {
        let filter = compile(&doc! {
            "$or": [{ count: { "$lt": 10 } }, { count: { "$gte": 90 } }]
        })
        .unwrap();
        assert!(filter.apply(&doc! { count: 5 }).unwrap());
        assert!(filter.apply(&doc! { count: 95 }).unwrap());
        assert!(!filter.apply(&doc! { count: 50 }).unwrap());
    }

    #[test]
    fn test_equality_to_nested_document() {
        let filter = compile(&doc! { meta: { kind: "a" } }).unwrap();
        assert!(filter.apply(&doc! { meta: { kind: "a" } }).unwrap());
        assert!(!filter.apply(&doc! { meta: { kind: "b" } }).unwrap());
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = compile(&doc! { count: { "$near": 5 } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);

        let err = compile(&doc! { "$nor": [{ a: 1 }] }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = compile(&doc! { name: { "$regex": "[" } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);

        let err = compile(&doc! { name: { "$regex": 5 } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_malformed_logical_operand() {
        let err = compile(&doc! { "$and": 5 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);

        let err = compile(&doc! { "$and": [] }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFilter);
    }

    #[test]
    fn test_id_string_is_normalized() {
        let filter = compile(&doc! { "_id": "000000000000000000000007" }).unwrap();
        let mut stored = doc! { count: 1 };
        stored
            .put("_id", "000000000000000000000007")
            .unwrap();
        assert!(filter.apply(&stored).unwrap());
    }
}
