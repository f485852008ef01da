use crate::aggregate::stages::{GroupExpr, GroupStage, Stage};
use crate::aggregate::AggregatePlan;
use crate::collection::Document;
use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, LutraError, LutraResult};
use crate::filter;

/// Executes a compiled pipeline stage-by-stage over a document stream.
///
/// `$match` hands its original filter document to the predicate engine, so
/// matching behaves identically to `find` with the same filter. `$sort`
/// re-orders by the declared keys. `$group` partitions by the `_id`
/// expression (groups emitted in first-appearance order) and evaluates the
/// output fields per group.
pub(crate) fn run_pipeline(
    plan: &AggregatePlan,
    mut docs: Vec<Document>,
) -> LutraResult<Vec<Document>> {
    for stage in plan.stages() {
        docs = match stage {
            Stage::Match(stage) => {
                let compiled = filter::compile(stage.filter_document())?;
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if compiled.apply(&doc)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            Stage::Sort(stage) => {
                let mut sorted = docs;
                sorted.sort_by(|a, b| {
                    for (field, order) in stage.keys() {
                        let left = a.get(field).cloned().unwrap_or(Value::Null);
                        let right = b.get(field).cloned().unwrap_or(Value::Null);
                        let ordering = match order {
                            SortOrder::Ascending => left.cmp(&right),
                            SortOrder::Descending => right.cmp(&left),
                        };
                        if ordering != std::cmp::Ordering::Equal {
                            return ordering;
                        }
                    }
                    std::cmp::Ordering::Equal
                });
                sorted
            }
            Stage::Group(stage) => run_group(stage, docs)?,
        };
    }
    Ok(docs)
}

fn run_group(stage: &GroupStage, docs: Vec<Document>) -> LutraResult<Vec<Document>> {
    let key_expr = stage
        .fields()
        .iter()
        .find(|(name, _)| name == "_id")
        .map(|(_, expr)| expr);

    // groups keep first-appearance order
    let mut groups: Vec<(Value, Vec<Document>)> = Vec::new();
    for doc in docs {
        let key = match key_expr {
            Some(expr) => eval_scalar(expr, &doc)?,
            None => Value::Null,
        };
        match groups.iter_mut().find(|(existing, _)| existing == &key) {
            Some((_, members)) => members.push(doc),
            None => groups.push((key, vec![doc])),
        }
    }

    let mut output = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let mut doc = Document::new();
        for (name, expr) in stage.fields() {
            if name == "_id" {
                doc.put_unchecked("_id", key.clone());
                continue;
            }
            let value = match expr {
                GroupExpr::Expr { op, args } if is_accumulator(op) => {
                    accumulate(op, args, &members)?
                }
                // non-accumulator outputs evaluate against the group's
                // first document
                other => match members.first() {
                    Some(first) => eval_scalar(other, first)?,
                    None => Value::Null,
                },
            };
            doc.put_unchecked(name, value);
        }
        output.push(doc);
    }
    Ok(output)
}

fn is_accumulator(op: &str) -> bool {
    matches!(op, "$sum" | "$avg" | "$min" | "$max" | "$count")
}

fn accumulate(op: &str, args: &[GroupExpr], members: &[Document]) -> LutraResult<Value> {
    if op == "$count" {
        return Ok(Value::Int(members.len() as i64));
    }

    let arg = args.first().ok_or_else(|| {
        LutraError::new(
            &format!("{} requires an argument", op),
            ErrorKind::ParseError,
        )
    })?;

    let mut values = Vec::with_capacity(members.len());
    for member in members {
        let value = eval_scalar(arg, member)?;
        if !value.is_null() {
            values.push(value);
        }
    }

    match op {
        "$sum" => {
            let mut total = Value::Int(0);
            for value in &values {
                if value.is_number() {
                    total = numeric_add(&total, value);
                }
            }
            Ok(total)
        }
        "$avg" => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_number()).collect();
            if numbers.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Double(numbers.iter().sum::<f64>() / numbers.len() as f64))
            }
        }
        "$min" => Ok(values.into_iter().min().unwrap_or(Value::Null)),
        "$max" => Ok(values.into_iter().max().unwrap_or(Value::Null)),
        other => Err(LutraError::new(
            &format!("Unknown accumulator {}", other),
            ErrorKind::ParseError,
        )),
    }
}

/// Evaluates a non-accumulator group expression against one document.
fn eval_scalar(expr: &GroupExpr, doc: &Document) -> LutraResult<Value> {
    match expr {
        GroupExpr::Literal(value) => Ok(value.clone()),
        GroupExpr::FieldRef(name) => {
            let path = name.trim_start_matches('$');
            Ok(doc.get(path).cloned().unwrap_or(Value::Null))
        }
        GroupExpr::Expr { op, args } => {
            if is_accumulator(op) {
                return Err(LutraError::new(
                    &format!("{} is not allowed inside a scalar expression", op),
                    ErrorKind::ParseError,
                ));
            }
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                let value = eval_scalar(arg, doc)?;
                if !value.is_number() {
                    // arithmetic over a missing or non-numeric operand
                    // yields null for the whole expression
                    return Ok(Value::Null);
                }
                evaluated.push(value);
            }
            apply_arithmetic(op, &evaluated)
        }
    }
}

fn apply_arithmetic(op: &str, args: &[Value]) -> LutraResult<Value> {
    let binary = |op_name: &str| -> LutraResult<(Value, Value)> {
        if args.len() != 2 {
            return Err(LutraError::new(
                &format!("{} requires exactly two arguments", op_name),
                ErrorKind::ParseError,
            ));
        }
        Ok((args[0].clone(), args[1].clone()))
    };

    match op {
        "$add" => Ok(args.iter().fold(Value::Int(0), |acc, v| numeric_add(&acc, v))),
        "$multiply" => Ok(args.iter().fold(Value::Int(1), |acc, v| numeric_mul(&acc, v))),
        "$subtract" => {
            let (a, b) = binary("$subtract")?;
            match (a, b) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
                (a, b) => Ok(Value::Double(
                    a.as_number().unwrap_or(0.0) - b.as_number().unwrap_or(0.0),
                )),
            }
        }
        "$divide" => {
            let (a, b) = binary("$divide")?;
            let divisor = b.as_number().unwrap_or(0.0);
            if divisor == 0.0 {
                return Err(LutraError::new(
                    "$divide by zero",
                    ErrorKind::TypeMismatch,
                ));
            }
            Ok(Value::Double(a.as_number().unwrap_or(0.0) / divisor))
        }
        other => Err(LutraError::new(
            &format!("Unknown scalar operator {}", other),
            ErrorKind::ParseError,
        )),
    }
}

fn numeric_add(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
        (a, b) => Value::Double(a.as_number().unwrap_or(0.0) + b.as_number().unwrap_or(0.0)),
    }
}

fn numeric_mul(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(a * b),
        (a, b) => Value::Double(a.as_number().unwrap_or(1.0) * b.as_number().unwrap_or(1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn sales() -> Vec<Document> {
        vec![
            doc! { name: "apple", price: 2, quantity: 3 },
            doc! { name: "apple", price: 2, quantity: 1 },
            doc! { name: "pear", price: 5, quantity: 2 },
        ]
    }

    fn run(pipeline: &[Document], docs: Vec<Document>) -> Vec<Document> {
        let plan = AggregatePlan::compile(pipeline).unwrap();
        run_pipeline(&plan, docs).unwrap()
    }

    #[test]
    fn test_match_stage_filters() {
        let result = run(&[doc! { "$match": { name: "apple" } }], sales());
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_sort_stage_orders() {
        let result = run(&[doc! { "$sort": { quantity: (-1) } }], sales());
        assert_eq!(result[0].get("quantity"), Some(&Value::Int(3)));
        assert_eq!(result[2].get("quantity"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_group_sum_of_expression() {
        let result = run(
            &[doc! {
                "$group": {
                    "_id": "$name",
                    total: { "$sum": { "$multiply": ["$price", "$quantity"] } },
                }
            }],
            sales(),
        );
        assert_eq!(result.len(), 2);
        // groups surface in first-appearance order
        assert_eq!(result[0].get("_id"), Some(&Value::String("apple".into())));
        assert_eq!(result[0].get("total"), Some(&Value::Int(8)));
        assert_eq!(result[1].get("_id"), Some(&Value::String("pear".into())));
        assert_eq!(result[1].get("total"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_group_avg_min_max_count() {
        let result = run(
            &[doc! {
                "$group": {
                    avg_q: { "$avg": "$quantity" },
                    min_q: { "$min": "$quantity" },
                    max_q: { "$max": "$quantity" },
                    n: { "$count": 1 },
                }
            }],
            sales(),
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("avg_q"), Some(&Value::Double(2.0)));
        assert_eq!(result[0].get("min_q"), Some(&Value::Int(1)));
        assert_eq!(result[0].get("max_q"), Some(&Value::Int(3)));
        assert_eq!(result[0].get("n"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_full_pipeline_match_group_sort() {
        let result = run(
            &[
                doc! { "$match": { quantity: { "$gte": 2 } } },
                doc! { "$group": { "_id": "$name", n: { "$count": 1 } } },
                doc! { "$sort": { "_id": 1 } },
            ],
            sales(),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get("_id"), Some(&Value::String("apple".into())));
        assert_eq!(result[0].get("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_missing_operand_yields_null() {
        let result = run(
            &[doc! { "$group": { x: { "$multiply": ["$absent", 2] } } }],
            sales(),
        );
        assert_eq!(result[0].get("x"), Some(&Value::Null));
    }

    #[test]
    fn test_divide_by_zero_fails() {
        let plan = AggregatePlan::compile(&[doc! {
            "$group": { x: { "$divide": ["$price", 0] } }
        }])
        .unwrap();
        let err = run_pipeline(&plan, sales()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }
}
