//! The update engine: parsing update-operator documents and applying them to
//! matched documents, including upsert document synthesis.

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, LutraError, LutraResult};

/// A parsed update document.
///
/// Supported operators:
///
/// * `$set` — writes a value at a field path, creating intermediate
///   documents as needed
/// * `$inc` — adds a numeric amount to a field, creating it at `0` when
///   absent; a non-numeric target fails that one document's update
///
/// Parsing rejects anything else up front ([ErrorKind::InvalidUpdate]), so a
/// malformed update never touches the collection. Application is
/// all-or-nothing per document: either every operator applies or the
/// document is left untouched.
pub struct UpdateSpec {
    sets: Vec<(String, Value)>,
    incs: Vec<(String, Value)>,
}

impl UpdateSpec {
    /// Parses an update document such as
    /// `{"$set": {"a.b": 1}, "$inc": {"count": 2}}`.
    pub fn parse(update_doc: &Document) -> LutraResult<UpdateSpec> {
        let mut sets = Vec::new();
        let mut incs = Vec::new();

        for (key, value) in update_doc.iter() {
            match key.as_str() {
                "$set" => {
                    let fields = operand_document(key, value)?;
                    for (path, field_value) in fields.iter() {
                        sets.push((path.clone(), field_value.clone()));
                    }
                }
                "$inc" => {
                    let fields = operand_document(key, value)?;
                    for (path, amount) in fields.iter() {
                        if !amount.is_number() {
                            log::error!("$inc amount for {} must be numeric", path);
                            return Err(LutraError::new(
                                &format!(
                                    "$inc amount for {} must be numeric, got {}",
                                    path,
                                    amount.type_name()
                                ),
                                ErrorKind::InvalidUpdate,
                            ));
                        }
                        incs.push((path.clone(), amount.clone()));
                    }
                }
                other => {
                    log::error!("Unknown update operator {}", other);
                    return Err(LutraError::new(
                        &format!("Unknown update operator {}", other),
                        ErrorKind::InvalidUpdate,
                    ));
                }
            }
        }

        Ok(UpdateSpec { sets, incs })
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.incs.is_empty()
    }

    /// Applies the update to a document, returning the new document and
    /// whether it differs from the original.
    ///
    /// # Errors
    ///
    /// [ErrorKind::TypeMismatch] if `$inc` targets a non-numeric value or a
    /// path traverses into an incompatible structure. The input document is
    /// never half-updated; on error the caller keeps the original.
    pub fn apply(&self, doc: &Document) -> LutraResult<(Document, bool)> {
        let mut updated = doc.clone();

        for (path, value) in &self.sets {
            updated.put_path(path, value.clone())?;
        }

        for (path, amount) in &self.incs {
            let incremented = match updated.get(path) {
                None => amount.clone(),
                Some(existing) => add_numbers(path, existing, amount)?,
            };
            updated.put_path(path, incremented)?;
        }

        let changed = updated != *doc;
        Ok((updated, changed))
    }

    /// Builds the document an upsert inserts when the filter matched
    /// nothing: the filter's equality constraints merged with the update's
    /// `$set` fields, then `$inc` applied from a zero base.
    ///
    /// Range and `$or` sub-filters contribute nothing to the new document.
    pub fn synthesize_upsert(&self, filter_doc: &Document) -> LutraResult<Document> {
        let mut base = Document::new();
        collect_equality_fields(filter_doc, &mut base)?;
        let (doc, _) = self.apply(&base)?;
        Ok(doc)
    }
}

fn operand_document<'a>(operator: &str, value: &'a Value) -> LutraResult<&'a Document> {
    value.as_document().ok_or_else(|| {
        log::error!("{} operand must be a document", operator);
        LutraError::new(
            &format!("{} operand must be a document", operator),
            ErrorKind::InvalidUpdate,
        )
    })
}

fn add_numbers(path: &str, existing: &Value, amount: &Value) -> LutraResult<Value> {
    match (existing, amount) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (a, b) if a.is_number() && b.is_number() => {
            // any double operand promotes the result to double
            let (a, b) = (a.as_number(), b.as_number());
            match (a, b) {
                (Some(a), Some(b)) => Ok(Value::Double(a + b)),
                _ => Err(LutraError::new(
                    &format!("$inc target {} is not numeric", path),
                    ErrorKind::TypeMismatch,
                )),
            }
        }
        (other, _) => {
            log::warn!(
                "$inc target {} holds {} value, skipping document",
                path,
                other.type_name()
            );
            Err(LutraError::new(
                &format!(
                    "$inc target {} holds {} value",
                    path,
                    other.type_name()
                ),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

/// Walks a filter document and copies its equality constraints (bare
/// `field: value` pairs and `{$eq: v}` operators) into the target; `$and`
/// branches are walked recursively, anything else is ignored.
fn collect_equality_fields(filter_doc: &Document, target: &mut Document) -> LutraResult<()> {
    for (key, value) in filter_doc.iter() {
        if key == "$and" {
            if let Some(branches) = value.as_array() {
                for branch in branches {
                    if let Some(branch_doc) = branch.as_document() {
                        collect_equality_fields(branch_doc, target)?;
                    }
                }
            }
            continue;
        }
        if key.starts_with('$') {
            continue;
        }

        match value.as_document() {
            Some(operators) if operators.keys().all(|k| k.starts_with('$')) && !operators.is_empty() => {
                if let Some(eq_value) = operators.get("$eq") {
                    target.put_path(key, eq_value.clone())?;
                }
            }
            _ => {
                target.put_path(key, value.clone())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_set_overwrites_and_creates() {
        let spec = UpdateSpec::parse(&doc! { "$set": { a: 10, "b.c": 20 } }).unwrap();
        let (updated, changed) = spec.apply(&doc! { a: 1 }).unwrap();
        assert!(changed);
        assert_eq!(updated.get("a"), Some(&Value::Int(10)));
        assert_eq!(updated.get("b.c"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_set_at_path_preserves_siblings() {
        let spec = UpdateSpec::parse(&doc! { "$set": { "meta.count": 2 } }).unwrap();
        let (updated, changed) = spec.apply(&doc! { meta: { count: 1, kind: "a" } }).unwrap();
        assert!(changed);
        assert_eq!(updated.get("meta.count"), Some(&Value::Int(2)));
        assert_eq!(updated.get("meta.kind"), Some(&Value::String("a".into())));
    }

    #[test]
    fn test_inc_adds_and_creates_at_zero() {
        let spec = UpdateSpec::parse(&doc! { "$inc": { hits: 5 } }).unwrap();

        let (updated, changed) = spec.apply(&doc! { hits: 2 }).unwrap();
        assert!(changed);
        assert_eq!(updated.get("hits"), Some(&Value::Int(7)));

        let (updated, _) = spec.apply(&doc! { other: 1 }).unwrap();
        assert_eq!(updated.get("hits"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_inc_promotes_to_double() {
        let spec = UpdateSpec::parse(&doc! { "$inc": { hits: 0.5 } }).unwrap();
        let (updated, _) = spec.apply(&doc! { hits: 2 }).unwrap();
        assert_eq!(updated.get("hits"), Some(&Value::Double(2.5)));
    }

    #[test]
    fn test_inc_on_non_numeric_fails_document() {
        let spec = UpdateSpec::parse(&doc! { "$inc": { hits: 1 } }).unwrap();
        let err = spec.apply(&doc! { hits: "two" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_noop_update_reports_unchanged() {
        let spec = UpdateSpec::parse(&doc! { "$set": { a: 1 } }).unwrap();
        let (_, changed) = spec.apply(&doc! { a: 1 }).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let err = UpdateSpec::parse(&doc! { "$rename": { a: "b" } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_parse_rejects_non_document_operand() {
        let err = UpdateSpec::parse(&doc! { "$set": 5 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_parse_rejects_non_numeric_inc_amount() {
        let err = UpdateSpec::parse(&doc! { "$inc": { hits: "one" } }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUpdate);
    }

    #[test]
    fn test_upsert_synthesis_merges_filter_and_set() {
        let spec = UpdateSpec::parse(&doc! { "$set": { status: "new" } }).unwrap();
        let doc = spec
            .synthesize_upsert(&doc! { kind: "widget", count: { "$eq": 7 } })
            .unwrap();
        assert_eq!(doc.get("kind"), Some(&Value::String("widget".into())));
        assert_eq!(doc.get("count"), Some(&Value::Int(7)));
        assert_eq!(doc.get("status"), Some(&Value::String("new".into())));
    }

    #[test]
    fn test_upsert_synthesis_ignores_ranges() {
        let spec = UpdateSpec::parse(&doc! { "$inc": { count: 2 } }).unwrap();
        let doc = spec
            .synthesize_upsert(&doc! { count: { "$gte": 100 }, kind: "widget" })
            .unwrap();
        assert_eq!(doc.get("kind"), Some(&Value::String("widget".into())));
        // the range constraint contributes nothing; $inc starts from zero
        assert_eq!(doc.get("count"), Some(&Value::Int(2)));
    }
}
