use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::collection::ObjectId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, LutraError, LutraResult};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};

type SegmentVec<'a> = SmallVec<[&'a str; 8]>;

/// A schemaless record: an ordered mapping from string keys to [Value]s.
///
/// Documents preserve insertion order for their fields and support nesting
/// through [Value::Document] and [Value::Array]. Embedded values are
/// addressed by a `.`-separated field path; numeric segments index into
/// arrays. For example, with `{"a": {"b": [10, 20]}}` the path `a.b.1`
/// resolves to `20`.
///
/// Path traversal fails softly: a missing key, an out-of-range index, or a
/// segment applied to an incompatible type yields `None` rather than an
/// error. Reads ([Document::get]) are always path-aware; writes keep keys
/// verbatim ([Document::put]) unless the path-writing primitive
/// ([Document::put_path]) is asked for, because filter and update documents
/// carry field paths as literal keys.
///
/// The reserved field `_id` holds the document's [ObjectId]. It may be set
/// by the caller, either as an `ObjectId` or as its 24-hex string form
/// (which is normalized on the way in); anything else is rejected.
#[derive(Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The number of top-level fields.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks for a top-level field (no path traversal).
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterates the top-level fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Iterates the top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Associates a value with a top-level key.
    ///
    /// The key is stored verbatim — a dotted key like `"a.b"` stays one
    /// key, which is what filter and update documents rely on to carry
    /// field paths. Use [Document::put_path] to write *through* an embedded
    /// path instead.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::InvalidOperation] if the key is empty
    /// * [ErrorKind::InvalidId] if the key is `_id` and the value is neither
    ///   an [ObjectId] nor a 24-hex string
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> LutraResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(LutraError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut value = value.into();
        if key == DOC_ID {
            value = normalize_id_value(value)?;
        }

        self.data.insert(key.to_string(), value);
        Ok(())
    }

    /// Writes a value at a `.`-separated path, creating intermediate
    /// documents as needed (`"user.address.zip"`). Numeric segments index
    /// into existing arrays. This is the write primitive behind `$set` and
    /// `$inc`.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::InvalidOperation] if the path is empty
    /// * [ErrorKind::InvalidId] if the path is `_id` and the value is
    ///   neither an [ObjectId] nor a 24-hex string
    /// * [ErrorKind::TypeMismatch] if a segment traverses into an
    ///   incompatible value (an index into a non-array, or an out-of-range
    ///   array position)
    pub fn put_path<T: Into<Value>>(&mut self, path: &str, value: T) -> LutraResult<()> {
        if !path.contains(FIELD_SEPARATOR) {
            return self.put(path, value);
        }

        let segments: SegmentVec = path.split(FIELD_SEPARATOR).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            log::error!("Document does not support empty path segments: {}", path);
            return Err(LutraError::new(
                &format!("Document does not support empty path segments: {}", path),
                ErrorKind::InvalidOperation,
            ));
        }
        self.deep_put(&segments, value.into())
    }

    /// Returns the value at the given key or embedded path, or `None` if any
    /// segment is missing or type-incompatible.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.data.get(key) {
            Some(value) => Some(value),
            None => {
                // only walk the path if the literal key is absent
                if key.contains(FIELD_SEPARATOR) {
                    let segments: SegmentVec = key.split(FIELD_SEPARATOR).collect();
                    self.deep_get(&segments)
                } else {
                    None
                }
            }
        }
    }

    /// The [ObjectId] stored in `_id`, if the document has one.
    pub fn id(&self) -> Option<ObjectId> {
        match self.data.get(DOC_ID) {
            Some(Value::ObjectId(id)) => Some(*id),
            _ => None,
        }
    }

    /// Returns the document id, generating and storing a fresh one if the
    /// `_id` field is not populated yet.
    pub fn ensure_id(&mut self) -> ObjectId {
        if let Some(id) = self.id() {
            return id;
        }
        let id = ObjectId::new();
        self.data.insert(DOC_ID.to_string(), Value::ObjectId(id));
        id
    }

    /// Inserts a top-level field without path splitting or `_id` validation.
    /// Used for derived documents (aggregation output) whose `_id` carries a
    /// group key rather than a document id.
    pub(crate) fn put_unchecked(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    fn deep_get(&self, segments: &[&str]) -> Option<&Value> {
        let (head, rest) = segments.split_first()?;
        let value = self.data.get(*head)?;
        if rest.is_empty() {
            Some(value)
        } else {
            get_in_value(value, rest)
        }
    }

    fn deep_put(&mut self, segments: &[&str], value: Value) -> LutraResult<()> {
        let (head, rest) = match segments.split_first() {
            Some(split) => split,
            None => return Ok(()),
        };

        if rest.is_empty() {
            self.data.insert(head.to_string(), value);
            return Ok(());
        }

        let entry = self
            .data
            .entry(head.to_string())
            .or_insert_with(|| Value::Document(Document::new()));
        put_in_value(entry, rest, value)
    }
}

fn get_in_value<'a>(current: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let (head, rest) = segments.split_first()?;
    let next = match current {
        Value::Document(doc) => doc.data.get(*head)?,
        Value::Array(items) => {
            let index: usize = head.parse().ok()?;
            items.get(index)?
        }
        _ => return None,
    };
    if rest.is_empty() {
        Some(next)
    } else {
        get_in_value(next, rest)
    }
}

fn put_in_value(current: &mut Value, segments: &[&str], value: Value) -> LutraResult<()> {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    match current {
        Value::Document(doc) => {
            if rest.is_empty() {
                doc.data.insert(head.to_string(), value);
                Ok(())
            } else {
                let entry = doc
                    .data
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Document(Document::new()));
                put_in_value(entry, rest, value)
            }
        }
        Value::Array(items) => {
            let index: usize = head.parse().map_err(|_| {
                LutraError::new(
                    &format!("Cannot index array with non-numeric segment '{}'", head),
                    ErrorKind::TypeMismatch,
                )
            })?;
            let slot = items.get_mut(index).ok_or_else(|| {
                LutraError::new(
                    &format!("Array index {} out of bounds", index),
                    ErrorKind::TypeMismatch,
                )
            })?;
            if rest.is_empty() {
                *slot = value;
                Ok(())
            } else {
                put_in_value(slot, rest, value)
            }
        }
        other => {
            log::error!(
                "Cannot traverse into {} value with segment '{}'",
                other.type_name(),
                head
            );
            Err(LutraError::new(
                &format!("Cannot traverse into {} value", other.type_name()),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

/// Normalizes a caller-supplied `_id` value: an [ObjectId] passes through,
/// a 24-hex string is parsed, anything else is rejected.
fn normalize_id_value(value: Value) -> LutraResult<Value> {
    match value {
        Value::ObjectId(_) => Ok(value),
        Value::String(s) => {
            let id = ObjectId::parse_str(&s)?;
            Ok(Value::ObjectId(id))
        }
        other => {
            log::error!("Document id must be an ObjectId, got {}", other.type_name());
            Err(LutraError::new(
                &format!(
                    "Document id must be an ObjectId or a 24-hex string, got {}",
                    other.type_name()
                ),
                ErrorKind::InvalidId,
            ))
        }
    }
}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        // key-sorted comparison keeps the order consistent with equality,
        // which ignores insertion order
        let mut left: Vec<(&String, &Value)> = self.data.iter().collect();
        let mut right: Vec<(&String, &Value)> = other.data.iter().collect();
        left.sort_by_key(|(k, _)| *k);
        right.sort_by_key(|(k, _)| *k);
        left.cmp(&right)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Strips the quotes `stringify!` leaves around string-literal keys in the
/// [doc!](crate::doc) macro.
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] from key-value pairs.
///
/// Keys can be identifiers or string literals (useful for embedded paths);
/// values can be literals, expressions in parentheses, nested `{...}`
/// documents, or `[...]` arrays.
///
/// ```ignore
/// let doc = doc! {
///     name: "Alice",
///     "address.city": "Springfield",
///     scores: [1, 2, 3],
///     meta: { active: true },
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // empty document, with or without outer braces
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    // outer-brace syntax
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro converting values for [doc!](crate::doc); handles nested
/// documents, arrays and plain expressions.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn nested_doc() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York",
                zip: 10001,
            },
            category: ["food", "produce", "grocery"],
            shelves: [
                { level: 1 },
                { level: 2 },
            ]
        }
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let doc = doc! { b: 1, a: 2, c: 3 };
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_get_top_level() {
        let doc = nested_doc();
        assert_eq!(doc.get("score"), Some(&Value::Int(1034)));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn test_get_embedded_path() {
        let doc = nested_doc();
        assert_eq!(doc.get("location.city"), Some(&Value::String("New York".into())));
        assert_eq!(doc.get("location.zip"), Some(&Value::Int(10001)));
        assert_eq!(doc.get("location.country"), None);
    }

    #[test]
    fn test_get_array_index() {
        let doc = nested_doc();
        assert_eq!(doc.get("category.0"), Some(&Value::String("food".into())));
        assert_eq!(doc.get("category.2"), Some(&Value::String("grocery".into())));
        assert_eq!(doc.get("category.3"), None);
        assert_eq!(doc.get("shelves.1.level"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_traversal_fails_on_type_mismatch() {
        let doc = nested_doc();
        // indexing into a scalar
        assert_eq!(doc.get("score.0"), None);
        // non-numeric segment into an array
        assert_eq!(doc.get("category.first"), None);
    }

    #[test]
    fn test_put_keeps_dotted_keys_literal() {
        // filter documents carry field paths as keys; put must not split them
        let mut doc = Document::new();
        doc.put("a.b", 1).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a.b"]);
        assert_eq!(doc.get("a.b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_put_path_creates_intermediates() {
        let mut doc = Document::new();
        doc.put_path("user.address.zip", 10001).unwrap();
        assert_eq!(doc.get("user.address.zip"), Some(&Value::Int(10001)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["user"]);
    }

    #[test]
    fn test_put_path_into_array_element() {
        let mut doc = doc! { items: [1, 2, 3] };
        doc.put_path("items.1", 20).unwrap();
        assert_eq!(doc.get("items.1"), Some(&Value::Int(20)));

        let err = doc.put_path("items.9", 0).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_put_rejects_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_id_normalization() {
        let mut doc = Document::new();
        doc.put("_id", "000000000000000000000001").unwrap();
        assert_eq!(doc.id().unwrap().value_of(), "000000000000000000000001");

        let mut doc = Document::new();
        let err = doc.put("_id", 42).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_ensure_id_generates_once() {
        let mut doc = doc! { name: "x" };
        assert!(doc.id().is_none());
        let id = doc.ensure_id();
        assert_eq!(doc.ensure_id(), id);
        assert_eq!(doc.id(), Some(id));
    }

    #[test]
    fn test_equality_ignores_field_order() {
        let a = doc! { x: 1, y: 2 };
        let b = doc! { y: 2, x: 1 };
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_display_renders_in_insertion_order() {
        let doc = doc! { b: 1, a: "x" };
        assert_eq!(doc.to_string(), "{\"b\": 1, \"a\": \"x\"}");
    }
}
