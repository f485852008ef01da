use crate::collection::Document;
use crate::errors::LutraResult;
use crate::filter::FilterProvider;
use regex::Regex;
use std::any::Any;
use std::fmt::Display;

/// `$regex` — matches string fields against a compiled regular expression.
///
/// The match is partial and unanchored unless the pattern itself anchors.
/// Applying it to a non-string or missing field is not an error; the
/// document simply does not match.
pub(crate) struct RegexFilter {
    field: String,
    regex: Regex,
}

impl RegexFilter {
    pub fn new(field: String, regex: Regex) -> Self {
        RegexFilter { field, regex }
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ /{}/)", self.field, self.regex.as_str())
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, doc: &Document) -> LutraResult<bool> {
        match doc.get(&self.field).and_then(|v| v.as_string()) {
            Some(text) => Ok(self.regex.is_match(text)),
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
