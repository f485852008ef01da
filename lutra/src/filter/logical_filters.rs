use crate::collection::Document;
use crate::errors::LutraResult;
use crate::filter::{Filter, FilterProvider};
use itertools::Itertools;
use std::any::Any;
use std::fmt::Display;

/// `$and` — matches when every sub-filter matches, evaluated with
/// short-circuit semantics.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.filters.iter().map(|x| x.to_string()).join(" && "))
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, doc: &Document) -> LutraResult<bool> {
        for filter in &self.filters {
            if !filter.apply(doc)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn logical_filters(&self) -> LutraResult<Vec<Filter>> {
        Ok(self.filters.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `$or` — matches when at least one sub-filter matches, evaluated with
/// short-circuit semantics.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.filters.iter().map(|x| x.to_string()).join(" || "))
    }
}

impl FilterProvider for OrFilter {
    fn apply(&self, doc: &Document) -> LutraResult<bool> {
        for filter in &self.filters {
            if filter.apply(doc)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn logical_filters(&self) -> LutraResult<Vec<Filter>> {
        Ok(self.filters.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
