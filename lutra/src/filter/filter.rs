use crate::collection::find_plan::ExecutionChoice;
use crate::collection::operation::find_optimizer;
use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, LutraError, LutraResult};
use crate::index::IndexDescriptor;
use std::any::Any;
use std::fmt::Display;
use std::ops::{Bound, Deref};
use std::sync::Arc;

use super::logical_filters::{AndFilter, OrFilter};

/// Trait implemented by every concrete filter.
///
/// A `FilterProvider` evaluates a condition against one document. Single-field
/// comparison filters additionally expose their field and, when the operator
/// translates to a key range, the bounds an ordered index can scan; the query
/// planner uses both to decide between a full scan and an index scan.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Applies the filter to a document and returns whether it matches.
    fn apply(&self, doc: &Document) -> LutraResult<bool>;

    /// The field this filter compares, for single-field filters.
    fn field_name(&self) -> Option<&str> {
        None
    }

    /// The key range an ordered index on [Self::field_name] could scan to
    /// cover this filter, or `None` if the operator is not index-coverable
    /// (`$ne`, `$regex`).
    fn index_range(&self) -> Option<(Bound<Value>, Bound<Value>)> {
        None
    }

    /// The sub-filters of a logical (`$and`/`$or`) filter.
    fn logical_filters(&self) -> LutraResult<Vec<Filter>> {
        Err(LutraError::new(
            "Filter is not a logical filter",
            ErrorKind::InvalidFilter,
        ))
    }

    fn as_any(&self) -> &dyn Any;
}

/// A compiled query filter for selecting documents from a collection.
///
/// `Filter` wraps a [FilterProvider] behind an `Arc`, so filters are cheap to
/// clone and share. Filters are produced by [compile](crate::filter::compile)
/// from Mongo-style filter documents, and evaluated either against every
/// document (full scan) or against index candidates — always through the same
/// [FilterProvider::apply], which is what keeps the two paths equivalent.
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    /// Creates a new filter from a provider implementation.
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Chooses an execution strategy for this filter given the declared
    /// indexes: a full collection scan, an index range scan, or a union of
    /// index scans for `$or` branches.
    pub fn plan(&self, indexes: &[IndexDescriptor]) -> ExecutionChoice {
        find_optimizer::plan(self, indexes)
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Internal filter matching all documents; the result of an empty filter
/// document.
pub(crate) struct AllFilter;

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(all)")
    }
}

impl FilterProvider for AllFilter {
    fn apply(&self, _doc: &Document) -> LutraResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Combines multiple filters using logical AND.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

/// Combines multiple filters using logical OR.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub(crate) fn is_all_filter(filter: &Filter) -> bool {
    filter.as_any().is::<AllFilter>()
}

pub(crate) fn is_and_filter(filter: &Filter) -> bool {
    filter.as_any().is::<AndFilter>()
}

pub(crate) fn is_or_filter(filter: &Filter) -> bool {
    filter.as_any().is::<OrFilter>()
}
