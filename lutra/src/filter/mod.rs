//! Query filters: the [FilterProvider] architecture, the concrete operator
//! filters, and the compiler that turns Mongo-style filter documents into a
//! [Filter] tree.

mod basic_filters;
mod compile;
#[allow(clippy::module_inception)]
mod filter;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub use compile::compile;
pub use filter::{all, and, or, Filter, FilterProvider};

pub(crate) use basic_filters::{EqualsFilter, NotEqualsFilter};
pub(crate) use filter::{is_all_filter, is_and_filter, is_or_filter};
pub(crate) use logical_filters::{AndFilter, OrFilter};
pub(crate) use pattern_filters::RegexFilter;
pub(crate) use range_filters::{
    GreaterEqualFilter, GreaterThanFilter, LesserEqualFilter, LesserThanFilter,
};
