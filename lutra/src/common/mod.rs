//! Common types and helpers shared across the crate.

mod sort_order;
mod value;

pub use sort_order::SortOrder;
pub use value::Value;

use parking_lot::RwLock;
use std::sync::Arc;

/// The reserved document id field.
pub const DOC_ID: &str = "_id";

/// Separator used in embedded field paths (`"a.b.3"`).
pub const FIELD_SEPARATOR: char = '.';

/// Shared mutable cell used where interior mutability must stay `Clone`.
pub type Atomic<T> = Arc<RwLock<T>>;

/// Wraps a value in an [Atomic] cell.
pub fn atomic<T>(value: T) -> Atomic<T> {
    Arc::new(RwLock::new(value))
}
