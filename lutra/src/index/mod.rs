//! Indexing support: index descriptors, the ordered value→id map, and the
//! single-field index maintained alongside collection mutations.
//!
//! Indexes are advisory: the query planner may use them to narrow the
//! candidate set, but every candidate is re-verified against the filter, so
//! an index can never change query results — only execution cost.

mod descriptor;
mod index_map;
mod single_field_index;

pub use descriptor::{IndexDescriptor, IndexType};
pub use index_map::IndexMap;
pub use single_field_index::SingleFieldIndex;
