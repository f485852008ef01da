//! Documents, ids, and the storage engine behind collections: the document
//! model, write results, execution plans, and the read/write operation
//! paths.

pub(crate) mod core;
mod document;
pub mod find_plan;
mod object_id;
pub(crate) mod operation;
mod write_result;

pub use document::{normalize, Document};
pub use find_plan::{ExecutionChoice, IndexScanSpec};
pub use object_id::ObjectId;
pub use write_result::{DeleteResult, InsertResult, UpdateResult};
