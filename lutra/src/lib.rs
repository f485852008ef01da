//! # lutra — an embedded document-oriented data engine
//!
//! lutra stores schemaless hierarchical documents in named collections
//! grouped into databases, answers MongoDB-style filter/update/aggregate
//! queries and a small SQL dialect, and accelerates lookups with declared
//! single-field indexes.
//!
//! ## Key pieces
//!
//! - **Documents** — ordered, dynamically typed value trees addressed by
//!   `.`-separated field paths, identified by a 24-hex [`ObjectId`]
//! - **Filters** — Mongo-style filter documents compiled to predicate
//!   trees, with index-aware execution planning
//! - **Updates** — `$set`/`$inc` operator documents with upsert synthesis
//! - **Aggregation** — `$match`/`$group`/`$sort` pipelines, compiled to a
//!   canonical deterministic representation and executable stage-by-stage
//! - **Cursors** — closable, sortable handles over query results
//! - **Dispatch** — one actor per collection: serialized mutations,
//!   snapshot-consistent concurrent reads
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use lutra::{doc, Client};
//!
//! # fn main() -> lutra::errors::LutraResult<()> {
//! let client = Client::new(None)?;
//! let collection = client.database("shop").collection("items")?;
//!
//! collection.insert_one(doc! { name: "apple", count: 3 })?;
//!
//! let mut cursor = collection.find(&doc! { count: { "$gte": 1 } })?;
//! assert_eq!(cursor.count()?, 1);
//! cursor.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module organization
//!
//! - [`aggregate`] - Aggregation pipeline compiler and executor
//! - [`collection`] - Documents, ids, storage and operation paths
//! - [`common`] - Shared value types and helpers
//! - [`cursor`] - Query result cursors
//! - [`dispatch`] - Client/database/collection handles and the actor layer
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters and the filter compiler
//! - [`index`] - Single-field index support
//! - [`sql`] - The minimal SQL dialect
//! - [`store`] - The storage collaborator seam
//! - [`update`] - Update-operator engine

pub mod aggregate;
pub mod collection;
pub mod common;
pub mod cursor;
pub mod dispatch;
pub mod errors;
pub mod filter;
pub mod index;
pub mod sql;
pub mod store;
pub mod update;

pub use aggregate::to_aggregate;
pub use collection::{DeleteResult, Document, InsertResult, ObjectId, UpdateResult};
pub use common::{SortOrder, Value};
pub use cursor::{Cursor, CursorState};
pub use dispatch::{Client, Collection, Database};
pub use errors::{ErrorKind, LutraError, LutraResult};
pub use index::IndexType;
pub use sql::ExecuteResult;
