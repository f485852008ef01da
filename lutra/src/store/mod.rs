//! The storage collaborator seam.
//!
//! Persistence is external to the engine: a [StorageProvider] loads and
//! flushes a collection's contents keyed by database and collection name,
//! and the engine treats the persisted layout as opaque. The in-tree
//! [MemoryStorage] keeps flushed copies in memory; bindings install real
//! adapters through [Client::with_storage](crate::dispatch::Client::with_storage).

use dashmap::DashMap;

use crate::collection::Document;
use crate::errors::LutraResult;

const SPACE_SEPARATOR: &str = "|";

/// Load/flush interface a storage backend implements.
pub trait StorageProvider: Send + Sync {
    /// Loads a collection's documents, or `None` if the backend has nothing
    /// stored under that name.
    fn load(&self, database: &str, collection: &str) -> LutraResult<Option<Vec<Document>>>;

    /// Persists a point-in-time copy of a collection's documents.
    fn flush(&self, database: &str, collection: &str, documents: &[Document]) -> LutraResult<()>;

    /// Removes everything stored for a collection (after a drop).
    fn remove(&self, database: &str, collection: &str) -> LutraResult<()>;
}

/// The default backend: flushed collections are held in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    spaces: DashMap<String, Vec<Document>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            spaces: DashMap::new(),
        }
    }
}

fn space_key(database: &str, collection: &str) -> String {
    format!("{}{}{}", database, SPACE_SEPARATOR, collection)
}

impl StorageProvider for MemoryStorage {
    fn load(&self, database: &str, collection: &str) -> LutraResult<Option<Vec<Document>>> {
        Ok(self
            .spaces
            .get(&space_key(database, collection))
            .map(|docs| docs.clone()))
    }

    fn flush(&self, database: &str, collection: &str, documents: &[Document]) -> LutraResult<()> {
        self.spaces
            .insert(space_key(database, collection), documents.to_vec());
        Ok(())
    }

    fn remove(&self, database: &str, collection: &str) -> LutraResult<()> {
        self.spaces.remove(&space_key(database, collection));
        Ok(())
    }
}
