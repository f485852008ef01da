use dashmap::DashMap;
use std::sync::Arc;

use crate::collection::core::CollectionCore;
use crate::dispatch::Collection;
use crate::errors::LutraResult;
use crate::store::StorageProvider;

/// A named namespace of collections.
///
/// Collections come into existence on first reference; the handle is cheap
/// to clone and all clones share one registry.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    name: String,
    collections: DashMap<String, Collection>,
    store: Arc<dyn StorageProvider>,
}

impl Database {
    pub(crate) fn new(name: &str, store: Arc<dyn StorageProvider>) -> Self {
        Database {
            inner: Arc::new(DatabaseInner {
                name: name.to_string(),
                collections: DashMap::new(),
                store,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the collection with the given name, creating it on first
    /// reference. A newly created collection is seeded from the storage
    /// collaborator when it has content stored under this name.
    pub fn collection(&self, name: &str) -> LutraResult<Collection> {
        use dashmap::mapref::entry::Entry;

        if let Some(existing) = self.inner.collections.get(name) {
            return Ok(existing.clone());
        }

        match self.inner.collections.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let mut core = CollectionCore::new(&self.inner.name, name);
                if let Some(docs) = self.inner.store.load(&self.inner.name, name)? {
                    log::debug!(
                        "Loaded {} document(s) into collection {}.{}",
                        docs.len(),
                        self.inner.name,
                        name
                    );
                    core.insert_many(docs);
                }
                let collection = Collection::spawn(core, self.inner.store.clone())?;
                entry.insert(collection.clone());
                Ok(collection)
            }
        }
    }

    /// The names of the currently live collections.
    pub fn collection_names(&self) -> Vec<String> {
        self.inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Drops a collection by name: removes it from the registry and stops
    /// its actor. Returns whether it existed; a second call returns
    /// `false`.
    pub fn drop_collection(&self, name: &str) -> LutraResult<bool> {
        match self.inner.collections.remove(name) {
            Some((_, collection)) => collection.drop(),
            None => Ok(false),
        }
    }
}
