use im::OrdMap;

use crate::collection::{Document, ObjectId};
use crate::index::{IndexDescriptor, IndexType, SingleFieldIndex};

/// The storage unit behind a collection: the id→document map plus the
/// declared indexes.
///
/// A `CollectionCore` is owned exclusively by its collection's actor thread;
/// it is never shared, so mutation needs no locking. Readers are served by
/// [CollectionCore::snapshot], which is O(1) thanks to the persistent map —
/// a snapshot keeps observing the state at the moment it was taken, however
/// the core mutates afterwards.
pub(crate) struct CollectionCore {
    database_name: String,
    name: String,
    pub(crate) documents: OrdMap<ObjectId, Document>,
    pub(crate) indexes: Vec<SingleFieldIndex>,
}

/// A point-in-time, immutable view of a collection's documents and indexes.
#[derive(Clone)]
pub(crate) struct CollectionSnapshot {
    documents: OrdMap<ObjectId, Document>,
    indexes: Vec<SingleFieldIndex>,
}

impl CollectionCore {
    pub fn new(database_name: &str, name: &str) -> Self {
        CollectionCore {
            database_name: database_name.to_string(),
            name: name.to_string(),
            documents: OrdMap::new(),
            indexes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn documents(&self) -> &OrdMap<ObjectId, Document> {
        &self.documents
    }

    /// Takes an O(1) snapshot for readers.
    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            documents: self.documents.clone(),
            indexes: self.indexes.clone(),
        }
    }

    /// Declares an index over a field path, building it from the current
    /// documents. Returns `false` without touching anything if the field is
    /// already indexed.
    pub fn create_index(&mut self, field: &str, index_type: IndexType) -> bool {
        if self.indexes.iter().any(|idx| idx.field() == field) {
            log::debug!(
                "Index on field {} already exists in collection {}",
                field,
                self.name
            );
            return false;
        }

        let mut index = SingleFieldIndex::new(IndexDescriptor::new(field, index_type));
        for (id, doc) in self.documents.iter() {
            index.write_entry(*id, doc);
        }
        log::debug!(
            "Created {} index on field {} in collection {}",
            index_type,
            field,
            self.name
        );
        self.indexes.push(index);
        true
    }

    /// Releases all storage; called when the collection is dropped.
    pub fn clear(&mut self) {
        self.documents = OrdMap::new();
        self.indexes.clear();
    }
}

impl CollectionSnapshot {
    pub fn documents(&self) -> &OrdMap<ObjectId, Document> {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn index_for(&self, field: &str) -> Option<&SingleFieldIndex> {
        self.indexes.iter().find(|idx| idx.field() == field)
    }

    pub fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes
            .iter()
            .map(|idx| idx.descriptor().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_create_index_is_idempotent() {
        let mut core = CollectionCore::new("db", "coll");
        assert!(core.create_index("count", IndexType::SingleField));
        assert!(!core.create_index("count", IndexType::SingleField));
    }

    #[test]
    fn test_create_index_backfills_existing_documents() {
        let mut core = CollectionCore::new("db", "coll");
        for n in 0..3 {
            let mut doc = doc! { count: n };
            let id = doc.ensure_id();
            core.documents.insert(id, doc);
        }
        core.create_index("count", IndexType::SingleField);

        let snapshot = core.snapshot();
        let index = snapshot.index_for("count").unwrap();
        assert_eq!(index.index_map().len(), 3);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let mut core = CollectionCore::new("db", "coll");
        let mut doc = doc! { count: 1 };
        let id = doc.ensure_id();
        core.documents.insert(id, doc);

        let snapshot = core.snapshot();
        core.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(core.len(), 0);
    }
}
