use crate::collection::{Document, ObjectId};
use crate::index::{IndexDescriptor, IndexMap};

/// An ordered single-field index, kept consistent with its collection on
/// every insert, update and delete.
///
/// A document that lacks the indexed field simply has no entry; queries that
/// scan the index can therefore never see it as a candidate, and the
/// full-scan verification path is what keeps results identical either way.
#[derive(Clone)]
pub struct SingleFieldIndex {
    descriptor: IndexDescriptor,
    map: IndexMap,
}

impl SingleFieldIndex {
    pub fn new(descriptor: IndexDescriptor) -> Self {
        SingleFieldIndex {
            descriptor,
            map: IndexMap::new(),
        }
    }

    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    pub fn field(&self) -> &str {
        self.descriptor.field()
    }

    pub fn index_map(&self) -> &IndexMap {
        &self.map
    }

    /// Records a newly inserted document.
    pub fn write_entry(&mut self, id: ObjectId, doc: &Document) {
        if let Some(value) = doc.get(self.descriptor.field()) {
            self.map.add_entry(value.clone(), id);
        }
    }

    /// Removes a deleted document.
    pub fn remove_entry(&mut self, id: ObjectId, doc: &Document) {
        if let Some(value) = doc.get(self.descriptor.field()) {
            self.map.remove_entry(value, &id);
        }
    }

    /// Re-indexes a document after an update.
    pub fn update_entry(&mut self, id: ObjectId, old_doc: &Document, new_doc: &Document) {
        let old_value = old_doc.get(self.descriptor.field());
        let new_value = new_doc.get(self.descriptor.field());
        if old_value == new_value {
            return;
        }
        if let Some(value) = old_value {
            self.map.remove_entry(value, &id);
        }
        if let Some(value) = new_value {
            self.map.add_entry(value.clone(), id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::index::IndexType;
    use std::ops::Bound;

    fn index_on(field: &str) -> SingleFieldIndex {
        SingleFieldIndex::new(IndexDescriptor::new(field, IndexType::SingleField))
    }

    #[test]
    fn test_write_and_remove_entry() {
        let mut index = index_on("count");
        let mut doc = doc! { count: 5 };
        let id = doc.ensure_id();

        index.write_entry(id, &doc);
        assert_eq!(index.index_map().len(), 1);

        index.remove_entry(id, &doc);
        assert!(index.index_map().is_empty());
    }

    #[test]
    fn test_document_without_field_is_not_indexed() {
        let mut index = index_on("count");
        let mut doc = doc! { name: "x" };
        let id = doc.ensure_id();
        index.write_entry(id, &doc);
        assert!(index.index_map().is_empty());
    }

    #[test]
    fn test_update_entry_moves_id() {
        let mut index = index_on("count");
        let mut old_doc = doc! { count: 5 };
        let id = old_doc.ensure_id();
        index.write_entry(id, &old_doc);

        let mut new_doc = old_doc.clone();
        new_doc.put("count", 9).unwrap();
        index.update_entry(id, &old_doc, &new_doc);

        use crate::common::Value;
        let hits = index
            .index_map()
            .scan(Bound::Included(Value::Int(9)), Bound::Included(Value::Int(9)));
        assert!(hits.contains(&id));
        assert!(index.index_map().get(&Value::Int(5)).is_none());
    }

    #[test]
    fn test_nested_field_indexing() {
        let mut index = index_on("stats.count");
        let mut doc = doc! { stats: { count: 3 } };
        let id = doc.ensure_id();
        index.write_entry(id, &doc);
        assert_eq!(index.index_map().len(), 1);
    }
}
