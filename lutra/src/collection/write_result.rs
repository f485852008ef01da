use crate::collection::ObjectId;

/// The result of an insert operation.
///
/// Batch inserts are best-effort: a document whose `_id` already exists (or
/// fails id validation) is skipped, its siblings are still attempted, and
/// only the successfully inserted ids are reported.
#[derive(Debug, Clone, Default)]
pub struct InsertResult {
    inserted_ids: Vec<ObjectId>,
}

impl InsertResult {
    pub(crate) fn new(inserted_ids: Vec<ObjectId>) -> Self {
        InsertResult { inserted_ids }
    }

    /// The ids of the documents that were actually inserted.
    pub fn inserted_ids(&self) -> &[ObjectId] {
        &self.inserted_ids
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }
}

/// The result of an `update_one`/`update_many` operation.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    matched_count: usize,
    modified_count: usize,
    upserted_id: Option<ObjectId>,
}

impl UpdateResult {
    pub(crate) fn new(
        matched_count: usize,
        modified_count: usize,
        upserted_id: Option<ObjectId>,
    ) -> Self {
        UpdateResult {
            matched_count,
            modified_count,
            upserted_id,
        }
    }

    /// How many documents the filter matched before the update.
    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    /// How many documents were actually changed.
    pub fn modified_count(&self) -> usize {
        self.modified_count
    }

    /// The id of the document inserted by an upsert, when one happened.
    pub fn upserted_id(&self) -> Option<ObjectId> {
        self.upserted_id
    }
}

/// The result of a `delete_one`/`delete_many` operation.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    deleted_count: usize,
}

impl DeleteResult {
    pub(crate) fn new(deleted_count: usize) -> Self {
        DeleteResult { deleted_count }
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted_count
    }
}
