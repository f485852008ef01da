use crate::collection::core::CollectionCore;
use crate::collection::operation::read_operations;
use crate::collection::write_result::{DeleteResult, InsertResult, UpdateResult};
use crate::collection::Document;
use crate::errors::LutraResult;
use crate::filter;
use crate::update::UpdateSpec;

impl CollectionCore {
    /// Inserts a batch of documents, best-effort per element.
    ///
    /// A document without an `_id` gets a generated id; a document whose id
    /// already exists is skipped and the rest of the batch is still
    /// attempted. Index entries are written in the same step as the
    /// document, so an index is never observably stale.
    pub(crate) fn insert_many(&mut self, docs: Vec<Document>) -> InsertResult {
        let mut inserted_ids = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let id = doc.ensure_id();
            if self.documents.contains_key(&id) {
                log::warn!(
                    "Duplicate id {} in collection {}, skipping document",
                    id,
                    self.name()
                );
                continue;
            }
            for index in self.indexes.iter_mut() {
                index.write_entry(id, &doc);
            }
            self.documents.insert(id, doc);
            inserted_ids.push(id);
        }
        InsertResult::new(inserted_ids)
    }

    /// Applies an update document to every matched document (or just the
    /// first, for `update_one`).
    ///
    /// A document whose update fails (`$inc` on a non-numeric value) is left
    /// untouched and its siblings are still attempted; each document's
    /// update is all-or-nothing. With `upsert` set and zero matches, a new
    /// document is synthesized from the filter's equality constraints and
    /// the update's `$set` fields.
    pub(crate) fn update(
        &mut self,
        filter_doc: &Document,
        update_doc: &Document,
        upsert: bool,
        many: bool,
    ) -> LutraResult<UpdateResult> {
        let compiled = filter::compile(filter_doc)?;
        let spec = UpdateSpec::parse(update_doc)?;

        let snapshot = self.snapshot();
        let mut matched = read_operations::find(&snapshot, &compiled)?;
        if !many {
            matched.truncate(1);
        }

        let matched_count = matched.len();
        let mut modified_count = 0;
        for old_doc in matched {
            let id = match old_doc.id() {
                Some(id) => id,
                None => continue,
            };
            match spec.apply(&old_doc) {
                Ok((new_doc, changed)) => {
                    if changed {
                        for index in self.indexes.iter_mut() {
                            index.update_entry(id, &old_doc, &new_doc);
                        }
                        self.documents.insert(id, new_doc);
                        modified_count += 1;
                    }
                }
                Err(err) => {
                    // best-effort per element, the rest of the batch proceeds
                    log::warn!(
                        "Update failed for document {} in collection {}: {}",
                        id,
                        self.name(),
                        err
                    );
                }
            }
        }

        let mut upserted_id = None;
        if matched_count == 0 && upsert {
            let mut new_doc = spec.synthesize_upsert(filter_doc)?;
            let id = new_doc.ensure_id();
            if !self.documents.contains_key(&id) {
                for index in self.indexes.iter_mut() {
                    index.write_entry(id, &new_doc);
                }
                self.documents.insert(id, new_doc);
                upserted_id = Some(id);
            }
        }

        Ok(UpdateResult::new(matched_count, modified_count, upserted_id))
    }

    /// Deletes every matched document (or just the first, for
    /// `delete_one`). Zero matches is not an error.
    pub(crate) fn delete(&mut self, filter_doc: &Document, many: bool) -> LutraResult<DeleteResult> {
        let compiled = filter::compile(filter_doc)?;

        let snapshot = self.snapshot();
        let mut matched = read_operations::find(&snapshot, &compiled)?;
        if !many {
            matched.truncate(1);
        }

        let mut deleted_count = 0;
        for doc in matched {
            let id = match doc.id() {
                Some(id) => id,
                None => continue,
            };
            if self.documents.remove(&id).is_some() {
                for index in self.indexes.iter_mut() {
                    index.remove_entry(id, &doc);
                }
                deleted_count += 1;
            }
        }
        Ok(DeleteResult::new(deleted_count))
    }
}
