use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;

use crate::aggregate::{self, AggregatePlan};
use crate::collection::core::{CollectionCore, CollectionSnapshot};
use crate::collection::operation::read_operations;
use crate::collection::{DeleteResult, Document, InsertResult, UpdateResult};
use crate::cursor::Cursor;
use crate::dispatch::collection_actor;
use crate::dispatch::message::CollectionRequest;
use crate::errors::{ErrorKind, LutraError, LutraResult};
use crate::filter;
use crate::index::IndexType;
use crate::store::StorageProvider;

/// A handle to one collection of documents.
///
/// The handle is cheap to clone; every clone talks to the same actor.
/// Mutating calls are serialized by the actor in submission order, while
/// `find`/`count`/`aggregate` fetch an O(1) snapshot and scan on the
/// caller's thread, so reads run concurrently with each other and observe a
/// consistent state — never a partially applied batch.
///
/// After [Collection::drop] (or
/// [Database::drop_collection](crate::dispatch::Database::drop_collection))
/// a stale handle stays safe to use: operations return defined "not found"
/// results — empty cursors, zero counts, `false` — rather than failing.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    database_name: String,
    name: String,
    sender: Sender<CollectionRequest>,
    store: Arc<dyn StorageProvider>,
}

impl Collection {
    pub(crate) fn spawn(
        core: CollectionCore,
        store: Arc<dyn StorageProvider>,
    ) -> LutraResult<Collection> {
        let database_name = core.database_name().to_string();
        let name = core.name().to_string();
        let sender = collection_actor::spawn(core)?;
        Ok(Collection {
            inner: Arc::new(CollectionInner {
                database_name,
                name,
                sender,
                store,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn database_name(&self) -> &str {
        &self.inner.database_name
    }

    /// Inserts a single document, generating its `_id` when absent.
    pub fn insert_one(&self, doc: Document) -> LutraResult<InsertResult> {
        self.insert_many(vec![doc])
    }

    /// Inserts a batch of documents, best-effort per element: a document
    /// with a duplicate `_id` is skipped, its siblings still land.
    pub fn insert_many(&self, docs: Vec<Document>) -> LutraResult<InsertResult> {
        self.request(|reply| CollectionRequest::Insert { docs, reply })
            .unwrap_or_else(|| Ok(InsertResult::default()))
    }

    /// Inserts one or many documents.
    pub fn insert<I>(&self, docs: I) -> LutraResult<InsertResult>
    where
        I: IntoIterator<Item = Document>,
    {
        self.insert_many(docs.into_iter().collect())
    }

    /// Runs a filter query and returns a cursor over the matching
    /// documents.
    ///
    /// The filter compiles before anything is dispatched, so a malformed
    /// filter fails the call without touching the collection.
    pub fn find(&self, filter_doc: &Document) -> LutraResult<Cursor> {
        let compiled = filter::compile(filter_doc)?;
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot?,
            None => return Ok(Cursor::new(Vec::new())),
        };
        let documents = read_operations::find(&snapshot, &compiled)?;
        Ok(Cursor::new(documents))
    }

    /// Returns the first matching document, or `None`.
    pub fn find_one(&self, filter_doc: &Document) -> LutraResult<Option<Document>> {
        let compiled = filter::compile(filter_doc)?;
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot?,
            None => return Ok(None),
        };
        read_operations::find_first(&snapshot, &compiled)
    }

    /// Applies an update to the first matching document. See
    /// [Collection::update_many].
    pub fn update_one(
        &self,
        filter_doc: &Document,
        update_doc: &Document,
        upsert: bool,
    ) -> LutraResult<UpdateResult> {
        self.update(filter_doc, update_doc, upsert, false)
    }

    /// Applies an update to every matching document, reporting matched and
    /// modified counts. With `upsert` set and zero matches, a document
    /// synthesized from the filter's equality constraints and the update's
    /// `$set` fields is inserted and its id reported.
    pub fn update_many(
        &self,
        filter_doc: &Document,
        update_doc: &Document,
        upsert: bool,
    ) -> LutraResult<UpdateResult> {
        self.update(filter_doc, update_doc, upsert, true)
    }

    fn update(
        &self,
        filter_doc: &Document,
        update_doc: &Document,
        upsert: bool,
        many: bool,
    ) -> LutraResult<UpdateResult> {
        let filter = filter_doc.clone();
        let update = update_doc.clone();
        self.request(|reply| CollectionRequest::Update {
            filter,
            update,
            upsert,
            many,
            reply,
        })
        .unwrap_or_else(|| Ok(UpdateResult::default()))
    }

    /// Deletes the first matching document.
    pub fn delete_one(&self, filter_doc: &Document) -> LutraResult<DeleteResult> {
        self.delete(filter_doc, false)
    }

    /// Deletes every matching document.
    pub fn delete_many(&self, filter_doc: &Document) -> LutraResult<DeleteResult> {
        self.delete(filter_doc, true)
    }

    fn delete(&self, filter_doc: &Document, many: bool) -> LutraResult<DeleteResult> {
        let filter = filter_doc.clone();
        self.request(|reply| CollectionRequest::Delete {
            filter,
            many,
            reply,
        })
        .unwrap_or_else(|| Ok(DeleteResult::default()))
    }

    /// Declares an index over the given field paths.
    ///
    /// Only single-field indexes exist, so the list must name exactly one
    /// field. Returns `false` if the field is already indexed.
    pub fn create_index(&self, fields: &[&str], index_type: IndexType) -> LutraResult<bool> {
        if fields.len() != 1 {
            log::error!(
                "A {} index covers exactly one field, got {}",
                index_type,
                fields.len()
            );
            return Err(LutraError::new(
                &format!(
                    "A {} index covers exactly one field, got {}",
                    index_type,
                    fields.len()
                ),
                ErrorKind::IndexingError,
            ));
        }
        let field = fields[0].to_string();
        self.request(|reply| CollectionRequest::CreateIndex {
            field,
            index_type,
            reply,
        })
        .unwrap_or(Ok(false))
    }

    /// Executes an aggregation pipeline over the collection and returns a
    /// cursor over the resulting documents.
    pub fn aggregate(&self, pipeline: &[Document]) -> LutraResult<Cursor> {
        let plan = AggregatePlan::compile(pipeline)?;
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot?,
            None => return Ok(Cursor::new(Vec::new())),
        };
        let documents: Vec<Document> =
            snapshot.documents().iter().map(|(_, doc)| doc.clone()).collect();
        let result = aggregate::run_pipeline(&plan, documents)?;
        Ok(Cursor::new(result))
    }

    /// Drops the collection, freeing its storage and stopping its actor.
    /// Returns whether it still existed; a second call returns `false`.
    pub fn drop(&self) -> LutraResult<bool> {
        let dropped = self
            .request(|reply| CollectionRequest::Drop { reply })
            .unwrap_or(Ok(false))?;
        if dropped {
            self.inner
                .store
                .remove(&self.inner.database_name, &self.inner.name)?;
        }
        Ok(dropped)
    }

    /// The number of stored documents.
    pub fn count(&self) -> LutraResult<usize> {
        match self.snapshot() {
            Some(snapshot) => Ok(snapshot?.len()),
            None => Ok(0),
        }
    }

    /// Alias of [Collection::count].
    pub fn len(&self) -> LutraResult<usize> {
        self.count()
    }

    pub fn is_empty(&self) -> LutraResult<bool> {
        Ok(self.count()? == 0)
    }

    /// Hands a point-in-time copy of the collection to the storage
    /// collaborator.
    pub fn flush(&self) -> LutraResult<()> {
        let snapshot = match self.snapshot() {
            Some(snapshot) => snapshot?,
            None => return Ok(()),
        };
        let documents: Vec<Document> =
            snapshot.documents().iter().map(|(_, doc)| doc.clone()).collect();
        self.inner
            .store
            .flush(&self.inner.database_name, &self.inner.name, &documents)
    }

    fn snapshot(&self) -> Option<LutraResult<CollectionSnapshot>> {
        self.request(|reply| CollectionRequest::Snapshot { reply })
    }

    /// Sends a request and blocks on its reply. `None` means the actor is
    /// gone (the collection was dropped); callers map that to their defined
    /// "not found" result.
    fn request<T>(
        &self,
        build: impl FnOnce(Sender<LutraResult<T>>) -> CollectionRequest,
    ) -> Option<LutraResult<T>> {
        let (reply, receiver) = bounded(1);
        if self.inner.sender.send(build(reply)).is_err() {
            log::debug!(
                "Collection {}.{} is gone, reporting not-found result",
                self.inner.database_name,
                self.inner.name
            );
            return None;
        }
        receiver.recv().ok()
    }
}
