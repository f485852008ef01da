use crossbeam_channel::Sender;

use crate::collection::core::CollectionSnapshot;
use crate::collection::{DeleteResult, Document, InsertResult, UpdateResult};
use crate::errors::LutraResult;
use crate::index::IndexType;

/// A request delivered to a collection's actor, carrying its own reply
/// channel. Mutations execute inside the actor; reads only fetch a snapshot
/// and scan on the caller's thread.
pub(crate) enum CollectionRequest {
    Insert {
        docs: Vec<Document>,
        reply: Sender<LutraResult<InsertResult>>,
    },
    Update {
        filter: Document,
        update: Document,
        upsert: bool,
        many: bool,
        reply: Sender<LutraResult<UpdateResult>>,
    },
    Delete {
        filter: Document,
        many: bool,
        reply: Sender<LutraResult<DeleteResult>>,
    },
    CreateIndex {
        field: String,
        index_type: IndexType,
        reply: Sender<LutraResult<bool>>,
    },
    Snapshot {
        reply: Sender<LutraResult<CollectionSnapshot>>,
    },
    Drop {
        reply: Sender<LutraResult<bool>>,
    },
}
