use crossbeam_channel::{bounded, Sender};
use std::thread;

use crate::collection::core::CollectionCore;
use crate::dispatch::message::CollectionRequest;
use crate::errors::{ErrorKind, LutraError, LutraResult};

/// Inbox depth per collection actor; a full inbox applies backpressure to
/// submitters rather than growing without bound.
const INBOX_CAPACITY: usize = 64;

/// Spawns the exclusive-owner thread for one collection.
///
/// The actor processes one request at a time in arrival order, which is
/// what serializes mutations against each other and keeps index updates
/// atomic with the document mutation that caused them. A `Drop` request
/// stops the loop; once every sender is gone the receiver disconnects and
/// the thread exits on its own.
pub(crate) fn spawn(mut core: CollectionCore) -> LutraResult<Sender<CollectionRequest>> {
    let (sender, receiver) = bounded::<CollectionRequest>(INBOX_CAPACITY);
    let thread_name = format!("lutra-{}.{}", core.database_name(), core.name());

    thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            for request in receiver.iter() {
                match request {
                    CollectionRequest::Insert { docs, reply } => {
                        let _ = reply.send(Ok(core.insert_many(docs)));
                    }
                    CollectionRequest::Update {
                        filter,
                        update,
                        upsert,
                        many,
                        reply,
                    } => {
                        let _ = reply.send(core.update(&filter, &update, upsert, many));
                    }
                    CollectionRequest::Delete {
                        filter,
                        many,
                        reply,
                    } => {
                        let _ = reply.send(core.delete(&filter, many));
                    }
                    CollectionRequest::CreateIndex {
                        field,
                        index_type,
                        reply,
                    } => {
                        let _ = reply.send(Ok(core.create_index(&field, index_type)));
                    }
                    CollectionRequest::Snapshot { reply } => {
                        let _ = reply.send(Ok(core.snapshot()));
                    }
                    CollectionRequest::Drop { reply } => {
                        core.clear();
                        let _ = reply.send(Ok(true));
                        break;
                    }
                }
            }
            log::debug!("Collection actor {} stopped", thread_name);
        })
        .map_err(|err| {
            LutraError::new(
                &format!("Failed to spawn collection actor: {}", err),
                ErrorKind::InternalError,
            )
        })?;

    Ok(sender)
}
