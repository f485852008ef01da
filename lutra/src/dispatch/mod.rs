//! The dispatch layer: one actor per collection behind a bounded inbox,
//! with cheap cloneable handles for clients, databases and collections.
//!
//! Mutations against one collection are serialized in submission-arrival
//! order (FIFO per submitter); reads fetch an O(1) snapshot and scan on the
//! caller's thread, so they run concurrently and stay snapshot-consistent.
//! The external surface is synchronous — callers block on the actor's
//! reply — which keeps the concurrency invisible at the interface.

mod client;
mod collection;
mod collection_actor;
mod database;
mod message;

pub use client::Client;
pub use collection::Collection;
pub use database::Database;
