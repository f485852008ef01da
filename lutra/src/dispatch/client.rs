use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dispatch::Database;
use crate::errors::LutraResult;
use crate::sql::{self, ExecuteResult, SqlStatement};
use crate::store::{MemoryStorage, StorageProvider};

/// The entry point: a registry of databases plus the SQL surface.
///
/// A client opened without a path keeps everything in memory. A path is
/// retained and handed to the storage collaborator installed via
/// [Client::with_storage]; the engine itself never interprets it.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    path: Option<PathBuf>,
    databases: DashMap<String, Database>,
    store: Arc<dyn StorageProvider>,
}

impl Client {
    /// Opens a client backed by in-memory storage.
    pub fn new(path: Option<&str>) -> LutraResult<Client> {
        Client::with_storage(path, Arc::new(MemoryStorage::new()))
    }

    /// Opens a client with a caller-provided storage backend.
    pub fn with_storage(
        path: Option<&str>,
        store: Arc<dyn StorageProvider>,
    ) -> LutraResult<Client> {
        Ok(Client {
            inner: Arc::new(ClientInner {
                path: path.map(PathBuf::from),
                databases: DashMap::new(),
                store,
            }),
        })
    }

    /// The path this client was opened with, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Returns the database with the given name, creating it on first
    /// reference.
    pub fn database(&self, name: &str) -> Database {
        self.inner
            .databases
            .entry(name.to_string())
            .or_insert_with(|| Database::new(name, self.inner.store.clone()))
            .clone()
    }

    /// The names of the databases referenced so far.
    pub fn database_names(&self) -> Vec<String> {
        self.inner
            .databases
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Parses and executes one SQL statement.
    ///
    /// A `SELECT` returns a cursor in the result; mutating statements
    /// report affected-row counts. Parse errors fail the call before any
    /// mutation is attempted, and execution flows through the same filter
    /// and update machinery as the native API.
    pub fn execute(&self, sql_text: &str) -> LutraResult<ExecuteResult> {
        match sql::parse(sql_text)? {
            SqlStatement::Select {
                database,
                collection,
                filter,
                order_by,
            } => {
                let collection = self.database(&database).collection(&collection)?;
                let mut cursor = collection.find(&filter)?;
                // applying single-key stable sorts in reverse declaration
                // order yields the multi-key ordering
                for (field, order) in order_by.iter().rev() {
                    cursor.sort(field, *order)?;
                }
                Ok(ExecuteResult {
                    cursor: Some(cursor),
                    ..ExecuteResult::default()
                })
            }
            SqlStatement::Insert {
                database,
                collection,
                docs,
            } => {
                let collection = self.database(&database).collection(&collection)?;
                let result = collection.insert_many(docs)?;
                Ok(ExecuteResult {
                    inserted_count: result.inserted_count(),
                    ..ExecuteResult::default()
                })
            }
            SqlStatement::Update {
                database,
                collection,
                update,
                filter,
            } => {
                let collection = self.database(&database).collection(&collection)?;
                let result = collection.update_many(&filter, &update, false)?;
                Ok(ExecuteResult {
                    modified_count: result.modified_count(),
                    ..ExecuteResult::default()
                })
            }
            SqlStatement::Delete {
                database,
                collection,
                filter,
            } => {
                let collection = self.database(&database).collection(&collection)?;
                let result = collection.delete_many(&filter)?;
                Ok(ExecuteResult {
                    deleted_count: result.deleted_count(),
                    ..ExecuteResult::default()
                })
            }
        }
    }
}
