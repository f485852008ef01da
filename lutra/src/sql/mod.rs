//! A minimal SQL dialect over the document engine.
//!
//! Statements are translated into the same filter documents and update
//! specs the native API consumes, then executed through the regular
//! dispatch path — SQL is an entry point, not a second engine.

mod lexer;
mod parser;

pub(crate) use parser::{parse, SqlStatement};

use crate::cursor::Cursor;

/// The outcome of [Client::execute](crate::dispatch::Client::execute).
///
/// A `SELECT` produces a [Cursor]; mutating statements report their
/// affected-row counts and leave `cursor` empty.
#[derive(Default)]
pub struct ExecuteResult {
    /// Result rows of a `SELECT`.
    pub cursor: Option<Cursor>,
    /// Documents inserted by an `INSERT`.
    pub inserted_count: usize,
    /// Documents changed by an `UPDATE`.
    pub modified_count: usize,
    /// Documents removed by a `DELETE`.
    pub deleted_count: usize,
}
