use crate::collection::Document;
use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, LutraError, LutraResult};
use once_cell::sync::Lazy;

static CURSOR_CLOSED_ERROR: Lazy<LutraError> =
    Lazy::new(|| LutraError::new("Cursor has been closed", ErrorKind::CursorClosed));

/// The lifecycle state of a [Cursor].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The cursor still has results to produce.
    Open,
    /// Every result has been consumed; the cursor is still readable.
    Exhausted,
    /// The cursor has been released; any further access fails.
    Closed,
}

/// A stateful handle over one query's result set.
///
/// A cursor is bound to the results materialized when the query ran; it
/// never observes later collection mutations. It supports sequential
/// consumption ([Cursor::try_next] or plain iteration), positional access
/// ([Cursor::at]), whole-set re-ordering ([Cursor::sort], intended to be
/// called before consumption starts), and explicit release
/// ([Cursor::close]).
///
/// `close` is idempotent; every other operation on a closed cursor fails
/// fast with [ErrorKind::CursorClosed]. Iterating a closed cursor yields
/// nothing.
pub struct Cursor {
    documents: Vec<Document>,
    position: usize,
    closed: bool,
}

impl Cursor {
    pub(crate) fn new(documents: Vec<Document>) -> Self {
        Cursor {
            documents,
            position: 0,
            closed: false,
        }
    }

    /// The cursor's current lifecycle state.
    pub fn state(&self) -> CursorState {
        if self.closed {
            CursorState::Closed
        } else if self.position >= self.documents.len() {
            CursorState::Exhausted
        } else {
            CursorState::Open
        }
    }

    /// The total number of results, independent of how many have been
    /// consumed.
    pub fn count(&self) -> LutraResult<usize> {
        self.ensure_open()?;
        Ok(self.documents.len())
    }

    /// Alias of [Cursor::count]; the result set is materialized.
    pub fn len(&self) -> LutraResult<usize> {
        self.count()
    }

    pub fn is_empty(&self) -> LutraResult<bool> {
        Ok(self.count()? == 0)
    }

    /// Whether another call to [Cursor::try_next] would produce a document.
    pub fn has_next(&self) -> LutraResult<bool> {
        self.ensure_open()?;
        Ok(self.position < self.documents.len())
    }

    /// Advances one position and returns the document there, or `None` once
    /// exhausted.
    pub fn try_next(&mut self) -> LutraResult<Option<Document>> {
        self.ensure_open()?;
        match self.documents.get(self.position) {
            Some(doc) => {
                self.position += 1;
                Ok(Some(doc.clone()))
            }
            None => Ok(None),
        }
    }

    /// Positional access, equivalent to seeking to `index`.
    pub fn at(&self, index: usize) -> LutraResult<Document> {
        self.ensure_open()?;
        self.documents.get(index).cloned().ok_or_else(|| {
            LutraError::new(
                &format!(
                    "Cursor position {} out of bounds (len {})",
                    index,
                    self.documents.len()
                ),
                ErrorKind::NotFound,
            )
        })
    }

    /// Re-orders the full result set by a field's natural value ordering and
    /// rewinds the cursor. Documents lacking the field sort as nulls.
    ///
    /// Meant to be called before consumption begins; calling it later still
    /// re-sorts, but the ordering of already-consumed results is undefined
    /// by contract.
    pub fn sort(&mut self, field: &str, order: SortOrder) -> LutraResult<&mut Cursor> {
        self.ensure_open()?;
        self.documents.sort_by(|a, b| {
            let left = a.get(field).cloned().unwrap_or(Value::Null);
            let right = b.get(field).cloned().unwrap_or(Value::Null);
            match order {
                SortOrder::Ascending => left.cmp(&right),
                SortOrder::Descending => right.cmp(&left),
            }
        });
        self.position = 0;
        Ok(self)
    }

    /// Releases the cursor's result state. Idempotent.
    pub fn close(&mut self) {
        self.documents = Vec::new();
        self.position = 0;
        self.closed = true;
    }

    fn ensure_open(&self) -> LutraResult<()> {
        if self.closed {
            return Err(CURSOR_CLOSED_ERROR.clone());
        }
        Ok(())
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        let doc = self.documents.get(self.position).cloned();
        if doc.is_some() {
            self.position += 1;
        }
        doc
    }
}
