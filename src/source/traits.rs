//! Capability traits for the database-side collaborators

use crate::model::{ColumnInfo, LobChunk, ProofRow};
use crate::Result;
use serde_json::Value;

/// Read access to one fetched ledger row
///
/// Implementations wrap a database cursor positioned on a row, or an
/// in-memory row for testing. Failures of the underlying driver should be
/// reported as [`crate::Error::Collaborator`].
pub trait LedgerRecord {
    /// Columns of the row, in declared order
    fn columns(&self) -> Result<Vec<ColumnInfo>>;

    /// Whether the value at `col` is SQL NULL
    fn is_null(&self, col: usize) -> Result<bool>;

    /// The value at `col` in the driver's plain-string form, `None` if NULL
    fn read_string(&self, col: usize) -> Result<Option<String>>;

    /// Read the next piece of a large-object value, at most `max_len` bytes
    ///
    /// Repeated calls continue where the previous one stopped until a chunk
    /// with `has_more == false` is returned.
    fn read_chunk(&mut self, col: usize, max_len: usize) -> Result<LobChunk>;
}

/// Executes the proof queries against the ledger database
pub trait ProofSource {
    /// Run `sql` with positional `params` and return every row, in order
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<ProofRow>>;
}

impl<T: ProofSource + ?Sized> ProofSource for &T {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<ProofRow>> {
        (**self).query(sql, params)
    }
}

impl<T: ProofSource + ?Sized> ProofSource for Box<T> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<ProofRow>> {
        (**self).query(sql, params)
    }
}
