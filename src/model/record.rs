//! Column metadata and chunked reads for ledger rows

use serde::{Deserialize, Serialize};

/// Name of the identity column that is never part of a record's hash
pub const RECORD_ID_COLUMN: &str = "record_id";

/// Type names whose values are streamed in chunks rather than read as strings
pub const LARGE_OBJECT_TYPES: [&str; 2] = ["BLOB", "CLOB"];

/// Describes one column of a ledger row, in declared order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Position used to address the column in reader calls
    pub index: usize,
    /// Column name as reported by the database
    pub name: String,
    /// SQL type name, e.g. `INTEGER`, `VARCHAR`, `BLOB`
    pub type_name: String,
}

impl ColumnInfo {
    pub fn new(index: usize, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ColumnInfo {
            index,
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Whether this is the row's own identity column
    pub fn is_record_id(&self) -> bool {
        self.name.eq_ignore_ascii_case(RECORD_ID_COLUMN)
    }

    /// Whether values of this column must be read through chunked buffers
    pub fn is_large_object(&self) -> bool {
        LARGE_OBJECT_TYPES
            .iter()
            .any(|t| self.type_name.eq_ignore_ascii_case(t))
    }
}

/// One piece of a streamed large-object value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LobChunk {
    /// Raw bytes of this piece
    pub data: Vec<u8>,
    /// Whether further reads of the same column will yield more bytes
    pub has_more: bool,
}

impl LobChunk {
    pub fn new(data: impl Into<Vec<u8>>, has_more: bool) -> Self {
        LobChunk {
            data: data.into(),
            has_more,
        }
    }

    /// The final piece of a value
    pub fn last(data: impl Into<Vec<u8>>) -> Self {
        LobChunk::new(data, false)
    }
}
