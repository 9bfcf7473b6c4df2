//! In-memory collaborators
//!
//! Useful for tests and for verifying proofs that were exported to JSON
//! files instead of being fetched from a live database.

use super::{LedgerRecord, ProofSource};
use crate::model::{ColumnInfo, LobChunk, ProofRow};
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// The value held by a [`MemoryColumn`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryValue {
    /// SQL NULL
    #[default]
    Null,
    /// A value in its plain-string form
    Text(String),
    /// Raw bytes, written as `{"hex": "..."}` in JSON
    Bytes {
        #[serde(with = "hex")]
        hex: Vec<u8>,
    },
}

impl MemoryValue {
    fn as_bytes(&self) -> &[u8] {
        match self {
            MemoryValue::Null => &[],
            MemoryValue::Text(s) => s.as_bytes(),
            MemoryValue::Bytes { hex: bytes } => bytes,
        }
    }
}

/// One named, typed column of a [`MemoryRecord`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub value: MemoryValue,
}

/// An owned ledger row
///
/// Columns are addressed 1-based, the way the database driver numbers
/// them. Large-object reads keep a cursor per column; reaching the end of
/// a value rewinds it so the row can be hashed again.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryRecord {
    columns: Vec<MemoryColumn>,
    #[serde(skip)]
    cursors: Vec<usize>,
}

impl MemoryRecord {
    /// Create an empty record
    pub fn new() -> Self {
        MemoryRecord::default()
    }

    /// Append a column
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: MemoryValue,
    ) -> Self {
        self.columns.push(MemoryColumn {
            name: name.into(),
            type_name: type_name.into(),
            value,
        });
        self
    }

    /// Append a column holding text
    pub fn with_text(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.with_column(name, type_name, MemoryValue::Text(value.into()))
    }

    /// Append a column holding raw bytes
    pub fn with_bytes(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.with_column(name, type_name, MemoryValue::Bytes { hex: value.into() })
    }

    /// Append a NULL column
    pub fn with_null(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.with_column(name, type_name, MemoryValue::Null)
    }

    /// Load a record from a JSON file of the form `{"columns": [...]}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn column(&self, col: usize) -> Result<&MemoryColumn> {
        col.checked_sub(1)
            .and_then(|i| self.columns.get(i))
            .ok_or_else(|| Error::collaborator(format!("no column at index {col}")))
    }
}

impl LedgerRecord for MemoryRecord {
    fn columns(&self) -> Result<Vec<ColumnInfo>> {
        Ok(self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| ColumnInfo::new(i + 1, c.name.clone(), c.type_name.clone()))
            .collect())
    }

    fn is_null(&self, col: usize) -> Result<bool> {
        Ok(self.column(col)?.value == MemoryValue::Null)
    }

    fn read_string(&self, col: usize) -> Result<Option<String>> {
        Ok(match &self.column(col)?.value {
            MemoryValue::Null => None,
            MemoryValue::Text(s) => Some(s.clone()),
            MemoryValue::Bytes { hex: bytes } => Some(hex::encode(bytes)),
        })
    }

    fn read_chunk(&mut self, col: usize, max_len: usize) -> Result<LobChunk> {
        let len = self.column(col)?.value.as_bytes().len();
        if self.cursors.len() < self.columns.len() {
            self.cursors.resize(self.columns.len(), 0);
        }

        let start = self.cursors[col - 1];
        let end = (start + max_len).min(len);
        let data = self.columns[col - 1].value.as_bytes()[start..end].to_vec();
        let has_more = end < len;

        self.cursors[col - 1] = if has_more { end } else { 0 };
        Ok(LobChunk { data, has_more })
    }
}

/// A query that reached a [`MemoryProofSource`]
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A proof source that answers every query with the same rows
#[derive(Debug, Default)]
pub struct MemoryProofSource {
    rows: Vec<ProofRow>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl MemoryProofSource {
    pub fn new(rows: Vec<ProofRow>) -> Self {
        MemoryProofSource {
            rows,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Build from a JSON array of row objects
    pub fn from_json(value: Value) -> Result<Self> {
        Ok(MemoryProofSource::new(serde_json::from_value(value)?))
    }

    /// Load a JSON array of row objects from a file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(MemoryProofSource::new(serde_json::from_str(&content)?))
    }

    /// The rows returned for every query
    pub fn rows(&self) -> &[ProofRow] {
        &self.rows
    }

    /// Every query received so far, oldest first
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().clone()
    }
}

impl ProofSource for MemoryProofSource {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<ProofRow>> {
        self.queries.lock().push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        Ok(self.rows.clone())
    }
}
