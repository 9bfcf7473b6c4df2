//! Leaf hashing of ledger rows
//!
//! A leaf digest is `sha256(0x00 || col_1 || col_2 || ...)` over every
//! column except `record_id`, where each column contributes
//!
//! - `0x00` if the value is NULL, or
//! - `0x01` followed by the value's content bytes otherwise.
//!
//! Content bytes are the raw bytes of BLOB/CLOB values, streamed in chunks,
//! and the UTF-8 bytes of the plain-string form for everything else. No
//! length prefix or type tag is added.

use crate::model::{ColumnInfo, Digest};
use crate::source::LedgerRecord;
use crate::{Error, Result};
use sha2::{Digest as _, Sha256};

/// Leading byte of every leaf preimage
pub const LEAF_MARKER: u8 = 0x00;
/// Written for a NULL column
pub const NULL_MARKER: u8 = 0x00;
/// Written before the content of a non-NULL column
pub const PRESENT_MARKER: u8 = 0x01;

/// Default number of bytes requested per large-object read
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Computes leaf digests of ledger rows
#[derive(Clone, Copy, Debug)]
pub struct RecordHasher {
    chunk_size: usize,
}

impl Default for RecordHasher {
    fn default() -> Self {
        RecordHasher {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl RecordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different large-object chunk size
    ///
    /// Zero is rejected the same way a config file with `lob_chunk_size: 0` is.
    pub fn with_chunk_size(chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("lob_chunk_size must be positive".into()));
        }
        Ok(RecordHasher { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash the row the reader is positioned on
    pub fn hash<R: LedgerRecord + ?Sized>(&self, record: &mut R) -> Result<Digest> {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_MARKER]);

        for column in record.columns()? {
            if column.is_record_id() {
                continue;
            }
            if record.is_null(column.index)? {
                hasher.update([NULL_MARKER]);
                continue;
            }

            hasher.update([PRESENT_MARKER]);
            if column.is_large_object() {
                self.feed_large_object(&mut hasher, record, &column)?;
            } else {
                let value = record.read_string(column.index)?.ok_or_else(|| {
                    contract_violation(&column, "non-NULL value has no string form")
                })?;
                hasher.update(value.as_bytes());
            }
        }

        Ok(Digest::from_bytes(hasher.finalize().into()))
    }

    // Never holds more than one chunk of the value
    fn feed_large_object<R: LedgerRecord + ?Sized>(
        &self,
        hasher: &mut Sha256,
        record: &mut R,
        column: &ColumnInfo,
    ) -> Result<()> {
        loop {
            let chunk = record.read_chunk(column.index, self.chunk_size)?;
            if chunk.data.len() > self.chunk_size {
                return Err(contract_violation(
                    column,
                    format!(
                        "chunk of {} bytes exceeds requested {}",
                        chunk.data.len(),
                        self.chunk_size
                    ),
                ));
            }
            if chunk.data.is_empty() && chunk.has_more {
                return Err(contract_violation(
                    column,
                    "empty chunk reported more data remaining",
                ));
            }

            hasher.update(&chunk.data);
            if !chunk.has_more {
                return Ok(());
            }
        }
    }
}

/// Hash a row with the default chunk size
pub fn hash_record<R: LedgerRecord + ?Sized>(record: &mut R) -> Result<Digest> {
    RecordHasher::default().hash(record)
}

fn contract_violation(column: &ColumnInfo, reason: impl Into<String>) -> Error {
    Error::RecordContract {
        column: column.name.clone(),
        reason: reason.into(),
    }
}
