//! Verifier configuration
//!
//! Stored as JSON in `<config dir>/tbledger/config.json` unless a path is
//! given explicitly. Every field is optional.

use crate::hashing::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Audit proof nodes, leaf sibling first
pub const DEFAULT_AUDIT_PROOF_SQL: &str =
    "select hash, first from ledger_audit_proof(?, ?) order by level asc";

/// Consistency proof nodes, ascending by position in the new tree
pub const DEFAULT_CONSISTENCY_PROOF_SQL: &str =
    "select hash, first, old, new from ledger_consistency_proof(?, ?) order by new asc";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Query for audit proofs, bound to `(tree_index, record_id)`
    pub audit_proof_sql: String,
    /// Query for consistency proofs, bound to `(old_index, new_index)`
    pub consistency_proof_sql: String,
    /// Bytes requested per large-object read when hashing records
    pub lob_chunk_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            audit_proof_sql: DEFAULT_AUDIT_PROOF_SQL.to_string(),
            consistency_proof_sql: DEFAULT_CONSISTENCY_PROOF_SQL.to_string(),
            lob_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl LedgerConfig {
    /// Default config location (~/.config/tbledger/config.json on Linux)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("tbledger").join("config.json"))
    }

    /// Load and validate a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: LedgerConfig = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly named file must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Ok(path) if path.exists() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Save the config as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.audit_proof_sql.trim().is_empty() {
            return Err(Error::Config("audit_proof_sql must not be empty".into()));
        }
        if self.consistency_proof_sql.trim().is_empty() {
            return Err(Error::Config(
                "consistency_proof_sql must not be empty".into(),
            ));
        }
        if self.lob_chunk_size == 0 {
            return Err(Error::Config("lob_chunk_size must be positive".into()));
        }
        Ok(())
    }
}
