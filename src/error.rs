//! Error types for tbledger

use thiserror::Error;

/// Result type alias for tbledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a row or query collaborator
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while hashing records or verifying proofs
///
/// A failed cryptographic check is never an error: verifiers return
/// `Ok(false)` for that. Every variant here means the check could not be
/// carried out.
#[derive(Error, Debug)]
pub enum Error {
    /// Raised by the row reader or the query executor, passed through as-is
    #[error("Collaborator error: {0}")]
    Collaborator(#[source] SourceError),

    #[error("Malformed proof row {row}: {reason}")]
    MalformedProof { row: usize, reason: String },

    #[error("Record contract violation in column {column}: {reason}")]
    RecordContract { column: String, reason: String },

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    #[error("Verification cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a collaborator failure without reinterpreting it
    pub fn collaborator(err: impl Into<SourceError>) -> Self {
        Error::Collaborator(err.into())
    }

    /// True for contract violations by a collaborator (as opposed to I/O
    /// or transport failures it reported itself)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::MalformedProof { .. } | Error::RecordContract { .. }
        )
    }
}
