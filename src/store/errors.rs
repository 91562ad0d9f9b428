//! # Record Store Errors
//!
//! Error types shared by every `RecordStore` implementation.

use thiserror::Error;

use super::record::{Rank, RecordId, Scope, TxHandle};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Payload or timestamp could not be (de)serialized
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two records would share a rank within one scope
    #[error("rank {order} already taken in scope {scope}")]
    UniqueViolation { scope: Scope, order: Rank },

    /// Record does not exist
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// A record with this id already exists
    #[error("duplicate record id: {0}")]
    DuplicateId(RecordId),

    /// `begin_transaction` while another transaction is open
    #[error("transaction {0} already active")]
    TransactionActive(TxHandle),

    /// Commit/rollback with a handle that is not the active transaction
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHandle),

    /// Operation requires an open transaction
    #[error("no active transaction")]
    NoTransaction,

    /// Fault injected by a test store
    #[error("injected failure during {0}")]
    InjectedFailure(&'static str),

    /// Table or column name is not a plain SQL identifier
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Stored value could not be decoded
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    /// Short machine-readable kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Sqlite(_) => "sqlite",
            StoreError::Serialization(_) => "serialization",
            StoreError::UniqueViolation { .. } => "unique_violation",
            StoreError::NotFound(_) => "not_found",
            StoreError::DuplicateId(_) => "duplicate_id",
            StoreError::TransactionActive(_) => "transaction_active",
            StoreError::UnknownTransaction(_) => "unknown_transaction",
            StoreError::NoTransaction => "no_transaction",
            StoreError::InjectedFailure(_) => "injected_failure",
            StoreError::InvalidIdentifier(_) => "invalid_identifier",
            StoreError::CorruptRow(_) => "corrupt_row",
        }
    }
}
