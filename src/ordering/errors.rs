//! Ordering error types
//!
//! Error codes:
//! - ORDER_LOCKED_SCOPE (ERROR) - another move holds the scope
//! - ORDER_NEIGHBOR_NOT_FOUND (FATAL) - adjacent rank missing, invariant broken
//! - ORDER_STORE_FAILURE (ERROR) - record store I/O or transaction failure
//! - ORDER_RECORD_NOT_FOUND (ERROR) - record is not in the scope
//! - ORDER_RANK_OVERFLOW (ERROR) - scope cannot grow past the rank type

use std::fmt;

use crate::store::{Rank, RecordId, Scope, StoreError};

/// Severity levels for ordering errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, scope is intact
    Error,
    /// Scope invariant is already broken; needs repair
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Ordering error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderErrorCode {
    LockedScope,
    NeighborNotFound,
    StoreFailure,
    RecordNotFound,
    RankOverflow,
}

impl OrderErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            OrderErrorCode::LockedScope => "ORDER_LOCKED_SCOPE",
            OrderErrorCode::NeighborNotFound => "ORDER_NEIGHBOR_NOT_FOUND",
            OrderErrorCode::StoreFailure => "ORDER_STORE_FAILURE",
            OrderErrorCode::RecordNotFound => "ORDER_RECORD_NOT_FOUND",
            OrderErrorCode::RankOverflow => "ORDER_RANK_OVERFLOW",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            OrderErrorCode::NeighborNotFound => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for OrderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Ordering error with context
#[derive(Debug)]
pub struct OrderError {
    code: OrderErrorCode,
    message: String,
    details: Option<String>,
    source: Option<StoreError>,
}

impl OrderError {
    /// A sentinel rank already exists in the scope
    pub fn locked_scope(scope: &Scope, holder: Option<&RecordId>) -> Self {
        Self {
            code: OrderErrorCode::LockedScope,
            message: format!("scope {} order is locked by an in-progress move", scope),
            details: holder.map(|id| format!("sentinel_holder: {}", id)),
            source: None,
        }
    }

    /// No record holds the rank the swap expects
    pub fn neighbor_not_found(scope: &Scope, rank: Rank) -> Self {
        Self {
            code: OrderErrorCode::NeighborNotFound,
            message: format!("no record holds rank {} in scope {}", rank, scope),
            details: Some(format!("expected_rank: {}", rank)),
            source: None,
        }
    }

    /// Underlying store failure
    pub fn store_failure(context: impl Into<String>, source: StoreError) -> Self {
        Self {
            code: OrderErrorCode::StoreFailure,
            message: context.into(),
            details: Some(format!("store_error: {}", source.kind())),
            source: Some(source),
        }
    }

    pub fn record_not_found(scope: &Scope, id: &RecordId) -> Self {
        Self {
            code: OrderErrorCode::RecordNotFound,
            message: format!("record {} not found in scope {}", id, scope),
            details: None,
            source: None,
        }
    }

    pub fn rank_overflow(scope: &Scope) -> Self {
        Self {
            code: OrderErrorCode::RankOverflow,
            message: format!("scope {} has no rank left above {}", scope, Rank::MAX),
            details: None,
            source: None,
        }
    }

    pub fn code(&self) -> OrderErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// The wrapped store error, for `StoreFailure`
    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.as_ref()
    }

    /// Returns whether the scope invariant is known to be broken
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns whether retrying later may succeed
    pub fn is_retryable(&self) -> bool {
        self.code == OrderErrorCode::LockedScope
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for OrderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        Self::store_failure("record store operation failed", e)
    }
}

/// Result type for ordering operations
pub type OrderResult<T> = Result<T, OrderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_codes() {
        assert_eq!(OrderErrorCode::LockedScope.code(), "ORDER_LOCKED_SCOPE");
        assert_eq!(OrderErrorCode::NeighborNotFound.code(), "ORDER_NEIGHBOR_NOT_FOUND");
        assert_eq!(OrderErrorCode::StoreFailure.code(), "ORDER_STORE_FAILURE");
        assert_eq!(OrderErrorCode::RecordNotFound.code(), "ORDER_RECORD_NOT_FOUND");
        assert_eq!(OrderErrorCode::RankOverflow.code(), "ORDER_RANK_OVERFLOW");
    }

    #[test]
    fn test_neighbor_not_found_is_fatal() {
        let err = OrderError::neighbor_not_found(&Scope::all(), 2);
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_locked_scope_is_retryable() {
        let err = OrderError::locked_scope(&Scope::all(), Some(&RecordId::new("r9")));
        assert!(!err.is_fatal());
        assert!(err.is_retryable());
        assert_eq!(err.details(), Some("sentinel_holder: r9"));
    }

    #[test]
    fn test_store_failure_keeps_source() {
        let err: OrderError = StoreError::InjectedFailure("set_order").into();
        assert_eq!(err.code(), OrderErrorCode::StoreFailure);
        assert!(err.source().is_some());
        assert!(matches!(
            err.store_error(),
            Some(StoreError::InjectedFailure("set_order"))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = OrderError::neighbor_not_found(&Scope::partition("forum-3"), 4);
        let display = format!("{}", err);
        assert!(display.contains("[FATAL]"));
        assert!(display.contains("ORDER_NEIGHBOR_NOT_FOUND"));
        assert!(display.contains("forum-3"));
        assert!(display.contains("expected_rank: 4"));
    }
}
