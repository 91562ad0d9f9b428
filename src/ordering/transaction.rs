//! Transaction scoping for ordering operations
//!
//! An operation either participates in a transaction its caller already
//! owns (a handle was passed in) or opens one of its own. Only an owned
//! transaction is ever committed or rolled back here.

use crate::observability::Logger;
use crate::store::{RecordStore, StoreError, TxHandle};

use super::errors::{OrderError, OrderResult};

/// Transaction an ordering operation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxScope {
    /// Opened here; committed or rolled back here
    Owned(TxHandle),
    /// Caller's transaction; the caller commits or rolls back
    Participating(TxHandle),
}

impl TxScope {
    /// Join `external` or open a new transaction.
    ///
    /// A supplied handle must be the store's active transaction.
    pub fn enter<S: RecordStore + ?Sized>(
        store: &mut S,
        external: Option<&TxHandle>,
    ) -> OrderResult<Self> {
        match external {
            Some(handle) if store.active_transaction() == Some(*handle) => {
                Ok(TxScope::Participating(*handle))
            }
            Some(handle) => Err(OrderError::store_failure(
                "caller transaction is not active on this store",
                StoreError::UnknownTransaction(*handle),
            )),
            None => {
                let handle = store
                    .begin_transaction()
                    .map_err(|e| OrderError::store_failure("failed to begin transaction", e))?;
                Ok(TxScope::Owned(handle))
            }
        }
    }

    pub fn handle(&self) -> TxHandle {
        match self {
            TxScope::Owned(h) | TxScope::Participating(h) => *h,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, TxScope::Owned(_))
    }

    /// Commit if owned. A failed commit is rolled back before the error returns.
    pub fn commit<S: RecordStore + ?Sized>(self, store: &mut S) -> OrderResult<()> {
        let TxScope::Owned(handle) = self else {
            return Ok(());
        };
        if let Err(e) = store.commit(handle) {
            if store.active_transaction() == Some(handle) {
                if let Err(rb) = store.rollback(handle) {
                    Logger::error(
                        "TX_ROLLBACK_FAILED",
                        &[
                            ("tx", handle.to_string().as_str()),
                            ("error", rb.to_string().as_str()),
                        ],
                    );
                }
            }
            return Err(OrderError::store_failure("failed to commit transaction", e));
        }
        Ok(())
    }

    /// Roll back if owned and still open
    pub fn abort<S: RecordStore + ?Sized>(self, store: &mut S) -> OrderResult<()> {
        match self {
            TxScope::Owned(handle) if store.active_transaction() == Some(handle) => store
                .rollback(handle)
                .map_err(|e| OrderError::store_failure("failed to roll back transaction", e)),
            TxScope::Owned(_) | TxScope::Participating(_) => Ok(()),
        }
    }

    /// Run `f` under a transaction: commit on success, roll back on error.
    ///
    /// The error from `f` wins over a rollback failure, which is only logged.
    pub fn run<S, T, F>(store: &mut S, external: Option<&TxHandle>, f: F) -> OrderResult<T>
    where
        S: RecordStore + ?Sized,
        F: FnOnce(&mut S) -> OrderResult<T>,
    {
        let tx = Self::enter(store, external)?;
        match f(&mut *store) {
            Ok(value) => {
                tx.commit(store)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.abort(store) {
                    Logger::error(
                        "TX_ROLLBACK_FAILED",
                        &[("tx", tx.handle().to_string().as_str()), ("error", rb.message())],
                    );
                }
                Err(e)
            }
        }
    }
}
