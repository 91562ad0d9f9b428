//! # Record Store Trait
//!
//! The minimal persistence surface the ordering core needs. Every rank
//! read and write the core performs goes through these operations.

use super::errors::StoreResult;
use super::record::{OrderedRecord, Query, Rank, RecordId, Scope, TxHandle};

/// Backend trait for ordered record persistence
pub trait RecordStore {
    /// Highest rank in scope, `0` when the scope is empty
    fn max_order(&self, scope: &Scope) -> StoreResult<Rank>;

    /// Number of live records in scope
    fn count_in_scope(&self, scope: &Scope) -> StoreResult<u64>;

    /// Record currently holding `order` in scope
    fn find_by_order(&self, scope: &Scope, order: Rank) -> StoreResult<Option<OrderedRecord>>;

    /// Record by id, restricted to scope
    fn find_by_id(&self, scope: &Scope, id: &RecordId) -> StoreResult<Option<OrderedRecord>>;

    /// Records in scope, sorted per `query.order_by` (unspecified order if `None`)
    fn find_all(&self, query: &Query) -> StoreResult<Vec<OrderedRecord>>;

    /// Write a new record. Fails on a duplicate id or a taken rank.
    fn insert(&mut self, record: &OrderedRecord) -> StoreResult<()>;

    /// Physically remove a record, returning it
    fn delete(&mut self, scope: &Scope, id: &RecordId) -> StoreResult<OrderedRecord>;

    /// Single-row rank write. Fails if `order` is taken in scope.
    fn set_order(&mut self, scope: &Scope, id: &RecordId, order: Rank) -> StoreResult<()>;

    /// Decrement every rank above `threshold` by one, atomically.
    ///
    /// Returns the number of rows shifted.
    fn bulk_decrement_order_above(&mut self, scope: &Scope, threshold: Rank) -> StoreResult<u64>;

    /// Rewrite many ranks at once; the result must satisfy uniqueness,
    /// intermediate states need not.
    fn reassign_orders(&mut self, scope: &Scope, assignments: &[(RecordId, Rank)])
        -> StoreResult<()>;

    /// Open a transaction. Fails if one is already open.
    fn begin_transaction(&mut self) -> StoreResult<TxHandle>;

    fn commit(&mut self, tx: TxHandle) -> StoreResult<()>;

    fn rollback(&mut self, tx: TxHandle) -> StoreResult<()>;

    /// Currently open transaction, if any
    fn active_transaction(&self) -> Option<TxHandle>;
}
