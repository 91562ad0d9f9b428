//! Lifecycle hooks a host data layer calls around its own writes and reads
//!
//! For hosts that insert, delete and query records themselves and only want
//! the ranks kept dense. Each hook must run inside the same transaction as
//! the host's write.

use crate::store::{NewRecord, OrderedRecord, Query, Rank, RecordStore, Scope};

use super::errors::OrderResult;
use super::maintainer::OrderMaintainer;

/// Hook points around record lifecycle events
pub trait LifecycleHook<S: RecordStore + ?Sized> {
    /// Before a record is written: assign its rank
    fn before_insert(&self, store: &S, record: &mut NewRecord) -> OrderResult<Rank>;

    /// Before a query runs: fill in the default sort
    fn before_find(&self, query: &mut Query);

    /// After a record is physically removed: close the gap it left
    fn after_delete(&self, store: &mut S, removed: &OrderedRecord) -> OrderResult<u64>;
}

impl<S: RecordStore + ?Sized> LifecycleHook<S> for OrderMaintainer {
    fn before_insert(&self, store: &S, record: &mut NewRecord) -> OrderResult<Rank> {
        self.on_insert(store, record)
    }

    fn before_find(&self, query: &mut Query) {
        self.apply_default_order(query);
    }

    fn after_delete(&self, store: &mut S, removed: &OrderedRecord) -> OrderResult<u64> {
        let scope: &Scope = &removed.scope;
        self.on_delete(store, scope, removed.order)
    }
}
