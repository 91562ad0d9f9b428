//! The Order Maintainer
//!
//! Keeps the order column of every scope a dense bijection onto `1..N`:
//!
//! 1. Insert appends at `max + 1`
//! 2. Delete shifts every higher rank down by one
//! 3. Moves swap two adjacent ranks through the sentinel rank `0`
//!
//! # Swap protocol
//!
//! For a record at rank `p` moving to `q = p ± 1`, inside one transaction:
//!
//! 1. record: `p -> 0` (frees `p`, marks the scope as mid-move)
//! 2. neighbor: `q -> p`
//! 3. record: `0 -> q`
//!
//! A move refuses to start while any record in the scope holds `0`.

use std::sync::Arc;

use crate::crash_point::{maybe_crash, points};
use crate::observability::{log_event_at, log_event_with_fields, Event, MetricsRegistry, Severity};
use crate::store::{
    NewRecord, OrderBy, OrderField, OrderedRecord, Query, Rank, RecordId, RecordStore, Scope,
    StoreError, TxHandle, SENTINEL_RANK,
};

use super::errors::{OrderError, OrderErrorCode, OrderResult};
use super::outcome::{Boundary, MoveDirection, MoveOutcome};
use super::transaction::TxScope;

/// Maintains dense ranks over a `RecordStore`
#[derive(Debug, Clone, Default)]
pub struct OrderMaintainer {
    metrics: Arc<MetricsRegistry>,
}

impl OrderMaintainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a metrics registry with the host
    pub fn with_metrics(metrics: Arc<MetricsRegistry>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    // ---------------------------------------------------------------
    // Insert
    // ---------------------------------------------------------------

    /// Rank the next record appended to `scope` would receive
    pub fn next_order<S: RecordStore + ?Sized>(&self, store: &S, scope: &Scope) -> OrderResult<Rank> {
        let max = store.max_order(scope)?;
        if max > 0 {
            max.checked_add(1).ok_or_else(|| OrderError::rank_overflow(scope))
        } else {
            Ok(1)
        }
    }

    /// Pre-insert: assign `max + 1` (or `1`) to a record about to be written.
    ///
    /// Safe against a concurrent insert only when run inside the same
    /// transaction as the write; `insert` does that.
    pub fn on_insert<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        record: &mut NewRecord,
    ) -> OrderResult<Rank> {
        let order = self.next_order(store, &record.scope)?;
        record.order = Some(order);
        log_event_with_fields(
            Event::OrderAssigned,
            &[
                ("id", record.id.as_str()),
                ("order", order.to_string().as_str()),
                ("scope", record.scope.to_string().as_str()),
            ],
        );
        Ok(order)
    }

    /// Append a record at the end of its scope and write it.
    ///
    /// Rank assignment and the write share one transaction.
    pub fn insert<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        mut record: NewRecord,
        tx: Option<&TxHandle>,
    ) -> OrderResult<OrderedRecord> {
        let stored = TxScope::run(store, tx, |store| {
            self.on_insert(&*store, &mut record)?;
            maybe_crash(points::INSERT_BEFORE_WRITE);

            let scope = record.scope.clone();
            let id = record.id.clone();
            let stored = record
                .clone()
                .into_record()
                .ok_or_else(|| OrderError::record_not_found(&scope, &id))?;
            store.insert(&stored)?;
            Ok(stored)
        })?;
        self.metrics.increment_inserts();
        Ok(stored)
    }

    // ---------------------------------------------------------------
    // Delete
    // ---------------------------------------------------------------

    /// Post-delete: close the hole left at `deleted_order`.
    ///
    /// Call after the row is physically gone. Returns rows shifted.
    pub fn on_delete<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        deleted_order: Rank,
    ) -> OrderResult<u64> {
        if deleted_order == SENTINEL_RANK {
            // shifting everything above 0 would break the scope
            return Err(OrderError::locked_scope(scope, None));
        }
        let shifted = store
            .bulk_decrement_order_above(scope, deleted_order)
            .map_err(|e| OrderError::store_failure("failed to renumber scope after delete", e))?;

        self.metrics.add_rows_renumbered(shifted);
        log_event_with_fields(
            Event::ScopeRenumbered,
            &[
                ("deleted_order", deleted_order.to_string().as_str()),
                ("scope", scope.to_string().as_str()),
                ("shifted", shifted.to_string().as_str()),
            ],
        );
        Ok(shifted)
    }

    /// Remove a record and renumber the ranks above it, in one transaction
    pub fn delete<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        id: &RecordId,
        tx: Option<&TxHandle>,
    ) -> OrderResult<OrderedRecord> {
        let removed = TxScope::run(store, tx, |store| {
            let current = store
                .find_by_id(scope, id)?
                .ok_or_else(|| OrderError::record_not_found(scope, id))?;
            if current.is_sentinel() {
                return Err(OrderError::locked_scope(scope, Some(id)));
            }

            let removed = store.delete(scope, id)?;
            maybe_crash(points::DELETE_BEFORE_RENUMBER);
            self.on_delete(store, scope, removed.order)?;
            Ok(removed)
        })?;
        self.metrics.increment_deletes();
        Ok(removed)
    }

    // ---------------------------------------------------------------
    // Moves
    // ---------------------------------------------------------------

    /// Move a record one rank toward the top.
    ///
    /// Rank is re-read from the store; `record.order` is updated on success.
    pub fn move_up<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        record: &mut OrderedRecord,
        tx: Option<&TxHandle>,
    ) -> OrderResult<MoveOutcome> {
        self.move_by(store, scope, record, MoveDirection::Up, tx)
    }

    /// Move a record one rank toward the bottom
    pub fn move_down<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        record: &mut OrderedRecord,
        tx: Option<&TxHandle>,
    ) -> OrderResult<MoveOutcome> {
        self.move_by(store, scope, record, MoveDirection::Down, tx)
    }

    fn move_by<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        record: &mut OrderedRecord,
        direction: MoveDirection,
        tx: Option<&TxHandle>,
    ) -> OrderResult<MoveOutcome> {
        let tx = TxScope::enter(store, tx)?;

        let swapped = self
            .swap(store, scope, &record.id, direction)
            .and_then(|outcome| tx.commit(store).map(|_| outcome));

        let outcome = match swapped {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rb) = tx.abort(store) {
                    log_event_at(
                        Severity::Error,
                        Event::MoveRolledBack,
                        &[("id", record.id.as_str()), ("error", rb.message())],
                    );
                }
                self.record_failure(scope, &record.id, direction, &e);
                return Err(e);
            }
        };

        match &outcome {
            MoveOutcome::Moved { from, to, displaced } => {
                record.order = *to;
                match direction {
                    MoveDirection::Up => self.metrics.increment_moves_up(),
                    MoveDirection::Down => self.metrics.increment_moves_down(),
                }
                log_event_with_fields(
                    Event::MoveCommitted,
                    &[
                        ("direction", direction.as_str()),
                        ("displaced", displaced.as_str()),
                        ("from", from.to_string().as_str()),
                        ("id", record.id.as_str()),
                        ("owned_tx", if tx.is_owned() { "true" } else { "false" }),
                        ("scope", scope.to_string().as_str()),
                        ("to", to.to_string().as_str()),
                    ],
                );
            }
            MoveOutcome::Unchanged { boundary } => {
                self.metrics.increment_moves_noop();
                log_event_with_fields(
                    Event::MoveNoop,
                    &[
                        ("boundary", if *boundary == Boundary::First { "first" } else { "last" }),
                        ("direction", direction.as_str()),
                        ("id", record.id.as_str()),
                        ("scope", scope.to_string().as_str()),
                    ],
                );
            }
        }
        Ok(outcome)
    }

    /// The three-step sentinel swap. Runs inside the caller's transaction.
    fn swap<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        id: &RecordId,
        direction: MoveDirection,
    ) -> OrderResult<MoveOutcome> {
        let current = store
            .find_by_id(scope, id)?
            .ok_or_else(|| OrderError::record_not_found(scope, id))?;
        if current.is_sentinel() {
            return Err(OrderError::locked_scope(scope, Some(id)));
        }
        let from = current.order;

        // Boundaries first: a no-op never looks at the lock
        let boundary = match direction {
            MoveDirection::Up if from <= 1 => Some(Boundary::First),
            MoveDirection::Down if u64::from(from) >= store.count_in_scope(scope)? => {
                Some(Boundary::Last)
            }
            _ => None,
        };
        if let Some(boundary) = boundary {
            return Ok(MoveOutcome::Unchanged { boundary });
        }

        if let Some(holder) = store.find_by_order(scope, SENTINEL_RANK)? {
            return Err(OrderError::locked_scope(scope, Some(&holder.id)));
        }

        let to = direction
            .neighbor_of(from)
            .ok_or_else(|| OrderError::rank_overflow(scope))?;

        log_event_with_fields(
            Event::MoveBegin,
            &[
                ("direction", direction.as_str()),
                ("from", from.to_string().as_str()),
                ("id", id.as_str()),
                ("scope", scope.to_string().as_str()),
            ],
        );

        // Step 1: park on the sentinel. A unique violation here means another
        // mover took the sentinel after our check.
        store
            .set_order(scope, id, SENTINEL_RANK)
            .map_err(|e| match e {
                StoreError::UniqueViolation { order: SENTINEL_RANK, .. } => {
                    OrderError::locked_scope(scope, None)
                }
                other => OrderError::store_failure("failed to park record on sentinel", other),
            })?;
        maybe_crash(points::MOVE_AFTER_SENTINEL);

        // Step 2: neighbor takes the freed rank
        let neighbor = store
            .find_by_order(scope, to)?
            .ok_or_else(|| OrderError::neighbor_not_found(scope, to))?;
        store
            .set_order(scope, &neighbor.id, from)
            .map_err(|e| OrderError::store_failure("failed to move neighbor", e))?;
        maybe_crash(points::MOVE_AFTER_NEIGHBOR);

        // Step 3: record takes the neighbor's rank
        store
            .set_order(scope, id, to)
            .map_err(|e| OrderError::store_failure("failed to release sentinel", e))?;

        Ok(MoveOutcome::Moved {
            from,
            to,
            displaced: neighbor.id,
        })
    }

    fn record_failure(
        &self,
        scope: &Scope,
        id: &RecordId,
        direction: MoveDirection,
        err: &OrderError,
    ) {
        let scope_str = scope.to_string();
        let fields = [
            ("code", err.code().code()),
            ("direction", direction.as_str()),
            ("id", id.as_str()),
            ("message", err.message()),
            ("scope", scope_str.as_str()),
        ];
        match err.code() {
            OrderErrorCode::LockedScope => {
                self.metrics.increment_lock_conflicts();
                log_event_at(Severity::Warn, Event::MoveRejected, &fields);
            }
            OrderErrorCode::NeighborNotFound => {
                self.metrics.increment_rollbacks();
                log_event_with_fields(Event::NeighborMissing, &fields);
            }
            _ => {
                self.metrics.increment_rollbacks();
                log_event_at(Severity::Error, Event::MoveRolledBack, &fields);
            }
        }
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Pre-query: sort by rank ascending unless the query already sorts
    pub fn apply_default_order(&self, query: &mut Query) {
        if query.order_by.is_none() {
            query.order_by = Some(OrderBy::asc(OrderField::Rank));
        }
    }

    /// Read a scope with the default ordering applied
    pub fn list<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        mut query: Query,
    ) -> OrderResult<Vec<OrderedRecord>> {
        self.apply_default_order(&mut query);
        Ok(store.find_all(&query)?)
    }
}
