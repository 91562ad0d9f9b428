//! In-memory record store
//!
//! Snapshot-based transactions and deterministic fault injection make this
//! the store of choice for exercising the ordering protocol in tests and
//! for hosts that keep their collections in process.

use std::collections::BTreeMap;

use super::backend::RecordStore;
use super::errors::{StoreError, StoreResult};
use super::record::{
    OrderField, OrderedRecord, Query, Rank, RecordId, Scope, SortDirection, TxHandle,
};

/// Write operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Insert,
    Delete,
    SetOrder,
    BulkDecrement,
    Reassign,
    Commit,
}

impl StoreOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Insert => "insert",
            StoreOp::Delete => "delete",
            StoreOp::SetOrder => "set_order",
            StoreOp::BulkDecrement => "bulk_decrement",
            StoreOp::Reassign => "reassign",
            StoreOp::Commit => "commit",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    op: StoreOp,
    /// Calls of `op` that still succeed before the fault fires
    remaining: u32,
}

#[derive(Debug)]
struct OpenTx {
    handle: TxHandle,
    snapshot: BTreeMap<RecordId, OrderedRecord>,
}

/// Record store backed by a `BTreeMap`
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecordId, OrderedRecord>,
    tx: Option<OpenTx>,
    next_tx: u64,
    fault: Option<Fault>,
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `ok_calls` calls of `op` succeed, then fail the next one
    pub fn fail_after(&mut self, op: StoreOp, ok_calls: u32) {
        self.fault = Some(Fault {
            op,
            remaining: ok_calls,
        });
    }

    pub fn clear_faults(&mut self) {
        self.fault = None;
    }

    /// Number of successful write operations since creation
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Overwrite a rank with no constraint checks.
    ///
    /// Used to plant corrupt states (stray sentinels, gaps, duplicates).
    pub fn force_order(&mut self, id: &RecordId, order: Rank) -> StoreResult<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.order = order;
        Ok(())
    }

    /// Ranks in scope as `(id, order)` sorted by rank
    pub fn ranks(&self, scope: &Scope) -> Vec<(RecordId, Rank)> {
        let mut ranks: Vec<_> = self
            .in_scope(scope)
            .map(|r| (r.id.clone(), r.order))
            .collect();
        ranks.sort_by_key(|(id, order)| (*order, id.clone()));
        ranks
    }

    fn in_scope<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a OrderedRecord> + 'a {
        self.records.values().filter(move |r| &r.scope == scope)
    }

    fn rank_taken(&self, scope: &Scope, order: Rank, except: Option<&RecordId>) -> bool {
        self.in_scope(scope)
            .any(|r| r.order == order && Some(&r.id) != except)
    }

    fn check_fault(&mut self, op: StoreOp) -> StoreResult<()> {
        if let Some(fault) = self.fault.as_mut() {
            if fault.op == op {
                if fault.remaining == 0 {
                    self.fault = None;
                    return Err(StoreError::InjectedFailure(op.as_str()));
                }
                fault.remaining -= 1;
            }
        }
        Ok(())
    }

    fn sort(records: &mut [OrderedRecord], field: OrderField, direction: SortDirection) {
        records.sort_by(|a, b| {
            let ordering = match field {
                OrderField::Rank => a.order.cmp(&b.order),
                OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderField::Id => a.id.cmp(&b.id),
            };
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

impl RecordStore for MemoryStore {
    fn max_order(&self, scope: &Scope) -> StoreResult<Rank> {
        Ok(self.in_scope(scope).map(|r| r.order).max().unwrap_or(0))
    }

    fn count_in_scope(&self, scope: &Scope) -> StoreResult<u64> {
        Ok(self.in_scope(scope).count() as u64)
    }

    fn find_by_order(&self, scope: &Scope, order: Rank) -> StoreResult<Option<OrderedRecord>> {
        Ok(self.in_scope(scope).find(|r| r.order == order).cloned())
    }

    fn find_by_id(&self, scope: &Scope, id: &RecordId) -> StoreResult<Option<OrderedRecord>> {
        Ok(self.records.get(id).filter(|r| &r.scope == scope).cloned())
    }

    fn find_all(&self, query: &Query) -> StoreResult<Vec<OrderedRecord>> {
        let mut records: Vec<_> = self.in_scope(&query.scope).cloned().collect();
        if let Some(order_by) = query.order_by {
            Self::sort(&mut records, order_by.field, order_by.direction);
        }
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn insert(&mut self, record: &OrderedRecord) -> StoreResult<()> {
        self.check_fault(StoreOp::Insert)?;
        if self.records.contains_key(&record.id) {
            return Err(StoreError::DuplicateId(record.id.clone()));
        }
        if self.rank_taken(&record.scope, record.order, None) {
            return Err(StoreError::UniqueViolation {
                scope: record.scope.clone(),
                order: record.order,
            });
        }
        self.records.insert(record.id.clone(), record.clone());
        self.writes += 1;
        Ok(())
    }

    fn delete(&mut self, scope: &Scope, id: &RecordId) -> StoreResult<OrderedRecord> {
        self.check_fault(StoreOp::Delete)?;
        match self.records.get(id) {
            Some(r) if &r.scope == scope => {}
            _ => return Err(StoreError::NotFound(id.clone())),
        }
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.writes += 1;
        Ok(removed)
    }

    fn set_order(&mut self, scope: &Scope, id: &RecordId, order: Rank) -> StoreResult<()> {
        self.check_fault(StoreOp::SetOrder)?;
        if self.rank_taken(scope, order, Some(id)) {
            return Err(StoreError::UniqueViolation {
                scope: scope.clone(),
                order,
            });
        }
        let record = self
            .records
            .get_mut(id)
            .filter(|r| &r.scope == scope)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.order = order;
        self.writes += 1;
        Ok(())
    }

    fn bulk_decrement_order_above(&mut self, scope: &Scope, threshold: Rank) -> StoreResult<u64> {
        self.check_fault(StoreOp::BulkDecrement)?;
        let mut shifted = 0;
        for record in self.records.values_mut() {
            if &record.scope == scope && record.order > threshold {
                record.order -= 1;
                shifted += 1;
            }
        }
        self.writes += 1;
        Ok(shifted)
    }

    fn reassign_orders(
        &mut self,
        scope: &Scope,
        assignments: &[(RecordId, Rank)],
    ) -> StoreResult<()> {
        self.check_fault(StoreOp::Reassign)?;
        let mut next = self.records.clone();
        for (id, order) in assignments {
            let record = next
                .get_mut(id)
                .filter(|r| &r.scope == scope)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            record.order = *order;
        }

        let mut seen = std::collections::BTreeSet::new();
        for record in next.values().filter(|r| &r.scope == scope) {
            if !seen.insert(record.order) {
                return Err(StoreError::UniqueViolation {
                    scope: scope.clone(),
                    order: record.order,
                });
            }
        }

        self.records = next;
        self.writes += 1;
        Ok(())
    }

    fn begin_transaction(&mut self) -> StoreResult<TxHandle> {
        if let Some(open) = &self.tx {
            return Err(StoreError::TransactionActive(open.handle));
        }
        self.next_tx += 1;
        let handle = TxHandle::new(self.next_tx);
        self.tx = Some(OpenTx {
            handle,
            snapshot: self.records.clone(),
        });
        Ok(handle)
    }

    fn commit(&mut self, tx: TxHandle) -> StoreResult<()> {
        match &self.tx {
            Some(open) if open.handle == tx => {}
            Some(_) => return Err(StoreError::UnknownTransaction(tx)),
            None => return Err(StoreError::NoTransaction),
        }
        self.check_fault(StoreOp::Commit)?;
        self.tx = None;
        Ok(())
    }

    fn rollback(&mut self, tx: TxHandle) -> StoreResult<()> {
        match self.tx.take() {
            Some(open) if open.handle == tx => {
                self.records = open.snapshot;
                Ok(())
            }
            Some(open) => {
                self.tx = Some(open);
                Err(StoreError::UnknownTransaction(tx))
            }
            None => Err(StoreError::NoTransaction),
        }
    }

    fn active_transaction(&self) -> Option<TxHandle> {
        self.tx.as_ref().map(|open| open.handle)
    }
}
