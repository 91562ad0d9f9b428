//! Scope verification and repair
//!
//! An interrupted move (process killed between swap steps, with a store that
//! did not roll the transaction back) can leave a record on the sentinel
//! rank and the scope locked. Repair brings the scope back to `1..N`.
//!
//! Repair rules:
//!
//! 1. A sentinel holder goes into the single free rank if the rest of the
//!    scope is otherwise clean, else to the end
//! 2. Everything is then compacted to `1..N`, keeping the current relative
//!    order (ties broken by id)

use std::collections::BTreeMap;

use serde::Serialize;

use crate::observability::{log_event_at, log_event_with_fields, Event, ObservationScope, Severity};
use crate::store::{OrderBy, OrderField, OrderedRecord, Query, Rank, RecordId, RecordStore, Scope, TxHandle};

use super::errors::OrderResult;
use super::maintainer::OrderMaintainer;
use super::transaction::TxScope;

/// State of one scope's ranks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    pub scope: Scope,
    pub size: u64,
    /// Record holding the sentinel rank, if any
    pub sentinel: Option<RecordId>,
    /// Ranks in `1..=size` no record holds
    pub gaps: Vec<Rank>,
    /// Ranks held by more than one record
    pub duplicates: Vec<Rank>,
    /// Records ranked above `size`
    pub out_of_range: Vec<RecordId>,
}

impl ScopeReport {
    /// True if ranks are exactly `1..=size`
    pub fn is_dense(&self) -> bool {
        self.sentinel.is_none()
            && self.gaps.is_empty()
            && self.duplicates.is_empty()
            && self.out_of_range.is_empty()
    }

    fn build(scope: &Scope, records: &[OrderedRecord]) -> Self {
        let size = records.len() as u64;
        let mut holders: BTreeMap<Rank, usize> = BTreeMap::new();
        let mut sentinel = None;
        let mut out_of_range = Vec::new();

        for record in records {
            if record.is_sentinel() {
                sentinel.get_or_insert_with(|| record.id.clone());
            } else if u64::from(record.order) > size {
                out_of_range.push(record.id.clone());
            }
            *holders.entry(record.order).or_default() += 1;
        }

        let duplicates = holders
            .iter()
            .filter(|(_, n)| **n > 1)
            .map(|(rank, _)| *rank)
            .collect();
        let gaps = (1..=size)
            .filter_map(|r| Rank::try_from(r).ok())
            .filter(|r| !holders.contains_key(r))
            .collect();

        Self {
            scope: scope.clone(),
            size,
            sentinel,
            gaps,
            duplicates,
            out_of_range,
        }
    }
}

/// Result of a repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairOutcome {
    /// State before repair
    pub before: ScopeReport,
    /// Records whose rank changed
    pub reassigned: usize,
}

impl OrderMaintainer {
    /// Inspect a scope's ranks. Read-only.
    pub fn verify_scope<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        scope: &Scope,
    ) -> OrderResult<ScopeReport> {
        let records = self.scan(&*store, scope)?;
        let report = ScopeReport::build(scope, &records);

        let scope_str = scope.to_string();
        if let Some(holder) = &report.sentinel {
            log_event_at(
                Severity::Warn,
                Event::SentinelDetected,
                &[("holder", holder.as_str()), ("scope", scope_str.as_str())],
            );
        }
        log_event_with_fields(
            Event::ScopeVerified,
            &[
                ("dense", if report.is_dense() { "true" } else { "false" }),
                ("gaps", report.gaps.len().to_string().as_str()),
                ("scope", scope_str.as_str()),
                ("size", report.size.to_string().as_str()),
            ],
        );
        Ok(report)
    }

    /// Restore `1..N` in a scope, in one transaction
    pub fn repair_scope<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        scope: &Scope,
        tx: Option<&TxHandle>,
    ) -> OrderResult<RepairOutcome> {
        let scope_str = scope.to_string();
        let obs = ObservationScope::with_fields("SCOPE_REPAIR", &[("scope", scope_str.as_str())]);

        let result = TxScope::run(store, tx, |store| {
            let records = self.scan(&*store, scope)?;
            let before = ScopeReport::build(scope, &records);
            if before.is_dense() {
                return Ok(RepairOutcome {
                    before,
                    reassigned: 0,
                });
            }

            let plan = Self::plan_repair(&before, records);
            let reassigned = plan.iter().filter(|(_, from, to)| from != to).count();
            let assignments: Vec<(RecordId, Rank)> =
                plan.into_iter().map(|(id, _, to)| (id, to)).collect();
            store.reassign_orders(scope, &assignments)?;

            Ok(RepairOutcome { before, reassigned })
        });

        match result {
            Ok(outcome) => {
                if outcome.reassigned > 0 {
                    self.metrics().increment_repairs();
                    self.metrics().add_rows_renumbered(outcome.reassigned as u64);
                }
                log_event_with_fields(
                    Event::ScopeRepaired,
                    &[
                        ("reassigned", outcome.reassigned.to_string().as_str()),
                        ("scope", scope_str.as_str()),
                    ],
                );
                obs.complete();
                Ok(outcome)
            }
            Err(e) => {
                obs.fail(e.message());
                Err(e)
            }
        }
    }

    fn scan<S: RecordStore + ?Sized>(&self, store: &S, scope: &Scope) -> OrderResult<Vec<OrderedRecord>> {
        let query = Query::scope(scope.clone()).order_by(OrderBy::asc(OrderField::Rank));
        Ok(store.find_all(&query)?)
    }

    /// `(id, current, target)` for every record, target ranks `1..=N`
    fn plan_repair(report: &ScopeReport, records: Vec<OrderedRecord>) -> Vec<(RecordId, Rank, Rank)> {
        let (parked, mut placed): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.is_sentinel());

        let single_gap = match report.gaps.as_slice() {
            [gap] if report.duplicates.is_empty() && report.out_of_range.is_empty() => Some(*gap),
            _ => None,
        };

        // Sort key: (rank, tiebreak, id). A parked record in the single gap
        // sorts exactly there; otherwise it goes after everything.
        let mut keyed: Vec<((u64, u8, RecordId), OrderedRecord)> = placed
            .drain(..)
            .map(|r| ((u64::from(r.order), 0, r.id.clone()), r))
            .collect();
        for (i, r) in parked.into_iter().enumerate() {
            let key = match single_gap {
                Some(gap) if i == 0 => (u64::from(gap), 0, r.id.clone()),
                _ => (u64::MAX, 1, r.id.clone()),
            };
            keyed.push((key, r));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        keyed
            .into_iter()
            .enumerate()
            .map(|(i, (_, r))| {
                let target = Rank::try_from(i + 1).unwrap_or(Rank::MAX);
                (r.id, r.order, target)
            })
            .collect()
    }
}
