//! Record model for ordered collections
//!
//! A record carries an opaque identity, the scope it is ordered within,
//! its 1-based rank, and an arbitrary JSON payload owned by the host.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 1-based position of a record within its scope
pub type Rank = u32;

/// Transient rank marking a record that is mid-move.
///
/// No live record holds this rank outside an in-progress swap.
pub const SENTINEL_RANK: Rank = 0;

/// Opaque record identity (primary key)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an existing key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Partition of records sharing one dense ordering sequence.
///
/// The empty key is the whole table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    /// The whole table as a single order space
    pub fn all() -> Self {
        Self(String::new())
    }

    /// An independent order space keyed by `key` (e.g. a parent id)
    pub fn partition(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Storage key for this scope
    pub fn key(&self) -> &str {
        &self.0
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            f.write_str("*")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// A persisted record with an assigned rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRecord {
    pub id: RecordId,
    pub scope: Scope,
    pub order: Rank,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl OrderedRecord {
    /// True while the record holds the sentinel rank
    pub fn is_sentinel(&self) -> bool {
        self.order == SENTINEL_RANK
    }
}

/// A record that has not been written yet.
///
/// `order` stays `None` until the pre-insert hook assigns it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub id: RecordId,
    pub scope: Scope,
    pub payload: Value,
    pub order: Option<Rank>,
}

impl NewRecord {
    /// Create a record with a generated id
    pub fn new(scope: Scope, payload: Value) -> Self {
        Self::with_id(RecordId::generate(), scope, payload)
    }

    pub fn with_id(id: RecordId, scope: Scope, payload: Value) -> Self {
        Self {
            id,
            scope,
            payload,
            order: None,
        }
    }

    /// Convert into a persisted record, stamping `created_at`.
    ///
    /// Returns `None` if no rank has been assigned.
    pub fn into_record(self) -> Option<OrderedRecord> {
        let order = self.order?;
        Some(OrderedRecord {
            id: self.id,
            scope: self.scope,
            order,
            payload: self.payload,
            created_at: Utc::now(),
        })
    }
}

/// Field a query can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Rank,
    CreatedAt,
    Id,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Read request against one scope
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub scope: Scope,
    /// Explicit sort; `None` leaves the choice to the pre-query hook
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn scope(scope: Scope) -> Self {
        Self {
            scope,
            order_by: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Handle for a store transaction.
///
/// Passing a handle into an ordering operation means the caller owns the
/// transaction; the operation participates without committing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(u64);

impl TxHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}
