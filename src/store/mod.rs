//! Record Store subsystem for rankkeeper
//!
//! The persistence collaborator of the ordering core. The core never touches
//! storage directly; it issues the operations of the `RecordStore` trait.
//!
//! # Implementations
//!
//! - `MemoryStore`: in-process map with snapshot transactions and fault injection
//! - `SqliteStore`: single SQLite table with a `UNIQUE(scope, order)` constraint
//!
//! # Guarantees Required From Every Store
//!
//! - Ranks are unique per scope, the sentinel rank included
//! - `bulk_decrement_order_above` and `reassign_orders` are atomic
//! - At most one transaction is open at a time

mod backend;
mod errors;
mod memory;
mod record;
mod sqlite;

pub use backend::RecordStore;
pub use errors::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreOp};
pub use record::{
    NewRecord, OrderBy, OrderField, OrderedRecord, Query, Rank, RecordId, Scope, SortDirection,
    TxHandle, SENTINEL_RANK,
};
pub use sqlite::{validate_identifier, SqliteStore, TableLayout, DEFAULT_ORDER_COLUMN, DEFAULT_TABLE};
