//! Ordering subsystem for rankkeeper
//!
//! Keeps an integer rank column dense (`1..N`, no gaps, no duplicates) per
//! scope across inserts, deletes and unit moves.
//!
//! # Guarantees
//!
//! - Insert appends at `max + 1`
//! - Delete closes its gap
//! - Moves swap adjacent ranks through the sentinel rank `0`
//! - A scope with a record on the sentinel rejects further moves
//! - Every operation runs in one transaction, its own or the caller's
//!
//! # Usage
//!
//! ```ignore
//! use rankkeeper::ordering::OrderMaintainer;
//! use rankkeeper::store::{MemoryStore, NewRecord, Scope};
//!
//! let maintainer = OrderMaintainer::new();
//! let mut store = MemoryStore::new();
//! let mut rec = maintainer.insert(&mut store, NewRecord::new(Scope::all(), payload), None)?;
//! maintainer.move_up(&mut store, &Scope::all(), &mut rec, None)?;
//! ```

mod errors;
mod hooks;
mod maintainer;
mod outcome;
mod repair;
mod transaction;

pub use errors::{OrderError, OrderErrorCode, OrderResult, Severity};
pub use hooks::LifecycleHook;
pub use maintainer::OrderMaintainer;
pub use outcome::{Boundary, MoveDirection, MoveOutcome};
pub use repair::{RepairOutcome, ScopeReport};
pub use transaction::TxScope;
