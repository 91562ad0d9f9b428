//! rankkeeper - dense, gapless ordering for record collections
//!
//! Maintains an integer rank column at exactly `1..N` per scope across
//! inserts, deletes and unit moves, using rank `0` as a per-scope lock.

pub mod cli;
pub mod crash_point;
pub mod observability;
pub mod ordering;
pub mod store;
