//! Crash testing framework for rankkeeper
//!
//! Provides:
//! - Subprocess management with crash injection
//! - Post-crash inspection of the database

pub mod harness;
pub mod scenarios;

pub use harness::*;
