//! Crash tests for rankkeeper
//!
//! - Each test kills a real `rankkeeper` process at a crash point
//! - Post-crash state is read back from the database file
//! - Real filesystem (no mocks)

mod crash;
