//! Crash scenarios, one module per operation

mod delete;
mod insert;
mod moves;
mod repair;
