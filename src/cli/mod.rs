//! CLI module for rankkeeper
//!
//! Provides a command-line interface over a SQLite-backed record table:
//! - init: Create the database and table
//! - insert / delete: Write records, keeping ranks dense
//! - move-up / move-down: Unit moves
//! - list: Read a scope in rank order
//! - verify / repair: Inspect and restore a scope after an interruption

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{delete, init, insert, list, move_record, repair, run, run_command, verify};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, write_error, write_response};
