//! rankkeeper CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Dispatches to CLI commands (via cli::run)
//! 2. Prints errors as a JSON line on stdout
//! 3. Exits with non-zero on failure
//!
//! All logic is delegated to the CLI module.

use rankkeeper::cli;

fn main() {
    if let Err(e) = cli::run() {
        if cli::write_error(e.code_str(), e.message()).is_err() {
            eprintln!("{}", e);
        }
        std::process::exit(1);
    }
}
