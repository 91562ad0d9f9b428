//! Crash point injection for testing interruption safety
//!
//! When `RANKKEEPER_CRASH_POINT` names a point that execution reaches, the
//! process terminates via `std::process::abort()`: no cleanup, no
//! unwinding, no rollback.
//!
//! ```bash
//! RANKKEEPER_CRASH_POINT=move_after_sentinel rankkeeper move-up --id r2
//! ```

use std::sync::OnceLock;

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "RANKKEEPER_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if the environment selects crash point `name`
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if crash point `name` is selected
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Moving record holds the sentinel, neighbor untouched
    pub const MOVE_AFTER_SENTINEL: &str = "move_after_sentinel";
    /// Neighbor took the old rank, moving record still holds the sentinel
    pub const MOVE_AFTER_NEIGHBOR: &str = "move_after_neighbor";
    /// Row removed, ranks above it not yet shifted
    pub const DELETE_BEFORE_RENUMBER: &str = "delete_before_renumber";
    /// Rank computed, row not yet written
    pub const INSERT_BEFORE_WRITE: &str = "insert_before_write";

    pub fn all() -> &'static [&'static str] {
        &[
            MOVE_AFTER_SENTINEL,
            MOVE_AFTER_NEIGHBOR,
            DELETE_BEFORE_RENUMBER,
            INSERT_BEFORE_WRITE,
        ]
    }
}
