//! Observability events for rankkeeper
//!
//! Every lifecycle step of the ordering core that is worth a log line has
//! a typed event here.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Configuration file loaded
    ConfigLoaded,
    /// Record store opened and migrated
    StoreOpened,

    // Insert
    /// A new record received its rank
    OrderAssigned,

    // Moves
    /// Swap protocol starting
    MoveBegin,
    /// Swap committed (or handed to the caller's transaction)
    MoveCommitted,
    /// Record already at the boundary, nothing written
    MoveNoop,
    /// Another move holds the scope
    MoveRejected,
    /// Swap failed and its transaction was rolled back
    MoveRolledBack,
    /// Adjacent rank missing; scope invariant already broken
    NeighborMissing,

    // Delete
    /// Ranks above a deleted record shifted down
    ScopeRenumbered,

    // Verification / repair
    /// Scope checked for density
    ScopeVerified,
    /// A sentinel rank was found outside a move
    SentinelDetected,
    /// Scope ranks rewritten to 1..N
    ScopeRepaired,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreOpened => "STORE_OPENED",

            Event::OrderAssigned => "ORDER_ASSIGNED",

            Event::MoveBegin => "MOVE_BEGIN",
            Event::MoveCommitted => "MOVE_COMMITTED",
            Event::MoveNoop => "MOVE_NOOP",
            Event::MoveRejected => "MOVE_REJECTED",
            Event::MoveRolledBack => "MOVE_ROLLED_BACK",
            Event::NeighborMissing => "NEIGHBOR_MISSING",

            Event::ScopeRenumbered => "SCOPE_RENUMBERED",

            Event::ScopeVerified => "SCOPE_VERIFIED",
            Event::SentinelDetected => "SENTINEL_DETECTED",
            Event::ScopeRepaired => "SCOPE_REPAIRED",
        }
    }

    /// Returns true if this event indicates a broken invariant
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::NeighborMissing)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
