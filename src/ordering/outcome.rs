//! Results of a move request

use serde::Serialize;

use crate::store::{Rank, RecordId};

/// Direction of a unit move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    /// Toward rank 1
    Up,
    /// Toward rank N
    Down,
}

impl MoveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveDirection::Up => "up",
            MoveDirection::Down => "down",
        }
    }

    /// Rank of the neighbor a record at `rank` swaps with.
    ///
    /// `None` when the step would leave the rank type.
    pub fn neighbor_of(&self, rank: Rank) -> Option<Rank> {
        match self {
            MoveDirection::Up => rank.checked_sub(1),
            MoveDirection::Down => rank.checked_add(1),
        }
    }
}

/// Which end of the scope stopped a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    First,
    Last,
}

/// Outcome of `move_up` / `move_down`.
///
/// A boundary no-op is a successful `Unchanged`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved {
        from: Rank,
        to: Rank,
        /// Neighbor that took over `from`
        displaced: RecordId,
    },
    Unchanged { boundary: Boundary },
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}
