//! Error types for the engine.

use thiserror::Error;

use crate::hex::Cell;
use crate::position::Action;

/// Errors raised at the boundaries of the engine.
///
/// The hot path (`apply`, `undo`, `legal_moves`) never returns these; it
/// relies on its callers only passing legal actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown game '{0}' (expected 'dodo' or 'gopher')")]
    UnknownGame(String),

    #[error("invalid occupant {value} at {cell} (expected 0, 1 or 2)")]
    InvalidOccupant { cell: Cell, value: u8 },

    #[error("cell {0} is not on the board")]
    OffBoard(Cell),

    #[error("cell {0} is listed more than once")]
    DuplicateCell(Cell),

    #[error("board radius {0} is out of range")]
    InvalidRadius(i32),

    #[error("invalid player id {0} (expected 1 or 2)")]
    InvalidPlayer(u8),

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("search finished without a single completed simulation")]
    NoSimulations,

    #[error("action does not match the game being played")]
    WrongActionKind,

    #[error("illegal action {0}")]
    IllegalAction(Action),

    #[error("cannot start search workers: {0}")]
    ThreadPool(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
