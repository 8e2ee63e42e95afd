//! Constants for board geometry, evaluation weights, and search parameters.
//!
//! Every tunable default of the engine lives here. [`crate::engine::EngineConfig`]
//! starts from these values; the binary may override some of them from the
//! command line.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Smallest supported hexagon side length (a single cell).
pub const MIN_RADIUS: i32 = 1;

/// Largest supported hexagon side length.
pub const MAX_RADIUS: i32 = 32;

/// Seed for the Zobrist key table. Fixed so hashes are stable across runs,
/// which the opening book relies on.
pub const ZOBRIST_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

// =============================================================================
// Evaluation Weights
// =============================================================================

/// Score of a decided game, from the side to move. Kept far above anything
/// the static evaluation can produce.
pub const WIN_SCORE: i32 = 100_000;

/// Bound used as "infinity" by the searches.
pub const INFINITY: i32 = 1_000_000;

/// Weight of a single stone.
pub const PIECE_WEIGHT: i32 = 40;

/// Weight of a single legal move.
pub const MOBILITY_WEIGHT: i32 = 80;

/// Bonus for a stone sitting on the outermost ring.
pub const EDGE_WEIGHT: i32 = 40;

/// Per-step decay of the edge bonus when moving inwards.
pub const EDGE_DECAY: i32 = 15;

// =============================================================================
// Alpha-Beta Parameters
// =============================================================================

/// Numerator of the depth factor (`DEPTH_FACTOR_SCALE / log2(branching)`).
pub const DEPTH_FACTOR_SCALE: f64 = 6.0;

/// Base depth added to the depth factor for Dodo.
pub const DODO_BASE_DEPTH: u32 = 2;

/// Hard depth cap for Dodo.
pub const DODO_MAX_DEPTH: u32 = 9;

/// Base depth added to the depth factor for Gopher.
pub const GOPHER_BASE_DEPTH: u32 = 6;

/// Depth factor multiplier on small Gopher boards.
pub const GOPHER_SMALL_BOARD_BONUS: f64 = 1.5;

/// Gopher boards up to this size get [`GOPHER_SMALL_BOARD_BONUS`].
pub const GOPHER_SMALL_BOARD: i32 = 4;

/// Gopher depth cap when the position is wide open.
pub const GOPHER_WIDE_DEPTH: u32 = 7;

/// Branching factor from which [`GOPHER_WIDE_DEPTH`] applies.
pub const GOPHER_WIDE_BRANCHING: usize = 8;

/// Gopher depth cap on large boards.
pub const GOPHER_LARGE_BOARD_DEPTH: u32 = 10;

/// Gopher boards from this size get [`GOPHER_LARGE_BOARD_DEPTH`].
pub const GOPHER_LARGE_BOARD: i32 = 6;

/// Absolute Gopher depth cap.
pub const GOPHER_MAX_DEPTH: u32 = 15;

/// Nodes visited between two clock checks.
pub const CLOCK_CHECK_INTERVAL: u64 = 1024;

/// Fixed depth of the NegaScout search.
pub const NEGASCOUT_DEPTH: u32 = 4;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Simulations per move of the demo game.
pub const N_SIMS: usize = 800;

/// UCB1 exploration constant (sqrt 2).
pub const UCB_EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Safety margin of the early-stop test: remaining simulations are
/// overestimated by this factor before comparing against the visit lead.
pub const EARLY_STOP_MARGIN: f64 = 1.1;

/// Simulations between two early-stop checks.
pub const EARLY_STOP_CHECK_INTERVAL: usize = 64;

// =============================================================================
// Time Management
// =============================================================================

/// Fixed part of the divisor spreading the remaining clock over the game.
pub const TIME_DIVISOR_BASE: f64 = 30.0;

/// Rounds over which the extra divisor decays to zero.
pub const TIME_DIVISOR_ROUNDS: usize = 60;

/// Below this much remaining clock the engine plays the first legal move.
pub const SURVIVAL_TIME: Duration = Duration::from_secs(5);
