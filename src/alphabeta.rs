//! Depth-limited alpha-beta search with a transposition memo.
//!
//! Negamax formulation over the shared [`GameState`]: each child is reached
//! with `apply` and left with `undo`, so the caller's state is unchanged when
//! the search returns, aborted or not.
//!
//! The memo is owned by one [`AlphaBeta`] value and cleared at the start of
//! every [`AlphaBeta::best_action`] call. Entries are keyed by position hash,
//! side to move and remaining depth, and carry a bound flag so that a value
//! produced under a narrow window is never reused as exact.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::board::Player;
use crate::constants::{
    CLOCK_CHECK_INTERVAL, DEPTH_FACTOR_SCALE, DODO_BASE_DEPTH, DODO_MAX_DEPTH, GOPHER_BASE_DEPTH,
    GOPHER_LARGE_BOARD, GOPHER_LARGE_BOARD_DEPTH, GOPHER_MAX_DEPTH, GOPHER_SMALL_BOARD,
    GOPHER_SMALL_BOARD_BONUS, GOPHER_WIDE_BRANCHING, GOPHER_WIDE_DEPTH, INFINITY,
};
use crate::error::{Error, Result};
use crate::eval::{evaluate, terminal_value};
use crate::position::{Action, GameKind, GameState};

/// The clock ran out mid-search. Partial scores are discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aborted;

/// How a memoized score relates to the true value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Bound {
    Exact,
    /// True value is at least the score
    Lower,
    /// True value is at most the score
    Upper,
}

#[derive(Copy, Clone, Debug)]
struct MemoEntry {
    score: i32,
    bound: Bound,
    action: Option<Action>,
}

type MemoKey = (u64, Player, u32);

/// Counters for one search.
#[derive(Clone, Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub memo_hits: u64,
    pub cutoffs: u64,
    /// Deepest fully completed iteration
    pub depth: u32,
}

/// Alpha-beta searcher.
#[derive(Debug, Default)]
pub struct AlphaBeta {
    depth_cap: Option<u32>,
    time_budget: Option<Duration>,
    deadline: Option<Instant>,
    memo: HashMap<MemoKey, MemoEntry>,
    stats: SearchStats,
}

impl AlphaBeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never search deeper than `cap`, whatever the adaptive depth says.
    pub fn with_depth_cap(mut self, cap: u32) -> Self {
        self.depth_cap = Some(cap);
        self
    }

    /// Abort once `budget` has elapsed since the start of `best_action`.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Pick a move for the side to move.
    ///
    /// Without a time budget the adaptive depth is searched directly. With a
    /// budget, depths are searched one after another and the result of the
    /// deepest completed one is kept; if not even depth 1 completes, a random
    /// legal move is returned.
    pub fn best_action(
        &mut self,
        state: &mut GameState,
        rng: &mut fastrand::Rng,
    ) -> Result<Action> {
        let moves = state.legal_moves();
        let Some(&first) = moves.first() else {
            return Err(Error::NoLegalMoves);
        };
        if moves.len() == 1 {
            return Ok(first);
        }

        let target = self.target_depth(state);
        self.memo.clear();
        self.stats = SearchStats::default();
        self.deadline = self.time_budget.map(|b| Instant::now() + b);
        let start = Instant::now();

        let depths = if self.deadline.is_some() { 1..=target } else { target..=target };
        let mut best = None;
        for depth in depths {
            match self.search(state, depth, -INFINITY, INFINITY) {
                Ok((score, action)) => {
                    best = Some((score, action.unwrap_or(first)));
                    self.stats.depth = depth;
                }
                Err(Aborted) => break,
            }
        }

        match best {
            Some((score, action)) => {
                debug!(
                    "alpha-beta: {action} ({score}) depth {}/{target}, {} nodes, {} hits, {:.0?}",
                    self.stats.depth,
                    self.stats.nodes,
                    self.stats.memo_hits,
                    start.elapsed()
                );
                Ok(action)
            }
            None => {
                warn!("alpha-beta aborted on the clock before depth 1, playing at random");
                Ok(moves[rng.usize(..moves.len())])
            }
        }
    }

    /// Value of the position for the side to move at a fixed depth, with the
    /// move that reaches it. Clears the memo first.
    pub fn score(
        &mut self,
        state: &mut GameState,
        depth: u32,
    ) -> std::result::Result<(i32, Option<Action>), Aborted> {
        self.memo.clear();
        self.search(state, depth, -INFINITY, INFINITY)
    }

    fn target_depth(&self, state: &GameState) -> u32 {
        let depth = adaptive_depth(state);
        self.depth_cap.map_or(depth, |cap| depth.min(cap)).max(1)
    }

    /// Checks the clock on the first node and then every
    /// `CLOCK_CHECK_INTERVAL` nodes.
    fn out_of_time(&self) -> bool {
        self.stats.nodes % CLOCK_CHECK_INTERVAL == 1
            && self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail-hard negamax: the result is clamped to `[alpha, beta]`.
    fn search(
        &mut self,
        state: &mut GameState,
        depth: u32,
        mut alpha: i32,
        beta: i32,
    ) -> std::result::Result<(i32, Option<Action>), Aborted> {
        self.stats.nodes += 1;
        if self.out_of_time() {
            return Err(Aborted);
        }

        let player = state.current_player();
        if let Some(value) = terminal_value(state, depth) {
            return Ok((value, None));
        }
        if depth == 0 {
            return Ok((evaluate(state, player), None));
        }

        let key = (state.hash(), player, depth);
        if let Some(entry) = self.memo.get(&key) {
            let hit = match entry.bound {
                Bound::Exact => Some(entry.score.clamp(alpha, beta)),
                Bound::Lower if entry.score >= beta => Some(beta),
                Bound::Upper if entry.score <= alpha => Some(alpha),
                _ => None,
            };
            if let Some(score) = hit {
                self.stats.memo_hits += 1;
                return Ok((score, entry.action));
            }
        }

        let alpha_orig = alpha;
        let mut best_action = None;
        for action in state.legal_moves() {
            state.apply(action);
            let child = self.search(state, depth - 1, -beta, -alpha);
            state.undo(action);
            let score = -child?.0;

            if score >= beta {
                self.stats.cutoffs += 1;
                let entry = MemoEntry {
                    score: beta,
                    bound: Bound::Lower,
                    action: Some(action),
                };
                self.memo.insert(key, entry);
                return Ok((beta, Some(action)));
            }
            if score > alpha {
                alpha = score;
                best_action = Some(action);
            }
        }

        let bound = if best_action.is_some() { Bound::Exact } else { Bound::Upper };
        debug_assert!(bound == Bound::Exact || alpha == alpha_orig);
        self.memo.insert(key, MemoEntry { score: alpha, bound, action: best_action });
        Ok((alpha, best_action))
    }
}

/// Search depth suited to the branching factor of the position.
///
/// Narrow positions are searched deeper: the depth factor is
/// `DEPTH_FACTOR_SCALE / log2(branching)`, or 1 when there is at most one move.
pub fn adaptive_depth(state: &GameState) -> u32 {
    let branching = state.move_count(state.current_player());
    let factor = if branching <= 1 {
        1.0
    } else {
        DEPTH_FACTOR_SCALE / (branching as f64).log2()
    };

    match state.kind() {
        GameKind::Dodo => (DODO_BASE_DEPTH + factor.round() as u32).min(DODO_MAX_DEPTH),
        GameKind::Gopher => {
            let radius = state.radius();
            let bonus = if radius <= GOPHER_SMALL_BOARD {
                factor * GOPHER_SMALL_BOARD_BONUS
            } else {
                factor
            };
            let mut depth = GOPHER_BASE_DEPTH + bonus.round() as u32;
            if branching >= GOPHER_WIDE_BRANCHING {
                depth = depth.min(GOPHER_WIDE_DEPTH);
            }
            if radius >= GOPHER_LARGE_BOARD {
                depth = depth.min(GOPHER_LARGE_BOARD_DEPTH);
            }
            depth.min(GOPHER_MAX_DEPTH)
        }
    }
}

/// Plain negamax without pruning or memo. Exponential; meant for checking
/// the pruned searches on tiny boards.
pub fn minimax(state: &mut GameState, depth: u32) -> i32 {
    if let Some(value) = terminal_value(state, depth) {
        return value;
    }
    if depth == 0 {
        return evaluate(state, state.current_player());
    }
    let mut best = -INFINITY;
    for action in state.legal_moves() {
        state.apply(action);
        let score = -minimax(state, depth - 1);
        state.undo(action);
        best = best.max(score);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WIN_SCORE;
    use crate::hex::Cell;
    use crate::position::CellState;

    #[test]
    fn test_adaptive_depth_bounds() {
        let dodo = GameState::new_dodo(4, Player::Red).unwrap();
        let d = adaptive_depth(&dodo);
        assert!((DODO_BASE_DEPTH..=DODO_MAX_DEPTH).contains(&d));

        let gopher = GameState::new_gopher(4, Player::Red).unwrap();
        assert_eq!(adaptive_depth(&gopher), GOPHER_WIDE_DEPTH);

        let big = GameState::new_gopher(8, Player::Red).unwrap();
        assert!(adaptive_depth(&big) <= GOPHER_LARGE_BOARD_DEPTH);
    }

    #[test]
    fn test_adaptive_depth_single_move() {
        // Red's only stone has exactly one free forward cell
        let cells: Vec<CellState> = vec![
            (Cell::new(0, 0), 1),
            (Cell::new(1, 0), 2),
            (Cell::new(1, 1), 0),
            (Cell::new(0, 1), 2),
        ];
        let state = GameState::from_cells(GameKind::Dodo, 2, &cells, Player::Red).unwrap();
        assert_eq!(state.move_count(Player::Red), 1);
        assert_eq!(adaptive_depth(&state), DODO_BASE_DEPTH + 1);
    }

    #[test]
    fn test_state_restored_after_search() {
        let mut state = GameState::new_dodo(3, Player::Red).unwrap();
        let before = state.clone();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut ab = AlphaBeta::new().with_depth_cap(4);
        ab.best_action(&mut state, &mut rng).unwrap();
        assert_eq!(state, before);
        assert!(ab.stats().nodes > 0);
    }

    #[test]
    fn test_finds_immediate_gopher_win() {
        // Blue to move; every reply to the center stone leaves Red without a placement
        let mut state = GameState::new_gopher(2, Player::Blue).unwrap();
        state.apply(Action::Place(Cell::new(0, 0)));
        let mut ab = AlphaBeta::new();
        let (score, action) = ab.score(&mut state, 2).unwrap();
        assert!(score > WIN_SCORE, "score {score}");
        let action = action.unwrap();
        state.apply(action);
        assert!(state.is_terminal());
        assert_eq!(state.winner(), Some(Player::Blue));
    }

    #[test]
    fn test_zero_budget_falls_back() {
        let mut state = GameState::new_dodo(5, Player::Red).unwrap();
        let before = state.clone();
        let mut played = std::collections::HashSet::new();
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut ab = AlphaBeta::new().with_time_budget(Duration::ZERO);
            let action = ab.best_action(&mut state, &mut rng).unwrap();
            assert!(state.is_legal(action));
            assert_eq!(state, before);
            assert_eq!(ab.stats().depth, 0);
            assert_eq!(ab.stats().nodes, 1);
            played.insert(action);
        }
        // the fallback picks at random
        assert!(played.len() > 1);
    }

    #[test]
    fn test_no_moves_is_an_error() {
        let cells: Vec<CellState> = vec![(Cell::new(0, 0), 1), (Cell::new(1, 0), 2)];
        let mut state = GameState::from_cells(GameKind::Dodo, 2, &cells, Player::Red).unwrap();
        // (1, 1) and (0, 1) are not part of this board
        assert!(state.is_terminal());
        let mut rng = fastrand::Rng::with_seed(0);
        assert_eq!(
            AlphaBeta::new().best_action(&mut state, &mut rng),
            Err(Error::NoLegalMoves)
        );
    }
}
