//! NegaScout (principal variation search) at a fixed depth.
//!
//! The first child of every node is searched with the full window; later
//! siblings are tested with a null window and re-searched only when the
//! scout says they might beat the current best. No memo and no clock: the
//! depth alone bounds the work.

use log::debug;

use crate::constants::INFINITY;
use crate::error::{Error, Result};
use crate::eval::{evaluate, terminal_value};
use crate::position::{Action, GameState};

#[derive(Debug, Clone)]
pub struct NegaScout {
    depth: u32,
    nodes: u64,
    researches: u64,
}

impl NegaScout {
    pub fn new(depth: u32) -> Self {
        Self {
            depth: depth.max(1),
            nodes: 0,
            researches: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Best move for the side to move. Ties keep the first move found.
    pub fn best_action(&mut self, state: &mut GameState) -> Result<Action> {
        let moves = state.legal_moves();
        let Some(&first) = moves.first() else {
            return Err(Error::NoLegalMoves);
        };
        let (score, action) = self.score(state, self.depth);
        let action = action.unwrap_or(first);
        debug!(
            "negascout: {action} score {score} depth {}, {} nodes, {} re-searches",
            self.depth, self.nodes, self.researches
        );
        Ok(action)
    }

    /// Value of the position for the side to move at `depth`.
    pub fn score(&mut self, state: &mut GameState, depth: u32) -> (i32, Option<Action>) {
        self.nodes = 0;
        self.researches = 0;
        self.pvs(state, depth, -INFINITY, INFINITY)
    }

    fn pvs(
        &mut self,
        state: &mut GameState,
        depth: u32,
        mut alpha: i32,
        beta: i32,
    ) -> (i32, Option<Action>) {
        self.nodes += 1;
        if let Some(value) = terminal_value(state, depth) {
            return (value, None);
        }
        if depth == 0 {
            return (evaluate(state, state.current_player()), None);
        }

        let mut best = None;
        for (i, action) in state.legal_moves().into_iter().enumerate() {
            state.apply(action);
            let score = if i == 0 {
                -self.pvs(state, depth - 1, -beta, -alpha).0
            } else {
                let scout = -self.pvs(state, depth - 1, -alpha - 1, -alpha).0;
                if alpha < scout && scout < beta {
                    self.researches += 1;
                    -self.pvs(state, depth - 1, -beta, -scout).0
                } else {
                    scout
                }
            };
            state.undo(action);

            if score > alpha {
                alpha = score;
                best = Some(action);
            }
            if alpha >= beta {
                return (beta, best);
            }
        }
        (alpha, best)
    }
}
