//! Random playouts and the two trivial strategies.
//!
//! A playout plays uniformly random legal moves until the side to move is
//! blocked, then rewinds every move it made. Both games always end: Dodo
//! stones only move forward and Gopher stones are never removed.

use crate::board::Player;
use crate::error::{Error, Result};
use crate::position::{Action, GameState};

/// Play random moves to the end of the game and return the winner.
///
/// `state` is restored before returning.
pub fn rollout(state: &mut GameState, rng: &mut fastrand::Rng) -> Player {
    let mut played: Vec<Action> = Vec::new();
    let winner = loop {
        let moves = state.legal_moves();
        if moves.is_empty() {
            break state.kind().blocked_winner(state.current_player());
        }
        let action = moves[rng.usize(..moves.len())];
        state.apply(action);
        played.push(action);
    };

    while let Some(action) = played.pop() {
        state.undo(action);
    }
    winner
}

/// First legal move in enumeration order.
pub fn strategy_first_legal(state: &GameState) -> Result<Action> {
    state.legal_moves().first().copied().ok_or(Error::NoLegalMoves)
}

/// Uniformly random legal move.
pub fn strategy_random(state: &GameState, rng: &mut fastrand::Rng) -> Result<Action> {
    let moves = state.legal_moves();
    if moves.is_empty() {
        return Err(Error::NoLegalMoves);
    }
    Ok(moves[rng.usize(..moves.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollout_restores_state() {
        let mut rng = fastrand::Rng::with_seed(42);
        for radius in 2..=4 {
            let mut dodo = GameState::new_dodo(radius, Player::Red).unwrap();
            let before = dodo.clone();
            rollout(&mut dodo, &mut rng);
            assert_eq!(dodo, before);

            let mut gopher = GameState::new_gopher(radius, Player::Red).unwrap();
            let before = gopher.clone();
            rollout(&mut gopher, &mut rng);
            assert_eq!(gopher, before);
        }
    }

    #[test]
    fn test_rollouts_are_reproducible() {
        let mut state = GameState::new_dodo(4, Player::Red).unwrap();
        let a: Vec<Player> = {
            let mut rng = fastrand::Rng::with_seed(7);
            (0..20).map(|_| rollout(&mut state, &mut rng)).collect()
        };
        let b: Vec<Player> = {
            let mut rng = fastrand::Rng::with_seed(7);
            (0..20).map(|_| rollout(&mut state, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_simple_strategies() {
        let state = GameState::new_dodo(3, Player::Red).unwrap();
        let first = strategy_first_legal(&state).unwrap();
        assert_eq!(first, state.legal_moves()[0]);

        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..10 {
            assert!(state.is_legal(strategy_random(&state, &mut rng).unwrap()));
        }
    }
}
