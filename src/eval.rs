//! Static evaluation used at search cutoffs.
//!
//! The score is a difference of per-side terms: a weight per stone, a weight
//! per legal move, and a bonus for stones close to the edge. In Dodo every
//! stone and every move is a liability (the side that runs out of moves
//! wins); in Gopher stones and moves are assets. Cost is proportional to the
//! number of stones, never to the board size.

use crate::board::Player;
use crate::constants::{EDGE_DECAY, EDGE_WEIGHT, MOBILITY_WEIGHT, PIECE_WEIGHT, WIN_SCORE};
use crate::position::{GameKind, GameState};

/// Heuristic value of `state` for `player`. Positive is good for `player`.
pub fn evaluate(state: &GameState, player: Player) -> i32 {
    side_terms(state, player) - side_terms(state, player.opponent())
}

fn side_terms(state: &GameState, player: Player) -> i32 {
    let grid = state.board().grid();
    let stones = state.index(player);
    let edge: i32 = stones
        .iter()
        .map(|idx| (EDGE_WEIGHT - EDGE_DECAY * grid.edge_distance(idx)).max(0))
        .sum();
    let material = PIECE_WEIGHT * stones.len() as i32;
    let mobility = MOBILITY_WEIGHT * state.move_count(player) as i32;

    match state.kind() {
        GameKind::Dodo => edge - material - mobility,
        GameKind::Gopher => edge + material + mobility,
    }
}

/// Exact value of a finished game for the side to move, `None` otherwise.
///
/// Wins found with more `depth` left score higher, so searches prefer the
/// quickest win and the slowest loss.
#[inline]
pub fn terminal_value(state: &GameState, depth: u32) -> Option<i32> {
    state
        .terminal_score(state.current_player())
        .map(|sign| sign * (WIN_SCORE + depth as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_start_is_balanced() {
        for radius in 2..=5 {
            let state = GameState::new_dodo(radius, Player::Red).unwrap();
            assert_eq!(evaluate(&state, Player::Red), -evaluate(&state, Player::Blue));
            assert_eq!(evaluate(&state, Player::Red), 0, "radius {radius}");
        }
    }

    #[test]
    fn test_gopher_rewards_mobility() {
        let mut state = GameState::new_gopher(3, Player::Red).unwrap();
        let center = crate::position::Action::Place(crate::hex::Cell::new(0, 0));
        state.apply(center);
        // Red owns a stone and Blue has six replies against zero for Red
        let red = evaluate(&state, Player::Red);
        let blue = evaluate(&state, Player::Blue);
        assert_eq!(red, -blue);
        assert!(blue > 0);
    }

    #[test]
    fn test_far_below_win_score() {
        let state = GameState::new_dodo(7, Player::Red).unwrap();
        assert!(evaluate(&state, Player::Red).abs() < WIN_SCORE);
        assert_eq!(terminal_value(&state, 3), None);
    }
}
