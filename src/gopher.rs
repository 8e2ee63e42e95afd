//! Gopher placement generation.
//!
//! The first stone of the game may go anywhere. Afterwards a stone must touch
//! exactly one enemy stone and no friendly stone. The player left without a
//! placement loses.

use crate::board::{Board, Player};
use crate::hex::Heading;
use crate::position::PositionIndex;

/// Whether `player` may place on the empty cell `idx` once the game has started.
pub fn is_valid_placement(board: &Board, idx: usize, player: Player) -> bool {
    let mut enemies = 0;
    for n in board.grid().neighbors_of(idx, Heading::All) {
        match board.get(n) {
            Some(p) if p == player => return false,
            Some(_) => enemies += 1,
            None => {}
        }
    }
    enemies == 1
}

/// Board indices where `player` may place.
///
/// Candidates are drawn from the empty neighbors of enemy stones, so the scan
/// is proportional to the number of stones. A valid cell has exactly one
/// enemy neighbor, hence appears exactly once.
pub fn placements<'a>(
    board: &'a Board,
    own: &'a PositionIndex,
    enemy: &'a PositionIndex,
    player: Player,
) -> impl Iterator<Item = usize> + 'a {
    let grid = board.grid();
    let opening = if own.is_empty() && enemy.is_empty() {
        board.len()
    } else {
        0
    };
    let adjacent = enemy.iter().flat_map(move |stone| {
        grid.neighbors_of(stone, Heading::All)
            .filter(move |&n| board.get(n).is_none() && is_valid_placement(board, n, player))
    });
    (0..opening).chain(adjacent)
}
