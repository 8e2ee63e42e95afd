//! Dodo move generation.
//!
//! Each player only steps forward: Red along the up offsets, Blue along the
//! down offsets. A stone may move to any adjacent empty cell in its
//! direction set. The player left without a move wins.

use crate::board::{Board, Player};
use crate::hex::Heading;
use crate::position::PositionIndex;

/// Direction set of `player`.
#[inline]
pub fn heading(player: Player) -> Heading {
    match player {
        Player::Red => Heading::Up,
        Player::Blue => Heading::Down,
    }
}

/// `(source, destination)` board indices of every move of `player`.
///
/// Sources follow the order of `stones`; destinations follow the direction
/// set order. Each pair is produced once.
pub fn moves<'a>(
    board: &'a Board,
    stones: &'a PositionIndex,
    player: Player,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    let grid = board.grid();
    let heading = heading(player);
    stones.iter().flat_map(move |src| {
        grid.neighbors_of(src, heading)
            .filter(move |&dst| board.get(dst).is_none())
            .map(move |dst| (src, dst))
    })
}
