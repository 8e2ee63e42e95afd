//! Occupancy board over a shared [`HexGrid`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::hex::{Cell, HexGrid};

/// One of the two players. Red (id 1) always moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    Red,
    Blue,
}

impl Player {
    /// External id: 1 for Red, 2 for Blue.
    pub fn id(self) -> u8 {
        match self {
            Player::Red => 1,
            Player::Blue => 2,
        }
    }

    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Player::Red),
            2 => Ok(Player::Blue),
            other => Err(Error::InvalidPlayer(other)),
        }
    }

    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    /// Dense index (0 or 1) for per-player tables.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Player::Red => 0,
            Player::Blue => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Red => write!(f, "Red"),
            Player::Blue => write!(f, "Blue"),
        }
    }
}

/// Cell occupancy. The geometry is shared, so clones only copy the cells.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Arc<HexGrid>,
    cells: Vec<Option<Player>>,
}

impl Board {
    pub fn new(grid: Arc<HexGrid>) -> Self {
        let cells = vec![None; grid.len()];
        Self { grid, cells }
    }

    #[inline]
    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<Player> {
        self.cells[idx]
    }

    #[inline]
    pub fn set(&mut self, idx: usize, occupant: Option<Player>) {
        self.cells[idx] = occupant;
    }

    /// Occupant of `cell`; off-board cells read as empty.
    pub fn at(&self, cell: Cell) -> Option<Player> {
        self.grid.index_of(cell).and_then(|idx| self.cells[idx])
    }

    pub fn radius(&self) -> i32 {
        self.grid.radius()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of stones owned by `player`.
    pub fn count(&self, player: Player) -> usize {
        self.cells.iter().filter(|&&c| c == Some(player)).count()
    }

    /// Remove every stone.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// `(cell, occupant)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, Option<Player>)> + '_ {
        self.grid.cells().iter().copied().zip(self.cells.iter().copied())
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.grid.cells() == other.grid.cells() && self.cells == other.cells
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    /// Staggered rows, largest `q` on top. `R` and `B` are stones, `.` empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.grid.cells();
        let Some(max_q) = cells.iter().map(|c| c.q).max() else {
            return Ok(());
        };
        let min_q = cells.iter().map(|c| c.q).min().unwrap_or(max_q);
        let min_x = cells.iter().map(|c| 2 * c.r - c.q).min().unwrap_or(0);

        for q in (min_q..=max_q).rev() {
            let mut row: Vec<(i32, char)> = self
                .iter()
                .filter(|(c, _)| c.q == q)
                .map(|(c, occ)| {
                    let ch = match occ {
                        Some(Player::Red) => 'R',
                        Some(Player::Blue) => 'B',
                        None => '.',
                    };
                    (2 * c.r - c.q - min_x, ch)
                })
                .collect();
            row.sort_unstable();

            let mut line = String::new();
            for (x, ch) in row {
                while (line.len() as i32) < x {
                    line.push(' ');
                }
                line.push(ch);
            }
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_ids() {
        assert_eq!(Player::from_id(1).unwrap(), Player::Red);
        assert_eq!(Player::from_id(2).unwrap(), Player::Blue);
        assert_eq!(Player::from_id(3).unwrap_err(), Error::InvalidPlayer(3));
        assert_eq!(Player::Red.opponent(), Player::Blue);
        assert_eq!(Player::Blue.id(), 2);
    }

    #[test]
    fn test_set_and_count() {
        let grid = Arc::new(HexGrid::hexagon(2).unwrap());
        let mut board = Board::new(grid);
        assert_eq!(board.len(), 7);
        board.set(0, Some(Player::Red));
        board.set(3, Some(Player::Blue));
        assert_eq!(board.count(Player::Red), 1);
        assert_eq!(board.count(Player::Blue), 1);
        assert_eq!(board.at(Cell::new(0, 0)), Some(Player::Blue));
        assert_eq!(board.at(Cell::new(9, 9)), None);
        board.clear();
        assert_eq!(board.count(Player::Red), 0);
    }

    #[test]
    fn test_display_shape() {
        let grid = Arc::new(HexGrid::hexagon(2).unwrap());
        let mut board = Board::new(grid);
        board.set(3, Some(Player::Red));
        let text = board.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].matches('.').count(), 2);
        assert_eq!(lines[1].matches('R').count(), 1);
    }
}
