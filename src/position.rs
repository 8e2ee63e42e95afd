//! Game state shared by every search: board, per-player indexes, side to move.
//!
//! A [`GameState`] is mutated in place by [`GameState::apply`] and rewound by
//! [`GameState::undo`]. The two form an exact inverse pair: after
//! `apply(a); undo(a)` the state compares equal to what it was, including the
//! position indexes and the running Zobrist hash. Searches rely on this
//! instead of copying the board at every node.
//!
//! Rule specifics live in [`crate::dodo`] and [`crate::gopher`]; this module
//! dispatches on [`GameKind`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::board::{Board, Player};
use crate::error::{Error, Result};
use crate::hex::{Cell, HexGrid};
use crate::{dodo, gopher};

/// External cell encoding: a cell and its occupant (0 empty, 1 Red, 2 Blue).
pub type CellState = (Cell, u8);

/// The two games played on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GameKind {
    /// Stones step forward; a player with no move left wins.
    Dodo,
    /// Stones are placed; a player with no placement left loses.
    Gopher,
}

impl GameKind {
    /// Winner when `blocked` is to move and has nothing to play.
    ///
    /// Only the side to move is tested for being blocked, in both games.
    #[inline]
    pub fn blocked_winner(self, blocked: Player) -> Player {
        match self {
            GameKind::Dodo => blocked,
            GameKind::Gopher => blocked.opponent(),
        }
    }
}

impl FromStr for GameKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dodo" => Ok(GameKind::Dodo),
            "gopher" => Ok(GameKind::Gopher),
            _ => Err(Error::UnknownGame(s.to_string())),
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Dodo => write!(f, "dodo"),
            GameKind::Gopher => write!(f, "gopher"),
        }
    }
}

/// A move. Gopher places a stone; Dodo moves one from a source to a destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Place(Cell),
    Move(Cell, Cell),
}

impl Action {
    /// The cell that becomes occupied.
    pub fn destination(self) -> Cell {
        match self {
            Action::Place(c) | Action::Move(_, c) => c,
        }
    }

    pub fn kind(self) -> GameKind {
        match self {
            Action::Place(_) => GameKind::Gopher,
            Action::Move(..) => GameKind::Dodo,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place(c) => write!(f, "{c}"),
            Action::Move(src, dst) => write!(f, "{src} -> {dst}"),
        }
    }
}

/// Cells occupied by one player, as board indices.
///
/// Membership is O(1) through `slots`. Removing the most recently inserted
/// cell and relocating a cell both leave the remaining order untouched, which
/// is what makes `undo` restore the index exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionIndex {
    cells: Vec<usize>,
    slots: Vec<Option<usize>>,
}

impl PositionIndex {
    pub fn new(board_len: usize) -> Self {
        Self {
            cells: Vec::new(),
            slots: vec![None; board_len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        self.slots[idx].is_some()
    }

    /// Occupied board indices in index order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.iter().copied()
    }

    pub fn insert(&mut self, idx: usize) {
        debug_assert!(!self.contains(idx), "cell {idx} already indexed");
        self.slots[idx] = Some(self.cells.len());
        self.cells.push(idx);
    }

    pub fn remove(&mut self, idx: usize) {
        let Some(slot) = self.slots[idx].take() else {
            debug_assert!(false, "cell {idx} not indexed");
            return;
        };
        self.cells.swap_remove(slot);
        if let Some(&moved) = self.cells.get(slot) {
            self.slots[moved] = Some(slot);
        }
    }

    /// Move a stone from `src` to `dst`, keeping its position in the order.
    pub fn relocate(&mut self, src: usize, dst: usize) {
        let Some(slot) = self.slots[src].take() else {
            debug_assert!(false, "cell {src} not indexed");
            return;
        };
        debug_assert!(!self.contains(dst), "cell {dst} already indexed");
        self.cells[slot] = dst;
        self.slots[dst] = Some(slot);
    }

    pub fn clear(&mut self) {
        for &idx in &self.cells {
            self.slots[idx] = None;
        }
        self.cells.clear();
    }
}

/// Complete game state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    kind: GameKind,
    board: Board,
    /// Indexed by [`Player::slot`]
    indexes: [PositionIndex; 2],
    current: Player,
    /// The side the engine plays
    max_player: Player,
    hash: u64,
    time_left: Duration,
}

impl GameState {
    /// Standard starting position of `kind` on a hexagon of side `radius`.
    pub fn new(kind: GameKind, radius: i32, max_player: Player) -> Result<Self> {
        match kind {
            GameKind::Dodo => Self::new_dodo(radius, max_player),
            GameKind::Gopher => Self::new_gopher(radius, max_player),
        }
    }

    /// Dodo opening: Red fills the lower corner, Blue the upper corner.
    pub fn new_dodo(radius: i32, max_player: Player) -> Result<Self> {
        let grid = Arc::new(HexGrid::hexagon(radius)?);
        let mut state = Self::empty(GameKind::Dodo, grid, max_player);
        let k = (radius - 2).max(1);
        for idx in 0..state.board.len() {
            let cell = state.board.grid().cell(idx);
            if cell.q + cell.r <= -k {
                state.put(idx, Player::Red);
            } else if cell.q + cell.r >= k {
                state.put(idx, Player::Blue);
            }
        }
        Ok(state)
    }

    /// Gopher opening: an empty board.
    pub fn new_gopher(radius: i32, max_player: Player) -> Result<Self> {
        let grid = Arc::new(HexGrid::hexagon(radius)?);
        Ok(Self::empty(GameKind::Gopher, grid, max_player))
    }

    /// Build a state from an external `(cell, occupant)` list.
    ///
    /// When the list covers exactly the hexagon of side `radius` the standard
    /// geometry is used, otherwise the board holds only the supplied cells.
    /// Red is to move.
    pub fn from_cells(
        kind: GameKind,
        radius: i32,
        cells: &[CellState],
        max_player: Player,
    ) -> Result<Self> {
        let hexagon = HexGrid::hexagon(radius)?;
        let covers = cells.len() == hexagon.len()
            && cells.iter().all(|&(c, _)| hexagon.contains(c));
        let grid = if covers || cells.is_empty() {
            hexagon
        } else {
            HexGrid::from_cells(radius, cells.iter().map(|&(c, _)| c))?
        };

        let mut state = Self::empty(kind, Arc::new(grid), max_player);
        state.load(cells)?;
        Ok(state)
    }

    fn empty(kind: GameKind, grid: Arc<HexGrid>, max_player: Player) -> Self {
        let len = grid.len();
        Self {
            kind,
            board: Board::new(grid),
            indexes: [PositionIndex::new(len), PositionIndex::new(len)],
            current: Player::Red,
            max_player,
            hash: 0,
            time_left: Duration::ZERO,
        }
    }

    /// Re-synchronize with an authoritative external position.
    ///
    /// Board, both indexes and the hash are rebuilt. `player` becomes both the
    /// side to move and the engine's own side.
    pub fn sync(
        &mut self,
        observed: &[CellState],
        player: Player,
        time_left: Duration,
    ) -> Result<()> {
        self.load(observed)?;
        self.max_player = player;
        if self.current != player {
            self.current = player;
            self.hash ^= self.board.grid().side_key();
        }
        self.time_left = time_left;
        Ok(())
    }

    /// Replace the stones with `cells`. Nothing changes unless every entry is
    /// on the board, names a valid occupant and appears once.
    fn load(&mut self, cells: &[CellState]) -> Result<()> {
        let mut seen = vec![false; self.board.len()];
        let mut placed = Vec::with_capacity(cells.len());
        for &(cell, value) in cells {
            let idx = self.board.grid().index_of(cell).ok_or(Error::OffBoard(cell))?;
            if std::mem::replace(&mut seen[idx], true) {
                return Err(Error::DuplicateCell(cell));
            }
            let occupant = match value {
                0 => None,
                1 | 2 => Some(Player::from_id(value)?),
                _ => return Err(Error::InvalidOccupant { cell, value }),
            };
            placed.push((idx, occupant));
        }

        self.board.clear();
        self.indexes.iter_mut().for_each(PositionIndex::clear);
        self.hash = if self.current == Player::Blue {
            self.board.grid().side_key()
        } else {
            0
        };
        for (idx, occupant) in placed {
            if let Some(player) = occupant {
                self.put(idx, player);
            }
        }
        Ok(())
    }

    #[inline]
    fn put(&mut self, idx: usize, player: Player) {
        self.board.set(idx, Some(player));
        self.indexes[player.slot()].insert(idx);
        self.hash ^= self.board.grid().key(idx, player);
    }

    #[inline]
    fn take(&mut self, idx: usize, player: Player) {
        self.board.set(idx, None);
        self.indexes[player.slot()].remove(idx);
        self.hash ^= self.board.grid().key(idx, player);
    }

    #[inline]
    fn shift(&mut self, src: usize, dst: usize, player: Player) {
        let grid = self.board.grid();
        self.hash ^= grid.key(src, player) ^ grid.key(dst, player);
        self.board.set(src, None);
        self.board.set(dst, Some(player));
        self.indexes[player.slot()].relocate(src, dst);
    }

    #[inline]
    fn flip(&mut self) {
        self.current = self.current.opponent();
        self.hash ^= self.board.grid().side_key();
    }

    fn index_of(&self, cell: Cell) -> usize {
        let idx = self.board.grid().index_of(cell);
        debug_assert!(idx.is_some(), "{cell} is off the board");
        idx.unwrap_or_default()
    }

    /// Play `action` for the side to move.
    ///
    /// `action` must be legal in this position. That is checked only in
    /// debug builds.
    pub fn apply(&mut self, action: Action) {
        debug_assert_eq!(action.kind(), self.kind, "{action} does not belong to {}", self.kind);
        debug_assert!(self.is_legal(action), "illegal action {action}");
        let player = self.current;
        match action {
            Action::Move(src, dst) => {
                let (src, dst) = (self.index_of(src), self.index_of(dst));
                self.shift(src, dst, player);
            }
            Action::Place(cell) => {
                let idx = self.index_of(cell);
                self.put(idx, player);
            }
        }
        self.flip();
    }

    /// Take back `action`, which must be the last action applied.
    pub fn undo(&mut self, action: Action) {
        self.flip();
        let player = self.current;
        match action {
            Action::Move(src, dst) => {
                let (src, dst) = (self.index_of(src), self.index_of(dst));
                self.shift(dst, src, player);
            }
            Action::Place(cell) => {
                let idx = self.index_of(cell);
                self.take(idx, player);
            }
        }
    }

    fn placements(&self, player: Player) -> impl Iterator<Item = usize> + '_ {
        gopher::placements(&self.board, self.index(player), self.index(player.opponent()), player)
    }

    /// Legal actions of the side to move, in enumeration order.
    pub fn legal_moves(&self) -> Vec<Action> {
        self.legal_moves_for(self.current)
    }

    /// Legal actions of `player` as if it were to move.
    pub fn legal_moves_for(&self, player: Player) -> Vec<Action> {
        let grid = self.board.grid();
        match self.kind {
            GameKind::Dodo => dodo::moves(&self.board, self.index(player), player)
                .map(|(src, dst)| Action::Move(grid.cell(src), grid.cell(dst)))
                .collect(),
            GameKind::Gopher => self
                .placements(player)
                .map(|idx| Action::Place(grid.cell(idx)))
                .collect(),
        }
    }

    /// Number of legal actions of `player`, without allocating.
    pub fn move_count(&self, player: Player) -> usize {
        match self.kind {
            GameKind::Dodo => dodo::moves(&self.board, self.index(player), player).count(),
            GameKind::Gopher => self.placements(player).count(),
        }
    }

    pub fn has_legal_move(&self, player: Player) -> bool {
        match self.kind {
            GameKind::Dodo => {
                dodo::moves(&self.board, self.index(player), player).next().is_some()
            }
            GameKind::Gopher => self.placements(player).next().is_some(),
        }
    }

    /// Whether `action` is legal for the side to move.
    pub fn is_legal(&self, action: Action) -> bool {
        if action.kind() != self.kind {
            return false;
        }
        let grid = self.board.grid();
        let player = self.current;
        match action {
            Action::Move(src, dst) => {
                let (Some(s), Some(d)) = (grid.index_of(src), grid.index_of(dst)) else {
                    return false;
                };
                self.board.get(s) == Some(player)
                    && self.board.get(d).is_none()
                    && grid.neighbors_of(s, dodo::heading(player)).any(|n| n == d)
            }
            Action::Place(cell) => grid
                .index_of(cell)
                .is_some_and(|idx| self.placements(player).any(|p| p == idx)),
        }
    }

    /// The game is over when the side to move has nothing to play.
    pub fn is_terminal(&self) -> bool {
        !self.has_legal_move(self.current)
    }

    /// Winner of a finished game, `None` while play continues.
    ///
    /// A blocked Dodo player wins; a blocked Gopher player loses.
    pub fn winner(&self) -> Option<Player> {
        if !self.is_terminal() {
            return None;
        }
        Some(self.kind.blocked_winner(self.current))
    }

    /// `+1` if `player` won, `-1` if it lost, `None` while play continues.
    pub fn terminal_score(&self, player: Player) -> Option<i32> {
        self.winner().map(|w| if w == player { 1 } else { -1 })
    }

    #[inline]
    pub fn kind(&self) -> GameKind {
        self.kind
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn index(&self, player: Player) -> &PositionIndex {
        &self.indexes[player.slot()]
    }

    #[inline]
    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn max_player(&self) -> Player {
        self.max_player
    }

    pub fn min_player(&self) -> Player {
        self.max_player.opponent()
    }

    pub fn radius(&self) -> i32 {
        self.board.radius()
    }

    /// Zobrist hash of stones plus side to move.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn set_time_left(&mut self, time_left: Duration) {
        self.time_left = time_left;
    }

    /// Number of stones on the board.
    pub fn stones(&self) -> usize {
        self.indexes[0].len() + self.indexes[1].len()
    }

    /// External encoding of the board, in enumeration order.
    pub fn to_cells(&self) -> Vec<CellState> {
        self.board
            .iter()
            .map(|(c, occ)| (c, occ.map_or(0, Player::id)))
            .collect()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f, "{} to move ({})", self.current, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_kind_parse() {
        assert_eq!("Dodo".parse::<GameKind>().unwrap(), GameKind::Dodo);
        assert_eq!("gopher".parse::<GameKind>().unwrap(), GameKind::Gopher);
        assert_eq!(
            "go".parse::<GameKind>().unwrap_err(),
            Error::UnknownGame("go".into())
        );
    }

    #[test]
    fn test_dodo_initial_layout() {
        let state = GameState::new_dodo(4, Player::Red).unwrap();
        assert_eq!(state.index(Player::Red).len(), 13);
        assert_eq!(state.index(Player::Blue).len(), 13);
        assert_eq!(state.board().len() - state.stones(), 11);
        assert_eq!(state.current_player(), Player::Red);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_position_index_relocate_and_remove() {
        let mut idx = PositionIndex::new(8);
        idx.insert(1);
        idx.insert(4);
        idx.insert(6);
        let before = idx.clone();

        idx.relocate(4, 5);
        assert!(idx.contains(5) && !idx.contains(4));
        assert_eq!(idx.iter().collect::<Vec<_>>(), vec![1, 5, 6]);
        idx.relocate(5, 4);
        assert_eq!(idx, before);

        idx.insert(7);
        idx.remove(7);
        assert_eq!(idx, before);

        idx.remove(1);
        assert_eq!(idx.iter().collect::<Vec<_>>(), vec![6, 4]);
        assert!(!idx.contains(1));
    }

    #[test]
    fn test_apply_undo_dodo() {
        let mut state = GameState::new_dodo(4, Player::Red).unwrap();
        let before = state.clone();
        for action in state.legal_moves() {
            state.apply(action);
            assert_eq!(state.current_player(), Player::Blue);
            assert_ne!(state.hash(), before.hash());
            state.undo(action);
            assert_eq!(state, before, "undo mismatch for {action}");
        }
    }

    #[test]
    fn test_gopher_first_move_anywhere() {
        let state = GameState::new_gopher(3, Player::Red).unwrap();
        assert_eq!(state.legal_moves().len(), 19);
    }

    #[test]
    fn test_from_cells_and_sync() {
        let base = GameState::new_dodo(3, Player::Red).unwrap();
        let cells = base.to_cells();
        let rebuilt = GameState::from_cells(GameKind::Dodo, 3, &cells, Player::Red).unwrap();
        assert_eq!(rebuilt, base);

        let mut state = GameState::new_gopher(3, Player::Red).unwrap();
        state.sync(&cells, Player::Blue, Duration::from_secs(10)).unwrap();
        assert_eq!(state.current_player(), Player::Blue);
        assert_eq!(state.max_player(), Player::Blue);
        assert_eq!(state.stones(), base.stones());
        assert_eq!(state.time_left(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_rejects_bad_input() {
        let mut state = GameState::new_gopher(2, Player::Red).unwrap();
        let off = Cell::new(5, 5);
        assert_eq!(
            state.sync(&[(off, 1)], Player::Red, Duration::ZERO),
            Err(Error::OffBoard(off))
        );
        let c = Cell::new(0, 0);
        assert_eq!(
            state.sync(&[(c, 7)], Player::Red, Duration::ZERO),
            Err(Error::InvalidOccupant { cell: c, value: 7 })
        );
    }

    #[test]
    fn test_load_rejects_duplicate_cells() {
        let mut state = GameState::new_dodo(3, Player::Red).unwrap();
        let before = state.clone();
        let c = Cell::new(0, 0);
        assert_eq!(
            state.sync(&[(c, 1), (c, 2)], Player::Red, Duration::ZERO),
            Err(Error::DuplicateCell(c))
        );
        assert_eq!(state, before);

        let cells = [(c, 1), (Cell::new(1, 0), 0), (c, 0)];
        assert_eq!(
            GameState::from_cells(GameKind::Gopher, 2, &cells, Player::Red),
            Err(Error::DuplicateCell(c))
        );
    }

    #[test]
    fn test_sync_hash_matches_fresh_build() {
        let mut played = GameState::new_dodo(3, Player::Red).unwrap();
        let first = played.legal_moves()[0];
        played.apply(first);

        let mut synced = GameState::new_dodo(3, Player::Red).unwrap();
        synced
            .sync(&played.to_cells(), Player::Blue, Duration::ZERO)
            .unwrap();
        assert_eq!(synced.hash(), played.hash());
    }

    #[test]
    fn test_is_legal() {
        let state = GameState::new_dodo(4, Player::Red).unwrap();
        let legal = state.legal_moves();
        assert!(legal.iter().all(|&a| state.is_legal(a)));
        assert!(!state.is_legal(Action::Place(Cell::new(0, 0))));
        assert!(!state.is_legal(Action::Move(Cell::new(0, 0), Cell::new(1, 1))));
    }
}
