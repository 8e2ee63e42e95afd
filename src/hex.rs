//! Axial hexagonal coordinates and board geometry.
//!
//! Cells are addressed by axial pairs `(q, r)`. The six neighbor offsets are
//! `(±1, 0)`, `(0, ±1)` and `(1, 1)`, `(-1, -1)`, so a hexagon of side `n`
//! is the set of cells with `|q| < n`, `|r| < n` and `|q - r| < n`.
//!
//! [`HexGrid`] is the immutable part of a board: which cells exist, the
//! order they enumerate in, their precomputed neighbor links, and the
//! Zobrist keys used to hash positions. It is built once and shared.

use std::fmt;

use crate::board::Player;
use crate::constants::{MAX_RADIUS, MIN_RADIUS, ZOBRIST_SEED};
use crate::error::{Error, Result};

/// A cell in axial coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub q: i32,
    pub r: i32,
}

impl Cell {
    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Step along a single offset. No bounds checking.
    #[inline]
    pub const fn offset(self, (dq, dr): Direction) -> Self {
        Self::new(self.q + dq, self.r + dr)
    }

    /// Distance to the origin, in moves. Saturates instead of overflowing.
    #[inline]
    pub fn distance_to_center(self) -> i32 {
        let diagonal = self.q.saturating_sub(self.r).saturating_abs();
        self.q.saturating_abs().max(self.r.saturating_abs()).max(diagonal)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((q, r): (i32, i32)) -> Self {
        Self::new(q, r)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// A neighbor offset `(dq, dr)`.
pub type Direction = (i32, i32);

/// The six offsets. The first three point "down", the last three "up".
pub const ALL_DIRECTIONS: [Direction; 6] = [(0, -1), (-1, -1), (-1, 0), (1, 0), (1, 1), (0, 1)];

/// Offsets available to a player moving down the board.
pub const DOWN_DIRECTIONS: &[Direction] = &[(0, -1), (-1, -1), (-1, 0)];

/// Offsets available to a player moving up the board.
pub const UP_DIRECTIONS: &[Direction] = &[(1, 0), (1, 1), (0, 1)];

/// A direction set, as a slice of [`ALL_DIRECTIONS`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Down,
    All,
}

impl Heading {
    /// The offsets of this set, in enumeration order.
    #[inline]
    pub fn directions(self) -> &'static [Direction] {
        &ALL_DIRECTIONS[self.slots()]
    }

    /// Positions of this set inside [`ALL_DIRECTIONS`], matching the layout of
    /// the neighbor links of [`HexGrid`].
    #[inline]
    pub fn slots(self) -> std::ops::Range<usize> {
        match self {
            Heading::Down => 0..3,
            Heading::Up => 3..6,
            Heading::All => 0..6,
        }
    }
}

/// Neighbors of `cell` along each offset of `directions`.
///
/// Pure and total: off-board cells are returned as well, callers check
/// membership themselves.
pub fn neighbors(cell: Cell, directions: &[Direction]) -> impl Iterator<Item = Cell> + '_ {
    directions.iter().map(move |&d| cell.offset(d))
}

/// Convert a cell to `(row, col)` display coordinates on a board of side `n`.
///
/// Row 0 holds the largest `q`; columns grow with `r`.
pub fn to_display(cell: Cell, n: i32) -> (i32, i32) {
    (n - 1 - cell.q, cell.r + n - 1)
}

/// Inverse of [`to_display`].
pub fn from_display(row: i32, col: i32, n: i32) -> Cell {
    Cell::new(n - 1 - row, col - n + 1)
}

/// Zobrist key for a `(cell, slot)` pair. Slots 0 and 1 are the two players;
/// derived from coordinates rather than enumeration order so two grids
/// holding the same cells hash identically.
fn zobrist_key(cell: Cell, slot: u64) -> u64 {
    let seed = ZOBRIST_SEED
        ^ (cell.q as u32 as u64).rotate_left(40)
        ^ (cell.r as u32 as u64).rotate_left(16)
        ^ slot;
    fastrand::Rng::with_seed(seed).u64(..)
}

/// Immutable board geometry.
#[derive(Clone, Debug)]
pub struct HexGrid {
    /// Hexagon side length (the "radius" of the board)
    radius: i32,
    /// Cells in enumeration order
    cells: Vec<Cell>,
    /// Bounding box of `cells`, used for O(1) lookup
    min_q: i32,
    min_r: i32,
    width: i32,
    height: i32,
    /// Bounding-box slot -> cell index
    lookup: Vec<Option<usize>>,
    /// For each cell, the index of its neighbor along each of [`ALL_DIRECTIONS`]
    links: Vec<[Option<usize>; 6]>,
    /// Moves from each cell to the outer ring
    edge_distance: Vec<i32>,
    /// Zobrist keys, one per (cell, player)
    keys: Vec<[u64; 2]>,
    side_key: u64,
}

impl HexGrid {
    /// Full hexagon of side `radius`.
    ///
    /// Cells enumerate row by row, `r` descending and `q` ascending.
    pub fn hexagon(radius: i32) -> Result<Self> {
        if !(MIN_RADIUS..=MAX_RADIUS).contains(&radius) {
            return Err(Error::InvalidRadius(radius));
        }
        let h = radius - 1;
        let mut cells = Vec::new();
        for r in (-h..=h).rev() {
            for q in (-h).max(r - h)..=h.min(r + h) {
                cells.push(Cell::new(q, r));
            }
        }
        Ok(Self::build(radius, cells))
    }

    /// Grid holding exactly the supplied cells, all of which must lie on the
    /// hexagon of side `radius`.
    pub fn from_cells(radius: i32, cells: impl IntoIterator<Item = Cell>) -> Result<Self> {
        if !(MIN_RADIUS..=MAX_RADIUS).contains(&radius) {
            return Err(Error::InvalidRadius(radius));
        }
        let mut unique: Vec<Cell> = Vec::new();
        for cell in cells {
            if cell.distance_to_center() >= radius {
                return Err(Error::OffBoard(cell));
            }
            if !unique.contains(&cell) {
                unique.push(cell);
            }
        }
        Ok(Self::build(radius, unique))
    }

    fn build(radius: i32, cells: Vec<Cell>) -> Self {
        let min_q = cells.iter().map(|c| c.q).min().unwrap_or(0);
        let max_q = cells.iter().map(|c| c.q).max().unwrap_or(0);
        let min_r = cells.iter().map(|c| c.r).min().unwrap_or(0);
        let max_r = cells.iter().map(|c| c.r).max().unwrap_or(0);
        // cells lie within MAX_RADIUS of the origin, so the box stays small
        let width = max_q - min_q + 1;
        let height = max_r - min_r + 1;
        let slots = width as usize * height as usize;

        let mut grid = Self {
            radius,
            cells,
            min_q,
            min_r,
            width,
            height,
            lookup: vec![None; slots],
            links: Vec::new(),
            edge_distance: Vec::new(),
            keys: Vec::new(),
            side_key: zobrist_key(Cell::new(0, 0), 2),
        };

        for (idx, &cell) in grid.cells.iter().enumerate() {
            let slot = grid.slot(cell).unwrap_or_default();
            grid.lookup[slot] = Some(idx);
        }

        let links = grid
            .cells
            .iter()
            .map(|&cell| std::array::from_fn(|i| grid.index_of(cell.offset(ALL_DIRECTIONS[i]))))
            .collect();
        grid.links = links;

        grid.edge_distance = grid
            .cells
            .iter()
            .map(|c| (radius - 1 - c.distance_to_center()).max(0))
            .collect();

        grid.keys = grid
            .cells
            .iter()
            .map(|&c| [zobrist_key(c, 0), zobrist_key(c, 1)])
            .collect();

        grid
    }

    #[inline]
    fn slot(&self, cell: Cell) -> Option<usize> {
        let dq = cell.q - self.min_q;
        let dr = cell.r - self.min_r;
        if dq < 0 || dr < 0 || dq >= self.width || dr >= self.height {
            return None;
        }
        Some((dr * self.width + dq) as usize)
    }

    /// Index of `cell`, or `None` when it is not on the board.
    #[inline]
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        self.slot(cell).and_then(|s| self.lookup[s])
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.index_of(cell).is_some()
    }

    /// Cell at index `idx`.
    #[inline]
    pub fn cell(&self, idx: usize) -> Cell {
        self.cells[idx]
    }

    /// All cells in enumeration order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// On-board neighbors of `idx` within `heading`.
    #[inline]
    pub fn neighbors_of(&self, idx: usize, heading: Heading) -> impl Iterator<Item = usize> + '_ {
        self.links[idx][heading.slots()].iter().filter_map(|&n| n)
    }

    #[inline]
    pub fn edge_distance(&self, idx: usize) -> i32 {
        self.edge_distance[idx]
    }

    #[inline]
    pub fn key(&self, idx: usize, player: Player) -> u64 {
        self.keys[idx][player.slot()]
    }

    #[inline]
    pub fn side_key(&self) -> u64 {
        self.side_key
    }
}
