//! Grid map representation and builder.
//!
//! # Data layout
//!
//! Cells are stored row-major in a single `Vec<Cell>`; the cell at `(x, y)`
//! lives at index `y * width + x`.  The map is built once at startup and
//! never mutated, so it can be shared behind an `Arc` by every robot thread
//! and the dispatcher without locking.

use wf_core::GridPos;

use crate::{Cell, Occupant, SpatialError, SpatialResult};

/// 8-connected neighbour offsets, orthogonal first.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Fixed-size 2-D warehouse floor.
///
/// Do not construct directly; use [`GridMapBuilder`] or
/// [`FloorPlan::parse`][crate::FloorPlan::parse].
#[derive(Clone, Debug)]
pub struct GridMap {
    width:  u32,
    height: u32,
    cells:  Vec<Cell>,
}

impl GridMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Row-major index of `pos`, or `None` when out of bounds.
    #[inline]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// Position of the cell stored at `index`.
    #[inline]
    pub fn pos_of(&self, index: usize) -> GridPos {
        self.cells[index].pos
    }

    /// Cell lookup by position.
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    /// `true` if `pos` is in bounds and walkable.
    #[inline]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|c| c.walkable)
    }

    /// In-bounds 8-connected neighbours of `pos` (fewer at edges and corners).
    pub fn neighbors(&self, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        NEIGHBOR_OFFSETS
            .iter()
            .map(move |&(dx, dy)| GridPos::new(pos.x + dx, pos.y + dy))
            .filter(|&n| self.in_bounds(n))
    }

    /// Every cell holding `occupant`, in row-major order.
    pub fn positions_of(&self, occupant: Occupant) -> Vec<GridPos> {
        self.cells
            .iter()
            .filter(|c| c.occupant == occupant)
            .map(|c| c.pos)
            .collect()
    }

    /// Iterator over all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

// ── GridMapBuilder ────────────────────────────────────────────────────────────

/// Construct a [`GridMap`] by placing occupants, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use wf_core::GridPos;
/// use wf_spatial::{GridMapBuilder, Occupant};
///
/// let mut b = GridMapBuilder::new(4, 3);
/// b.place(GridPos::new(1, 1), Occupant::Shelf).unwrap();
/// let map = b.build();
/// assert!(!map.is_walkable(GridPos::new(1, 1)));
/// assert!(map.is_walkable(GridPos::new(0, 0)));
/// ```
pub struct GridMapBuilder {
    width:  u32,
    height: u32,
    cells:  Vec<Cell>,
}

impl GridMapBuilder {
    /// All cells start out empty and walkable.
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(Cell::new(GridPos::new(x, y), Occupant::Empty));
            }
        }
        Self { width, height, cells }
    }

    /// Put `occupant` on `pos`.  Each cell can be assigned once.
    pub fn place(&mut self, pos: GridPos, occupant: Occupant) -> SpatialResult<&mut Self> {
        let in_bounds = pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.width
            && (pos.y as u32) < self.height;
        if !in_bounds {
            return Err(SpatialError::OutOfBounds(pos));
        }
        let idx = pos.y as usize * self.width as usize + pos.x as usize;
        if self.cells[idx].occupant != Occupant::Empty {
            return Err(SpatialError::AlreadyOccupied(pos));
        }
        self.cells[idx] = Cell::new(pos, occupant);
        Ok(self)
    }

    pub fn build(self) -> GridMap {
        GridMap {
            width:  self.width,
            height: self.height,
            cells:  self.cells,
        }
    }
}
