//! Grid coordinates and the distance metrics used by routing and energy
//! accounting.

/// Cost of an orthogonal step in router units.
pub const STRAIGHT_COST: u32 = 10;

/// Cost of a diagonal step in router units (≈ 10·√2).
pub const DIAGONAL_COST: u32 = 14;

/// A cell coordinate on the warehouse floor.  `x` is the column, `y` the row.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance in cells.  Used for per-step battery drain and
    /// travel time, so a diagonal step costs √2.
    #[inline]
    pub fn euclidean_to(self, other: GridPos) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Diagonal-distance metric with straight = 10, diagonal = 14.
    ///
    /// This is the exact cost of the cheapest 8-connected path on an open
    /// grid, which makes it an admissible and consistent A* heuristic.
    #[inline]
    pub fn octile_cost_to(self, other: GridPos) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let diag = dx.min(dy);
        let straight = dx.max(dy) - diag;
        DIAGONAL_COST * diag + STRAIGHT_COST * straight
    }

    /// `true` if `other` is one of the 8 neighbours of `self`.
    #[inline]
    pub fn is_adjacent(self, other: GridPos) -> bool {
        self != other && self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
