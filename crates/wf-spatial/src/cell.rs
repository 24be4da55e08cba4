//! Grid cells and what occupies them.

use wf_core::GridPos;

/// What sits on a cell.  Exactly one occupant per cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Occupant {
    /// Open floor (default for every unassigned cell).
    #[default]
    Empty,
    Shelf,
    PackingBay,
    LoadingBay,
    ChargingBay,
    /// A robot's starting cell.  Robots are not obstacles to each other.
    Robot,
    /// Structural obstacle with no other role.
    Wall,
}

impl Occupant {
    /// Whether a robot may pass through a cell with this occupant.
    #[inline]
    pub fn is_walkable(self) -> bool {
        matches!(self, Occupant::Empty | Occupant::Robot)
    }

    /// Single-character symbol used by [`FloorPlan`][crate::FloorPlan].
    pub fn symbol(self) -> char {
        match self {
            Occupant::Empty       => '.',
            Occupant::Shelf       => 'S',
            Occupant::PackingBay  => 'P',
            Occupant::LoadingBay  => 'L',
            Occupant::ChargingBay => 'C',
            Occupant::Robot       => 'R',
            Occupant::Wall        => '#',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Occupant> {
        Some(match symbol {
            '.' => Occupant::Empty,
            'S' => Occupant::Shelf,
            'P' => Occupant::PackingBay,
            'L' => Occupant::LoadingBay,
            'C' => Occupant::ChargingBay,
            'R' => Occupant::Robot,
            '#' => Occupant::Wall,
            _ => return None,
        })
    }
}

/// One floor cell.  Immutable once the map is built.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub pos:      GridPos,
    pub occupant: Occupant,
    pub walkable: bool,
}

impl Cell {
    pub fn new(pos: GridPos, occupant: Occupant) -> Self {
        Self { pos, occupant, walkable: occupant.is_walkable() }
    }
}
