//! Station identity and kind.

use wf_core::{GridPos, StationId};

/// The three kinds of scarce floor resource.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StationKind {
    Charging,
    Packing,
    Loading,
}

impl StationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StationKind::Charging => "charging",
            StationKind::Packing  => "packing",
            StationKind::Loading  => "loading",
        }
    }
}

impl std::fmt::Display for StationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A station on the floor.  Created at floor initialization and never
/// destroyed; ownership moves between its pool and at most one task.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Station {
    pub id:   StationId,
    pub kind: StationKind,
    pub pos:  GridPos,
}

impl Station {
    pub fn new(id: StationId, kind: StationKind, pos: GridPos) -> Self {
        Self { id, kind, pos }
    }
}

impl std::fmt::Display for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} at {}", self.kind, self.id, self.pos)
    }
}
