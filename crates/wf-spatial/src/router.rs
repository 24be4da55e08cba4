//! Routing trait and default A* implementation.
//!
//! # Pluggability
//!
//! The dispatcher and every robot call routing through the [`Router`] trait,
//! so applications can swap in other search strategies (congestion-aware,
//! precomputed tables) without touching the dispatcher.  The default
//! [`AStarRouter`] is an 8-connected A* over the [`GridMap`].
//!
//! # Cost units
//!
//! Search costs use the integer diagonal-distance metric (straight = 10,
//! diagonal = 14).  `Route::distance()` reports the Euclidean length in cells,
//! which is what battery drain and travel time are computed from.
//!
//! # Concurrency
//!
//! A search allocates its own bookkeeping (`g` costs, parents, closed set)
//! indexed by cell position and never writes to the shared map, so a single
//! router may be used from many threads at once without locking.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use wf_core::{DIAGONAL_COST, GridPos, STRAIGHT_COST};

use crate::{GridMap, SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Where the route starts (not part of `cells`).
    pub from: GridPos,
    /// Cells to step through in order, start exclusive, goal inclusive.
    pub cells: Vec<GridPos>,
    /// Total search cost in router units (straight 10, diagonal 14).
    pub cost: u32,
}

impl Route {
    /// `true` if the source and destination are the same cell.
    pub fn is_trivial(&self) -> bool {
        self.cells.is_empty()
    }

    /// Euclidean length of the route in cells.
    pub fn distance(&self) -> f64 {
        let mut prev = self.from;
        let mut total = 0.0;
        for &cell in &self.cells {
            total += prev.euclidean_to(cell);
            prev = cell;
        }
        total
    }

    /// Final cell of the route (the start for a trivial route).
    pub fn destination(&self) -> GridPos {
        self.cells.last().copied().unwrap_or(self.from)
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: one router is shared by the
/// dispatcher's feasibility checks and every robot thread concurrently.
pub trait Router: Send + Sync {
    /// Compute a shortest walkable route from `from` to `to`.
    ///
    /// The goal cell is always enterable even when it is occupied (stations,
    /// shelves).  Returns [`SpatialError::NoRoute`] if the goal cannot be
    /// reached; `from == to` yields a trivial route rather than an error.
    fn route(&self, map: &GridMap, from: GridPos, to: GridPos) -> SpatialResult<Route>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// Classic A* with an octile heuristic.
///
/// The heuristic equals the exact open-grid step cost, so it is admissible
/// and consistent and each cell is expanded at most once.  Ties on total
/// cost `f` are broken by the smaller remaining estimate `h` (prefer nodes
/// closer to the goal), then by cell index for determinism.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarRouter;

impl Router for AStarRouter {
    fn route(&self, map: &GridMap, from: GridPos, to: GridPos) -> SpatialResult<Route> {
        astar(map, from, to)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

const UNREACHED: u32 = u32::MAX;
const NO_PARENT: usize = usize::MAX;

#[inline]
fn step_cost(a: GridPos, b: GridPos) -> u32 {
    if a.x != b.x && a.y != b.y { DIAGONAL_COST } else { STRAIGHT_COST }
}

fn astar(map: &GridMap, from: GridPos, to: GridPos) -> SpatialResult<Route> {
    let start = map.index_of(from).ok_or(SpatialError::OutOfBounds(from))?;
    let goal = map.index_of(to).ok_or(SpatialError::OutOfBounds(to))?;

    if start == goal {
        return Ok(Route { from, cells: vec![], cost: 0 });
    }

    let n = map.cell_count();
    let mut g      = vec![UNREACHED; n];
    let mut parent = vec![NO_PARENT; n];
    let mut closed = vec![false; n];

    // Min-heap on (f, h, index).  Reverse turns BinaryHeap's max-heap around.
    let mut open: BinaryHeap<Reverse<(u32, u32, usize)>> = BinaryHeap::new();
    let h0 = from.octile_cost_to(to);
    g[start] = 0;
    open.push(Reverse((h0, h0, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        // Stale duplicates of an already expanded cell.
        if closed[current] {
            continue;
        }
        if current == goal {
            return Ok(reconstruct(map, &parent, from, goal, g[goal]));
        }
        closed[current] = true;

        let pos = map.pos_of(current);
        for next in map.neighbors(pos) {
            if next != to && !map.is_walkable(next) {
                continue;
            }
            let Some(ni) = map.index_of(next) else { continue };
            if closed[ni] {
                continue;
            }
            let tentative = g[current] + step_cost(pos, next);
            if tentative < g[ni] {
                g[ni] = tentative;
                parent[ni] = current;
                let h = next.octile_cost_to(to);
                open.push(Reverse((tentative + h, h, ni)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(map: &GridMap, parent: &[usize], from: GridPos, goal: usize, cost: u32) -> Route {
    let mut cells = Vec::new();
    let mut cur = goal;
    while parent[cur] != NO_PARENT {
        cells.push(map.pos_of(cur));
        cur = parent[cur];
    }
    cells.reverse();
    Route { from, cells, cost }
}
