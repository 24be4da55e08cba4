//! Work items executed by robots.
//!
//! A `Task` is immutable once created.  External work (orders, stock
//! requests) is created by the dispatcher after validation; the remaining
//! variants are created internally when a robot finishes something.

use wf_core::{GridPos, ProductId, TaskId};
use wf_station::Station;

/// The five task variants, each carrying only what its script needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskKind {
    /// Fetch `quantity` of `product` from `shelf` and drop it at a packing
    /// station acquired on arrival.
    PickOrder {
        product:  ProductId,
        quantity: u32,
        shelf:    GridPos,
    },

    /// Collect `quantity` of `product` at `loading` and put it on `shelf`.
    Stock {
        loading:  Station,
        product:  ProductId,
        quantity: u32,
        shelf:    GridPos,
    },

    /// Charge at a station the dispatcher already holds for this robot.
    Charge { station: Station },

    /// Drive back to the home cell.
    ReturnToStart,

    /// Drive to `station` and wait a bounded time for any free charging
    /// station.
    GoWaitForCharge { station: Station },
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::PickOrder { .. }       => "pick-order",
            TaskKind::Stock { .. }           => "stock",
            TaskKind::Charge { .. }          => "charge",
            TaskKind::ReturnToStart          => "return-to-start",
            TaskKind::GoWaitForCharge { .. } => "go-wait-for-charge",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Task {
    pub id:          TaskId,
    pub description: String,
    pub kind:        TaskKind,
}

impl Task {
    pub fn new(id: TaskId, kind: TaskKind) -> Self {
        let description = match &kind {
            TaskKind::PickOrder { product, quantity, shelf } => {
                format!("pick {quantity} x {product} from shelf {shelf}")
            }
            TaskKind::Stock { loading, product, quantity, shelf } => {
                format!("stock {quantity} x {product} from {} to shelf {shelf}", loading.id)
            }
            TaskKind::Charge { station } => format!("charge at {}", station.id),
            TaskKind::ReturnToStart => "return to start".to_owned(),
            TaskKind::GoWaitForCharge { station } => {
                format!("go to {} and wait for a charger", station.id)
            }
        };
        Self { id, description, kind }
    }

    /// Whether the dispatcher must check battery feasibility before
    /// assigning this task.  Internal housekeeping tasks skip the check.
    pub fn needs_feasibility(&self) -> bool {
        matches!(self.kind, TaskKind::PickOrder { .. } | TaskKind::Stock { .. })
    }

    /// The first location the task drives to, if it is known up front.
    pub fn first_target(&self) -> Option<GridPos> {
        match &self.kind {
            TaskKind::PickOrder { shelf, .. } => Some(*shelf),
            TaskKind::Stock { loading, .. } => Some(loading.pos),
            TaskKind::Charge { station } | TaskKind::GoWaitForCharge { station } => {
                Some(station.pos)
            }
            TaskKind::ReturnToStart => None,
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.id, self.kind.label())
    }
}
