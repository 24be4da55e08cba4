//! Logical robot state and the mutable status snapshot.

use wf_core::{GridPos, TaskId};

/// What a robot is doing right now, for observability.
///
/// The dispatcher never branches on this; matching decisions use position
/// and battery only.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RobotState {
    #[default]
    Idle,
    Moving,
    Picking,
    /// Dropping items at a packing station or a shelf.
    Packing,
    Charging,
    WaitingForPacking,
    WaitingForCharge,
    /// Parked at a loading station until it is free.
    WaitingForLoading,
}

impl RobotState {
    pub fn as_str(self) -> &'static str {
        match self {
            RobotState::Idle              => "idle",
            RobotState::Moving            => "moving",
            RobotState::Picking           => "picking",
            RobotState::Packing           => "packing",
            RobotState::Charging          => "charging",
            RobotState::WaitingForPacking => "waiting-for-packing",
            RobotState::WaitingForCharge  => "waiting-for-charge",
            RobotState::WaitingForLoading => "waiting-for-loading",
        }
    }
}

impl std::fmt::Display for RobotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything about a robot that changes during a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotStatus {
    pub position:    GridPos,
    /// Battery percentage, always within `0.0..=100.0`.
    pub battery:     f64,
    pub state:       RobotState,
    pub active_task: Option<TaskId>,
}

impl RobotStatus {
    pub fn new(position: GridPos, battery: f64) -> Self {
        Self {
            position,
            battery: clamp_battery(battery),
            state: RobotState::Idle,
            active_task: None,
        }
    }
}

/// Clamp a battery level into `0..=100`; NaN becomes empty.
#[inline]
pub fn clamp_battery(level: f64) -> f64 {
    if level.is_nan() { 0.0 } else { level.clamp(0.0, 100.0) }
}
