//! Task execution scripts.
//!
//! One function per [`TaskKind`]; [`execute`] dispatches on the tag.  Station
//! requests happen just in time, when the robot actually needs the station,
//! and every acquired station is wrapped in a [`StationLease`].

use tracing::debug;

use wf_core::{GridPos, ProductId};
use wf_station::{Station, StationKind};

use crate::{
    FleetControl, Robot, RobotState, StationLease, StationWait, Task, TaskError, TaskKind,
    TaskResult,
};

/// Run `task` on `robot` to completion or first failure.
pub fn execute(task: &Task, robot: &Robot, control: &dyn FleetControl) -> TaskResult<()> {
    match &task.kind {
        TaskKind::PickOrder { shelf, .. } => pick_order(robot, control, *shelf),
        TaskKind::Stock { loading, product, quantity, shelf } => {
            stock(robot, control, *loading, *product, *quantity, *shelf)
        }
        TaskKind::Charge { station } => charge(robot, control, *station),
        TaskKind::ReturnToStart => go_to(robot, control, robot.home()),
        TaskKind::GoWaitForCharge { station } => go_wait_for_charge(robot, control, *station),
    }
}

fn go_to(robot: &Robot, control: &dyn FleetControl, target: GridPos) -> TaskResult<()> {
    let route = control.request_path(robot, target)?;
    robot.move_along(&route, control.config())?;
    Ok(())
}

fn pick_order(robot: &Robot, control: &dyn FleetControl, shelf: GridPos) -> TaskResult<()> {
    let config = control.config();
    go_to(robot, control, shelf)?;
    robot.pick(config)?;

    robot.set_state(RobotState::WaitingForPacking);
    let station = control
        .request_station(StationKind::Packing, robot, StationWait::Forever)?
        .ok_or(TaskError::Cancelled)?;
    let lease = StationLease::new(station, control);
    debug!(robot = %robot.id(), station = %station.id, "packing station acquired");

    go_to(robot, control, station.pos)?;
    robot.drop_off(config)?;
    lease.release();
    Ok(())
}

fn stock(
    robot:    &Robot,
    control:  &dyn FleetControl,
    loading:  Station,
    product:  ProductId,
    quantity: u32,
    shelf:    GridPos,
) -> TaskResult<()> {
    let config = control.config();
    go_to(robot, control, loading.pos)?;

    robot.set_state(RobotState::WaitingForLoading);
    let station = control.acquire_station(loading, robot)?;
    let lease = StationLease::new(station, control);
    robot.pick(config)?;
    lease.release();

    go_to(robot, control, shelf)?;
    robot.drop_off(config)?;
    control.increase_quantity(product, quantity)
}

fn charge(robot: &Robot, control: &dyn FleetControl, station: Station) -> TaskResult<()> {
    // The dispatcher acquired the station for us; we own it from here on.
    let lease = StationLease::new(station, control);
    go_to(robot, control, station.pos)?;
    robot.charge(control.config())?;
    lease.release();
    Ok(())
}

fn go_wait_for_charge(
    robot:   &Robot,
    control: &dyn FleetControl,
    nearest: Station,
) -> TaskResult<()> {
    let config = control.config();
    go_to(robot, control, nearest.pos)?;

    robot.set_state(RobotState::WaitingForCharge);
    let wait = config.charge_wait();
    let Some(station) =
        control.request_station(StationKind::Charging, robot, StationWait::Timeout(wait))?
    else {
        return Err(TaskError::ChargeTimeout(wait));
    };
    let lease = StationLease::new(station, control);
    // Any charger will do; it may not be the one we parked at.
    go_to(robot, control, station.pos)?;
    robot.charge(config)?;
    lease.release();
    Ok(())
}
