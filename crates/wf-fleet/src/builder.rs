//! Fluent builder for constructing a [`Fleet`].

use std::sync::Arc;

use tracing::info;

use wf_core::{FleetConfig, RobotId};
use wf_dispatch::{DispatchObserver, Dispatcher, InventoryStore, MemoryInventory};
use wf_robot::Robot;
use wf_spatial::{AStarRouter, FloorPlan, Router};

use crate::{Fleet, FleetError, FleetResult};

/// Fluent builder for [`Fleet<R>`].
///
/// # Required inputs
///
/// - [`FleetConfig`]: time unit, battery costs, timeouts
/// - [`FloorPlan`]: the map plus robot and station positions
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                         |
/// |-------------------|---------------------------------|
/// | `.router(r)`      | `AStarRouter`                   |
/// | `.inventory(i)`   | empty `MemoryInventory`         |
/// | `.observer(o)`    | `NoopObserver`                  |
/// | `.battery(v)`     | every robot at 100 %            |
///
/// Robot ids follow the row-major order of `R` cells in the plan.
///
/// # Example
///
/// ```rust,ignore
/// let plan = FloorPlan::parse(FLOOR)?;
/// let mut fleet = FleetBuilder::new(FleetConfig::default(), plan)
///     .inventory(Arc::new(inventory))
///     .build()?;
/// fleet.start()?;
/// fleet.create_order(ProductId(1), 2)?;
/// ```
pub struct FleetBuilder<R: Router = AStarRouter> {
    config:    FleetConfig,
    plan:      FloorPlan,
    router:    R,
    inventory: Option<Arc<dyn InventoryStore>>,
    observer:  Option<Arc<dyn DispatchObserver>>,
    battery:   Option<Vec<f64>>,
}

impl FleetBuilder<AStarRouter> {
    pub fn new(config: FleetConfig, plan: FloorPlan) -> Self {
        Self {
            config,
            plan,
            router:    AStarRouter,
            inventory: None,
            observer:  None,
            battery:   None,
        }
    }
}

impl<R: Router + 'static> FleetBuilder<R> {
    /// Route with `router` instead of the default A*.
    pub fn router<R2: Router + 'static>(self, router: R2) -> FleetBuilder<R2> {
        FleetBuilder {
            config:    self.config,
            plan:      self.plan,
            router,
            inventory: self.inventory,
            observer:  self.observer,
            battery:   self.battery,
        }
    }

    pub fn inventory(mut self, inventory: Arc<dyn InventoryStore>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Initial battery per robot (must match the robot count).  Values are
    /// clamped into `0..=100`.
    pub fn battery(mut self, levels: Vec<f64>) -> Self {
        self.battery = Some(levels);
        self
    }

    /// Validate inputs, create the robots and the dispatcher.  No thread is
    /// started until [`Fleet::start`].
    pub fn build(self) -> FleetResult<Fleet<R>> {
        self.config.validate()?;
        let robot_count = self.plan.robots.len();
        if robot_count == 0 {
            return Err(FleetError::NoRobots);
        }

        let battery = match self.battery {
            Some(levels) => {
                if levels.len() != robot_count {
                    return Err(FleetError::RobotCountMismatch {
                        expected: robot_count,
                        got:      levels.len(),
                        what:     "battery levels",
                    });
                }
                levels
            }
            None => vec![100.0; robot_count],
        };

        let robots: Vec<Arc<Robot>> = self
            .plan
            .robots
            .iter()
            .zip(battery)
            .enumerate()
            .map(|(i, (&home, level))| Arc::new(Robot::new(RobotId(i as u32), home, level)))
            .collect();

        let inventory = self
            .inventory
            .unwrap_or_else(|| Arc::new(MemoryInventory::new()));
        let mut dispatcher =
            Dispatcher::new(self.config, &self.plan, self.router, robots, inventory)?;
        if let Some(observer) = self.observer {
            dispatcher = dispatcher.with_observer(observer);
        }

        info!(
            robots = robot_count,
            width = self.plan.map.width(),
            height = self.plan.map.height(),
            "fleet built"
        );
        Ok(Fleet::new(dispatcher))
    }
}
