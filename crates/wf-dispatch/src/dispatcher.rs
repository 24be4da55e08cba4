//! The dispatcher: matching work to robots and managing scarce stations.
//!
//! # Bookkeeping
//!
//! All matching state lives in one `Book` behind one mutex, the decision
//! lock:
//!
//! | Field         | Meaning                                               |
//! |---------------|-------------------------------------------------------|
//! | `available`   | idle robots that may receive new work                 |
//! | `pending`     | tasks no feasible robot could take, in arrival order  |
//! | `outstanding` | tasks pushed to each robot's inbox and not reported   |
//!
//! Submissions, completion reports and idle-timeout charge requests all take
//! the decision lock, so they are serialized against each other.  Station
//! pools synchronize themselves: the dispatcher may call into a pool while
//! holding the decision lock, but a pool never calls back, and robots
//! release stations without touching the decision lock unless the station
//! is handed to a queued charge-waiter.
//!
//! # Robot lifecycle
//!
//! ```text
//! AVAILABLE ──submit──▶ ASSIGNED ──finish──▶ (pending task?) ASSIGNED
//!                                       └──▶ (low battery)  CHARGE-PENDING ─▶ CHARGING
//!                                       └──▶ RETURNING ─▶ AVAILABLE
//! ```
//!
//! A robot only re-enters this decision once its `outstanding` count drops
//! to zero, so several queued tasks (e.g. a hand-off `Charge` arriving
//! while the robot drives home) never double-book it.
//!
//! # Feasibility
//!
//! A pick order or stock task is feasible for a robot when its battery
//! covers the worst case of the whole job plus the drive to a charger
//! afterwards, all measured in routed distance:
//!
//! ```text
//! pick order: robot → shelf + shelf → farthest packing + that packing → farthest charger
//! stock:      robot → loading + loading → shelf + shelf → farthest charger
//! ```
//!
//! Anything unreachable makes the pairing infeasible.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use wf_core::{
    BlockingQueue, FleetConfig, GridPos, ProductId, RobotId, StationId, TaskId,
};
use wf_robot::{FleetControl, Robot, StationWait, Task, TaskError, TaskKind, TaskResult};
use wf_spatial::{AStarRouter, FloorPlan, GridMap, Route, Router, SpatialResult};
use wf_station::{Release, Station, StationKind, StationPool};

use crate::{DispatchError, DispatchObserver, DispatchResult, InventoryStore, NoopObserver};

#[derive(Default)]
struct Book {
    available:   BTreeSet<RobotId>,
    pending:     VecDeque<Task>,
    outstanding: FxHashMap<RobotId, u32>,
}

/// Central equipment manager for one warehouse floor.
pub struct Dispatcher<R: Router = AStarRouter> {
    config:      FleetConfig,
    map:         GridMap,
    router:      R,
    robots:      Vec<Arc<Robot>>,
    charging:    StationPool,
    packing:     StationPool,
    loading:     StationPool,
    inventory:   Arc<dyn InventoryStore>,
    observer:    Arc<dyn DispatchObserver>,
    submissions: BlockingQueue<Task>,
    book:        Mutex<Book>,
    next_task:   AtomicU64,
}

impl<R: Router> Dispatcher<R> {
    /// Build a dispatcher for `plan`.
    ///
    /// Station ids are assigned in row-major order: chargers first, then
    /// packing stations, then loading stations.  Every robot starts
    /// available.
    pub fn new(
        config:    FleetConfig,
        plan:      &FloorPlan,
        router:    R,
        mut robots: Vec<Arc<Robot>>,
        inventory: Arc<dyn InventoryStore>,
    ) -> DispatchResult<Self> {
        config.validate()?;
        robots.sort_by_key(|r| r.id());

        let mut next_station = 0u32;
        let mut stations = |kind: StationKind, positions: &[GridPos]| {
            positions
                .iter()
                .map(|&pos| {
                    let id = StationId(next_station);
                    next_station += 1;
                    Station::new(id, kind, pos)
                })
                .collect::<Vec<_>>()
        };
        let charging = stations(StationKind::Charging, &plan.charging);
        let packing = stations(StationKind::Packing, &plan.packing);
        let loading = stations(StationKind::Loading, &plan.loading);

        let book = Book {
            available: robots.iter().map(|r| r.id()).collect(),
            ..Book::default()
        };

        info!(
            robots = robots.len(),
            charging = charging.len(),
            packing = packing.len(),
            loading = loading.len(),
            "dispatcher ready"
        );

        Ok(Self {
            charging: StationPool::new(StationKind::Charging, charging, true)?,
            packing: StationPool::new(StationKind::Packing, packing, false)?,
            loading: StationPool::new(StationKind::Loading, loading, false)?,
            config,
            map: plan.map.clone(),
            router,
            robots,
            inventory,
            observer: Arc::new(NoopObserver),
            submissions: BlockingQueue::new(),
            book: Mutex::new(book),
            next_task: AtomicU64::new(1),
        })
    }

    /// Replace the observer (default: [`NoopObserver`]).
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Book> {
        self.book.lock().expect("dispatcher book mutex poisoned")
    }

    fn new_task(&self, kind: TaskKind) -> Task {
        Task::new(TaskId(self.next_task.fetch_add(1, Ordering::Relaxed)), kind)
    }

    // ── Read accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn inventory(&self) -> &dyn InventoryStore {
        self.inventory.as_ref()
    }

    /// All robots, ordered by id.
    pub fn robots(&self) -> &[Arc<Robot>] {
        &self.robots
    }

    pub fn robot(&self, id: RobotId) -> Option<&Arc<Robot>> {
        self.robots
            .binary_search_by_key(&id, |r| r.id())
            .ok()
            .map(|i| &self.robots[i])
    }

    pub fn pool(&self, kind: StationKind) -> &StationPool {
        match kind {
            StationKind::Charging => &self.charging,
            StationKind::Packing  => &self.packing,
            StationKind::Loading  => &self.loading,
        }
    }

    /// Snapshot of the pending queue in arrival order.
    pub fn pending_tasks(&self) -> Vec<Task> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Idle robots, ordered by id.
    pub fn available_robots(&self) -> Vec<RobotId> {
        self.lock().available.iter().copied().collect()
    }

    /// Robots queued for the next free charger, oldest first.
    pub fn charge_waiters(&self) -> Vec<RobotId> {
        self.charging.reservations()
    }

    /// Tasks submitted but not yet taken by the dispatch loop.
    pub fn submission_len(&self) -> usize {
        self.submissions.len()
    }

    /// Tasks pushed to `robot` and not yet reported back.
    pub fn outstanding(&self, robot: RobotId) -> u32 {
        self.lock().outstanding.get(&robot).copied().unwrap_or(0)
    }

    // ── Task creation ─────────────────────────────────────────────────────

    /// Validate and submit a pick order.
    ///
    /// The ordered quantity is taken out of stock immediately, so two
    /// orders can never both claim the last items.
    pub fn create_order(&self, product: ProductId, quantity: u32) -> DispatchResult<TaskId> {
        if quantity == 0 {
            return Err(DispatchError::ZeroQuantity);
        }
        let shelf = self
            .inventory
            .location_of(product)
            .ok_or(DispatchError::UnknownProduct(product))?;
        self.inventory.decrease_quantity(product, quantity)?;

        let task = self.new_task(TaskKind::PickOrder { product, quantity, shelf });
        let id = task.id;
        if let Err(err) = self.submit(task) {
            self.inventory.increase_quantity(product, quantity)?;
            return Err(err);
        }
        Ok(id)
    }

    /// Validate and submit a stock task from `loading` to the product's
    /// shelf.
    pub fn create_stock(
        &self,
        loading:  StationId,
        product:  ProductId,
        quantity: u32,
    ) -> DispatchResult<TaskId> {
        if quantity == 0 {
            return Err(DispatchError::ZeroQuantity);
        }
        let loading = self
            .loading
            .get(loading)
            .ok_or(DispatchError::UnknownLoadingStation(loading))?;
        let shelf = self
            .inventory
            .location_of(product)
            .ok_or(DispatchError::UnknownProduct(product))?;

        let task = self.new_task(TaskKind::Stock { loading, product, quantity, shelf });
        let id = task.id;
        self.submit(task)?;
        Ok(id)
    }

    /// Enqueue a task for the dispatch loop.  Never blocks.
    pub fn submit(&self, task: Task) -> DispatchResult<()> {
        let summary = task.clone();
        self.submissions.push(task).map_err(|_| DispatchError::ShutDown)?;
        debug!(task = %summary.id, kind = summary.kind.label(), "task submitted");
        self.observer.on_submitted(&summary);
        Ok(())
    }

    // ── Dispatch loop ─────────────────────────────────────────────────────

    /// Take one submission (blocking) and match it.  Returns `false` once
    /// the submission queue is closed and drained.
    pub fn dispatch_next_submission(&self) -> bool {
        match self.submissions.pop_blocking_or_closed() {
            Some(task) => {
                self.dispatch(task);
                true
            }
            None => false,
        }
    }

    /// Match everything already submitted without blocking.  Returns how
    /// many submissions were processed.
    pub fn drain_submissions(&self) -> usize {
        let mut n = 0;
        while let Some(task) = self.submissions.try_pop() {
            self.dispatch(task);
            n += 1;
        }
        n
    }

    /// Consume the submission queue until [`shutdown`](Self::shutdown).
    pub fn run_dispatch_loop(&self) {
        debug!("dispatch loop started");
        while self.dispatch_next_submission() {}
        debug!("dispatch loop stopped");
    }

    /// Close the submission queue and every robot inbox, drop queued
    /// robot work, and interrupt whatever the robots are doing.
    pub fn shutdown(&self) {
        self.submissions.close();
        for robot in &self.robots {
            robot.inbox().close();
            while robot.inbox().try_pop().is_some() {}
            robot.interrupt();
        }
        info!("dispatcher shut down");
    }

    fn dispatch(&self, task: Task) {
        let mut book = self.lock();
        match self.best_robot(&book, &task) {
            Some(robot) => {
                book.available.remove(&robot);
                self.assign(&mut book, robot, task);
            }
            None => {
                debug!(task = %task.id, "no feasible robot; task pending");
                self.observer.on_pending(&task);
                book.pending.push_back(task);
            }
        }
    }

    /// Nearest feasible available robot, ties broken by lower id.
    fn best_robot(&self, book: &Book, task: &Task) -> Option<RobotId> {
        let target = task.first_target();
        let candidates: Vec<RobotId> = book.available.iter().copied().collect();
        let evaluate = |id: &RobotId| -> Option<(f64, RobotId)> {
            let robot = self.robot(*id)?;
            if !self.is_feasible(robot, task) {
                return None;
            }
            let distance = match target {
                Some(t) => self.distance(robot.position(), t)?,
                None => 0.0,
            };
            Some((distance, *id))
        };

        #[cfg(not(feature = "parallel"))]
        let scored: Vec<(f64, RobotId)> = candidates.iter().filter_map(evaluate).collect();

        #[cfg(feature = "parallel")]
        let scored: Vec<(f64, RobotId)> = {
            use rayon::prelude::*;
            candidates.par_iter().filter_map(evaluate).collect()
        };

        scored
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    fn assign(&self, book: &mut Book, robot: RobotId, task: Task) {
        let Some(handle) = self.robot(robot) else {
            warn!(robot = %robot, task = %task.id, "assignment to unknown robot dropped");
            return;
        };
        let (task_id, kind) = (task.id, task.kind.label());
        let summary = task.clone();
        match handle.assign(task) {
            Ok(()) => {
                *book.outstanding.entry(robot).or_default() += 1;
                debug!(robot = %robot, task = %task_id, kind, "task assigned");
                self.observer.on_assigned(robot, &summary);
            }
            Err(task) => {
                debug!(robot = %robot, task = %task.id, "robot inbox closed; task dropped");
            }
        }
    }

    // ── Feasibility ───────────────────────────────────────────────────────

    fn distance(&self, from: GridPos, to: GridPos) -> Option<f64> {
        self.router.route(&self.map, from, to).ok().map(|r| r.distance())
    }

    fn farthest(&self, from: GridPos, pool: &StationPool) -> Option<(GridPos, f64)> {
        pool.stations()
            .iter()
            .filter_map(|s| self.distance(from, s.pos).map(|d| (s.pos, d)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn nearest_charger(&self, from: GridPos) -> Option<Station> {
        self.charging
            .stations()
            .into_iter()
            .filter_map(|s| self.distance(from, s.pos).map(|d| (d, s)))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)))
            .map(|(_, s)| s)
    }

    /// Worst-case routed distance for a robot at `from` to complete `task`
    /// and reach a charger afterwards.  `None` when any leg is unreachable.
    pub fn worst_case_distance(&self, from: GridPos, task: &Task) -> Option<f64> {
        match &task.kind {
            TaskKind::PickOrder { shelf, .. } => {
                let to_shelf = self.distance(from, *shelf)?;
                let (packing, to_packing) = self.farthest(*shelf, &self.packing)?;
                let (_, to_charger) = self.farthest(packing, &self.charging)?;
                Some(to_shelf + to_packing + to_charger)
            }
            TaskKind::Stock { loading, shelf, .. } => {
                let to_loading = self.distance(from, loading.pos)?;
                let to_shelf = self.distance(loading.pos, *shelf)?;
                let (_, to_charger) = self.farthest(*shelf, &self.charging)?;
                Some(to_loading + to_shelf + to_charger)
            }
            TaskKind::Charge { .. } | TaskKind::ReturnToStart | TaskKind::GoWaitForCharge { .. } => {
                Some(0.0)
            }
        }
    }

    /// Whether `robot`'s battery covers the worst case of `task`.
    pub fn is_feasible(&self, robot: &Robot, task: &Task) -> bool {
        if !task.needs_feasibility() {
            return true;
        }
        match self.worst_case_distance(robot.position(), task) {
            Some(distance) => robot.battery() >= self.config.energy_for(distance),
            None => false,
        }
    }

    // ── Completion and charging ───────────────────────────────────────────

    fn handle_finished(&self, robot_id: RobotId, task: &Task, succeeded: bool) {
        let mut book = self.lock();
        self.observer.on_finished(robot_id, task, succeeded);

        let Some(robot) = self.robot(robot_id) else {
            warn!(robot = %robot_id, task = %task.id, "report from unknown robot ignored");
            return;
        };
        match book.outstanding.get_mut(&robot_id) {
            Some(n) if *n > 1 => {
                *n -= 1;
                return;
            }
            Some(_) => {
                book.outstanding.remove(&robot_id);
            }
            None => warn!(robot = %robot_id, task = %task.id, "unexpected completion report"),
        }
        book.available.remove(&robot_id);

        // Pending work first, in arrival order.
        if let Some(i) = book.pending.iter().position(|t| self.is_feasible(robot, t)) {
            if let Some(next) = book.pending.remove(i) {
                self.assign(&mut book, robot_id, next);
                return;
            }
        }

        if !succeeded && matches!(task.kind, TaskKind::GoWaitForCharge { .. }) {
            match self.charging.reserve(robot_id) {
                Some(station) => {
                    let charge = self.new_task(TaskKind::Charge { station });
                    self.assign(&mut book, robot_id, charge);
                }
                None => {
                    info!(robot = %robot_id, "charge wait timed out; queued as charge-waiter");
                    self.observer.on_charge_waiter(robot_id);
                    let home = self.new_task(TaskKind::ReturnToStart);
                    self.assign(&mut book, robot_id, home);
                }
            }
            return;
        }

        if self.charging.reservations().contains(&robot_id) {
            // Parked until a released charger is handed over.
            debug!(robot = %robot_id, "charge-waiter parked");
            return;
        }

        if robot.battery() < self.config.low_battery_threshold {
            self.send_to_charge(&mut book, robot);
        } else if succeeded && matches!(task.kind, TaskKind::ReturnToStart) {
            book.available.insert(robot_id);
            debug!(robot = %robot_id, battery = robot.battery(), "robot available");
            self.observer.on_available(robot_id);
        } else {
            let home = self.new_task(TaskKind::ReturnToStart);
            self.assign(&mut book, robot_id, home);
        }
    }

    /// Charge now if a charger is free, otherwise drive to the nearest one
    /// and wait there.
    fn send_to_charge(&self, book: &mut Book, robot: &Robot) {
        let kind = match self.charging.try_take() {
            Some(station) => TaskKind::Charge { station },
            None => match self.nearest_charger(robot.position()) {
                Some(station) => TaskKind::GoWaitForCharge { station },
                None => {
                    warn!(robot = %robot.id(), "no reachable charging station");
                    book.available.insert(robot.id());
                    self.observer.on_available(robot.id());
                    return;
                }
            },
        };
        info!(robot = %robot.id(), battery = robot.battery(), kind = kind.label(), "sending robot to charge");
        let task = self.new_task(kind);
        self.assign(book, robot.id(), task);
    }

    fn handle_idle_timeout(&self, robot_id: RobotId) {
        let mut book = self.lock();
        if !book.available.contains(&robot_id) {
            return;
        }
        let Some(robot) = self.robot(robot_id) else {
            return;
        };
        if robot.battery() >= self.config.idle_charge_below {
            return;
        }
        book.available.remove(&robot_id);
        debug!(robot = %robot_id, battery = robot.battery(), "idle robot requests charge");
        self.send_to_charge(&mut book, robot);
    }

    fn handle_release(&self, station: Station) {
        // A charger may go to a reservation, so the hand-off and the Charge
        // assignment happen under one decision lock. Other kinds release
        // without touching the book.
        let book = (station.kind == StationKind::Charging).then(|| self.lock());
        match self.pool(station.kind).put(station) {
            Ok(Release::Reserved { robot, station }) => {
                let mut book = book.unwrap_or_else(|| self.lock());
                info!(robot = %robot, station = %station.id, "charger handed to charge-waiter");
                self.observer.on_reserved_handoff(robot, &station);
                let charge = self.new_task(TaskKind::Charge { station });
                self.assign(&mut book, robot, charge);
            }
            Ok(Release::Returned | Release::HandedToWaiter) => {}
            Err(err) => warn!(station = %station.id, error = %err, "station release rejected"),
        }
    }
}

// ── Robot callbacks ───────────────────────────────────────────────────────────

impl<R: Router> FleetControl for Dispatcher<R> {
    fn config(&self) -> &FleetConfig {
        &self.config
    }

    fn request_path(&self, robot: &Robot, target: GridPos) -> SpatialResult<Route> {
        self.router.route(&self.map, robot.position(), target)
    }

    fn request_station(
        &self,
        kind:  StationKind,
        robot: &Robot,
        wait:  StationWait,
    ) -> TaskResult<Option<Station>> {
        let pool = self.pool(kind);
        Ok(match wait {
            StationWait::Forever => Some(pool.take(robot.cancel_token())?),
            StationWait::Timeout(timeout) => pool.take_timeout(timeout, robot.cancel_token())?,
        })
    }

    fn acquire_station(&self, station: Station, robot: &Robot) -> TaskResult<Station> {
        Ok(self.pool(station.kind).take_specific(station.id, robot.cancel_token())?)
    }

    fn release_station(&self, station: Station) {
        self.handle_release(station);
    }

    fn report_finished(&self, robot: RobotId, task: &Task, succeeded: bool) {
        self.handle_finished(robot, task, succeeded);
    }

    fn idle_timeout_requests_charge(&self, robot: RobotId) {
        self.handle_idle_timeout(robot);
    }

    fn increase_quantity(&self, product: ProductId, amount: u32) -> TaskResult<()> {
        self.inventory
            .increase_quantity(product, amount)
            .map(|_| ())
            .map_err(|err| TaskError::Inventory(err.to_string()))
    }
}
