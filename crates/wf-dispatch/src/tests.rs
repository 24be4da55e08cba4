//! Unit tests for wf-dispatch.
//!
//! The dispatcher is driven directly, without robot threads: tests drain
//! the submission queue, pop tasks from robot inboxes and report them back
//! by hand.

#[cfg(test)]
mod helpers {
    use std::sync::{Arc, Mutex};

    use wf_core::{FleetConfig, RobotId, StationId, TaskId};
    use wf_robot::{FleetControl, Robot, Task};
    use wf_spatial::{AStarRouter, FloorPlan};
    use wf_station::Station;

    use crate::{DispatchObserver, Dispatcher, MemoryInventory};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Submitted(TaskId),
        Assigned(RobotId, TaskId),
        Pending(TaskId),
        Finished(RobotId, TaskId, bool),
        Available(RobotId),
        ChargeWaiter(RobotId),
        Handoff(RobotId, StationId),
    }

    #[derive(Default)]
    pub struct Recorder {
        pub events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        pub fn saw(&self, event: &Event) -> bool {
            self.events.lock().unwrap().contains(event)
        }
    }

    impl DispatchObserver for Recorder {
        fn on_submitted(&self, task: &Task) {
            self.push(Event::Submitted(task.id));
        }
        fn on_assigned(&self, robot: RobotId, task: &Task) {
            self.push(Event::Assigned(robot, task.id));
        }
        fn on_pending(&self, task: &Task) {
            self.push(Event::Pending(task.id));
        }
        fn on_finished(&self, robot: RobotId, task: &Task, succeeded: bool) {
            self.push(Event::Finished(robot, task.id, succeeded));
        }
        fn on_available(&self, robot: RobotId) {
            self.push(Event::Available(robot));
        }
        fn on_charge_waiter(&self, robot: RobotId) {
            self.push(Event::ChargeWaiter(robot));
        }
        fn on_reserved_handoff(&self, robot: RobotId, station: &Station) {
            self.push(Event::Handoff(robot, station.id));
        }
    }

    pub fn config() -> FleetConfig {
        FleetConfig { time_unit_ms: 1, ..FleetConfig::default() }
    }

    /// Dispatcher over `floor` with one robot per `R` (in row-major order)
    /// at the given battery levels.
    pub fn dispatcher(
        floor:     &str,
        batteries: &[f64],
        inventory: MemoryInventory,
    ) -> (Dispatcher, Arc<Recorder>) {
        let plan = FloorPlan::parse(floor).expect("test floor parses");
        assert_eq!(plan.robots.len(), batteries.len(), "one battery per robot");
        let robots = plan
            .robots
            .iter()
            .zip(batteries)
            .enumerate()
            .map(|(i, (&pos, &battery))| Arc::new(Robot::new(RobotId(i as u32), pos, battery)))
            .collect();
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(config(), &plan, AStarRouter, robots, Arc::new(inventory))
            .expect("valid dispatcher")
            .with_observer(Arc::clone(&recorder) as Arc<dyn DispatchObserver>);
        (dispatcher, recorder)
    }

    /// Pop the next queued task of `robot`.
    pub fn next_task(d: &Dispatcher, robot: u32) -> Task {
        d.robot(RobotId(robot))
            .expect("known robot")
            .inbox()
            .try_pop()
            .expect("robot has a queued task")
    }

    /// Pop the next task of `robot` and report it back.
    pub fn finish(d: &Dispatcher, robot: u32, succeeded: bool) -> Task {
        let task = next_task(d, robot);
        d.report_finished(RobotId(robot), &task, succeeded);
        task
    }

    pub fn inbox_len(d: &Dispatcher, robot: u32) -> usize {
        d.robot(RobotId(robot)).expect("known robot").inbox().len()
    }
}

// ── Inventory ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod inventory {
    use wf_core::{GridPos, ProductId};

    use crate::{DispatchError, InventoryStore, MemoryInventory};

    #[test]
    fn quantities_move_both_ways() {
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(3, 0), 5);
        assert_eq!(inv.decrease_quantity(ProductId(1), 2).unwrap(), 3);
        assert_eq!(inv.increase_quantity(ProductId(1), 10).unwrap(), 13);
        assert_eq!(inv.quantity(ProductId(1)), Some(13));
        assert_eq!(inv.location_of(ProductId(1)), Some(GridPos::new(3, 0)));
    }

    #[test]
    fn insufficient_stock_leaves_quantity_alone() {
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(3, 0), 2);
        assert!(matches!(
            inv.decrease_quantity(ProductId(1), 3),
            Err(DispatchError::InsufficientStock { requested: 3, available: 2, .. })
        ));
        assert_eq!(inv.quantity(ProductId(1)), Some(2));
    }

    #[test]
    fn unknown_products_are_errors() {
        let inv = MemoryInventory::new();
        assert!(inv.is_empty());
        assert!(matches!(
            inv.increase_quantity(ProductId(9), 1),
            Err(DispatchError::UnknownProduct(ProductId(9)))
        ));
        assert_eq!(inv.quantity(ProductId(9)), None);
    }

    #[test]
    fn snapshot_is_sorted() {
        let inv = MemoryInventory::new()
            .with_product(ProductId(7), GridPos::new(0, 0), 1)
            .with_product(ProductId(2), GridPos::new(1, 0), 4);
        assert_eq!(inv.snapshot(), vec![(ProductId(2), 4), (ProductId(7), 1)]);
        assert_eq!(inv.len(), 2);
    }
}

// ── Task creation and validation ──────────────────────────────────────────────

#[cfg(test)]
mod creation {
    use wf_core::{GridPos, ProductId, StationId};

    use super::helpers::dispatcher;
    use crate::{DispatchError, MemoryInventory};

    const FLOOR: &str = "
        R . . S
        C . P L
    ";

    fn stocked() -> MemoryInventory {
        MemoryInventory::new().with_product(ProductId(1), GridPos::new(3, 0), 4)
    }

    #[test]
    fn order_beyond_stock_is_rejected_synchronously() {
        let (d, _) = dispatcher(FLOOR, &[100.0], stocked());
        let result = d.create_order(ProductId(1), 5);
        assert!(matches!(result, Err(DispatchError::InsufficientStock { .. })));
        assert_eq!(d.submission_len(), 0);
        assert_eq!(d.inventory().quantity(ProductId(1)), Some(4));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let (d, _) = dispatcher(FLOOR, &[100.0], stocked());
        assert!(matches!(d.create_order(ProductId(1), 0), Err(DispatchError::ZeroQuantity)));
        assert!(matches!(
            d.create_order(ProductId(8), 1),
            Err(DispatchError::UnknownProduct(ProductId(8)))
        ));
        assert!(matches!(
            d.create_stock(StationId(0), ProductId(1), 3),
            Err(DispatchError::UnknownLoadingStation(StationId(0)))
        ));
        assert!(matches!(
            d.create_stock(StationId(2), ProductId(8), 3),
            Err(DispatchError::UnknownProduct(ProductId(8)))
        ));
        assert_eq!(d.submission_len(), 0);
    }

    #[test]
    fn valid_requests_are_queued() {
        let (d, recorder) = dispatcher(FLOOR, &[100.0], stocked());
        let order = d.create_order(ProductId(1), 3).unwrap();
        // Charger is station 0, packing 1, loading 2.
        let stock = d.create_stock(StationId(2), ProductId(1), 6).unwrap();
        assert_ne!(order, stock);
        assert_eq!(d.submission_len(), 2);
        assert_eq!(d.inventory().quantity(ProductId(1)), Some(1));
        assert!(recorder.saw(&super::helpers::Event::Submitted(order)));
    }

    #[test]
    fn shutdown_rejects_and_restores_stock() {
        let (d, _) = dispatcher(FLOOR, &[100.0], stocked());
        d.shutdown();
        assert!(matches!(d.create_order(ProductId(1), 2), Err(DispatchError::ShutDown)));
        assert_eq!(d.inventory().quantity(ProductId(1)), Some(4));
        assert!(!d.dispatch_next_submission());
        d.run_dispatch_loop();
    }
}

// ── Matching and feasibility ──────────────────────────────────────────────────

#[cfg(test)]
mod matching {
    use wf_core::{GridPos, ProductId, RobotId};
    use wf_robot::{Task, TaskKind};

    use super::helpers::{Event, dispatcher, next_task};
    use crate::MemoryInventory;

    #[test]
    fn nearest_feasible_robot_wins() {
        let floor = "
            R . . . . . . S
            . . . . . . . .
            . . . . . . R P
            C . . . . . . .
        ";
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(7, 0), 10);
        let (d, recorder) = dispatcher(floor, &[100.0, 100.0], inv);
        let order = d.create_order(ProductId(1), 1).unwrap();
        assert_eq!(d.drain_submissions(), 1);

        assert!(recorder.saw(&Event::Assigned(RobotId(1), order)));
        assert_eq!(d.available_robots(), vec![RobotId(0)]);
        assert_eq!(d.outstanding(RobotId(1)), 1);
        assert_eq!(next_task(&d, 1).id, order);
    }

    #[test]
    fn worst_case_bound_on_a_corridor() {
        // robot → shelf 3, shelf → packing 2, packing → charger 2.
        let floor = "R . . S . P . C";
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(3, 0), 10);
        let (d, _) = dispatcher(floor, &[3.5], inv);
        let task = Task::new(
            wf_core::TaskId(99),
            TaskKind::PickOrder { product: ProductId(1), quantity: 1, shelf: GridPos::new(3, 0) },
        );
        let distance = d.worst_case_distance(GridPos::new(0, 0), &task).unwrap();
        assert!((distance - 7.0).abs() < 1e-9);

        let robot = d.robot(RobotId(0)).unwrap();
        // 7 cells at 0.5 %/cell needs exactly 3.5 %.
        assert!(d.is_feasible(robot, &task));
    }

    #[test]
    fn low_battery_robot_is_never_assigned() {
        let floor = "R . . S . P . C";
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(3, 0), 10);
        let (d, recorder) = dispatcher(floor, &[3.4], inv);
        let order = d.create_order(ProductId(1), 1).unwrap();
        d.drain_submissions();

        assert!(recorder.saw(&Event::Pending(order)));
        assert_eq!(d.pending_tasks().len(), 1);
        assert_eq!(d.available_robots(), vec![RobotId(0)]);
        assert_eq!(super::helpers::inbox_len(&d, 0), 0);
    }

    #[test]
    fn unreachable_shelf_is_infeasible() {
        let floor = "
            # # # . .
            # S # . R
            # # # . .
            C . . . P
        ";
        let inv = MemoryInventory::new().with_product(ProductId(1), GridPos::new(1, 1), 10);
        let (d, _) = dispatcher(floor, &[100.0], inv);
        d.create_order(ProductId(1), 1).unwrap();
        d.drain_submissions();
        assert_eq!(d.pending_tasks().len(), 1);
    }

    #[test]
    fn freed_robot_takes_first_feasible_pending_order_not_nearest() {
        // Pending work is matched in arrival order: the first order the
        // robot can serve wins even when a later one sits next to it.
        let floor = "
            # # # . . . . .
            # S # . . . . .
            # # # . . . . S
            R . S . . . . P
            C . . . . . . .
        ";
        let far = GridPos::new(7, 2);
        let inv = MemoryInventory::new()
            .with_product(ProductId(0), far, 10)
            .with_product(ProductId(1), GridPos::new(1, 1), 10)
            .with_product(ProductId(2), far, 10)
            .with_product(ProductId(3), GridPos::new(2, 3), 10);
        let (d, recorder) = dispatcher(floor, &[100.0], inv);

        let busy = d.create_order(ProductId(0), 1).unwrap();
        d.drain_submissions();
        assert!(recorder.saw(&Event::Assigned(RobotId(0), busy)));

        // No robot is available now.
        let ids: Vec<_> = (1..=3).map(|p| d.create_order(ProductId(p), 1).unwrap()).collect();
        d.drain_submissions();
        let pending: Vec<_> = d.pending_tasks().iter().map(|t| t.id).collect();
        assert_eq!(pending, ids);

        // The enclosed shelf is skipped; the far order beats the adjacent one.
        super::helpers::finish(&d, 0, true);
        assert_eq!(next_task(&d, 0).id, ids[1]);
        let pending: Vec<_> = d.pending_tasks().iter().map(|t| t.id).collect();
        assert_eq!(pending, vec![ids[0], ids[2]]);
    }
}

// ── Completion, charging and hand-off ─────────────────────────────────────────

#[cfg(test)]
mod charging {
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::{Duration, Instant};

    use wf_core::{ProductId, RobotId, StationId, TaskId};
    use wf_robot::{FleetControl, StationWait, Task, TaskKind};
    use wf_station::StationKind;

    use super::helpers::{Event, dispatcher, finish, inbox_len, next_task};
    use crate::MemoryInventory;

    const TWO_CHARGERS: &str = "
        C . . . C
        . . . . .
        R . R . R
        . . . . P
    ";

    const ONE_CHARGER: &str = "
        C . . . .
        R . . . R
        . . . . P
    ";

    fn send_everyone_home(d: &crate::Dispatcher, robots: u32) {
        for i in 0..robots {
            d.submit(Task::new(TaskId(1000 + u64::from(i)), TaskKind::ReturnToStart)).unwrap();
        }
        d.drain_submissions();
    }

    #[test]
    fn finished_return_makes_robot_available() {
        let (d, recorder) = dispatcher(ONE_CHARGER, &[90.0, 90.0], MemoryInventory::new());
        send_everyone_home(&d, 2);
        assert!(d.available_robots().is_empty());
        finish(&d, 0, true);
        assert_eq!(d.available_robots(), vec![RobotId(0)]);
        assert!(recorder.saw(&Event::Available(RobotId(0))));
    }

    #[test]
    fn finished_work_sends_robot_home() {
        let (d, _) = dispatcher(ONE_CHARGER, &[90.0, 90.0], MemoryInventory::new());
        let station = d.pool(StationKind::Charging).try_take().unwrap();
        d.submit(Task::new(TaskId(7), TaskKind::Charge { station })).unwrap();
        d.drain_submissions();
        finish(&d, 0, true);
        assert_eq!(next_task(&d, 0).kind, TaskKind::ReturnToStart);
    }

    #[test]
    fn low_battery_robots_share_chargers_then_wait() {
        let (d, _) = dispatcher(TWO_CHARGERS, &[20.0, 20.0, 20.0], MemoryInventory::new());
        send_everyone_home(&d, 3);
        for robot in 0..3 {
            finish(&d, robot, true);
        }

        let first = next_task(&d, 0);
        let second = next_task(&d, 1);
        let third = next_task(&d, 2);
        let TaskKind::Charge { station: s0 } = first.kind else {
            panic!("robot 0 should charge, got {first}");
        };
        assert!(matches!(second.kind, TaskKind::Charge { .. }));
        // Robot 2 at (4, 2) parks at the nearer charger (4, 0).
        let TaskKind::GoWaitForCharge { station } = third.kind else {
            panic!("robot 2 should wait for a charger, got {third}");
        };
        assert_eq!(station.id, StationId(1));

        // Robot 2 blocks on the bounded wait; robot 0 then releases.
        let d = Arc::new(d);
        let waiter = {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                let robot = Arc::clone(d.robot(RobotId(2)).unwrap());
                d.request_station(
                    StationKind::Charging,
                    &robot,
                    StationWait::Timeout(Duration::from_secs(5)),
                )
            })
        };
        let charging = d.pool(StationKind::Charging);
        let deadline = Instant::now() + Duration::from_secs(2);
        while charging.waiting_count() == 0 {
            assert!(Instant::now() < deadline, "waiter never blocked");
            thread::sleep(Duration::from_millis(1));
        }

        d.release_station(s0);
        assert!(charging.try_take().is_none(), "freed charger must not reach the pool");
        let got = waiter.join().expect("waiter panicked").unwrap();
        assert_eq!(got.map(|s| s.id), Some(s0.id));
    }

    #[test]
    fn charge_timeout_queues_robot_for_next_release() {
        let (d, recorder) = dispatcher(ONE_CHARGER, &[20.0, 20.0], MemoryInventory::new());
        send_everyone_home(&d, 2);
        finish(&d, 0, true);
        finish(&d, 1, true);
        let charge = next_task(&d, 0);
        let TaskKind::Charge { station } = charge.kind else {
            panic!("robot 0 should charge, got {charge}");
        };

        // Robot 1's bounded wait fails.
        let wait = finish(&d, 1, false);
        assert!(matches!(wait.kind, TaskKind::GoWaitForCharge { .. }));
        assert!(recorder.saw(&Event::ChargeWaiter(RobotId(1))));
        assert_eq!(d.charge_waiters(), vec![RobotId(1)]);

        // Home, then parked: neither available nor given new work.
        let home = finish(&d, 1, true);
        assert_eq!(home.kind, TaskKind::ReturnToStart);
        assert_eq!(inbox_len(&d, 1), 0);
        assert!(!d.available_robots().contains(&RobotId(1)));
        d.idle_timeout_requests_charge(RobotId(1));
        assert_eq!(inbox_len(&d, 1), 0);

        // Robot 0 frees the charger: it goes straight to robot 1.
        d.release_station(station);
        assert!(recorder.saw(&Event::Handoff(RobotId(1), station.id)));
        assert!(d.charge_waiters().is_empty());
        assert!(d.pool(StationKind::Charging).is_held(station.id));
        assert_eq!(next_task(&d, 1).kind, TaskKind::Charge { station });
    }

    #[test]
    fn handoff_while_driving_home_waits_for_both_reports() {
        let (d, _) = dispatcher(ONE_CHARGER, &[20.0, 20.0], MemoryInventory::new());
        send_everyone_home(&d, 2);
        finish(&d, 0, true);
        finish(&d, 1, true);
        let TaskKind::Charge { station } = next_task(&d, 0).kind else {
            panic!("robot 0 should charge");
        };
        finish(&d, 1, false);

        // Robot 1 is still driving home when the charger frees up.
        let home = next_task(&d, 1);
        d.release_station(station);
        assert_eq!(d.outstanding(RobotId(1)), 2);

        d.report_finished(RobotId(1), &home, true);
        assert_eq!(d.outstanding(RobotId(1)), 1);
        assert_eq!(inbox_len(&d, 1), 1);
        assert_eq!(next_task(&d, 1).kind, TaskKind::Charge { station });
    }

    #[test]
    fn charger_release_racing_the_return_report_yields_one_charge() {
        for _ in 0..200 {
            let (d, recorder) = dispatcher(ONE_CHARGER, &[20.0, 20.0], MemoryInventory::new());
            send_everyone_home(&d, 2);
            finish(&d, 0, true);
            finish(&d, 1, true);
            let TaskKind::Charge { station } = next_task(&d, 0).kind else {
                panic!("robot 0 should charge");
            };
            finish(&d, 1, false);
            let home = next_task(&d, 1);
            assert_eq!(home.kind, TaskKind::ReturnToStart);

            let d = Arc::new(d);
            let start = Arc::new(Barrier::new(2));
            let releaser = {
                let d = Arc::clone(&d);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    d.release_station(station);
                })
            };
            start.wait();
            d.report_finished(RobotId(1), &home, true);
            releaser.join().expect("releaser panicked");

            assert!(recorder.saw(&Event::Handoff(RobotId(1), station.id)));
            assert_eq!(inbox_len(&d, 1), 1, "robot 1 must get exactly one task");
            assert_eq!(next_task(&d, 1).kind, TaskKind::Charge { station });
            assert!(d.charge_waiters().is_empty());
            assert!(d.pool(StationKind::Charging).is_held(station.id));
            assert_eq!(d.outstanding(RobotId(1)), 1);
        }
    }

    #[test]
    fn failed_return_is_retried_not_made_available() {
        let (d, recorder) = dispatcher(ONE_CHARGER, &[90.0, 90.0], MemoryInventory::new());
        send_everyone_home(&d, 2);
        let first = finish(&d, 0, false);
        assert_eq!(first.kind, TaskKind::ReturnToStart);

        assert!(!d.available_robots().contains(&RobotId(0)));
        assert!(!recorder.saw(&Event::Available(RobotId(0))));
        let retry = next_task(&d, 0);
        assert_eq!(retry.kind, TaskKind::ReturnToStart);
        assert_ne!(retry.id, first.id);

        d.report_finished(RobotId(0), &retry, true);
        assert_eq!(d.available_robots(), vec![RobotId(0)]);
    }

    #[test]
    fn idle_timeout_charges_only_idle_unfull_robots() {
        let (d, _) = dispatcher(ONE_CHARGER, &[80.0, 100.0], MemoryInventory::new());
        d.idle_timeout_requests_charge(RobotId(1));
        assert_eq!(inbox_len(&d, 1), 0);

        d.idle_timeout_requests_charge(RobotId(0));
        assert!(matches!(next_task(&d, 0).kind, TaskKind::Charge { .. }));
        assert_eq!(d.available_robots(), vec![RobotId(1)]);

        // Already busy: ignored.
        d.idle_timeout_requests_charge(RobotId(0));
        assert_eq!(inbox_len(&d, 0), 0);
    }

    #[test]
    fn releasing_a_free_station_is_ignored() {
        let (d, _) = dispatcher(ONE_CHARGER, &[80.0, 100.0], MemoryInventory::new());
        let station = d.pool(StationKind::Packing).get(StationId(1)).unwrap();
        d.release_station(station);
        assert_eq!(d.pool(StationKind::Packing).free_count(), 1);
    }

    #[test]
    fn stock_completion_increases_quantity() {
        let inv = MemoryInventory::new().with_product(ProductId(3), wf_core::GridPos::new(2, 2), 1);
        let (d, _) = dispatcher(ONE_CHARGER, &[80.0, 100.0], inv);
        d.increase_quantity(ProductId(3), 9).unwrap();
        assert_eq!(d.inventory().quantity(ProductId(3)), Some(10));
        assert!(d.increase_quantity(ProductId(4), 1).is_err());
    }
}
