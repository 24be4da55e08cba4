//! Unit tests for wf-core primitives.

#[cfg(test)]
mod ids {
    use crate::{RobotId, StationId, TaskId};

    #[test]
    fn ordering() {
        assert!(RobotId(0) < RobotId(1));
        assert!(TaskId(100) > TaskId(99));
    }

    #[test]
    fn display() {
        assert_eq!(StationId(7).to_string(), "StationId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::GridPos;

    #[test]
    fn euclidean_steps() {
        let a = GridPos::new(0, 0);
        assert_eq!(a.euclidean_to(GridPos::new(3, 0)), 3.0);
        assert!((a.euclidean_to(GridPos::new(1, 1)) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn octile_cost() {
        let a = GridPos::new(0, 0);
        assert_eq!(a.octile_cost_to(a), 0);
        assert_eq!(a.octile_cost_to(GridPos::new(4, 0)), 40);
        assert_eq!(a.octile_cost_to(GridPos::new(3, 3)), 42);
        // 2 diagonals + 3 straights
        assert_eq!(a.octile_cost_to(GridPos::new(-5, 2)), 2 * 14 + 3 * 10);
    }

    #[test]
    fn adjacency() {
        let c = GridPos::new(5, 5);
        assert!(c.is_adjacent(GridPos::new(6, 6)));
        assert!(c.is_adjacent(GridPos::new(5, 4)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(GridPos::new(7, 5)));
    }
}

#[cfg(test)]
mod time {
    use std::time::Duration;

    use crate::TimeScale;

    #[test]
    fn wall_conversion() {
        let scale = TimeScale::from_millis(10);
        assert_eq!(scale.wall(3.0), Duration::from_millis(30));
        assert_eq!(scale.wall(0.5), Duration::from_millis(5));
        assert_eq!(scale.wall(-1.0), Duration::ZERO);
        assert_eq!(scale.wall(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn units_roundtrip() {
        let scale = TimeScale::from_millis(4);
        let units = scale.units(Duration::from_millis(10));
        assert!((units - 2.5).abs() < 1e-9);
    }
}

#[cfg(test)]
mod cancel {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::{CancelToken, Notify};

    #[test]
    fn uncancelled_sleep_completes() {
        let token = CancelToken::new();
        let start = Instant::now();
        assert!(token.sleep(Duration::from_millis(20)).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn cancel_wakes_sleeper_early() {
        let token = CancelToken::new();
        let sleeper = token.clone();
        let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(10)));
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let result = handle.join().expect("sleeper panicked");
        let interrupted = result.expect_err("sleep should be interrupted");
        assert!(interrupted.elapsed < Duration::from_secs(5));
    }

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Notify for Counter {
        fn notify(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn watchers_are_notified_only_while_registered() {
        let token = CancelToken::new();
        let counter = Arc::new(Counter::default());
        {
            let _watch = token.watch(Arc::clone(&counter) as Arc<dyn Notify>);
            token.cancel();
            assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        }
        token.reset();
        token.cancel();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(Arc::strong_count(&counter), 1);
    }

    #[test]
    fn raised_flag_fails_immediately_until_reset() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.sleep(Duration::from_millis(1)).is_err());
        token.reset();
        assert!(token.sleep(Duration::from_millis(1)).is_ok());
    }
}

#[cfg(test)]
mod queue {
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    use crate::{BlockingQueue, Popped};

    #[test]
    fn items_are_consumed_once() {
        let queue = Arc::new(BlockingQueue::new());
        let total = 100u64;
        for id in 0..total {
            queue.push(id).expect("queue closed");
        }

        let consumers = 4;
        let barrier = Arc::new(Barrier::new(consumers));
        let seen: Arc<Mutex<HashSet<u64>>> = Arc::new(Mutex::new(HashSet::new()));

        let mut handles = Vec::new();
        for _ in 0..consumers {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            let seen = Arc::clone(&seen);
            handles.push(thread::spawn(move || {
                barrier.wait();
                while let Some(id) = queue.try_pop() {
                    // Each id should be observed at most once.
                    assert!(seen.lock().expect("seen mutex poisoned").insert(id));
                }
            }));
        }
        for handle in handles {
            handle.join().expect("consumer thread panicked");
        }

        assert_eq!(seen.lock().expect("seen mutex poisoned").len(), total as usize);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_blocking_wakes_on_push() {
        let queue = Arc::new(BlockingQueue::new());
        let (tx, rx) = mpsc::channel();

        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            let item = consumer.pop_blocking_or_closed().expect("queue closed");
            tx.send(item).expect("send item");
        });

        thread::sleep(Duration::from_millis(10));
        queue.push(99u64).expect("queue closed");

        let received = rx.recv_timeout(Duration::from_secs(1)).expect("receive item");
        assert_eq!(received, 99);
        handle.join().expect("blocking pop thread panicked");
    }

    #[test]
    fn pop_timeout_reports_each_outcome() {
        let queue = BlockingQueue::new();
        assert_eq!(queue.pop_timeout(Duration::from_millis(5)), Popped::TimedOut);
        queue.push(1u8).expect("queue closed");
        assert_eq!(queue.pop_timeout(Duration::from_millis(5)), Popped::Item(1));
        queue.close();
        assert_eq!(queue.pop_timeout(Duration::from_millis(5)), Popped::Closed);
    }

    #[test]
    fn close_unblocks_consumer_and_rejects_push() {
        let queue: Arc<BlockingQueue<u8>> = Arc::new(BlockingQueue::new());
        let consumer = Arc::clone(&queue);
        let handle = thread::spawn(move || consumer.pop_blocking_or_closed());
        thread::sleep(Duration::from_millis(10));
        queue.close();
        assert_eq!(handle.join().expect("consumer panicked"), None);
        assert_eq!(queue.push(5), Err(5));
    }

    #[test]
    fn snapshot_preserves_fifo_order() {
        let queue = BlockingQueue::new();
        for c in ['a', 'b', 'c'] {
            queue.push(c).expect("queue closed");
        }
        assert_eq!(queue.snapshot(), vec!['a', 'b', 'c']);
        assert_eq!(queue.len(), 3);
    }
}

#[cfg(test)]
mod config {
    use std::time::Duration;

    use crate::FleetConfig;

    #[test]
    fn defaults_are_valid() {
        let cfg = FleetConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.idle_timeout(), Duration::from_millis(300));
        assert_eq!(cfg.energy_for(10.0), 5.0);
    }

    #[test]
    fn rejects_bad_values() {
        let zero_unit = FleetConfig { time_unit_ms: 0, ..FleetConfig::default() };
        assert!(zero_unit.validate().is_err());

        let bad_threshold = FleetConfig { low_battery_threshold: 130.0, ..FleetConfig::default() };
        assert!(bad_threshold.validate().is_err());

        let negative_cost = FleetConfig { battery_per_distance: -1.0, ..FleetConfig::default() };
        assert!(negative_cost.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..20 {
            assert_eq!(a.gen_range(0..1000u32), b.gen_range(0..1000u32));
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[3]), Some(&3));
    }
}
