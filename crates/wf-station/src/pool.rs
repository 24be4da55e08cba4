//! Bounded station pool with exclusive, blocking acquisition.
//!
//! # Acquisition
//!
//! | Call              | Blocks                                     |
//! |-------------------|--------------------------------------------|
//! | `try_take`        | never                                      |
//! | `take`            | until a station frees or the token cancels |
//! | `take_timeout`    | up to the timeout, then `Ok(None)`         |
//! | `take_specific`   | until that one station frees               |
//! | `reserve`         | never; queues a robot for the next release |
//!
//! # Priority hand-off
//!
//! With `priority_handoff` enabled (charging pools), blocked takers and
//! reservations form one FIFO of waiters.  `put` gives the released station
//! straight to the oldest waiter instead of the free list, so a late
//! `try_take` can never overtake a robot that has been waiting.  Without it
//! (packing and loading pools) blocked takers simply race for the free list
//! when woken.
//!
//! Pool waits sleep on the pool's own condvar.  A blocked take watches the
//! caller's [`CancelToken`], so cancelling it wakes the condvar directly.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use wf_core::{CancelToken, Notify, RobotId, StationId, Watch};

use crate::{Station, StationError, StationKind, StationResult};

/// What happened to a station passed to [`StationPool::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Back in the free list.
    Returned,
    /// Handed to the oldest blocked taker, which now holds it.
    HandedToWaiter,
    /// Assigned to the oldest reservation.  The station stays held; the
    /// caller is responsible for getting it to `robot`.
    Reserved { robot: RobotId, station: Station },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waiter {
    Blocked(u64),
    Reserved(RobotId),
}

struct PoolState {
    free:        VecDeque<StationId>,
    held:        FxHashSet<StationId>,
    waiters:     VecDeque<Waiter>,
    handoffs:    FxHashMap<u64, StationId>,
    next_ticket: u64,
}

struct Shared {
    state:   Mutex<PoolState>,
    changed: Condvar,
}

impl Notify for Shared {
    fn notify(&self) {
        // Holding the mutex orders this against a waiter's cancel check.
        let _state = self.state.lock();
        self.changed.notify_all();
    }
}

/// A pool of interchangeable stations of one kind.
pub struct StationPool {
    kind:             StationKind,
    priority_handoff: bool,
    stations:         FxHashMap<StationId, Station>,
    shared:           Arc<Shared>,
}

impl StationPool {
    /// Build a pool over `stations`, all initially free.
    ///
    /// Stations of another kind are rejected.
    pub fn new(
        kind: StationKind,
        stations: impl IntoIterator<Item = Station>,
        priority_handoff: bool,
    ) -> StationResult<Self> {
        let mut by_id = FxHashMap::default();
        let mut free = VecDeque::new();
        for station in stations {
            if station.kind != kind {
                return Err(StationError::WrongKind {
                    station:  station.id,
                    expected: kind,
                    got:      station.kind,
                });
            }
            free.push_back(station.id);
            by_id.insert(station.id, station);
        }
        Ok(Self {
            kind,
            priority_handoff,
            stations: by_id,
            shared: Arc::new(Shared {
                state: Mutex::new(PoolState {
                    free,
                    held: FxHashSet::default(),
                    waiters: VecDeque::new(),
                    handoffs: FxHashMap::default(),
                    next_ticket: 0,
                }),
                changed: Condvar::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.shared.state.lock().expect("station pool mutex poisoned")
    }

    /// Wake this pool's waiters when `cancel` is raised.
    fn watch<'a>(&self, cancel: &'a CancelToken) -> Watch<'a> {
        cancel.watch(Arc::clone(&self.shared) as Arc<dyn Notify>)
    }

    /// Sleep until notified or until `deadline`.
    fn wait<'a>(
        &self,
        guard: MutexGuard<'a, PoolState>,
        deadline: Option<Instant>,
    ) -> MutexGuard<'a, PoolState> {
        match deadline {
            Some(d) => {
                let left = d.saturating_duration_since(Instant::now());
                self.shared
                    .changed
                    .wait_timeout(guard, left)
                    .expect("station pool condvar wait failed")
                    .0
            }
            None => self.shared.changed.wait(guard).expect("station pool condvar wait failed"),
        }
    }

    fn station(&self, id: StationId) -> Station {
        self.stations[&id]
    }

    fn pop_free(&self, state: &mut PoolState) -> Option<Station> {
        let id = state.free.pop_front()?;
        state.held.insert(id);
        Some(self.station(id))
    }

    // ── Acquisition ───────────────────────────────────────────────────────

    /// Take a free station without blocking.
    pub fn try_take(&self) -> Option<Station> {
        let mut guard = self.lock();
        self.pop_free(&mut guard)
    }

    /// Block until a station is free.  Fails only on cancellation.
    pub fn take(&self, cancel: &CancelToken) -> StationResult<Station> {
        self.take_until(None, cancel)?.ok_or(StationError::Cancelled)
    }

    /// Block for at most `timeout`; `Ok(None)` when it expires.
    pub fn take_timeout(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> StationResult<Option<Station>> {
        self.take_until(Some(Instant::now() + timeout), cancel)
    }

    fn take_until(
        &self,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> StationResult<Option<Station>> {
        let _watch = self.watch(cancel);
        let mut guard = self.lock();
        if let Some(station) = self.pop_free(&mut guard) {
            return Ok(Some(station));
        }

        if !self.priority_handoff {
            loop {
                if cancel.is_cancelled() {
                    return Err(StationError::Cancelled);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Ok(None);
                }
                guard = self.wait(guard, deadline);
                if let Some(station) = self.pop_free(&mut guard) {
                    return Ok(Some(station));
                }
            }
        }

        let ticket = guard.next_ticket;
        guard.next_ticket += 1;
        guard.waiters.push_back(Waiter::Blocked(ticket));
        loop {
            // A hand-off is checked before giving up so a station released
            // at the deadline is never lost.
            if let Some(id) = guard.handoffs.remove(&ticket) {
                return Ok(Some(self.station(id)));
            }
            let timed_out = deadline.is_some_and(|d| Instant::now() >= d);
            if timed_out || cancel.is_cancelled() {
                guard.waiters.retain(|w| *w != Waiter::Blocked(ticket));
                return if timed_out && !cancel.is_cancelled() {
                    Ok(None)
                } else {
                    Err(StationError::Cancelled)
                };
            }
            guard = self.wait(guard, deadline);
        }
    }

    /// Block until the named station is free, then take it.
    pub fn take_specific(&self, id: StationId, cancel: &CancelToken) -> StationResult<Station> {
        if !self.stations.contains_key(&id) {
            return Err(StationError::Unknown(id));
        }
        let _watch = self.watch(cancel);
        let mut guard = self.lock();
        loop {
            if let Some(idx) = guard.free.iter().position(|&s| s == id) {
                guard.free.remove(idx);
                guard.held.insert(id);
                return Ok(self.station(id));
            }
            if cancel.is_cancelled() {
                return Err(StationError::Cancelled);
            }
            guard = self.wait(guard, None);
        }
    }

    /// Queue `robot` for the next released station, or grant one right away
    /// if a station is free and nobody is ahead.
    ///
    /// A robot already in the queue is not queued twice.
    pub fn reserve(&self, robot: RobotId) -> Option<Station> {
        let mut guard = self.lock();
        if guard.waiters.is_empty() {
            if let Some(station) = self.pop_free(&mut guard) {
                return Some(station);
            }
        }
        if !guard.waiters.contains(&Waiter::Reserved(robot)) {
            guard.waiters.push_back(Waiter::Reserved(robot));
        }
        None
    }

    // ── Release ───────────────────────────────────────────────────────────

    /// Return a held station.
    ///
    /// The oldest waiter, if any, receives it directly; otherwise it goes
    /// back on the free list.
    pub fn put(&self, station: Station) -> StationResult<Release> {
        if station.kind != self.kind {
            return Err(StationError::WrongKind {
                station:  station.id,
                expected: self.kind,
                got:      station.kind,
            });
        }
        if !self.stations.contains_key(&station.id) {
            return Err(StationError::Unknown(station.id));
        }

        let mut guard = self.lock();
        if !guard.held.contains(&station.id) {
            return Err(StationError::NotHeld(station.id));
        }

        match guard.waiters.pop_front() {
            Some(Waiter::Blocked(ticket)) => {
                guard.handoffs.insert(ticket, station.id);
                self.shared.changed.notify_all();
                debug!(station = %station.id, ticket, "station handed to blocked waiter");
                Ok(Release::HandedToWaiter)
            }
            Some(Waiter::Reserved(robot)) => {
                debug!(station = %station.id, robot = %robot, "station handed to reservation");
                Ok(Release::Reserved { robot, station: self.station(station.id) })
            }
            None => {
                guard.held.remove(&station.id);
                guard.free.push_back(station.id);
                self.shared.changed.notify_all();
                Ok(Release::Returned)
            }
        }
    }

    // ── Observability ─────────────────────────────────────────────────────

    pub fn kind(&self) -> StationKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.stations.len()
    }

    pub fn free_count(&self) -> usize {
        self.lock().free.len()
    }

    /// Number of stations currently held by someone.
    pub fn holder_count(&self) -> usize {
        self.lock().held.len()
    }

    pub fn is_held(&self, id: StationId) -> bool {
        self.lock().held.contains(&id)
    }

    /// Blocked takers plus reservations.
    pub fn waiting_count(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Reserved robots, oldest first.
    pub fn reservations(&self) -> Vec<RobotId> {
        self.lock()
            .waiters
            .iter()
            .filter_map(|w| match w {
                Waiter::Reserved(robot) => Some(*robot),
                Waiter::Blocked(_) => None,
            })
            .collect()
    }

    pub fn get(&self, id: StationId) -> Option<Station> {
        self.stations.get(&id).copied()
    }

    /// All stations of this pool, ordered by id.
    pub fn stations(&self) -> Vec<Station> {
        let mut all: Vec<Station> = self.stations.values().copied().collect();
        all.sort_by_key(|s| s.id);
        all
    }
}
