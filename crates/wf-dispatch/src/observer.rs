//! Dispatcher observer trait for monitoring and test instrumentation.

use wf_core::RobotId;
use wf_robot::Task;
use wf_station::Station;

/// Callbacks invoked by the [`Dispatcher`][crate::Dispatcher] at each
/// bookkeeping decision.
///
/// All methods have default no-op implementations.  They run inside the
/// dispatcher's critical section, so they must be quick and must not call
/// back into the dispatcher.
///
/// # Example: counting pending tasks
///
/// ```rust,ignore
/// struct PendingCounter(AtomicUsize);
///
/// impl DispatchObserver for PendingCounter {
///     fn on_pending(&self, _task: &Task) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait DispatchObserver: Send + Sync {
    /// A validated task entered the submission queue.
    fn on_submitted(&self, _task: &Task) {}

    /// `task` was pushed into `robot`'s inbox.
    fn on_assigned(&self, _robot: RobotId, _task: &Task) {}

    /// No feasible robot; `task` was appended to the pending queue.
    fn on_pending(&self, _task: &Task) {}

    /// `robot` reported the outcome of `task`.
    fn on_finished(&self, _robot: RobotId, _task: &Task, _succeeded: bool) {}

    /// `robot` joined the available set.
    fn on_available(&self, _robot: RobotId) {}

    /// `robot` timed out waiting for a charger and was queued for the next
    /// free one.
    fn on_charge_waiter(&self, _robot: RobotId) {}

    /// A released charger went straight to a queued charge-waiter.
    fn on_reserved_handoff(&self, _robot: RobotId, _station: &Station) {}
}

/// A [`DispatchObserver`] that does nothing.
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}
