//! Shared environment injected into every component
//!
//! The environment bundles the clock, the scheduler and the cleanup registry.
//! It is constructed once per page and cloned into each component, which
//! keeps the services explicit instead of hiding them in globals and lets a
//! test build a fresh, isolated page every time.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cleanup::{CleanupRegistry, Disposer, Owner};
use crate::schedule::{Scheduler, Task, TimerHandle};
use crate::time::{Clock, Millis};

/// Clock, scheduler and cleanup registry for one page
#[derive(Clone)]
pub struct Env {
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    cleanup: Rc<RefCell<CleanupRegistry>>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("now", &self.clock.now())
            .field("tracked", &self.cleanup.borrow().len())
            .finish()
    }
}

impl Env {
    /// Create an environment from a clock and a scheduler
    pub fn new(clock: Rc<dyn Clock>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            clock,
            scheduler,
            cleanup: Rc::new(RefCell::new(CleanupRegistry::new())),
        }
    }

    /// Current time
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// The clock, for views that interpolate against it
    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    /// Schedule a task and track its timer under `owner`
    pub fn schedule(&self, owner: Owner, delay: Millis, task: Task) -> TimerHandle {
        let handle = self.scheduler.schedule(delay, task);
        self.cleanup.borrow_mut().track_timer(owner, handle);
        handle
    }

    /// Cancel a timer and stop tracking it
    pub fn cancel(&self, handle: TimerHandle) {
        self.cleanup.borrow_mut().forget_timer(handle);
        self.scheduler.cancel(handle);
    }

    /// Stop tracking a timer whose task has been delivered
    pub fn fired(&self, handle: TimerHandle) {
        self.cleanup.borrow_mut().forget_timer(handle);
    }

    /// Track a host resource to release with `owner`
    pub fn track(&self, owner: Owner, dispose: Disposer) {
        self.cleanup.borrow_mut().track_disposer(owner, dispose);
    }

    /// Release everything tracked for `owner`
    pub fn release(&self, owner: Owner) -> usize {
        let drained = self.cleanup.borrow_mut().drain(owner);
        drained.release(self.scheduler.as_ref())
    }

    /// Release every tracked resource
    pub fn release_all(&self) -> usize {
        let drained = self.cleanup.borrow_mut().drain_all();
        drained.release(self.scheduler.as_ref())
    }

    /// Number of resources tracked for `owner`
    pub fn tracked(&self, owner: Owner) -> usize {
        self.cleanup.borrow().tracked(owner)
    }

    /// Total number of tracked resources
    pub fn tracked_total(&self) -> usize {
        self.cleanup.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::InstanceId;
    use crate::schedule::{TaskKind, VirtualScheduler};
    use crate::time::ManualClock;

    #[test]
    fn test_schedule_tracks_and_cancel_forgets() {
        let clock = ManualClock::new();
        let scheduler = Rc::new(VirtualScheduler::new(clock.clone()));
        let env = Env::new(Rc::new(clock), scheduler.clone());
        let owner = Owner::Instance(InstanceId(1));

        let handle = env.schedule(owner, 100.0, Task::new(InstanceId(1), TaskKind::Settle));
        assert_eq!(env.tracked(owner), 1);
        assert_eq!(scheduler.pending(), 1);

        env.cancel(handle);
        assert_eq!(env.tracked(owner), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_release_owner() {
        let clock = ManualClock::new();
        let scheduler = Rc::new(VirtualScheduler::new(clock.clone()));
        let env = Env::new(Rc::new(clock), scheduler.clone());
        let owner = Owner::Instance(InstanceId(2));
        env.schedule(owner, 10.0, Task::new(InstanceId(2), TaskKind::Settle));
        env.schedule(Owner::Fullscreen, 10.0, Task::new(InstanceId(2), TaskKind::Settle));

        assert_eq!(env.release(owner), 1);
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(env.release_all(), 1);
        assert_eq!(scheduler.pending(), 0);
    }
}
