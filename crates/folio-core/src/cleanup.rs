//! Cleanup registry
//!
//! Tracks the timers, observers and listeners that components create so a
//! page teardown can release all of them in one deterministic pass.
//!
//! Timers are tracked by handle and cancelled through the scheduler.
//! Everything else is tracked as a disposer closure, in the same spirit as
//! an unsubscribe function: registering work returns nothing, and releasing
//! the owner runs the closure exactly once.

use crate::ids::InstanceId;
use crate::schedule::{Scheduler, TimerHandle};

/// Closure that releases a host resource (observer, listener, ...)
pub type Disposer = Box<dyn FnOnce()>;

/// Who a tracked resource belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// A single carousel instance
    Instance(InstanceId),
    /// The visibility signal
    Visibility,
    /// The fullscreen coordinator
    Fullscreen,
    /// Page-wide listeners
    Page,
}

enum Tracked {
    Timer(TimerHandle),
    Disposer(Disposer),
}

impl std::fmt::Debug for Tracked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timer(handle) => f.debug_tuple("Timer").field(handle).finish(),
            Self::Disposer(_) => f.write_str("Disposer"),
        }
    }
}

/// Resources removed from the registry and waiting to be released
///
/// Released outside of any borrow on the registry, so disposers are free to
/// call back into code that touches it.
#[derive(Debug, Default)]
#[must_use = "drained resources leak unless released"]
pub struct Drained {
    items: Vec<Tracked>,
}

impl Drained {
    /// Cancel timers and run disposers in registration order.
    /// Returns how many resources were released.
    pub fn release(self, scheduler: &dyn Scheduler) -> usize {
        let count = self.items.len();
        for item in self.items {
            match item {
                Tracked::Timer(handle) => scheduler.cancel(handle),
                Tracked::Disposer(dispose) => dispose(),
            }
        }
        count
    }
}

/// Registry of live resources keyed by owner
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    entries: Vec<(Owner, Tracked)>,
}

impl CleanupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a scheduled timer
    pub fn track_timer(&mut self, owner: Owner, handle: TimerHandle) {
        self.entries.push((owner, Tracked::Timer(handle)));
    }

    /// Stop tracking a timer that fired or was cancelled.
    /// Returns false if it was not tracked.
    pub fn forget_timer(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|(_, t)| !matches!(t, Tracked::Timer(h) if *h == handle));
        self.entries.len() != before
    }

    /// Track a disposer to run when `owner` is released
    pub fn track_disposer(&mut self, owner: Owner, dispose: Disposer) {
        self.entries.push((owner, Tracked::Disposer(dispose)));
    }

    /// Remove everything owned by `owner`
    pub fn drain(&mut self, owner: Owner) -> Drained {
        let mut items = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for (o, tracked) in self.entries.drain(..) {
            if o == owner {
                items.push(tracked);
            } else {
                kept.push((o, tracked));
            }
        }
        self.entries = kept;
        Drained { items }
    }

    /// Remove everything
    pub fn drain_all(&mut self) -> Drained {
        Drained {
            items: self.entries.drain(..).map(|(_, t)| t).collect(),
        }
    }

    /// Number of resources tracked for `owner`
    pub fn tracked(&self, owner: Owner) -> usize {
        self.entries.iter().filter(|(o, _)| *o == owner).count()
    }

    /// Total number of tracked resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
