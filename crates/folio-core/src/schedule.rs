//! Deferred work as typed messages
//!
//! Nothing in the core holds a closure over its own state. Every deferred
//! callback is a [`Task`] handed to a [`Scheduler`]; when the delay elapses
//! the host gives the task back to [`Page::dispatch`](crate::Page::dispatch),
//! which routes it to its owner. Owners re-check their state on arrival,
//! since anything may have happened in between.

use std::cell::RefCell;

use crate::ids::InstanceId;
use crate::time::{Clock, ManualClock, Millis};

/// Handle to a scheduled task, used for cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// What a scheduled task should do when it fires
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// The post-initialization settle delay has elapsed; start autoplay
    Settle,
    /// Fallback guard for a progress run that never reported completion
    FillGuard {
        /// Run generation the guard was armed for
        generation: u64,
    },
    /// The progress fill transition finished
    ///
    /// Hosts that observe `transitionend` may deliver this directly through
    /// [`Page::on_fill_transition_end`](crate::Page::on_fill_transition_end)
    /// instead of scheduling it.
    FillTransitionEnd,
    /// Delayed resume after the lightbox closed
    FullscreenResume {
        /// Lightbox session that scheduled the resume
        session: u64,
    },
}

/// A unit of deferred work addressed to one carousel instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    /// Instance the task belongs to
    pub owner: InstanceId,
    /// What to do
    pub kind: TaskKind,
}

impl Task {
    /// Create a task for `owner`
    pub fn new(owner: InstanceId, kind: TaskKind) -> Self {
        Self { owner, kind }
    }
}

/// Runs tasks after a delay
///
/// Implementations must never deliver a task synchronously from inside
/// `schedule`; delivery always happens later, from the host's event loop.
pub trait Scheduler {
    /// Schedule `task` to be delivered after `delay` milliseconds
    fn schedule(&self, delay: Millis, task: Task) -> TimerHandle;

    /// Cancel a scheduled task. Unknown or already-fired handles are ignored.
    fn cancel(&self, handle: TimerHandle);
}

#[derive(Debug)]
struct Pending {
    deadline: Millis,
    seq: u64,
    handle: TimerHandle,
    task: Task,
}

#[derive(Debug, Default)]
struct VirtualQueue {
    next_handle: u64,
    next_seq: u64,
    pending: Vec<Pending>,
}

/// Deterministic scheduler over a [`ManualClock`]
///
/// Tasks fire in deadline order, ties broken by scheduling order. Popping a
/// task moves the clock to its deadline.
#[derive(Debug)]
pub struct VirtualScheduler {
    clock: ManualClock,
    queue: RefCell<VirtualQueue>,
}

impl VirtualScheduler {
    /// Create a scheduler that reads and advances `clock`
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: RefCell::new(VirtualQueue::default()),
        }
    }

    /// The clock this scheduler drives
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Number of tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Earliest deadline among pending tasks
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue
            .borrow()
            .pending
            .iter()
            .map(|p| p.deadline)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Remove and return the earliest task due at or before `until`,
    /// advancing the clock to its deadline.
    pub fn pop_due(&self, until: Millis) -> Option<Task> {
        let mut queue = self.queue.borrow_mut();
        let index = queue
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= until)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then_with(|| a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i)?;
        let entry = queue.pending.swap_remove(index);
        drop(queue);
        self.clock.set(entry.deadline);
        Some(entry.task)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, delay: Millis, task: Task) -> TimerHandle {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let mut queue = self.queue.borrow_mut();
        queue.next_handle += 1;
        queue.next_seq += 1;
        let handle = TimerHandle(queue.next_handle);
        let seq = queue.next_seq;
        queue.pending.push(Pending {
            deadline: self.clock.now() + delay,
            seq,
            handle,
            task,
        });
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        self.queue.borrow_mut().pending.retain(|p| p.handle != handle);
    }
}
