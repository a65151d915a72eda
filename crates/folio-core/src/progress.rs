//! Progress timer
//!
//! Represents "time left until the next slide" twice: as a scheduled
//! completion and as a 0→100% fill on screen. The two must agree, so the
//! timer prefers the fill transition's own completion event and only falls
//! back to a guard timer (fired `guard_margin_ms` after the expected end)
//! when that event never arrives.
//!
//! ## One-shot completion
//!
//! Each [`start`](ProgressTimer::start) opens a run with a fresh generation.
//! The first completion (transition end or guard) consumes the run; anything
//! arriving afterwards finds no run, or a different generation, and is
//! dropped.
//!
//! ## Pausing
//!
//! [`stop`](ProgressTimer::stop) freezes the fill where it is actually
//! rendered, read back from the view, so a later resume continues from what
//! the user saw rather than from the last requested target.

use crate::cleanup::Owner;
use crate::env::Env;
use crate::ids::InstanceId;
use crate::schedule::{Task, TaskKind, TimerHandle};
use crate::time::{clamp_duration, clamp_fraction, Millis};

/// The visual fill of a progress bar
pub trait ProgressBar {
    /// Transition the fill from `from` to `to` (fractions) over `duration_ms`
    fn animate_fill(&mut self, from: f64, to: f64, duration_ms: Millis);

    /// Set the fill instantly, without a transition
    fn set_fill(&mut self, fraction: f64);

    /// Fill fraction as currently rendered, or `None` if it can't be read
    fn rendered_fill(&self) -> Option<f64>;

    /// Toggle compositor hints (`will-change`) while animating
    fn set_compositor_hint(&mut self, _enabled: bool) {}
}

/// How a progress run reported completion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The fill transition ended
    TransitionEnd,
    /// The fallback guard fired
    Guard {
        /// Generation the guard was armed for
        generation: u64,
    },
}

#[derive(Clone, Copy, Debug)]
struct Run {
    started_at: Millis,
    start_elapsed: Millis,
    deadline: Millis,
    generation: u64,
    guard: TimerHandle,
}

/// Autoplay timer and progress fill, owned by exactly one carousel
pub struct ProgressTimer {
    owner: InstanceId,
    interval: Millis,
    guard_margin: Millis,
    tolerance: Millis,
    compositor_hints: bool,
    elapsed: Millis,
    generation: u64,
    run: Option<Run>,
    bar: Box<dyn ProgressBar>,
}

impl std::fmt::Debug for ProgressTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTimer")
            .field("owner", &self.owner)
            .field("interval", &self.interval)
            .field("elapsed", &self.elapsed)
            .field("generation", &self.generation)
            .field("running", &self.run.is_some())
            .finish_non_exhaustive()
    }
}

impl ProgressTimer {
    /// Create a stopped timer at 0%
    pub fn new(
        owner: InstanceId,
        interval: Millis,
        guard_margin: Millis,
        tolerance: Millis,
        bar: Box<dyn ProgressBar>,
    ) -> Self {
        Self {
            owner,
            interval: interval.max(1.0),
            guard_margin: guard_margin.max(0.0),
            tolerance: tolerance.max(0.0),
            compositor_hints: false,
            elapsed: 0.0,
            generation: 0,
            run: None,
            bar,
        }
    }

    /// Allow compositor hints on the fill while it animates
    pub fn with_compositor_hints(mut self, enabled: bool) -> Self {
        self.compositor_hints = enabled;
        self
    }

    /// Full interval length
    pub fn interval(&self) -> Millis {
        self.interval
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Generation of the current (or most recent) run
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Elapsed time remembered from the last stop
    pub fn elapsed_at_pause(&self) -> Millis {
        self.elapsed
    }

    /// When the current run is expected to end
    pub fn deadline(&self) -> Option<Millis> {
        self.run.map(|r| r.deadline)
    }

    /// Elapsed time at `now`, clamped to the interval
    pub fn elapsed(&self, now: Millis) -> Millis {
        match self.run {
            Some(run) => clamp_duration(run.start_elapsed + (now - run.started_at), self.interval),
            None => self.elapsed,
        }
    }

    /// Fill fraction at `now`, clamped to `[0, 1]`
    pub fn fraction(&self, now: Millis) -> f64 {
        clamp_fraction(self.elapsed(now) / self.interval)
    }

    /// Start a run that completes after `remaining` milliseconds
    ///
    /// The fill animates from where `remaining` implies it should be
    /// (`(interval - remaining) / interval`) to 100% over exactly `remaining`.
    pub fn start(&mut self, env: &Env, remaining: Millis) {
        self.cancel_run(env);

        let remaining = clamp_duration(remaining, self.interval);
        let start_elapsed = self.interval - remaining;
        let from = clamp_fraction(start_elapsed / self.interval);
        let now = env.now();

        self.generation += 1;
        let generation = self.generation;

        if self.compositor_hints {
            self.bar.set_compositor_hint(true);
        }
        self.bar.animate_fill(from, 1.0, remaining);

        let guard = env.schedule(
            Owner::Instance(self.owner),
            remaining + self.guard_margin,
            Task::new(self.owner, TaskKind::FillGuard { generation }),
        );

        self.run = Some(Run {
            started_at: now,
            start_elapsed,
            deadline: now + remaining,
            generation,
            guard,
        });

        tracing::trace!(
            owner = %self.owner,
            generation,
            remaining,
            "progress run started"
        );
    }

    /// Start a run for whatever is left after the last stop
    pub fn resume(&mut self, env: &Env) {
        let remaining = self.interval - self.elapsed;
        self.start(env, remaining);
    }

    /// Stop the run and freeze the fill at its rendered position.
    /// Returns the remembered elapsed time.
    pub fn stop(&mut self, env: &Env) -> Millis {
        let Some(run) = self.run.take() else {
            return self.elapsed;
        };
        env.cancel(run.guard);
        self.generation += 1;

        let computed = (run.start_elapsed + (env.now() - run.started_at)) / self.interval;
        let fraction = match self.bar.rendered_fill() {
            Some(rendered) => clamp_fraction(rendered),
            None => {
                tracing::trace!(owner = %self.owner, "rendered fill unavailable, using clock");
                clamp_fraction(computed)
            }
        };

        self.bar.set_fill(fraction);
        if self.compositor_hints {
            self.bar.set_compositor_hint(false);
        }
        self.elapsed = clamp_duration(fraction * self.interval, self.interval);

        tracing::trace!(owner = %self.owner, elapsed = self.elapsed, "progress run stopped");
        self.elapsed
    }

    /// Snap the fill to 0% and forget any elapsed time
    pub fn reset(&mut self, env: &Env) {
        if self.cancel_run(env) {
            self.generation += 1;
        }
        self.elapsed = 0.0;
        self.bar.set_fill(0.0);
    }

    /// Accept a completion signal. Returns true exactly once per run.
    pub fn complete(&mut self, env: &Env, via: Completion) -> bool {
        let Some(run) = self.run else {
            tracing::trace!(owner = %self.owner, ?via, "completion without a run");
            return false;
        };

        match via {
            Completion::Guard { generation } => {
                if generation != run.generation {
                    tracing::trace!(owner = %self.owner, generation, "stale guard");
                    return false;
                }
                env.fired(run.guard);
            }
            Completion::TransitionEnd => {
                if env.now() < run.deadline - self.tolerance {
                    tracing::trace!(owner = %self.owner, "early transition end ignored");
                    return false;
                }
                env.cancel(run.guard);
            }
        }

        self.run = None;
        self.elapsed = self.interval;
        if self.compositor_hints {
            self.bar.set_compositor_hint(false);
        }
        true
    }

    /// Cancel any run without touching the fill, for teardown
    pub fn dispose(&mut self, env: &Env) {
        if self.cancel_run(env) {
            self.generation += 1;
        }
    }

    fn cancel_run(&mut self, env: &Env) -> bool {
        match self.run.take() {
            Some(run) => {
                env.cancel(run.guard);
                true
            }
            None => false,
        }
    }
}
