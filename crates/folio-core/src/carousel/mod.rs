//! Carousel lifecycle state machine
//!
//! One [`CarouselInstance`] per image gallery. It is the only thing allowed
//! to change a gallery's slide index or pause state; buttons, keys, swipes,
//! the visibility signal and the lightbox all go through its operations.
//!
//! ## States
//!
//! ```text
//!                 first viewport entry
//!  Uninitialized ─────────────────────▶ Playing ◀──────┐
//!        │                               │             │ last reason cleared
//!        │                 any pause     ▼             │
//!        │                           Paused(reasons) ──┘
//!        │                               │
//!        └──────────── teardown ─────────┴──────────▶ Destroyed
//! ```
//!
//! The instance plays iff it is initialized, not destroyed and no pause
//! reason is set. Setting any reason stops the progress timer; only
//! clearing the last one restarts it, from wherever the fill was frozen.
//!
//! Every slide change, automatic or not, goes through
//! [`advance_to`](CarouselInstance::advance_to) and always leaves the fill
//! at 0% for the new slide.

mod target;

pub use target::AdvanceTarget;

use crate::cleanup::Owner;
use crate::config::PageConfig;
use crate::env::Env;
use crate::error::{FolioError, FolioResult};
use crate::ids::{ContainerId, InstanceId};
use crate::pause::{PauseReasons, PauseSource};
use crate::progress::{Completion, ProgressBar, ProgressTimer};
use crate::schedule::{Task, TaskKind, TimerHandle};
use crate::time::Millis;

/// Renders the active slide
pub trait SlideView {
    /// Make `index` the visible slide out of `count`
    fn show_slide(&mut self, index: usize, count: usize, animate: bool);
}

/// Observable lifecycle state of an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarouselState {
    /// Never been on screen
    Uninitialized,
    /// Autoplaying
    Playing,
    /// Suspended for the given reasons
    Paused(PauseReasons),
    /// Torn down; every operation is a no-op
    Destroyed,
}

/// Runtime state of one gallery
pub struct CarouselInstance {
    id: InstanceId,
    container: ContainerId,
    slide_count: usize,
    active_index: usize,
    pauses: PauseReasons,
    initialized: bool,
    destroyed: bool,
    settle: Option<TimerHandle>,
    settle_delay: Millis,
    animate_slides: bool,
    auto_advances: u64,
    progress: ProgressTimer,
    slides: Box<dyn SlideView>,
    env: Env,
}

impl std::fmt::Debug for CarouselInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselInstance")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("slide_count", &self.slide_count)
            .field("active_index", &self.active_index)
            .field("pauses", &self.pauses)
            .field("initialized", &self.initialized)
            .field("destroyed", &self.destroyed)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl CarouselInstance {
    /// Create an instance for a gallery with `slide_count` slides
    ///
    /// Fails with [`FolioError::MissingSlides`] when there is nothing to
    /// rotate. The instance starts uninitialized: autoplay begins only after
    /// its first viewport entry.
    pub fn new(
        id: InstanceId,
        container: ContainerId,
        slide_count: usize,
        config: &PageConfig,
        env: Env,
        slides: Box<dyn SlideView>,
        bar: Box<dyn ProgressBar>,
    ) -> FolioResult<Self> {
        if slide_count == 0 {
            return Err(FolioError::MissingSlides(container));
        }
        let motion = config.tier.motion_profile();
        let carousel = &config.carousel;
        let progress = ProgressTimer::new(
            id,
            carousel.interval_ms,
            carousel.guard_margin_ms,
            carousel.transition_end_tolerance_ms,
            bar,
        )
        .with_compositor_hints(motion.compositor_hints);

        Ok(Self {
            id,
            container,
            slide_count,
            active_index: 0,
            pauses: PauseReasons::empty(),
            initialized: false,
            destroyed: false,
            settle: None,
            settle_delay: config.effective_settle_delay(),
            animate_slides: motion.animate_slides,
            auto_advances: 0,
            progress,
            slides,
            env,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Instance ID
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Container this instance was mounted on
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Number of slides
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Currently shown slide
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Active pause reasons
    pub fn pause_reasons(&self) -> PauseReasons {
        self.pauses
    }

    /// Whether a specific source is holding a pause
    pub fn is_paused_by(&self, source: PauseSource) -> bool {
        self.pauses.contains(source.reason())
    }

    /// Whether the first viewport entry has happened
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the instance has been torn down
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Initialized, alive and not paused for any reason
    pub fn is_playing(&self) -> bool {
        self.initialized && !self.destroyed && self.pauses.is_empty()
    }

    /// Whether the progress timer is currently counting down
    pub fn is_timer_running(&self) -> bool {
        self.progress.is_running()
    }

    /// Whether autoplay is waiting on the post-initialization settle delay
    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Lifecycle state
    pub fn state(&self) -> CarouselState {
        if self.destroyed {
            CarouselState::Destroyed
        } else if !self.initialized {
            CarouselState::Uninitialized
        } else if self.pauses.is_empty() {
            CarouselState::Playing
        } else {
            CarouselState::Paused(self.pauses)
        }
    }

    /// Progress fill fraction right now
    pub fn progress_fraction(&self) -> f64 {
        self.progress.fraction(self.env.now())
    }

    /// Elapsed time remembered from the last pause
    pub fn elapsed_at_last_pause(&self) -> Millis {
        self.progress.elapsed_at_pause()
    }

    /// When autoplay will next advance, if it is counting down
    pub fn autoplay_deadline(&self) -> Option<Millis> {
        self.progress.deadline()
    }

    /// Number of automatic advances so far
    pub fn auto_advances(&self) -> u64 {
        self.auto_advances
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// First viewport entry. Valid once; later calls return false.
    ///
    /// Shows slide 0 with an empty fill. If no pause reason is set, autoplay
    /// starts after the settle delay. Otherwise autoplay is owed and starts
    /// when the last reason clears.
    pub fn initialize(&mut self) -> bool {
        if self.destroyed || self.initialized {
            return false;
        }
        self.initialized = true;
        self.active_index = 0;
        self.slides.show_slide(0, self.slide_count, false);
        self.progress.reset(&self.env);

        if self.pauses.is_empty() {
            self.settle = Some(self.env.schedule(
                Owner::Instance(self.id),
                self.settle_delay,
                Task::new(self.id, TaskKind::Settle),
            ));
            tracing::debug!(instance = %self.id, "initialized, autoplay after settle delay");
        } else {
            tracing::debug!(
                instance = %self.id,
                reasons = ?self.pauses,
                "initialized while paused, autoplay owed"
            );
        }
        true
    }

    /// Change slide. The single path for next, previous, dots, swipes and keys.
    ///
    /// Stops the timer, wraps the target into range, shows it with an empty
    /// fill and, if playing, restarts the timer for a full interval.
    /// Returns the new index, or `None` once destroyed.
    pub fn advance_to(&mut self, target: AdvanceTarget) -> Option<usize> {
        if self.destroyed {
            return None;
        }
        self.cancel_settle();
        self.progress.reset(&self.env);

        let index = target.resolve(self.active_index, self.slide_count);
        self.active_index = index;
        self.slides
            .show_slide(index, self.slide_count, self.animate_slides);

        if self.is_playing() {
            self.progress.start(&self.env, self.progress.interval());
        }
        Some(index)
    }

    /// Set one pause reason. Returns true if it was not already set.
    pub fn request_pause(&mut self, source: PauseSource) -> bool {
        if self.destroyed {
            return false;
        }
        let reason = source.reason();
        if self.pauses.contains(reason) {
            return false;
        }
        let was_playing = self.is_playing();
        self.pauses.insert(reason);

        if was_playing {
            self.cancel_settle();
            let elapsed = self.progress.stop(&self.env);
            tracing::debug!(instance = %self.id, source = source.id(), elapsed, "paused");
        }
        true
    }

    /// Clear one pause reason. Returns true if it was set.
    ///
    /// Playback only restarts if no other reason still holds a pause, and
    /// then continues from where the fill was frozen.
    pub fn request_resume(&mut self, source: PauseSource) -> bool {
        if self.destroyed {
            return false;
        }
        let reason = source.reason();
        if !self.pauses.contains(reason) {
            return false;
        }
        self.pauses.remove(reason);

        if self.is_playing() && !self.progress.is_running() && self.settle.is_none() {
            self.progress.resume(&self.env);
            tracing::debug!(
                instance = %self.id,
                source = source.id(),
                from = self.progress.elapsed_at_pause(),
                "resumed"
            );
        }
        true
    }

    /// Terminal. Stops everything and clears every pause reason.
    /// Returns false if already destroyed.
    pub fn teardown(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        self.cancel_settle();
        self.progress.dispose(&self.env);
        self.pauses = PauseReasons::empty();
        let released = self.env.release(Owner::Instance(self.id));
        tracing::debug!(instance = %self.id, released, "torn down");
        true
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Deliver a fired task. Returns true if it changed anything.
    pub(crate) fn handle_task(&mut self, kind: TaskKind) -> bool {
        if self.destroyed {
            tracing::trace!(instance = %self.id, ?kind, "task after teardown discarded");
            return false;
        }
        match kind {
            TaskKind::Settle => self.on_settle(),
            TaskKind::FillGuard { generation } => {
                self.complete(Completion::Guard { generation })
            }
            TaskKind::FillTransitionEnd => self.complete(Completion::TransitionEnd),
            TaskKind::FullscreenResume { .. } => self.request_resume(PauseSource::Fullscreen),
        }
    }

    fn on_settle(&mut self) -> bool {
        let Some(handle) = self.settle.take() else {
            return false;
        };
        self.env.fired(handle);
        if !self.is_playing() || self.progress.is_running() {
            return false;
        }
        self.progress.resume(&self.env);
        tracing::debug!(instance = %self.id, "autoplay started");
        true
    }

    fn complete(&mut self, via: Completion) -> bool {
        if !self.progress.complete(&self.env, via) {
            return false;
        }
        self.on_auto_advance()
    }

    /// Timer completion: advance by one if still playing
    fn on_auto_advance(&mut self) -> bool {
        if !self.is_playing() {
            tracing::trace!(instance = %self.id, "auto-advance while paused discarded");
            return false;
        }
        self.progress.reset(&self.env);
        self.auto_advances += 1;
        self.advance_to(AdvanceTarget::Next).is_some()
    }

    fn cancel_settle(&mut self) {
        if let Some(handle) = self.settle.take() {
            self.env.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{ProgressProbe, RecordingSlides, SimulatedProgressBar, SlideProbe};
    use crate::schedule::VirtualScheduler;
    use crate::time::{Clock, ManualClock};
    use std::rc::Rc;

    struct Rig {
        clock: ManualClock,
        scheduler: Rc<VirtualScheduler>,
        carousel: CarouselInstance,
        slides: SlideProbe,
        fill: ProgressProbe,
    }

    impl Rig {
        fn new(slide_count: usize) -> Self {
            let clock = ManualClock::new();
            let scheduler = Rc::new(VirtualScheduler::new(clock.clone()));
            let env = Env::new(Rc::new(clock.clone()), scheduler.clone());
            let slides = RecordingSlides::new();
            let bar = SimulatedProgressBar::new(env.clock());
            let (slide_probe, fill) = (slides.probe(), bar.probe());
            let carousel = CarouselInstance::new(
                InstanceId(1),
                ContainerId(1),
                slide_count,
                &PageConfig::default(),
                env,
                Box::new(slides),
                Box::new(bar),
            )
            .unwrap();
            Self {
                clock,
                scheduler,
                carousel,
                slides: slide_probe,
                fill,
            }
        }

        /// Deliver every task due by now + dt
        fn run_for(&mut self, dt: Millis) {
            let until = self.clock.now() + dt;
            while let Some(task) = self.scheduler.pop_due(until) {
                self.carousel.handle_task(task.kind);
            }
            self.clock.set(until);
        }
    }

    #[test]
    fn test_no_slides_is_rejected() {
        let clock = ManualClock::new();
        let scheduler = Rc::new(VirtualScheduler::new(clock.clone()));
        let env = Env::new(Rc::new(clock.clone()), scheduler);
        let err = CarouselInstance::new(
            InstanceId(1),
            ContainerId(9),
            0,
            &PageConfig::default(),
            env.clone(),
            Box::new(RecordingSlides::new()),
            Box::new(SimulatedProgressBar::new(env.clock())),
        )
        .unwrap_err();
        assert_eq!(err, FolioError::MissingSlides(ContainerId(9)));
    }

    #[test]
    fn test_lazy_start() {
        let mut rig = Rig::new(3);
        assert_eq!(rig.carousel.state(), CarouselState::Uninitialized);
        rig.run_for(10_000.0);
        assert_eq!(rig.carousel.active_index(), 0);
        assert!(!rig.carousel.is_timer_running());
    }

    #[test]
    fn test_initialize_once_then_settle() {
        let mut rig = Rig::new(3);
        assert!(rig.carousel.initialize());
        assert!(!rig.carousel.initialize());
        assert!(rig.carousel.is_settling());
        assert!(!rig.carousel.is_timer_running());
        assert_eq!(rig.slides.last(), Some(0));

        rig.run_for(100.0);
        assert!(rig.carousel.is_timer_running());
        assert_eq!(rig.carousel.state(), CarouselState::Playing);
    }

    #[test]
    fn test_initialize_while_paused_owes_autoplay() {
        let mut rig = Rig::new(3);
        rig.carousel.request_pause(PauseSource::Fullscreen);
        rig.carousel.initialize();
        assert!(!rig.carousel.is_settling());
        rig.run_for(10_000.0);
        assert!(!rig.carousel.is_timer_running());

        rig.carousel.request_resume(PauseSource::Fullscreen);
        assert!(rig.carousel.is_timer_running());
        assert_eq!(rig.carousel.autoplay_deadline(), Some(rig.clock.now() + 5000.0));
    }

    #[test]
    fn test_auto_advance_cycle() {
        let mut rig = Rig::new(3);
        rig.carousel.initialize();
        rig.run_for(100.0);
        // Guard fires 200ms after the expected end
        rig.run_for(5200.0);
        assert_eq!(rig.carousel.active_index(), 1);
        assert_eq!(rig.carousel.auto_advances(), 1);
        assert!(rig.carousel.is_timer_running());
    }

    #[test]
    fn test_transition_end_advances_and_guard_is_inert() {
        let mut rig = Rig::new(3);
        rig.carousel.initialize();
        rig.run_for(100.0);
        rig.clock.advance(5000.0);
        assert!(rig.carousel.handle_task(TaskKind::FillTransitionEnd));
        assert_eq!(rig.carousel.active_index(), 1);
        assert!(!rig.carousel.handle_task(TaskKind::FillTransitionEnd));
        rig.run_for(300.0);
        assert_eq!(rig.carousel.active_index(), 1);
        assert_eq!(rig.carousel.auto_advances(), 1);
    }

    #[test]
    fn test_manual_advance_resets_progress() {
        let mut rig = Rig::new(4);
        rig.carousel.initialize();
        rig.run_for(100.0);
        rig.run_for(2500.0);
        assert!(rig.fill.fill() > 0.4);

        assert_eq!(rig.carousel.advance_to(AdvanceTarget::Previous), Some(3));
        assert_eq!(rig.fill.fill(), 0.0);
        assert_eq!(
            rig.carousel.autoplay_deadline(),
            Some(rig.clock.now() + 5000.0)
        );
    }

    #[test]
    fn test_advance_while_paused_leaves_fill_at_zero() {
        let mut rig = Rig::new(4);
        rig.carousel.initialize();
        rig.run_for(100.0);
        rig.run_for(2000.0);
        rig.carousel.request_pause(PauseSource::Manual);
        rig.carousel.advance_to(AdvanceTarget::Next);
        assert!(!rig.carousel.is_timer_running());
        assert_eq!(rig.fill.fill(), 0.0);
        assert_eq!(rig.carousel.elapsed_at_last_pause(), 0.0);

        rig.carousel.request_resume(PauseSource::Manual);
        assert_eq!(
            rig.carousel.autoplay_deadline(),
            Some(rig.clock.now() + 5000.0)
        );
    }

    #[test]
    fn test_pause_during_settle_cancels_it() {
        let mut rig = Rig::new(2);
        rig.carousel.initialize();
        rig.carousel.request_pause(PauseSource::Viewport);
        assert!(!rig.carousel.is_settling());
        assert_eq!(rig.scheduler.pending(), 0);
        rig.carousel.request_resume(PauseSource::Viewport);
        assert!(rig.carousel.is_timer_running());
    }

    #[test]
    fn test_pause_composition() {
        let mut rig = Rig::new(3);
        rig.carousel.initialize();
        rig.run_for(100.0);

        rig.carousel.request_pause(PauseSource::Viewport);
        rig.carousel.request_pause(PauseSource::Manual);
        rig.carousel.request_resume(PauseSource::Viewport);
        assert!(!rig.carousel.is_timer_running());
        assert_eq!(
            rig.carousel.state(),
            CarouselState::Paused(PauseReasons::MANUAL)
        );

        rig.carousel.request_resume(PauseSource::Manual);
        assert!(rig.carousel.is_timer_running());
    }

    #[test]
    fn test_duplicate_requests_report_no_change() {
        let mut rig = Rig::new(3);
        assert!(rig.carousel.request_pause(PauseSource::Manual));
        assert!(!rig.carousel.request_pause(PauseSource::Manual));
        assert!(rig.carousel.request_resume(PauseSource::Manual));
        assert!(!rig.carousel.request_resume(PauseSource::Manual));
    }

    #[test]
    fn test_teardown_is_terminal_and_idempotent() {
        let mut rig = Rig::new(3);
        rig.carousel.initialize();
        rig.run_for(100.0);
        rig.carousel.request_pause(PauseSource::Manual);

        assert!(rig.carousel.teardown());
        assert!(!rig.carousel.teardown());
        assert_eq!(rig.carousel.state(), CarouselState::Destroyed);
        assert!(rig.carousel.pause_reasons().is_empty());
        assert_eq!(rig.scheduler.pending(), 0);

        assert_eq!(rig.carousel.advance_to(AdvanceTarget::Next), None);
        assert!(!rig.carousel.request_pause(PauseSource::Viewport));
        assert!(!rig.carousel.request_resume(PauseSource::Viewport));
        assert!(!rig.carousel.initialize());
        assert!(!rig.carousel.handle_task(TaskKind::Settle));
        assert_eq!(rig.carousel.active_index(), 0);
    }

    #[test]
    fn test_stale_guard_after_pause_does_not_advance() {
        let mut rig = Rig::new(3);
        rig.carousel.initialize();
        rig.run_for(100.0);
        rig.run_for(4000.0);
        rig.carousel.request_pause(PauseSource::Viewport);
        // A guard delivered late by the host, armed for the stopped run
        let generation = rig.carousel.progress.generation() - 1;
        assert!(!rig.carousel.handle_task(TaskKind::FillGuard { generation }));
        assert_eq!(rig.carousel.active_index(), 0);
    }
}
