//! Headless host
//!
//! Runs a [`Page`] without a browser: time is a [`ManualClock`], deferred
//! work goes through a [`VirtualScheduler`], and the views record what they
//! were asked to render. Every view hands out a cheap probe sharing its
//! state, so tests can inspect rendering after the view itself has been
//! boxed into the page.

use std::cell::RefCell;
use std::rc::Rc;

use crate::carousel::SlideView;
use crate::config::PageConfig;
use crate::env::Env;
use crate::error::{FolioError, FolioResult};
use crate::fullscreen::{ImageRef, LightboxView};
use crate::ids::{ContainerId, InstanceId};
use crate::page::{GalleryMount, Page};
use crate::progress::ProgressBar;
use crate::schedule::VirtualScheduler;
use crate::time::{clamp_fraction, Clock, ManualClock, Millis};
use crate::visibility::{Observation, ObservationMode};

// =============================================================================
// Progress bar
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct Animation {
    from: f64,
    to: f64,
    started_at: Millis,
    duration: Millis,
}

#[derive(Debug, Default)]
struct FillState {
    value: f64,
    animation: Option<Animation>,
}

impl FillState {
    fn fill_at(&self, now: Millis) -> f64 {
        match self.animation {
            Some(a) if a.duration > 0.0 => {
                let t = clamp_fraction((now - a.started_at) / a.duration);
                a.from + (a.to - a.from) * t
            }
            Some(a) => a.to,
            None => self.value,
        }
    }

    fn animating_at(&self, now: Millis) -> bool {
        self.animation
            .is_some_and(|a| now < a.started_at + a.duration)
    }
}

/// Progress bar whose fill interpolates linearly against a clock
pub struct SimulatedProgressBar {
    clock: Rc<dyn Clock>,
    state: Rc<RefCell<FillState>>,
    readable: bool,
}

impl SimulatedProgressBar {
    /// Create a bar at 0%
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(FillState::default())),
            readable: true,
        }
    }

    /// Create a bar whose rendered width can't be read back
    pub fn unreadable(clock: Rc<dyn Clock>) -> Self {
        Self {
            readable: false,
            ..Self::new(clock)
        }
    }

    /// Probe sharing this bar's state
    pub fn probe(&self) -> ProgressProbe {
        ProgressProbe {
            clock: self.clock.clone(),
            state: self.state.clone(),
        }
    }
}

impl ProgressBar for SimulatedProgressBar {
    fn animate_fill(&mut self, from: f64, to: f64, duration_ms: Millis) {
        self.state.borrow_mut().animation = Some(Animation {
            from,
            to,
            started_at: self.clock.now(),
            duration: duration_ms,
        });
    }

    fn set_fill(&mut self, fraction: f64) {
        let mut state = self.state.borrow_mut();
        state.animation = None;
        state.value = fraction;
    }

    fn rendered_fill(&self) -> Option<f64> {
        self.readable
            .then(|| self.state.borrow().fill_at(self.clock.now()))
    }
}

/// Read-only view of a [`SimulatedProgressBar`]
#[derive(Clone)]
pub struct ProgressProbe {
    clock: Rc<dyn Clock>,
    state: Rc<RefCell<FillState>>,
}

impl std::fmt::Debug for ProgressProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressProbe")
            .field("fill", &self.fill())
            .finish()
    }
}

impl ProgressProbe {
    /// Fill fraction as rendered right now
    pub fn fill(&self) -> f64 {
        self.state.borrow().fill_at(self.clock.now())
    }

    /// Whether a fill transition is in progress
    pub fn is_animating(&self) -> bool {
        self.state.borrow().animating_at(self.clock.now())
    }
}

// =============================================================================
// Slides
// =============================================================================

/// Slide view that records every change
#[derive(Default)]
pub struct RecordingSlides {
    history: Rc<RefCell<Vec<(usize, bool)>>>,
}

impl RecordingSlides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe sharing this view's history
    pub fn probe(&self) -> SlideProbe {
        SlideProbe {
            history: self.history.clone(),
        }
    }
}

impl SlideView for RecordingSlides {
    fn show_slide(&mut self, index: usize, _count: usize, animate: bool) {
        self.history.borrow_mut().push((index, animate));
    }
}

/// Read-only view of a [`RecordingSlides`]
#[derive(Clone, Debug)]
pub struct SlideProbe {
    history: Rc<RefCell<Vec<(usize, bool)>>>,
}

impl SlideProbe {
    /// Last shown slide
    pub fn last(&self) -> Option<usize> {
        self.history.borrow().last().map(|(i, _)| *i)
    }

    /// Whether the last change was animated
    pub fn last_animated(&self) -> Option<bool> {
        self.history.borrow().last().map(|(_, a)| *a)
    }

    /// Every shown slide, in order
    pub fn history(&self) -> Vec<usize> {
        self.history.borrow().iter().map(|(i, _)| *i).collect()
    }
}

// =============================================================================
// Lightbox
// =============================================================================

#[derive(Debug, Default)]
struct LightboxState {
    shown: Option<(String, usize, usize)>,
    shows: usize,
}

/// Lightbox view that records what it shows
#[derive(Default)]
pub struct RecordingLightbox {
    state: Rc<RefCell<LightboxState>>,
}

impl RecordingLightbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe sharing this view's state
    pub fn probe(&self) -> LightboxProbe {
        LightboxProbe {
            state: self.state.clone(),
        }
    }
}

impl LightboxView for RecordingLightbox {
    fn show(&mut self, image: &ImageRef, index: usize, count: usize) {
        let mut state = self.state.borrow_mut();
        state.shown = Some((image.src.clone(), index, count));
        state.shows += 1;
    }

    fn hide(&mut self) {
        self.state.borrow_mut().shown = None;
    }
}

/// Read-only view of a [`RecordingLightbox`]
#[derive(Clone)]
pub struct LightboxProbe {
    state: Rc<RefCell<LightboxState>>,
}

impl LightboxProbe {
    /// Whether the overlay is showing
    pub fn is_open(&self) -> bool {
        self.state.borrow().shown.is_some()
    }

    /// `(src, index, count)` of the shown image
    pub fn shown(&self) -> Option<(String, usize, usize)> {
        self.state.borrow().shown.clone()
    }

    /// Number of show calls so far
    pub fn shows(&self) -> usize {
        self.state.borrow().shows
    }
}

// =============================================================================
// Host
// =============================================================================

/// Handles to one mounted gallery's views
#[derive(Clone, Debug)]
pub struct GalleryProbe {
    pub id: InstanceId,
    pub container: ContainerId,
    pub slides: SlideProbe,
    pub fill: ProgressProbe,
}

/// Deterministic page host
pub struct HeadlessHost {
    clock: ManualClock,
    scheduler: Rc<VirtualScheduler>,
    page: Page,
    lightbox: LightboxProbe,
}

impl HeadlessHost {
    /// Create a host whose galleries are driven by observations
    pub fn new(config: PageConfig) -> Self {
        Self::with_mode(config, ObservationMode::Observed)
    }

    /// Create a host with an explicit observation mode
    pub fn with_mode(config: PageConfig, mode: ObservationMode) -> Self {
        let clock = ManualClock::new();
        let scheduler = Rc::new(VirtualScheduler::new(clock.clone()));
        let env = Env::new(Rc::new(clock.clone()), scheduler.clone());
        let lightbox = RecordingLightbox::new();
        let probe = lightbox.probe();
        let page = Page::new(env, config, Box::new(lightbox), mode);
        Self {
            clock,
            scheduler,
            page,
            lightbox: probe,
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// The scheduler
    pub fn scheduler(&self) -> &VirtualScheduler {
        &self.scheduler
    }

    /// The page
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// The page, mutably
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Lightbox probe
    pub fn lightbox(&self) -> &LightboxProbe {
        &self.lightbox
    }

    /// Mount a gallery with `slide_count` simulated slides
    pub fn mount(&mut self, container: ContainerId, slide_count: usize) -> FolioResult<GalleryProbe> {
        let slides = RecordingSlides::new();
        let bar = SimulatedProgressBar::new(Rc::new(self.clock.clone()));
        let probe = GalleryProbe {
            id: InstanceId(0),
            container,
            slides: slides.probe(),
            fill: bar.probe(),
        };
        let id = self.page.mount_gallery(GalleryMount {
            container,
            slide_count,
            slides: Box::new(slides),
            progress: Box::new(bar),
        })?;
        Ok(GalleryProbe { id, ..probe })
    }

    /// Deliver every task due up to `t` and move the clock there.
    /// Returns the number of tasks delivered.
    pub fn run_until(&mut self, t: Millis) -> usize {
        let mut delivered = 0;
        while let Some(task) = self.scheduler.pop_due(t) {
            self.page.dispatch(task);
            delivered += 1;
        }
        self.clock.set(t);
        delivered
    }

    /// Run for `dt` milliseconds
    pub fn advance_by(&mut self, dt: Millis) -> usize {
        let t = self.clock.now() + dt;
        self.run_until(t)
    }

    /// Report `container` fully on screen
    pub fn scroll_into_view(&mut self, container: ContainerId) {
        self.page.observe(container, Observation::visible());
    }

    /// Report `container` fully off screen
    pub fn scroll_out_of_view(&mut self, container: ContainerId) {
        self.page.observe(container, Observation::hidden());
    }

    /// Run to the gallery's autoplay deadline and deliver the fill's
    /// transition end, the way a browser completes a run.
    pub fn finish_fill(&mut self, container: ContainerId) -> FolioResult<bool> {
        let deadline = self
            .page
            .instance(container)
            .ok_or(FolioError::UnknownContainer(container))?
            .autoplay_deadline();
        let Some(deadline) = deadline else {
            return Ok(false);
        };
        self.run_until(deadline);
        self.page.on_fill_transition_end(container)
    }
}
