//! Page runtime
//!
//! The page is the explicit registry behind every gallery on screen: it maps
//! host containers to carousel instances, owns the visibility signal and the
//! lightbox coordinator, and routes host events and fired tasks to whichever
//! of them they belong to.
//!
//! ## Message flow
//!
//! ```text
//!  host events ──▶ Page ──┬──▶ VisibilitySignal ──▶ CarouselInstance
//!  fired tasks ──▶        ├──▶ FullscreenCoordinator ─(handoffs)─▶ CarouselInstance
//!                         └──▶ CarouselInstance
//! ```
//!
//! Per-gallery failures stop at the gallery: [`Page::mount_all`] logs and
//! skips a broken gallery, and routing errors are returned to the caller
//! instead of panicking. After [`Page::teardown`] every operation is a no-op.

use std::collections::{BTreeMap, HashMap};

use crate::carousel::{AdvanceTarget, CarouselInstance, SlideView};
use crate::cleanup::Owner;
use crate::config::PageConfig;
use crate::env::Env;
use crate::error::{FolioError, FolioResult};
use crate::fullscreen::{FullscreenCoordinator, Handoff, ImageRef, LightboxView};
use crate::ids::{ContainerId, InstanceId};
use crate::input::{Action, GalleryCommand, Key, SwipeTracker};
use crate::pause::PauseSource;
use crate::progress::ProgressBar;
use crate::schedule::{Task, TaskKind};
use crate::visibility::{
    Observation, ObservationMode, Subscribed, VisibilityChange, VisibilitySignal,
};

/// Everything needed to mount one gallery
pub struct GalleryMount {
    /// Host identity of the gallery's container
    pub container: ContainerId,
    /// Number of slides found in the container
    pub slide_count: usize,
    /// Slide renderer
    pub slides: Box<dyn SlideView>,
    /// Progress fill renderer
    pub progress: Box<dyn ProgressBar>,
}

impl std::fmt::Debug for GalleryMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryMount")
            .field("container", &self.container)
            .field("slide_count", &self.slide_count)
            .finish_non_exhaustive()
    }
}

/// Outcome of mounting a batch of galleries
#[derive(Debug, Default)]
pub struct MountReport {
    /// Galleries that now have an instance
    pub mounted: Vec<InstanceId>,
    /// Galleries that were skipped, and why
    pub skipped: Vec<(ContainerId, FolioError)>,
}

/// Runtime for every gallery on one page
pub struct Page {
    env: Env,
    config: PageConfig,
    instances: BTreeMap<InstanceId, CarouselInstance>,
    containers: HashMap<ContainerId, InstanceId>,
    swipes: HashMap<ContainerId, SwipeTracker>,
    visibility: VisibilitySignal,
    fullscreen: FullscreenCoordinator,
    focused: Option<ContainerId>,
    next_instance: u64,
    torn_down: bool,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("instances", &self.instances.len())
            .field("visibility", &self.visibility)
            .field("fullscreen", &self.fullscreen)
            .field("focused", &self.focused)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Create an empty page
    pub fn new(
        env: Env,
        config: PageConfig,
        lightbox: Box<dyn LightboxView>,
        mode: ObservationMode,
    ) -> Self {
        let visibility = VisibilitySignal::new(&config.visibility, mode);
        let fullscreen =
            FullscreenCoordinator::new(env.clone(), config.fullscreen.resume_delay_ms, lightbox);
        tracing::debug!(tier = config.tier.id(), ?mode, "page created");
        Self {
            env,
            config,
            instances: BTreeMap::new(),
            containers: HashMap::new(),
            swipes: HashMap::new(),
            visibility,
            fullscreen,
            focused: None,
            next_instance: 1,
            torn_down: false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Shared environment
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Page configuration
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Instance mounted on `container`
    pub fn instance(&self, container: ContainerId) -> Option<&CarouselInstance> {
        let id = self.containers.get(&container)?;
        self.instances.get(id)
    }

    /// Instance by ID
    pub fn instance_by_id(&self, id: InstanceId) -> Option<&CarouselInstance> {
        self.instances.get(&id)
    }

    /// Instance ID mounted on `container`
    pub fn instance_id(&self, container: ContainerId) -> Option<InstanceId> {
        self.containers.get(&container).copied()
    }

    /// All instances in mount order
    pub fn instances(&self) -> impl Iterator<Item = &CarouselInstance> {
        self.instances.values()
    }

    /// Number of mounted galleries
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if no gallery is mounted
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Visibility signal
    pub fn visibility(&self) -> &VisibilitySignal {
        &self.visibility
    }

    /// Lightbox coordinator
    pub fn fullscreen(&self) -> &FullscreenCoordinator {
        &self.fullscreen
    }

    /// Gallery receiving keyboard navigation
    pub fn focused(&self) -> Option<ContainerId> {
        self.focused
    }

    /// Whether the page has been torn down
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // =========================================================================
    // Mounting
    // =========================================================================

    /// Create an instance for a gallery and subscribe it to visibility
    pub fn mount_gallery(&mut self, mount: GalleryMount) -> FolioResult<InstanceId> {
        if self.torn_down {
            return Err(FolioError::TornDown);
        }
        let container = mount.container;
        if self.containers.contains_key(&container) {
            return Err(FolioError::DuplicateContainer(container));
        }

        let id = InstanceId(self.next_instance);
        let instance = CarouselInstance::new(
            id,
            container,
            mount.slide_count,
            &self.config,
            self.env.clone(),
            mount.slides,
            mount.progress,
        )?;
        self.next_instance += 1;
        self.instances.insert(id, instance);
        self.containers.insert(container, id);
        self.swipes
            .insert(container, SwipeTracker::new(self.config.carousel.swipe_threshold_px));
        tracing::debug!(%container, instance = %id, slides = mount.slide_count, "gallery mounted");

        match self.visibility.subscribe(container, id) {
            Subscribed::AlwaysVisible(change) => self.apply_visibility(change),
            Subscribed::Observing | Subscribed::AlreadySubscribed | Subscribed::ShutDown => {}
        }
        Ok(id)
    }

    /// Mount a batch, skipping (and logging) galleries that fail
    pub fn mount_all(&mut self, mounts: impl IntoIterator<Item = GalleryMount>) -> MountReport {
        let mut report = MountReport::default();
        for mount in mounts {
            let container = mount.container;
            match self.mount_gallery(mount) {
                Ok(id) => report.mounted.push(id),
                Err(e) => {
                    tracing::warn!(%container, error = %e, "gallery skipped");
                    report.skipped.push((container, e));
                }
            }
        }
        report
    }

    /// Tear down and forget the gallery on `container`
    pub fn unmount(&mut self, container: ContainerId) -> FolioResult<()> {
        let id = self
            .containers
            .remove(&container)
            .ok_or(FolioError::UnknownContainer(container))?;
        self.visibility.unsubscribe(container);
        self.swipes.remove(&container);
        if self.focused == Some(container) {
            self.focused = None;
        }
        if let Some(mut instance) = self.instances.remove(&id) {
            instance.teardown();
        }
        tracing::debug!(%container, instance = %id, "gallery unmounted");
        Ok(())
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Deliver a fired task to its owner. Returns true if it changed anything.
    pub fn dispatch(&mut self, task: Task) -> bool {
        if self.torn_down {
            tracing::trace!(?task, "task after teardown discarded");
            return false;
        }
        match task.kind {
            TaskKind::FullscreenResume { session } => {
                if !self.fullscreen.take_resume(task.owner, session) {
                    return false;
                }
                self.apply_handoff(Handoff::Resume(task.owner))
            }
            kind => match self.instances.get_mut(&task.owner) {
                Some(instance) => instance.handle_task(kind),
                None => {
                    tracing::trace!(owner = %task.owner, ?kind, "task for unknown instance");
                    false
                }
            },
        }
    }

    /// Feed an intersection report for `container`
    pub fn observe(
        &mut self,
        container: ContainerId,
        observation: Observation,
    ) -> Option<VisibilityChange> {
        if self.torn_down {
            return None;
        }
        let change = self.visibility.observe(container, observation)?;
        self.apply_visibility(change);
        Some(change)
    }

    /// Change slide on `container`. Returns the new index, `None` once destroyed.
    pub fn advance(
        &mut self,
        container: ContainerId,
        target: AdvanceTarget,
    ) -> FolioResult<Option<usize>> {
        Ok(self.instance_mut(container)?.advance_to(target))
    }

    /// Set a pause reason on `container`
    pub fn request_pause(&mut self, container: ContainerId, source: PauseSource) -> FolioResult<bool> {
        Ok(self.instance_mut(container)?.request_pause(source))
    }

    /// Clear a pause reason on `container`
    pub fn request_resume(
        &mut self,
        container: ContainerId,
        source: PauseSource,
    ) -> FolioResult<bool> {
        Ok(self.instance_mut(container)?.request_resume(source))
    }

    /// Apply a user gesture to `container`. Returns true if it changed anything.
    pub fn command(&mut self, container: ContainerId, command: GalleryCommand) -> FolioResult<bool> {
        let action = command.action(&self.config.carousel);
        let instance = self.instance_mut(container)?;
        let changed = match action {
            Action::Advance(target) => instance.advance_to(target).is_some(),
            Action::Pause(source) => instance.request_pause(source),
            Action::Resume(source) => instance.request_resume(source),
            Action::Toggle(source) if instance.is_paused_by(source) => {
                instance.request_resume(source)
            }
            Action::Toggle(source) => instance.request_pause(source),
            Action::Ignore => false,
        };
        Ok(changed)
    }

    /// Give keyboard focus to a gallery, or to none
    pub fn focus(&mut self, container: Option<ContainerId>) {
        self.focused = container.filter(|c| self.containers.contains_key(c));
    }

    /// Focus left `container`. Keys stop going to it unless another
    /// gallery already took focus.
    pub fn blur(&mut self, container: ContainerId) {
        if self.focused == Some(container) {
            self.focused = None;
        }
    }

    /// Route a key press. Returns true if it was consumed.
    ///
    /// The open lightbox takes every key first; otherwise navigation keys
    /// go to the focused gallery.
    pub fn key(&mut self, key: Key) -> bool {
        if self.torn_down {
            return false;
        }
        if self.fullscreen.is_open() {
            return self.fullscreen.handle_key(key);
        }
        let Some(container) = self.focused else {
            return false;
        };
        match self.command(container, GalleryCommand::Key(key)) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!(%container, error = %e, "key routing failed");
                false
            }
        }
    }

    /// Touch went down on `container`
    pub fn touch_start(&mut self, container: ContainerId, x: f64, y: f64) {
        if let Some(swipe) = self.swipes.get_mut(&container) {
            swipe.begin(x, y);
        }
    }

    /// Touch on `container` was interrupted by the browser
    pub fn touch_cancel(&mut self, container: ContainerId) {
        if let Some(swipe) = self.swipes.get_mut(&container) {
            swipe.cancel();
        }
    }

    /// Touch lifted on `container`. Returns the new index if it was a swipe.
    pub fn touch_end(&mut self, container: ContainerId, x: f64, y: f64) -> FolioResult<Option<usize>> {
        let target = self
            .swipes
            .get_mut(&container)
            .ok_or(FolioError::UnknownContainer(container))?
            .end(x, y);
        match target {
            Some(target) => self.advance(container, target),
            None => Ok(None),
        }
    }

    /// The progress fill on `container` finished its transition
    pub fn on_fill_transition_end(&mut self, container: ContainerId) -> FolioResult<bool> {
        Ok(self
            .instance_mut(container)?
            .handle_task(TaskKind::FillTransitionEnd))
    }

    /// Open the lightbox, pausing the gallery on `owner` if given
    pub fn open_fullscreen(
        &mut self,
        images: Vec<ImageRef>,
        start: usize,
        owner: Option<ContainerId>,
    ) -> FolioResult<()> {
        if self.torn_down {
            return Err(FolioError::TornDown);
        }
        let owner = owner
            .map(|c| self.instance_id(c).ok_or(FolioError::UnknownContainer(c)))
            .transpose()?;
        for handoff in self.fullscreen.open(images, start, owner)? {
            self.apply_handoff(handoff);
        }
        Ok(())
    }

    /// Close the lightbox. The owner resumes after the configured delay.
    pub fn close_fullscreen(&mut self) -> bool {
        !self.torn_down && self.fullscreen.close()
    }

    /// Show the next lightbox image
    pub fn fullscreen_next(&mut self) -> Option<usize> {
        self.fullscreen.next()
    }

    /// Show the previous lightbox image
    pub fn fullscreen_previous(&mut self) -> Option<usize> {
        self.fullscreen.previous()
    }

    /// Page teardown. Fires once; returns false on later calls.
    ///
    /// Tears down every instance, shuts down the visibility signal and the
    /// lightbox, and releases every tracked timer and listener.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        for instance in self.instances.values_mut() {
            instance.teardown();
        }
        let subscriptions = self.visibility.shutdown();
        self.env.release(Owner::Visibility);
        self.fullscreen.shutdown();
        let released = self.env.release_all();
        self.focused = None;
        tracing::debug!(
            instances = self.instances.len(),
            subscriptions,
            released,
            "page torn down"
        );
        true
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn instance_mut(&mut self, container: ContainerId) -> FolioResult<&mut CarouselInstance> {
        let id = self
            .containers
            .get(&container)
            .ok_or(FolioError::UnknownContainer(container))?;
        self.instances
            .get_mut(id)
            .ok_or(FolioError::UnknownInstance(*id))
    }

    fn apply_visibility(&mut self, change: VisibilityChange) {
        let Some(instance) = self.instances.get_mut(&change.instance()) else {
            return;
        };
        match change {
            VisibilityChange::FirstEntry(_) => {
                instance.initialize();
            }
            VisibilityChange::Reentry(_) => {
                instance.request_resume(PauseSource::Viewport);
            }
            VisibilityChange::Exit(_) => {
                instance.request_pause(PauseSource::Viewport);
            }
        }
    }

    fn apply_handoff(&mut self, handoff: Handoff) -> bool {
        let (id, pause) = match handoff {
            Handoff::Pause(id) => (id, true),
            Handoff::Resume(id) => (id, false),
        };
        let Some(instance) = self.instances.get_mut(&id) else {
            tracing::trace!(instance = %id, ?handoff, "handoff for unmounted instance");
            return false;
        };
        if pause {
            instance.request_pause(PauseSource::Fullscreen)
        } else {
            instance.request_resume(PauseSource::Fullscreen)
        }
    }
}
