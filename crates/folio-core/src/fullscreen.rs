//! Fullscreen coordinator
//!
//! Owns the single lightbox overlay. Opening it pauses the gallery it was
//! opened from; closing it resumes that gallery after a short delay so the
//! resume does not land on top of the closing transition.
//!
//! The coordinator never touches carousel state. It reports the pause and
//! resume requests it wants as [`Handoff`]s (or a scheduled
//! [`TaskKind::FullscreenResume`]) and the page applies them. The lightbox's
//! own image index is independent of the owning gallery's slide index.
//!
//! Only one session exists at a time. Opening while a session is showing, or
//! while a delayed resume is still pending, replaces it (last writer wins).

use serde::{Deserialize, Serialize};

use crate::cleanup::Owner;
use crate::env::Env;
use crate::error::{FolioError, FolioResult};
use crate::ids::InstanceId;
use crate::input::Key;
use crate::schedule::{Task, TaskKind, TimerHandle};
use crate::time::Millis;

/// An image the lightbox can show
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

impl ImageRef {
    /// Create an image reference
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
        }
    }
}

/// The lightbox overlay
pub trait LightboxView {
    /// Show `image` (number `index` of `count`), opening the overlay if needed
    fn show(&mut self, image: &ImageRef, index: usize, count: usize);

    /// Hide the overlay
    fn hide(&mut self);
}

/// The currently open lightbox
#[derive(Clone, Debug, PartialEq)]
pub struct FullscreenSession {
    id: u64,
    images: Vec<ImageRef>,
    index: usize,
    owner: Option<InstanceId>,
}

impl FullscreenSession {
    /// Session ID, unique per open
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Images in this session
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Index of the shown image
    pub fn index(&self) -> usize {
        self.index
    }

    /// The shown image
    pub fn current(&self) -> Option<&ImageRef> {
        self.images.get(self.index)
    }

    /// Gallery the lightbox was opened from
    pub fn owner(&self) -> Option<InstanceId> {
        self.owner
    }
}

/// A pause/resume request the page must apply to an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    /// Set the fullscreen pause
    Pause(InstanceId),
    /// Clear the fullscreen pause
    Resume(InstanceId),
}

#[derive(Clone, Copy, Debug)]
struct PendingResume {
    owner: InstanceId,
    session: u64,
    handle: TimerHandle,
}

/// Singleton lightbox coordinator for one page
pub struct FullscreenCoordinator {
    env: Env,
    resume_delay: Millis,
    view: Box<dyn LightboxView>,
    session: Option<FullscreenSession>,
    pending: Option<PendingResume>,
    next_session: u64,
    shut_down: bool,
}

impl std::fmt::Debug for FullscreenCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullscreenCoordinator")
            .field("session", &self.session)
            .field("pending", &self.pending)
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

impl FullscreenCoordinator {
    /// Create a closed coordinator
    pub fn new(env: Env, resume_delay: Millis, view: Box<dyn LightboxView>) -> Self {
        Self {
            env,
            resume_delay: resume_delay.max(0.0),
            view,
            session: None,
            pending: None,
            next_session: 0,
            shut_down: false,
        }
    }

    /// Whether the overlay is showing
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The open session
    pub fn session(&self) -> Option<&FullscreenSession> {
        self.session.as_ref()
    }

    /// Open the overlay on `images[start]`, optionally owned by a gallery.
    ///
    /// `start` wraps into range. Returns the handoffs the page must apply.
    pub fn open(
        &mut self,
        images: Vec<ImageRef>,
        start: usize,
        owner: Option<InstanceId>,
    ) -> FolioResult<Vec<Handoff>> {
        if self.shut_down {
            return Err(FolioError::TornDown);
        }
        if images.is_empty() {
            return Err(FolioError::EmptyImageList);
        }

        // Whoever currently holds a fullscreen pause: the showing session's
        // owner, or the owner still waiting for its delayed resume
        let previous = self.session.take().and_then(|s| s.owner);
        let waiting = self.pending.take().map(|p| {
            self.env.cancel(p.handle);
            p.owner
        });
        let held = previous.or(waiting);

        let mut handoffs = Vec::new();
        if held != owner {
            if let Some(id) = held {
                handoffs.push(Handoff::Resume(id));
            }
            if let Some(id) = owner {
                handoffs.push(Handoff::Pause(id));
            }
        }

        self.next_session += 1;
        let index = start % images.len();
        self.view.show(&images[index], index, images.len());
        let session = FullscreenSession {
            id: self.next_session,
            images,
            index,
            owner,
        };
        tracing::debug!(
            session = session.id,
            owner = ?owner,
            index,
            count = session.images.len(),
            "lightbox opened"
        );
        self.session = Some(session);
        Ok(handoffs)
    }

    /// Hide the overlay and schedule the owner's resume. Returns false if closed.
    pub fn close(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        self.view.hide();

        if let Some(owner) = session.owner {
            let handle = self.env.schedule(
                Owner::Fullscreen,
                self.resume_delay,
                Task::new(owner, TaskKind::FullscreenResume { session: session.id }),
            );
            self.pending = Some(PendingResume {
                owner,
                session: session.id,
                handle,
            });
        }
        tracing::debug!(session = session.id, "lightbox closed");
        true
    }

    /// Claim a fired delayed resume. Returns false if it is stale.
    pub fn take_resume(&mut self, owner: InstanceId, session: u64) -> bool {
        match self.pending {
            Some(p) if p.owner == owner && p.session == session => {
                self.env.fired(p.handle);
                self.pending = None;
                true
            }
            _ => {
                tracing::trace!(%owner, session, "stale fullscreen resume");
                false
            }
        }
    }

    /// Show the next image, wrapping around
    pub fn next(&mut self) -> Option<usize> {
        let index = self.session.as_ref()?.index + 1;
        self.show_index(index)
    }

    /// Show the previous image, wrapping around
    pub fn previous(&mut self) -> Option<usize> {
        let session = self.session.as_ref()?;
        let index = session.index.checked_sub(1).unwrap_or(session.images.len() - 1);
        self.show_index(index)
    }

    /// Show a specific image of the session, wrapped into range
    pub fn show_index(&mut self, index: usize) -> Option<usize> {
        let session = self.session.as_mut()?;
        let count = session.images.len();
        session.index = index % count;
        self.view
            .show(&session.images[session.index], session.index, count);
        Some(session.index)
    }

    /// Handle a key while open. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowLeft => self.previous().is_some(),
            Key::ArrowRight => self.next().is_some(),
            Key::Home | Key::End | Key::Other => false,
        }
    }

    /// Close without resuming anyone and release every timer
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if self.session.take().is_some() {
            self.view.hide();
        }
        self.pending = None;
        self.env.release(Owner::Fullscreen);
    }
}
