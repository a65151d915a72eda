//! User input
//!
//! Keys, pointer and touch gestures are translated into [`GalleryCommand`]s
//! and then into one of the carousel's own operations. Nothing here touches
//! carousel state; it only decides which operation a gesture maps to.

use crate::carousel::AdvanceTarget;
use crate::config::CarouselConfig;
use crate::pause::PauseSource;

/// Keys the runtime reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Home,
    End,
    Other,
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Self {
        match key {
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Escape" | "Esc" => Key::Escape,
            "Home" => Key::Home,
            "End" => Key::End,
            _ => Key::Other,
        }
    }
}

/// A gesture addressed to one gallery
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GalleryCommand {
    Next,
    Previous,
    /// Dot navigation
    GoTo(usize),
    PointerEnter,
    PointerLeave,
    /// Play/pause control
    TogglePlayback,
    Key(Key),
}

/// Carousel operation a command maps to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Advance(AdvanceTarget),
    Pause(PauseSource),
    Resume(PauseSource),
    /// Pause if not held by this source, resume otherwise
    Toggle(PauseSource),
    Ignore,
}

impl GalleryCommand {
    /// Resolve the command under the given settings
    pub fn action(self, config: &CarouselConfig) -> Action {
        match self {
            GalleryCommand::Next => Action::Advance(AdvanceTarget::Next),
            GalleryCommand::Previous => Action::Advance(AdvanceTarget::Previous),
            GalleryCommand::GoTo(index) => {
                Action::Advance(AdvanceTarget::Index(i64::try_from(index).unwrap_or(i64::MAX)))
            }
            GalleryCommand::PointerEnter if config.pause_on_hover => {
                Action::Pause(PauseSource::Manual)
            }
            GalleryCommand::PointerLeave if config.pause_on_hover => {
                Action::Resume(PauseSource::Manual)
            }
            GalleryCommand::PointerEnter | GalleryCommand::PointerLeave => Action::Ignore,
            GalleryCommand::TogglePlayback => Action::Toggle(PauseSource::Manual),
            GalleryCommand::Key(_) if !config.keyboard_navigation => Action::Ignore,
            GalleryCommand::Key(key) => match key {
                Key::ArrowLeft => Action::Advance(AdvanceTarget::Previous),
                Key::ArrowRight => Action::Advance(AdvanceTarget::Next),
                Key::Home => Action::Advance(AdvanceTarget::Index(0)),
                Key::End => Action::Advance(AdvanceTarget::Index(-1)),
                Key::Escape | Key::Other => Action::Ignore,
            },
        }
    }
}

/// Horizontal swipe recognizer for one gallery
#[derive(Clone, Copy, Debug)]
pub struct SwipeTracker {
    threshold: f64,
    origin: Option<(f64, f64)>,
}

impl SwipeTracker {
    /// Create a tracker that needs `threshold` pixels of horizontal travel
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            origin: None,
        }
    }

    /// Touch went down
    pub fn begin(&mut self, x: f64, y: f64) {
        self.origin = Some((x, y));
    }

    /// Touch was interrupted
    pub fn cancel(&mut self) {
        self.origin = None;
    }

    /// Touch lifted. Returns the swipe direction if the gesture counts.
    ///
    /// Swiping left shows the next slide. Mostly-vertical gestures are
    /// scrolls, not swipes.
    pub fn end(&mut self, x: f64, y: f64) -> Option<AdvanceTarget> {
        let (x0, y0) = self.origin.take()?;
        let dx = x - x0;
        let dy = y - y0;
        if !dx.is_finite() || dx.abs() < self.threshold || dx.abs() <= dy.abs() {
            return None;
        }
        if dx < 0.0 {
            Some(AdvanceTarget::Next)
        } else {
            Some(AdvanceTarget::Previous)
        }
    }
}
