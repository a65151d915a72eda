//! Pause sources
//!
//! Playback can be suspended for several independent reasons at once. They
//! are kept as one set so there is a single question to ask ("is any reason
//! active?") instead of a handful of booleans checked in different places.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of active pause reasons for one carousel
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PauseReasons: u8 {
        /// The gallery scrolled out of view
        const VIEWPORT = 1 << 0;
        /// The user paused it (hover or the play/pause control)
        const MANUAL = 1 << 1;
        /// The lightbox is showing over it
        const FULLSCREEN = 1 << 2;
    }
}

/// One independent reason playback may be suspended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseSource {
    /// Viewport visibility
    Viewport,
    /// User hover or explicit pause
    Manual,
    /// Fullscreen lightbox
    Fullscreen,
}

impl PauseSource {
    /// The flag this source sets in a [`PauseReasons`] set
    pub fn reason(self) -> PauseReasons {
        match self {
            PauseSource::Viewport => PauseReasons::VIEWPORT,
            PauseSource::Manual => PauseReasons::MANUAL,
            PauseSource::Fullscreen => PauseReasons::FULLSCREEN,
        }
    }

    /// String ID for this source
    pub fn id(self) -> &'static str {
        match self {
            PauseSource::Viewport => "viewport",
            PauseSource::Manual => "manual",
            PauseSource::Fullscreen => "fullscreen",
        }
    }
}

impl From<PauseSource> for PauseReasons {
    fn from(source: PauseSource) -> Self {
        source.reason()
    }
}
