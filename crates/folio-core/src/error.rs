//! Error types for the gallery runtime
//!
//! Errors only ever surface at construction and routing boundaries. Event
//! callbacks log them and carry on, so one broken gallery never takes the
//! rest of the page down with it.

use crate::ids::{ContainerId, InstanceId};

/// Errors that can occur in gallery runtime operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// The gallery container has no slides, so no instance is created
    MissingSlides(ContainerId),

    /// A gallery is already mounted for this container
    DuplicateContainer(ContainerId),

    /// No gallery is mounted for this container
    UnknownContainer(ContainerId),

    /// No instance with this ID exists
    UnknownInstance(InstanceId),

    /// The lightbox was asked to open with nothing to show
    EmptyImageList,

    /// A configuration value is out of its accepted range
    InvalidConfig {
        /// The offending field
        field: &'static str,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// Configuration JSON could not be parsed
    Config(String),

    /// The page has already been torn down
    TornDown,

    /// A DOM operation failed in the browser adapter
    Dom(String),
}

impl std::fmt::Display for FolioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSlides(id) => write!(f, "gallery {} has no slides", id),
            Self::DuplicateContainer(id) => write!(f, "gallery {} is already mounted", id),
            Self::UnknownContainer(id) => write!(f, "no gallery mounted for container {}", id),
            Self::UnknownInstance(id) => write!(f, "carousel instance not found: {}", id),
            Self::EmptyImageList => write!(f, "lightbox image list is empty"),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config '{}': {}", field, reason)
            }
            Self::Config(msg) => write!(f, "config error: {}", msg),
            Self::TornDown => write!(f, "page has been torn down"),
            Self::Dom(msg) => write!(f, "dom error: {}", msg),
        }
    }
}

impl std::error::Error for FolioError {}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for gallery runtime operations
pub type FolioResult<T> = Result<T, FolioError>;
