//! Gallery runtime for a portfolio page
//!
//! This crate provides the interaction core behind autoplaying image
//! galleries:
//! - Carousel lifecycle (lazy start, autoplay, slide changes, teardown)
//! - A progress timer kept in lockstep with its on-screen fill
//! - Viewport visibility with hysteresis
//! - Lightbox open/close coordination with the gallery it was opened from
//! - Deterministic cleanup of timers and listeners
//!
//! ## Architecture
//!
//! - [`carousel`]: per-gallery state machine and slide navigation
//! - [`progress`]: autoplay timer and progress fill
//! - [`visibility`]: container → instance routing with hysteresis
//! - [`fullscreen`]: singleton lightbox coordinator
//! - [`page`]: registry and message routing for a whole page
//! - [`headless`]: a browser-free host for tests and simulations
//!
//! ## Example
//!
//! ```rust
//! use folio_core::{ContainerId, HeadlessHost, PageConfig};
//!
//! let mut host = HeadlessHost::new(PageConfig::default());
//! let gallery = host.mount(ContainerId(1), 4).unwrap();
//!
//! host.scroll_into_view(ContainerId(1));
//! host.advance_by(100.0 + 5000.0 + 200.0);
//! assert_eq!(gallery.slides.last(), Some(1));
//! ```
//!
//! ## Design Principles
//!
//! 1. **No browser in the core**: views, clock and scheduler are traits the host implements
//! 2. **Messages, not closures**: deferred work is a typed [`Task`] handed back to [`Page::dispatch`]
//! 3. **One pause predicate**: pause sources live in a single [`PauseReasons`] set
//! 4. **Explicit services**: every component receives an [`Env`] instead of reaching for globals

pub mod carousel;
pub mod cleanup;
pub mod config;
pub mod env;
pub mod error;
pub mod fullscreen;
pub mod headless;
pub mod ids;
pub mod input;
pub mod page;
pub mod pause;
pub mod performance;
pub mod progress;
pub mod schedule;
pub mod time;
pub mod visibility;

pub use carousel::{AdvanceTarget, CarouselInstance, CarouselState, SlideView};
pub use cleanup::{CleanupRegistry, Disposer, Owner};
pub use config::{CarouselConfig, FullscreenConfig, PageConfig, VisibilityConfig};
pub use env::Env;
pub use error::{FolioError, FolioResult};
pub use fullscreen::{FullscreenCoordinator, FullscreenSession, Handoff, ImageRef, LightboxView};
pub use headless::HeadlessHost;
pub use ids::{ContainerId, InstanceId};
pub use input::{GalleryCommand, Key, SwipeTracker};
pub use page::{GalleryMount, MountReport, Page};
pub use pause::{PauseReasons, PauseSource};
pub use performance::{MotionProfile, PerformanceTier};
pub use progress::{ProgressBar, ProgressTimer};
pub use schedule::{Scheduler, Task, TaskKind, TimerHandle, VirtualScheduler};
pub use time::{Clock, ManualClock, Millis};
pub use visibility::{Observation, ObservationMode, VisibilityChange, VisibilitySignal};
