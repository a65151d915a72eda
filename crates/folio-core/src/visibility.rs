//! Visibility signal
//!
//! Routes viewport-intersection reports to carousel instances. The host owns
//! the actual observer and forwards each report as an [`Observation`]; the
//! signal keeps a routing table from container to instance and turns raw
//! ratios into at most one [`VisibilityChange`] per report.
//!
//! ## Hysteresis
//!
//! A hidden gallery becomes visible once it intersects with a ratio of at
//! least `enter_threshold`. A visible gallery becomes hidden once it stops
//! intersecting or its ratio drops to `exit_threshold` or below. Between the
//! two thresholds nothing changes, so scroll jitter near the edge cannot
//! thrash play/pause. Entries and exits always alternate per container.

use std::collections::HashMap;

use crate::config::VisibilityConfig;
use crate::ids::{ContainerId, InstanceId};

/// One intersection report for a container
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    /// Visible fraction of the container
    pub ratio: f64,
    /// Whether the container intersects the (margin-extended) viewport
    pub is_intersecting: bool,
}

impl Observation {
    /// Create an observation
    pub fn new(ratio: f64, is_intersecting: bool) -> Self {
        Self {
            ratio,
            is_intersecting,
        }
    }

    /// Entirely on screen
    pub fn visible() -> Self {
        Self::new(1.0, true)
    }

    /// Entirely off screen
    pub fn hidden() -> Self {
        Self::new(0.0, false)
    }

    fn clamped_ratio(&self) -> f64 {
        if self.ratio.is_nan() {
            0.0
        } else {
            self.ratio.clamp(0.0, 1.0)
        }
    }
}

/// A visibility transition for one instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisibilityChange {
    /// Visible for the first time: initialize
    FirstEntry(InstanceId),
    /// Visible again: clear the viewport pause
    Reentry(InstanceId),
    /// No longer visible: set the viewport pause
    Exit(InstanceId),
}

impl VisibilityChange {
    /// Instance the change is addressed to
    pub fn instance(&self) -> InstanceId {
        match self {
            VisibilityChange::FirstEntry(id)
            | VisibilityChange::Reentry(id)
            | VisibilityChange::Exit(id) => *id,
        }
    }
}

/// How the host observes the viewport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObservationMode {
    /// Intersection reports arrive through [`VisibilitySignal::observe`]
    #[default]
    Observed,
    /// No observer is available; everything counts as permanently visible
    AlwaysVisible,
}

/// Result of a subscribe call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subscribed {
    /// Now observing the container
    Observing,
    /// The container was already subscribed; nothing changed
    AlreadySubscribed,
    /// Degraded mode: the instance must be initialized right away
    AlwaysVisible(VisibilityChange),
    /// The signal has been shut down
    ShutDown,
}

#[derive(Clone, Copy, Debug)]
struct Subscription {
    instance: InstanceId,
    seen: bool,
    visible: bool,
}

/// Container → instance routing table with hysteresis
#[derive(Debug)]
pub struct VisibilitySignal {
    enter_threshold: f64,
    exit_threshold: f64,
    mode: ObservationMode,
    subscriptions: HashMap<ContainerId, Subscription>,
    shut_down: bool,
}

impl VisibilitySignal {
    /// Create a signal fed by intersection reports
    pub fn new(config: &VisibilityConfig, mode: ObservationMode) -> Self {
        if mode == ObservationMode::AlwaysVisible {
            tracing::warn!("viewport observation unavailable, treating galleries as always visible");
        }
        Self {
            enter_threshold: config.enter_threshold,
            exit_threshold: config.exit_threshold.min(config.enter_threshold),
            mode,
            subscriptions: HashMap::new(),
            shut_down: false,
        }
    }

    /// Create a degraded signal for environments without an observer
    pub fn unsupported(config: &VisibilityConfig) -> Self {
        Self::new(config, ObservationMode::AlwaysVisible)
    }

    /// Observation mode
    pub fn mode(&self) -> ObservationMode {
        self.mode
    }

    /// Start routing reports for `container` to `instance`. Idempotent.
    pub fn subscribe(&mut self, container: ContainerId, instance: InstanceId) -> Subscribed {
        if self.shut_down {
            return Subscribed::ShutDown;
        }
        if self.subscriptions.contains_key(&container) {
            return Subscribed::AlreadySubscribed;
        }
        match self.mode {
            ObservationMode::Observed => {
                self.subscriptions.insert(
                    container,
                    Subscription {
                        instance,
                        seen: false,
                        visible: false,
                    },
                );
                Subscribed::Observing
            }
            ObservationMode::AlwaysVisible => {
                self.subscriptions.insert(
                    container,
                    Subscription {
                        instance,
                        seen: true,
                        visible: true,
                    },
                );
                Subscribed::AlwaysVisible(VisibilityChange::FirstEntry(instance))
            }
        }
    }

    /// Stop routing reports for `container`. Returns false if it wasn't subscribed.
    pub fn unsubscribe(&mut self, container: ContainerId) -> bool {
        self.subscriptions.remove(&container).is_some()
    }

    /// Feed an intersection report. Returns the transition it caused, if any.
    pub fn observe(
        &mut self,
        container: ContainerId,
        observation: Observation,
    ) -> Option<VisibilityChange> {
        if self.mode == ObservationMode::AlwaysVisible {
            return None;
        }
        let Some(sub) = self.subscriptions.get_mut(&container) else {
            tracing::trace!(%container, "observation for unsubscribed container");
            return None;
        };
        let ratio = observation.clamped_ratio();

        if sub.visible {
            if !observation.is_intersecting || ratio <= self.exit_threshold {
                sub.visible = false;
                return Some(VisibilityChange::Exit(sub.instance));
            }
        } else if observation.is_intersecting && ratio >= self.enter_threshold {
            sub.visible = true;
            if sub.seen {
                return Some(VisibilityChange::Reentry(sub.instance));
            }
            sub.seen = true;
            return Some(VisibilityChange::FirstEntry(sub.instance));
        }
        None
    }

    /// Whether `container` currently counts as visible
    pub fn is_visible(&self, container: ContainerId) -> Option<bool> {
        self.subscriptions.get(&container).map(|s| s.visible)
    }

    /// Whether `container` has ever been visible
    pub fn has_been_seen(&self, container: ContainerId) -> Option<bool> {
        self.subscriptions.get(&container).map(|s| s.seen)
    }

    /// Whether `container` is subscribed
    pub fn is_subscribed(&self, container: ContainerId) -> bool {
        self.subscriptions.contains_key(&container)
    }

    /// Number of subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Check if nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Forget every subscription and refuse new ones. Returns how many were dropped.
    pub fn shutdown(&mut self) -> usize {
        self.shut_down = true;
        let dropped = self.subscriptions.len();
        self.subscriptions.clear();
        dropped
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Entries and exits alternate, and only the first entry is a FirstEntry
        #[test]
        fn transitions_alternate(
            reports in prop::collection::vec((0.0f64..=1.0, any::<bool>()), 0..200),
        ) {
            let mut signal = VisibilitySignal::new(&VisibilityConfig::default(), ObservationMode::Observed);
            signal.subscribe(ContainerId(1), InstanceId(1));

            let mut visible = false;
            let mut entries = 0usize;
            for (ratio, intersecting) in reports {
                match signal.observe(ContainerId(1), Observation::new(ratio, intersecting)) {
                    Some(VisibilityChange::FirstEntry(_)) => {
                        prop_assert!(!visible);
                        prop_assert_eq!(entries, 0);
                        visible = true;
                        entries += 1;
                    }
                    Some(VisibilityChange::Reentry(_)) => {
                        prop_assert!(!visible);
                        prop_assert!(entries > 0);
                        visible = true;
                        entries += 1;
                    }
                    Some(VisibilityChange::Exit(_)) => {
                        prop_assert!(visible);
                        visible = false;
                    }
                    None => {}
                }
                prop_assert_eq!(signal.is_visible(ContainerId(1)), Some(visible));
            }
        }
    }
}
