//! Performance tier
//!
//! Device capability detection happens outside this crate. The host reports
//! a tier and the runtime picks a motion profile from it; nothing here ever
//! changes the tier.

use serde::{Deserialize, Serialize};

/// Coarse device capability reported by the host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    /// Low-end devices: no slide animation, no compositor hints
    Low,
    /// Typical devices
    #[default]
    Medium,
    /// Capable devices
    High,
}

impl PerformanceTier {
    /// Get the string ID for this tier
    pub fn id(&self) -> &'static str {
        match self {
            PerformanceTier::Low => "low",
            PerformanceTier::Medium => "medium",
            PerformanceTier::High => "high",
        }
    }

    /// Motion settings appropriate for this tier
    pub fn motion_profile(&self) -> MotionProfile {
        match self {
            PerformanceTier::Low => MotionProfile {
                animate_slides: false,
                compositor_hints: false,
                settle_delay_scale: 2.0,
            },
            PerformanceTier::Medium => MotionProfile {
                animate_slides: true,
                compositor_hints: false,
                settle_delay_scale: 1.0,
            },
            PerformanceTier::High => MotionProfile {
                animate_slides: true,
                compositor_hints: true,
                settle_delay_scale: 1.0,
            },
        }
    }
}

/// How much motion a gallery may use
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionProfile {
    /// Animate slide changes (otherwise swap instantly)
    pub animate_slides: bool,
    /// Allow `will-change` style compositor hints on animated elements
    pub compositor_hints: bool,
    /// Multiplier on the configured settle delay
    pub settle_delay_scale: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tier() {
        let tier: PerformanceTier = Default::default();
        assert_eq!(tier, PerformanceTier::Medium);
    }

    #[test]
    fn test_id_matches_serde_name() {
        for tier in [PerformanceTier::Low, PerformanceTier::Medium, PerformanceTier::High] {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier.id()));
        }
    }

    #[test]
    fn test_low_tier_is_conservative() {
        let low = PerformanceTier::Low.motion_profile();
        assert!(!low.animate_slides);
        assert!(!low.compositor_hints);
        assert!(low.settle_delay_scale > 1.0);
        assert!(PerformanceTier::High.motion_profile().compositor_hints);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PerformanceTier::High).unwrap();
        assert_eq!(json, "\"high\"");
        let tier: PerformanceTier = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(tier, PerformanceTier::Low);
    }
}
