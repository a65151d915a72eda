//! Runtime configuration
//!
//! Timing constants vary between sites, so none of them are hard-coded.
//! Every section is `#[serde(default)]`: a JSON object only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, FolioResult};
use crate::performance::PerformanceTier;
use crate::time::Millis;

/// Default autoplay interval in milliseconds
pub const DEFAULT_INTERVAL_MS: Millis = 5000.0;

/// Default delay between initialization and the first autoplay run
pub const DEFAULT_SETTLE_DELAY_MS: Millis = 100.0;

/// Default lag of the fallback guard behind the fill transition
pub const DEFAULT_GUARD_MARGIN_MS: Millis = 200.0;

/// Per-gallery carousel settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Time each slide stays up during autoplay
    pub interval_ms: Millis,
    /// Delay after initialization before autoplay starts
    pub settle_delay_ms: Millis,
    /// How long after the expected end the fallback guard fires
    pub guard_margin_ms: Millis,
    /// How early a transition-end may arrive and still count
    pub transition_end_tolerance_ms: Millis,
    /// Pause while the pointer is over the gallery
    pub pause_on_hover: bool,
    /// Arrow/Home/End keys navigate the focused gallery
    pub keyboard_navigation: bool,
    /// Horizontal travel needed for a touch swipe to count
    pub swipe_threshold_px: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            guard_margin_ms: DEFAULT_GUARD_MARGIN_MS,
            transition_end_tolerance_ms: 50.0,
            pause_on_hover: false,
            keyboard_navigation: true,
            swipe_threshold_px: 50.0,
        }
    }
}

/// Viewport visibility settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Visible fraction at or above which a gallery counts as on-screen
    pub enter_threshold: f64,
    /// Visible fraction at or below which an on-screen gallery counts as gone
    pub exit_threshold: f64,
    /// Pixels the trigger zone extends beyond the viewport
    pub root_margin_px: f64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 0.3,
            exit_threshold: 0.1,
            root_margin_px: 50.0,
        }
    }
}

impl VisibilityConfig {
    /// CSS `rootMargin` string for an intersection observer
    pub fn root_margin(&self) -> String {
        format!("{}px", self.root_margin_px)
    }

    /// Intersection ratios the host should report changes at
    pub fn thresholds(&self) -> Vec<f64> {
        let mut points = vec![0.0, self.exit_threshold, self.enter_threshold, 1.0];
        points.sort_by(|a, b| a.total_cmp(b));
        points.dedup();
        points
    }
}

/// Lightbox settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullscreenConfig {
    /// Delay after closing before the owning gallery resumes
    pub resume_delay_ms: Millis,
}

impl Default for FullscreenConfig {
    fn default() -> Self {
        Self {
            resume_delay_ms: 150.0,
        }
    }
}

/// Complete page configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Carousel settings shared by every gallery
    pub carousel: CarouselConfig,
    /// Viewport visibility settings
    pub visibility: VisibilityConfig,
    /// Lightbox settings
    pub fullscreen: FullscreenConfig,
    /// Device tier reported by the host
    pub tier: PerformanceTier,
}

impl PageConfig {
    /// Parse and validate a JSON configuration object
    pub fn from_json(json: &str) -> FolioResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range
    pub fn validate(&self) -> FolioResult<()> {
        let c = &self.carousel;
        if !(c.interval_ms.is_finite() && c.interval_ms > 0.0) {
            return Err(invalid("carousel.interval_ms", "must be positive and finite"));
        }
        non_negative("carousel.settle_delay_ms", c.settle_delay_ms)?;
        non_negative("carousel.guard_margin_ms", c.guard_margin_ms)?;
        non_negative("carousel.transition_end_tolerance_ms", c.transition_end_tolerance_ms)?;
        non_negative("carousel.swipe_threshold_px", c.swipe_threshold_px)?;

        let v = &self.visibility;
        fraction("visibility.enter_threshold", v.enter_threshold)?;
        fraction("visibility.exit_threshold", v.exit_threshold)?;
        if v.exit_threshold > v.enter_threshold {
            return Err(invalid(
                "visibility.exit_threshold",
                "must not exceed enter_threshold",
            ));
        }
        if !v.root_margin_px.is_finite() {
            return Err(invalid("visibility.root_margin_px", "must be finite"));
        }

        non_negative("fullscreen.resume_delay_ms", self.fullscreen.resume_delay_ms)?;
        Ok(())
    }

    /// Settle delay after applying the tier's motion profile
    pub fn effective_settle_delay(&self) -> Millis {
        self.carousel.settle_delay_ms * self.tier.motion_profile().settle_delay_scale
    }
}

fn invalid(field: &'static str, reason: &'static str) -> FolioError {
    FolioError::InvalidConfig { field, reason }
}

fn non_negative(field: &'static str, value: f64) -> FolioResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be finite and not negative"))
    }
}

fn fraction(field: &'static str, value: f64) -> FolioResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be within [0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.carousel.interval_ms, 5000.0);
        assert!(!config.carousel.pause_on_hover);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let config = PageConfig::from_json(
            r#"{ "carousel": { "interval_ms": 3000, "pause_on_hover": true }, "tier": "low" }"#,
        )
        .unwrap();
        assert_eq!(config.carousel.interval_ms, 3000.0);
        assert!(config.carousel.pause_on_hover);
        assert_eq!(config.carousel.guard_margin_ms, DEFAULT_GUARD_MARGIN_MS);
        assert_eq!(config.visibility, VisibilityConfig::default());
        assert_eq!(config.tier, PerformanceTier::Low);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(PageConfig::from_json("{}").unwrap(), PageConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = PageConfig::from_json(r#"{ "carousel": { "interval_ms": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            FolioError::InvalidConfig { field: "carousel.interval_ms", .. }
        ));

        let err = PageConfig::from_json(
            r#"{ "visibility": { "enter_threshold": 0.2, "exit_threshold": 0.5 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FolioError::InvalidConfig { field: "visibility.exit_threshold", .. }
        ));

        let err = PageConfig::from_json(r#"{ "fullscreen": { "resume_delay_ms": -1 } }"#)
            .unwrap_err();
        assert!(matches!(err, FolioError::InvalidConfig { .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PageConfig::from_json("{ carousel"),
            Err(FolioError::Config(_))
        ));
    }

    #[test]
    fn test_thresholds_sorted_and_deduplicated() {
        let v = VisibilityConfig {
            enter_threshold: 1.0,
            exit_threshold: 0.0,
            root_margin_px: 0.0,
        };
        assert_eq!(v.thresholds(), vec![0.0, 1.0]);
        assert_eq!(VisibilityConfig::default().thresholds(), vec![0.0, 0.1, 0.3, 1.0]);
        assert_eq!(VisibilityConfig::default().root_margin(), "50px");
    }

    #[test]
    fn test_low_tier_lengthens_settle_delay() {
        let config = PageConfig {
            tier: PerformanceTier::Low,
            ..Default::default()
        };
        assert_eq!(config.effective_settle_delay(), 200.0);
    }
}
