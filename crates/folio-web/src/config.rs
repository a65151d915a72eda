//! Browser configuration
//!
//! One JSON object configures everything: the core [`PageConfig`] sections
//! sit at the top level next to `selectors` and `log_level`, so
//! `{ "carousel": { "interval_ms": 4000 }, "selectors": { "container": ".work" } }`
//! is a complete configuration. Omitted fields keep their defaults.

use folio_core::{FolioError, FolioResult, PageConfig};
use serde::{Deserialize, Serialize};

/// CSS selectors used to find gallery parts in the document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomSelectors {
    /// Gallery containers (document order defines container ids)
    pub container: String,
    /// Slides within a container
    pub slide: String,
    /// Progress fill within a container
    pub progress_fill: String,
    pub next_button: String,
    pub prev_button: String,
    /// Play/pause control within a container
    pub toggle_button: String,
    /// Dot navigation within a container, one per slide
    pub dot: String,
    /// Class marking the active slide and dot
    pub active_class: String,
    /// Lightbox overlay
    pub lightbox: String,
    /// Image element inside the overlay
    pub lightbox_image: String,
    pub lightbox_close: String,
    pub lightbox_next: String,
    pub lightbox_prev: String,
    /// Class that shows the overlay
    pub lightbox_open_class: String,
}

impl Default for DomSelectors {
    fn default() -> Self {
        Self {
            container: "[data-gallery]".into(),
            slide: ".gallery-slide".into(),
            progress_fill: ".gallery-progress-fill".into(),
            next_button: ".gallery-next".into(),
            prev_button: ".gallery-prev".into(),
            toggle_button: ".gallery-toggle".into(),
            dot: ".gallery-dot".into(),
            active_class: "active".into(),
            lightbox: "#lightbox".into(),
            lightbox_image: "#lightbox img".into(),
            lightbox_close: "#lightbox .lightbox-close".into(),
            lightbox_next: "#lightbox .lightbox-next".into(),
            lightbox_prev: "#lightbox .lightbox-prev".into(),
            lightbox_open_class: "open".into(),
        }
    }
}

/// Everything the `Portfolio` constructor accepts
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    #[serde(flatten)]
    pub page: PageConfig,
    pub selectors: DomSelectors,
    /// Most verbose level forwarded to the console
    pub log_level: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            selectors: DomSelectors::default(),
            log_level: "info".into(),
        }
    }
}

impl WebConfig {
    /// Parse and validate, treating a missing or blank string as defaults
    pub fn from_json(json: Option<&str>) -> FolioResult<Self> {
        let config: Self = match json.map(str::trim) {
            None | Some("") => Self::default(),
            Some(json) => serde_json::from_str(json)?,
        };
        config.page.validate()?;
        if config.selectors.container.trim().is_empty() || config.selectors.slide.trim().is_empty() {
            return Err(FolioError::InvalidConfig {
                field: "selectors",
                reason: "container and slide selectors must not be empty",
            });
        }
        Ok(config)
    }

    /// Console level, falling back to `info` when unrecognized
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::PerformanceTier;

    #[test]
    fn test_missing_config_is_default() {
        assert_eq!(WebConfig::from_json(None).unwrap(), WebConfig::default());
        assert_eq!(WebConfig::from_json(Some("  ")).unwrap(), WebConfig::default());
    }

    #[test]
    fn test_flattened_sections() {
        let config = WebConfig::from_json(Some(
            r#"{
                "carousel": { "interval_ms": 4000 },
                "tier": "high",
                "selectors": { "container": ".work" },
                "log_level": "debug"
            }"#,
        ))
        .unwrap();
        assert_eq!(config.page.carousel.interval_ms, 4000.0);
        assert_eq!(config.page.tier, PerformanceTier::High);
        assert_eq!(config.selectors.container, ".work");
        assert_eq!(config.selectors.slide, ".gallery-slide");
        assert_eq!(config.level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            WebConfig::from_json(Some(r#"{ "carousel": { "interval_ms": -5 } }"#)),
            Err(FolioError::InvalidConfig { .. })
        ));
        assert!(matches!(
            WebConfig::from_json(Some(r#"{ "selectors": { "slide": "" } }"#)),
            Err(FolioError::InvalidConfig { field: "selectors", .. })
        ));
        assert!(matches!(
            WebConfig::from_json(Some("not json")),
            Err(FolioError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let config = WebConfig {
            log_level: "chatty".into(),
            ..Default::default()
        };
        assert_eq!(config.level(), tracing::Level::INFO);
    }
}
