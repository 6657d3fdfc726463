//! Canvas configuration.

use crate::stroke::{CompositeOperation, CssColor, LineCap, LineStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default delay between two replayed points, in milliseconds.
pub const DEFAULT_REPLAY_INTERVAL_MS: u64 = 5;

/// Default background asset.
pub const DEFAULT_BACKGROUND_SRC: &str = "/images/bg-canvas.png";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(String),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings shared by every mount of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Line colour used until `mount` provides the player's colour.
    pub default_line_color: CssColor,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    /// `DestinationOut` turns the pen into an eraser.
    pub composite: CompositeOperation,
    /// Background image loaded on every mount.
    pub background_src: String,
    /// Delay between two replayed points.
    pub replay_interval_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_line_color: CssColor::new("#000"),
            stroke_width: 5.0,
            line_cap: LineCap::Round,
            composite: CompositeOperation::SourceOver,
            background_src: DEFAULT_BACKGROUND_SRC.to_string(),
            replay_interval_ms: DEFAULT_REPLAY_INTERVAL_MS,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replay_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "replay_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.stroke_width.is_finite() && self.stroke_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "stroke_width",
                reason: format!("{} is not a positive width", self.stroke_width),
            });
        }
        Ok(())
    }

    pub fn replay_interval(&self) -> Duration {
        Duration::from_millis(self.replay_interval_ms)
    }

    /// Style applied to new local strokes, before the player's colour.
    pub fn line_style(&self) -> LineStyle {
        LineStyle {
            color: self.default_line_color.clone(),
            width: self.stroke_width,
            cap: self.line_cap,
            composite: self.composite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CanvasConfig::default();
        assert_eq!(config.replay_interval(), Duration::from_millis(5));
        assert_eq!(config.line_style(), LineStyle::default());
        assert_eq!(config.background_src, "/images/bg-canvas.png");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CanvasConfig::from_json(r#"{"replay_interval_ms": 16, "composite": "destination-out"}"#).unwrap();
        assert_eq!(config.replay_interval_ms, 16);
        assert!(config.line_style().is_eraser());
        assert!((config.stroke_width - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = CanvasConfig::from_json(r#"{"replay_interval_ms": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "replay_interval_ms", .. })));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(CanvasConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
