use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::text_metrics;

const DEFAULT_FONT_FAMILY: &str = "\"trebuchet ms\", verdana, arial, sans-serif";
const DEFAULT_FONT_SIZE: f32 = 16.0;
// Fallback average glyph width as a fraction of the font size.
const FALLBACK_CHAR_WIDTH_RATIO: f32 = 0.56;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Premise width floor in character widths of the configured font.
    pub min_width_chars: f32,
    /// Explicit floor in layout units; overrides `min_width_chars` when set.
    pub min_width_floor: Option<f32>,
    /// Width changes up to this many layout units are not committed.
    pub hysteresis_tolerance: f32,
    /// Local-to-global ratio of the host's display transform.
    pub scale: f32,
    /// Horizontal gap between an anchor point and its label box.
    pub label_gap: f32,
    pub font_family: String,
    pub font_size: f32,
    /// Skip font lookups and use calibrated per-character widths.
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_width_chars: 2.0,
            min_width_floor: None,
            hysteresis_tolerance: 5.0,
            scale: 1.0,
            label_gap: 4.0,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            fast_text_metrics: false,
        }
    }
}

impl LayoutConfig {
    /// Minimum width any premise is given, in local layout units.
    pub fn floor_width(&self) -> f32 {
        if let Some(floor) = self.min_width_floor {
            return floor.max(0.0);
        }
        self.min_width_chars.max(0.0) * self.char_width()
    }

    pub fn char_width(&self) -> f32 {
        let fallback = self.font_size * FALLBACK_CHAR_WIDTH_RATIO;
        if self.fast_text_metrics {
            return fallback;
        }
        text_metrics::average_char_width(&self.font_family, self.font_size).unwrap_or(fallback)
    }

    /// Scale factor safe to divide by.
    pub fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    min_width_chars: Option<f32>,
    min_width_floor: Option<f32>,
    hysteresis_tolerance: Option<f32>,
    scale: Option<f32>,
    label_gap: Option<f32>,
    font_family: Option<String>,
    font_size: Option<f32>,
    fast_text_metrics: Option<bool>,
}

/// Loads a JSON5 (or plain JSON) config file over the defaults. Values that
/// cannot be used are reported and left at their defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = json5::from_str(contents)?;
    let mut config = LayoutConfig::default();

    if let Some(v) = parsed.min_width_chars {
        if v.is_finite() && v >= 0.0 {
            config.min_width_chars = v;
        } else {
            warn!(value = v, "ignoring invalid minWidthChars");
        }
    }
    if let Some(v) = parsed.min_width_floor {
        if v.is_finite() && v >= 0.0 {
            config.min_width_floor = Some(v);
        } else {
            warn!(value = v, "ignoring invalid minWidthFloor");
        }
    }
    if let Some(v) = parsed.hysteresis_tolerance {
        if v.is_finite() && v >= 0.0 {
            config.hysteresis_tolerance = v;
        } else {
            warn!(value = v, "ignoring invalid hysteresisTolerance");
        }
    }
    if let Some(v) = parsed.scale {
        if v.is_finite() && v > 0.0 {
            config.scale = v;
        } else {
            warn!(value = v, "ignoring invalid scale");
        }
    }
    if let Some(v) = parsed.label_gap {
        if v.is_finite() {
            config.label_gap = v;
        } else {
            warn!(value = v, "ignoring invalid labelGap");
        }
    }
    if let Some(v) = parsed.font_family {
        config.font_family = v;
    }
    if let Some(v) = parsed.font_size {
        if v.is_finite() && v > 0.0 {
            config.font_size = v;
        } else {
            warn!(value = v, "ignoring invalid fontSize");
        }
    }
    if let Some(v) = parsed.fast_text_metrics {
        config.fast_text_metrics = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = LayoutConfig::default();
        assert_eq!(config.hysteresis_tolerance, 5.0);
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.min_width_chars, 2.0);
        assert!(config.min_width_floor.is_none());
    }

    #[test]
    fn explicit_floor_overrides_char_floor() {
        let config = LayoutConfig {
            min_width_floor: Some(20.0),
            ..LayoutConfig::default()
        };
        assert_eq!(config.floor_width(), 20.0);
    }

    #[test]
    fn fast_floor_is_two_fallback_chars() {
        let config = LayoutConfig {
            fast_text_metrics: true,
            font_size: 10.0,
            ..LayoutConfig::default()
        };
        assert!((config.floor_width() - 11.2).abs() < 1e-4);
    }

    #[test]
    fn parse_config_accepts_json5_overrides() {
        let config = parse_config(
            r#"{
                // tighter guard for tests
                hysteresisTolerance: 2,
                scale: 1.5,
                minWidthFloor: 24,
                fastTextMetrics: true,
            }"#,
        )
        .expect("valid json5");
        assert_eq!(config.hysteresis_tolerance, 2.0);
        assert_eq!(config.scale, 1.5);
        assert_eq!(config.min_width_floor, Some(24.0));
        assert!(config.fast_text_metrics);
        assert_eq!(config.label_gap, LayoutConfig::default().label_gap);
    }

    #[test]
    fn parse_config_rejects_invalid_values() {
        let config = parse_config(r#"{"scale": 0, "hysteresisTolerance": -3}"#).unwrap();
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.hysteresis_tolerance, 5.0);
    }

    #[test]
    fn parse_config_reports_syntax_errors() {
        assert!(parse_config("{ scale: ").is_err());
    }

    #[test]
    fn effective_scale_guards_zero() {
        let config = LayoutConfig {
            scale: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(config.effective_scale(), 1.0);
    }

    #[test]
    fn load_config_without_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.font_size, 16.0);
    }
}
