use std::collections::HashSet;
use std::env;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::EngineError;

/// Hierarchy used by the geographic charts when nothing else is configured.
pub const DEFAULT_LEVELS: &[&str] = &["Zone", "Cluster", "Country"];

/// Name of the virtual apex node added by the root injector.
pub const DEFAULT_ROOT_NAME: &str = "Geo Levels";

/// Qualitative palette shared by the dashboard's charts.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52", "#E763FA", "#BA68C8", "#FFA000", "#F06292", "#7986CB", "#4DB6AC",
    "#FF8A65", "#A1887F", "#90A4AE", "#E53935", "#8E24AA",
];

/// Engine configuration, passed in at construction time.
///
/// Levels and palette live here rather than in globals, so several engines
/// with different settings can coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hierarchy columns, least granular first
    pub levels: Vec<String>,
    /// Base colors cycled over the top-level nodes
    pub palette: Vec<String>,
    /// Name of the virtual root, or None to leave the top level unwrapped
    pub root_name: Option<String>,
    /// Contrast exponent for the top-level sibling group (1.0 = identity)
    pub top_exponent: f64,
    /// Contrast exponent for every deeper sibling group (1.0 = identity)
    pub nested_exponent: f64,
    /// HSL lightness added per level of depth
    pub lighten_step: f64,
    /// What the top-level normalized values sum to
    pub normalized_total: f64,
    /// Keep building when a label occurs at two levels or under two parents.
    /// The first-seen assignment wins and a warning is logged.
    pub allow_label_collisions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.iter().map(|l| l.to_string()).collect(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            root_name: Some(DEFAULT_ROOT_NAME.to_string()),
            top_exponent: 1.0,
            nested_exponent: 1.0,
            lighten_step: 0.10,
            normalized_total: 100.0,
            allow_label_collisions: false,
        }
    }
}

impl EngineConfig {
    /// Config with the given levels and defaults for everything else.
    pub fn with_levels(levels: &[&str]) -> Self {
        Self {
            levels: levels.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to the defaults.
    /// The .env file is loaded by the binary before this is called.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let levels = env::var("SUNBURST_LEVELS")
            .map(|v| split_list(&v))
            .unwrap_or(defaults.levels);
        let palette = env::var("SUNBURST_PALETTE")
            .map(|v| split_list(&v))
            .unwrap_or(defaults.palette);
        let root_name = match env::var("SUNBURST_ROOT_NAME") {
            // An empty value disables the virtual root
            Ok(name) if name.trim().is_empty() => None,
            Ok(name) => Some(name),
            Err(_) => defaults.root_name,
        };
        let allow_label_collisions = match env::var("SUNBURST_ALLOW_COLLISIONS").as_deref() {
            Ok("1") | Ok("true") | Ok("yes") => true,
            _ => defaults.allow_label_collisions,
        };

        Ok(Self {
            levels,
            palette,
            root_name,
            top_exponent: env_f64("SUNBURST_TOP_EXPONENT", defaults.top_exponent)?,
            nested_exponent: env_f64("SUNBURST_NESTED_EXPONENT", defaults.nested_exponent)?,
            lighten_step: env_f64("SUNBURST_LIGHTEN_STEP", defaults.lighten_step)?,
            normalized_total: env_f64("SUNBURST_TOTAL", defaults.normalized_total)?,
            allow_label_collisions,
        })
    }

    /// Check the configuration before any computation begins.
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        if self.levels.is_empty() {
            return Err(EngineError::InvalidConfig(
                "at least one hierarchy level is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for level in &self.levels {
            if level.trim().is_empty() {
                return Err(EngineError::InvalidConfig(
                    "hierarchy level names must not be empty".to_string(),
                ));
            }
            if !seen.insert(level.as_str()) {
                return Err(EngineError::InvalidConfig(format!(
                    "hierarchy level {level:?} is listed twice"
                )));
            }
        }

        if self.palette.is_empty() {
            return Err(EngineError::InvalidConfig(
                "the color palette must contain at least one color".to_string(),
            ));
        }
        for color in &self.palette {
            Rgb::from_hex(color)?;
        }

        check_exponent("top_exponent", self.top_exponent)?;
        check_exponent("nested_exponent", self.nested_exponent)?;

        if !(0.0..=1.0).contains(&self.lighten_step) {
            return Err(EngineError::InvalidConfig(format!(
                "lighten_step must be within [0, 1], got {}",
                self.lighten_step
            )));
        }
        if !self.normalized_total.is_finite() || self.normalized_total <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "normalized_total must be a positive number, got {}",
                self.normalized_total
            )));
        }
        if let Some(name) = &self.root_name {
            if name.trim().is_empty() {
                return Err(EngineError::InvalidConfig(
                    "root name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn check_exponent(name: &str, value: f64) -> std::result::Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(format!(
            "{name} must be a positive finite number, got {value}"
        )))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn env_f64(name: &str, default: f64) -> Result<f64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.levels, vec!["Zone", "Cluster", "Country"]);
        assert_eq!(config.palette.len(), 21);
    }

    #[test]
    fn test_rejects_empty_levels() {
        let config = EngineConfig::with_levels(&[]);
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_levels() {
        let config = EngineConfig::with_levels(&["Zone", "Zone"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_palette_entry() {
        let config = EngineConfig {
            palette: vec!["#636EFA".to_string(), "blue".to_string()],
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_exponent() {
        let config = EngineConfig {
            nested_exponent: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            top_exponent: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        assert_eq!(
            split_list(" Zone, Cluster ,,Country "),
            vec!["Zone", "Cluster", "Country"]
        );
    }
}
