//! Configuration types for the evaluation pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for timestamp association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// Time offset added to the second file's timestamps
    #[serde(default)]
    pub offset: f64,

    /// Maximum allowed time difference for matching entries (seconds)
    #[serde(default = "default_max_difference")]
    pub max_difference: f64,

    /// Drop the first and last 100 raw lines of each input file
    /// (for benchmark formats with boilerplate headers/footers)
    #[serde(default)]
    pub remove_bounds: bool,
}

fn default_max_difference() -> f64 {
    0.02
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            offset: 0.0,
            max_difference: default_max_difference(),
            remove_bounds: false,
        }
    }
}

/// Configuration for trajectory alignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Scaling factor applied to the estimated trajectory before alignment
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

/// Configuration for trajectory plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Plot width in pixels
    #[serde(default = "default_plot_width")]
    pub width: u32,

    /// Plot height in pixels
    #[serde(default = "default_plot_height")]
    pub height: u32,
}

fn default_plot_width() -> u32 {
    1280
}

fn default_plot_height() -> u32 {
    960
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_plot_width(),
            height: default_plot_height(),
        }
    }
}

/// Main evaluation configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub association: AssociationConfig,

    #[serde(default)]
    pub alignment: AlignmentConfig,

    #[serde(default)]
    pub plot: PlotConfig,
}

impl EvalConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: EvalConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_association_config() {
        let config = AssociationConfig::default();
        assert_eq!(config.offset, 0.0);
        assert_eq!(config.max_difference, 0.02);
        assert!(!config.remove_bounds);
    }

    #[test]
    fn test_default_eval_config() {
        let config = EvalConfig::default();
        assert_eq!(config.alignment.scale, 1.0);
        assert_eq!(config.plot.width, 1280);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EvalConfig =
            serde_yaml::from_str("association:\n  offset: 0.5\n").unwrap();
        assert_eq!(config.association.offset, 0.5);
        assert_eq!(config.association.max_difference, 0.02);
        assert_eq!(config.alignment.scale, 1.0);
    }
}
