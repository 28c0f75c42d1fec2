//! Pipeline configuration, loaded from YAML.
//!
//! Every section may be omitted; missing keys take the defaults of the tabletop
//! scenes (1 cm voxels, table crop at z 0.6..1.1, 3 cm clustering tolerance).
//!
//! ```yaml
//! preprocess:
//!   leaf_size: 0.005
//!   pass_through:
//!     - { axis: z, min: 0.6, max: 1.1 }
//! cluster:
//!   tolerance: 0.02
//! planner:
//!   match_policy: last
//! ```

use serde::{Deserialize, Serialize};
use sorter_features::FeatureConfig;
use sorter_planner::PlannerConfig;
use sorter_point_cloud::{ClusterConfig, PlaneConfig, PreprocessConfig};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub plane: PlaneConfig,
    pub cluster: ClusterConfig,
    pub features: FeatureConfig,
    pub planner: PlannerConfig,
    /// Height of a label marker above the first point of its cluster.
    pub label_height: f32,
    /// Seed of the cluster visualization colors.
    pub palette_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            plane: PlaneConfig::default(),
            cluster: ClusterConfig::default(),
            features: FeatureConfig::default(),
            planner: PlannerConfig::default(),
            label_height: 0.4,
            palette_seed: 0,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.min_size > self.cluster.max_size {
            return Err(ConfigError::Invalid(format!(
                "cluster min_size {} exceeds max_size {}",
                self.cluster.min_size, self.cluster.max_size
            )));
        }
        if !self.cluster.tolerance.is_finite() || self.cluster.tolerance <= 0.0 {
            return Err(ConfigError::Invalid(
                "cluster tolerance must be positive".to_string(),
            ));
        }
        if !self.plane.max_distance.is_finite() || self.plane.max_distance < 0.0 {
            return Err(ConfigError::Invalid(
                "plane max_distance must be finite and non-negative".to_string(),
            ));
        }
        if self.features.color_bins == 0 || self.features.normal_bins == 0 {
            return Err(ConfigError::Invalid(
                "histogram bin counts must be positive".to_string(),
            ));
        }
        if let Some(f) = self.preprocess.pass_through.iter().find(|f| f.min > f.max) {
            return Err(ConfigError::Invalid(format!(
                "pass-through on {:?} has min {} above max {}",
                f.axis, f.min, f.max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorter_planner::MatchPolicy;
    use sorter_point_cloud::Axis;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(PipelineConfig::from_yaml("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let text = "
preprocess:
  statistical: null
  pass_through:
    - { axis: x, min: 0.3, max: 0.9 }
cluster:
  tolerance: 0.02
planner:
  match_policy: last
label_height: 0.25
";
        let config = PipelineConfig::from_yaml(text).unwrap();
        assert!(config.preprocess.statistical.is_none());
        assert_eq!(config.preprocess.leaf_size, 0.01);
        assert_eq!(config.preprocess.pass_through[0].axis, Axis::X);
        assert_eq!(config.cluster.tolerance, 0.02);
        assert_eq!(config.cluster.min_size, 10);
        assert_eq!(config.planner.match_policy, MatchPolicy::Last);
        assert_eq!(config.label_height, 0.25);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let text = "cluster: { min_size: 100, max_size: 10 }";
        assert!(matches!(
            PipelineConfig::from_yaml(text),
            Err(ConfigError::Invalid(_))
        ));
    }
}
