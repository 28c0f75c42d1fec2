//! Cluster descriptors for object classification.
//!
//! A [`FeatureVector`] is the concatenation of
//! - a color histogram: 3 channels (HSV by default) x `color_bins`
//! - a normal histogram: 3 normal components x `normal_bins`
//!
//! Every channel is normalized on its own, so each sub-segment sums to 1.0.

pub mod color;
pub mod histogram;
pub mod normals;

pub use color::*;
pub use histogram::*;
pub use normals::*;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use sorter_core::PointCloud;

pub type Result<T> = std::result::Result<T, FeatureError>;

/// Fixed-length descriptor consumed by the classifier.
pub type FeatureVector = Vec<f32>;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Cannot describe an empty cluster")]
    EmptyCluster,

    #[error("Normal count {normals} does not match point count {points}")]
    NormalCountMismatch { points: usize, normals: usize },

    #[error("None of the {0} normals is finite")]
    NoFiniteNormals(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub color_bins: usize,
    pub normal_bins: usize,
    /// Bin HSV instead of raw RGB.
    pub use_hsv: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            color_bins: 32,
            normal_bins: 32,
            use_hsv: true,
        }
    }
}

impl FeatureConfig {
    /// Length of every vector produced with this configuration.
    pub fn feature_len(&self) -> usize {
        3 * self.color_bins + 3 * self.normal_bins
    }
}

/// Describe one cluster. `normals` must be aligned 1:1 with `cluster.points`, and at
/// least one of them must be finite so the normal segments can be normalized.
pub fn extract_features(
    cluster: &PointCloud,
    normals: &[Vector3<f32>],
    config: &FeatureConfig,
) -> Result<FeatureVector> {
    if config.color_bins == 0 || config.normal_bins == 0 {
        return Err(FeatureError::InvalidConfig(
            "histogram bin counts must be positive".to_string(),
        ));
    }
    if cluster.is_empty() {
        return Err(FeatureError::EmptyCluster);
    }
    if normals.len() != cluster.len() {
        return Err(FeatureError::NormalCountMismatch {
            points: cluster.len(),
            normals: normals.len(),
        });
    }
    if !normals.iter().any(|n| n.iter().all(|v| v.is_finite())) {
        return Err(FeatureError::NoFiniteNormals(normals.len()));
    }

    let mut feature = Vec::with_capacity(config.feature_len());
    feature.extend(color_histogram(cluster, config.color_bins, config.use_hsv));
    feature.extend(normal_histogram(normals, config.normal_bins));
    Ok(feature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn cluster(n: usize) -> PointCloud {
        let points = (0..n).map(|i| Point3::new(i as f32 * 0.01, 0.0, 0.7)).collect();
        let colors = (0..n).map(|i| [(i * 40 % 256) as u8, 120, 200]).collect();
        PointCloud::new(points).with_colors(colors).unwrap()
    }

    fn segment_sums(feature: &[f32], config: &FeatureConfig) -> Vec<f32> {
        let mut sums = Vec::new();
        for c in 0..3 {
            let start = c * config.color_bins;
            sums.push(feature[start..start + config.color_bins].iter().sum());
        }
        let offset = 3 * config.color_bins;
        for c in 0..3 {
            let start = offset + c * config.normal_bins;
            sums.push(feature[start..start + config.normal_bins].iter().sum());
        }
        sums
    }

    #[test]
    fn test_feature_length_and_normalization() {
        let config = FeatureConfig::default();
        let pc = cluster(17);
        let normals = vec![Vector3::new(0.0, 0.6, 0.8); 17];

        let feature = extract_features(&pc, &normals, &config).unwrap();
        assert_eq!(feature.len(), config.feature_len());
        assert_eq!(feature.len(), 192);
        assert!(feature.iter().all(|v| v.is_finite()));
        for sum in segment_sums(&feature, &config) {
            assert!((sum - 1.0).abs() < 1e-5, "segment sums to {sum}");
        }
    }

    #[test]
    fn test_custom_bin_counts() {
        let config = FeatureConfig {
            color_bins: 8,
            normal_bins: 5,
            use_hsv: false,
        };
        let feature = extract_features(&cluster(4), &[Vector3::z(); 4], &config).unwrap();
        assert_eq!(feature.len(), 39);
    }

    #[test]
    fn test_rejects_empty_and_misaligned_input() {
        let config = FeatureConfig::default();
        assert!(matches!(
            extract_features(&PointCloud::default(), &[], &config),
            Err(FeatureError::EmptyCluster)
        ));
        assert!(matches!(
            extract_features(&cluster(3), &[Vector3::z()], &config),
            Err(FeatureError::NormalCountMismatch { points: 3, normals: 1 })
        ));
        let undefined = vec![Vector3::new(f32::NAN, 0.0, 0.0); 3];
        assert!(matches!(
            extract_features(&cluster(3), &undefined, &config),
            Err(FeatureError::NoFiniteNormals(3))
        ));
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: FeatureConfig = serde_json::from_str(r#"{"color_bins": 16}"#).unwrap();
        assert_eq!(config.color_bins, 16);
        assert_eq!(config.normal_bins, 32);
        assert!(config.use_hsv);
    }
}
