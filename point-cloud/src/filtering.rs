//! Point cloud filtering: outlier removal, voxel downsampling and region cropping.

use crate::spatial::PointIndex;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sorter_core::PointCloud;

/// Parameters of [`remove_statistical_outliers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalOutlierConfig {
    /// Neighbors examined per point.
    pub mean_k: usize,
    /// Points with mean neighbor distance above `mean + std_dev_mul * std_dev` are dropped.
    pub std_dev_mul: f64,
}

impl Default for StatisticalOutlierConfig {
    fn default() -> Self {
        Self {
            mean_k: 50,
            std_dev_mul: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn coordinate(self, p: &Point3<f32>) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }
}

/// Keep points whose `axis` coordinate lies in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassThrough {
    pub axis: Axis,
    pub min: f32,
    pub max: f32,
}

impl PassThrough {
    pub fn new(axis: Axis, min: f32, max: f32) -> Self {
        Self { axis, min, max }
    }

    pub fn contains(&self, p: &Point3<f32>) -> bool {
        let v = self.axis.coordinate(p);
        v >= self.min && v <= self.max
    }
}

/// Preprocessing chain: outlier removal, then voxel grid, then pass-through crops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// `None` disables statistical outlier removal.
    pub statistical: Option<StatisticalOutlierConfig>,
    /// Voxel edge length; `<= 0` disables downsampling.
    pub leaf_size: f32,
    /// Applied in order, each on the output of the previous one.
    pub pass_through: Vec<PassThrough>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            statistical: Some(StatisticalOutlierConfig::default()),
            leaf_size: 0.01,
            pass_through: vec![
                PassThrough::new(Axis::Z, 0.6, 1.1),
                PassThrough::new(Axis::Y, -0.4, 0.4),
            ],
        }
    }
}

/// Run the full preprocessing chain on a raw sensor cloud.
pub fn preprocess(raw: &PointCloud, config: &PreprocessConfig) -> PointCloud {
    let mut cloud = remove_non_finite(raw);
    tracing::debug!(input = raw.len(), finite = cloud.len(), "preprocess start");

    if let Some(sor) = &config.statistical {
        cloud = remove_statistical_outliers(&cloud, sor.mean_k, sor.std_dev_mul).0;
        tracing::debug!(points = cloud.len(), "after statistical outlier removal");
    }

    cloud = voxel_down_sample(&cloud, config.leaf_size);
    tracing::debug!(points = cloud.len(), leaf = config.leaf_size, "after voxel grid");

    for filter in &config.pass_through {
        cloud = pass_through(&cloud, filter);
        tracing::debug!(points = cloud.len(), axis = ?filter.axis, "after pass-through");
    }

    if cloud.is_empty() {
        tracing::debug!("preprocessing left no points");
    }
    cloud
}

/// Drop points with NaN or infinite coordinates.
pub fn remove_non_finite(pc: &PointCloud) -> PointCloud {
    let mask: Vec<bool> = pc
        .points
        .iter()
        .map(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        .collect();
    if mask.iter().all(|&keep| keep) {
        return pc.clone();
    }
    pc.select_mask(&mask)
}

/// Crop to an axis range.
pub fn pass_through(pc: &PointCloud, filter: &PassThrough) -> PointCloud {
    let mask: Vec<bool> = pc.points.iter().map(|p| filter.contains(p)).collect();
    pc.select_mask(&mask)
}

/// Downsample a point cloud with a voxel grid.
/// Returns a new point cloud with one point per voxel (the centroid).
pub fn voxel_down_sample(pc: &PointCloud, voxel_size: f32) -> PointCloud {
    if voxel_size <= 0.0 || pc.is_empty() {
        return pc.clone();
    }

    let n = pc.len();
    let mut indices: Vec<(i64, i64, i64, usize)> = Vec::with_capacity(n);

    // 1. Compute indices
    for (i, p) in pc.points.iter().enumerate() {
        let hx = (p.x / voxel_size).floor() as i64;
        let hy = (p.y / voxel_size).floor() as i64;
        let hz = (p.z / voxel_size).floor() as i64;
        indices.push((hx, hy, hz, i));
    }

    // 2. Sort by voxel index
    if n > 10000 {
        indices.par_sort_unstable();
    } else {
        indices.sort_unstable();
    }

    // 3. Aggregate
    let mut new_points = Vec::new();
    let mut new_colors = pc.colors.as_ref().map(|_| Vec::new());
    let mut new_normals = pc.normals.as_ref().map(|_| Vec::new());

    let mut start = 0;
    while start < indices.len() {
        let (hx, hy, hz, _) = indices[start];
        let mut end = start;
        while end < indices.len() && (indices[end].0, indices[end].1, indices[end].2) == (hx, hy, hz) {
            end += 1;
        }
        let members = &indices[start..end];
        let factor = 1.0 / members.len() as f64;

        let mut sum_p = Vector3::<f64>::zeros();
        for &(_, _, _, idx) in members {
            sum_p += pc.points[idx].coords.cast::<f64>();
        }
        new_points.push(Point3::from((sum_p * factor).cast::<f32>()));

        if let (Some(colors), Some(nc)) = (&pc.colors, &mut new_colors) {
            let mut sum_c = [0u32; 3];
            for &(_, _, _, idx) in members {
                for (acc, &c) in sum_c.iter_mut().zip(colors[idx].iter()) {
                    *acc += c as u32;
                }
            }
            let count = members.len() as f64;
            nc.push(sum_c.map(|s| (s as f64 / count).round().clamp(0.0, 255.0) as u8));
        }

        if let (Some(normals), Some(nn)) = (&pc.normals, &mut new_normals) {
            let mut sum_n = Vector3::<f32>::zeros();
            for &(_, _, _, idx) in members {
                sum_n += normals[idx];
            }
            if sum_n.norm_squared() > 1e-12 {
                sum_n.normalize_mut();
            }
            nn.push(sum_n);
        }

        start = end;
    }

    PointCloud {
        points: new_points,
        colors: new_colors,
        normals: new_normals,
    }
}

/// Remove statistical outliers.
///
/// Compute the mean distance from each point to its `k` nearest neighbors (itself
/// excluded, `k` capped at `n - 1`). Points whose mean distance exceeds
/// `global_mean + std_ratio * std_dev` are removed. Returns the filtered cloud and the
/// indices of the kept points.
pub fn remove_statistical_outliers(
    pc: &PointCloud,
    k: usize,
    std_ratio: f64,
) -> (PointCloud, Vec<usize>) {
    let n = pc.len();
    let k = k.min(n.saturating_sub(1));
    if k == 0 {
        return (pc.clone(), (0..n).collect());
    }

    let index = PointIndex::build(&pc.points);

    let distances: Vec<f64> = pc
        .points
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            let neighbors = index.k_nearest(p, k, Some(i));
            let sum: f64 = neighbors.iter().map(|&(_, d)| d as f64).sum();
            sum / neighbors.len().max(1) as f64
        })
        .collect();

    let mean_dist = distances.iter().sum::<f64>() / n as f64;
    let variance = distances
        .iter()
        .map(|d| (d - mean_dist).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let threshold = mean_dist + std_ratio * variance.sqrt();

    let inliers: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter(|(_, &d)| d <= threshold)
        .map(|(i, _)| i)
        .collect();

    (pc.select(&inliers), inliers)
}
