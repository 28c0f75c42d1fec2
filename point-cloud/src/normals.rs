//! Surface normal estimation.
//!
//! The perception pipeline treats normal estimation as an external capability
//! ([`NormalEstimator`]) invoked once per cluster, possibly from several threads at
//! once. [`PcaNormalEstimator`] is the in-process implementation.

use crate::spatial::PointIndex;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use rayon::prelude::*;
use sorter_core::PointCloud;

#[derive(Debug, thiserror::Error)]
pub enum NormalError {
    #[error("Normal service unavailable: {0}")]
    Unavailable(String),

    #[error("Normal count {got} does not match point count {expected}")]
    CountMismatch { expected: usize, got: usize },
}

/// Per-point surface normals for a cloud, aligned 1:1 with its points.
pub trait NormalEstimator: Send + Sync {
    fn estimate(&self, cloud: &PointCloud) -> Result<Vec<Vector3<f32>>, NormalError>;
}

/// PCA over the `k` nearest neighbors of each point, normals flipped toward `viewpoint`.
#[derive(Debug, Clone)]
pub struct PcaNormalEstimator {
    pub k: usize,
    pub viewpoint: Point3<f32>,
}

impl Default for PcaNormalEstimator {
    fn default() -> Self {
        Self {
            k: 15,
            viewpoint: Point3::origin(),
        }
    }
}

impl PcaNormalEstimator {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }
}

impl NormalEstimator for PcaNormalEstimator {
    fn estimate(&self, cloud: &PointCloud) -> Result<Vec<Vector3<f32>>, NormalError> {
        Ok(estimate_normals(cloud, self.k, &self.viewpoint))
    }
}

/// Estimate normals from the covariance of each point's neighborhood (itself included).
/// Neighborhoods with fewer than 3 points get the default up vector.
pub fn estimate_normals(pc: &PointCloud, k: usize, viewpoint: &Point3<f32>) -> Vec<Vector3<f32>> {
    if pc.is_empty() {
        return Vec::new();
    }

    let index = PointIndex::build(&pc.points);

    pc.points
        .par_iter()
        .map(|p| {
            let neighbors = index.k_nearest(p, k.max(1), None);
            if neighbors.len() < 3 {
                return Vector3::new(0.0, 0.0, 1.0);
            }

            let mut centroid = Vector3::zeros();
            for &(j, _) in &neighbors {
                centroid += pc.points[j].coords;
            }
            centroid /= neighbors.len() as f32;

            let mut cov = Matrix3::zeros();
            for &(j, _) in &neighbors {
                let d = pc.points[j].coords - centroid;
                cov += d * d.transpose();
            }
            cov /= neighbors.len() as f32;

            let eigen = SymmetricEigen::new(cov);

            let mut min_idx = 0;
            for i in 1..3 {
                if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
                    min_idx = i;
                }
            }

            let mut normal: Vector3<f32> = eigen.eigenvectors.column(min_idx).into_owned();
            if !normal.iter().all(|v| v.is_finite()) || normal.norm_squared() < 1e-12 {
                return Vector3::new(0.0, 0.0, 1.0);
            }
            normal.normalize_mut();
            if normal.dot(&(viewpoint - p)) < 0.0 {
                normal = -normal;
            }
            normal
        })
        .collect()
}
