//! Support-plane extraction with RANSAC.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use sorter_core::{Plane, PointCloud, Ransac, RobustConfig, RobustModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneConfig {
    /// Max point-to-plane distance for an inlier.
    pub max_distance: f32,
    pub max_iterations: usize,
    /// Early-termination confidence of the sampler.
    pub confidence: f64,
    /// Below this inlier fraction the plane is rejected and segmentation degrades.
    pub min_inlier_ratio: f32,
    /// Refit the winning plane to all of its inliers.
    pub refine: bool,
    pub seed: Option<u64>,
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            max_distance: 0.01,
            max_iterations: 1000,
            confidence: 0.99,
            min_inlier_ratio: 0.1,
            refine: true,
            seed: Some(0),
        }
    }
}

/// Output of [`segment_plane`].
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Points on the support plane.
    pub surface: PointCloud,
    /// Everything else.
    pub objects: PointCloud,
    /// `None` when no acceptable plane was found.
    pub plane: Option<Plane>,
    /// Indices of `surface` points in the input cloud.
    pub inliers: Vec<usize>,
}

pub struct PlaneEstimator;

impl RobustModel<Point3<f32>> for PlaneEstimator {
    type Model = Plane;

    fn min_sample_size(&self) -> usize {
        3
    }

    fn estimate(&self, data: &[&Point3<f32>]) -> Option<Self::Model> {
        Plane::from_points(data[0], data[1], data[2])
    }

    fn compute_error(&self, model: &Self::Model, data: &Point3<f32>) -> f64 {
        model.distance(data) as f64
    }
}

/// Fit the dominant plane. Returns the model and its inlier indices, or
/// `(None, [])` when the cloud is too small or no plane reaches the inlier ratio.
pub fn fit_plane(pc: &PointCloud, config: &PlaneConfig) -> (Option<Plane>, Vec<usize>) {
    let n = pc.len();
    if n < 3 {
        return (None, Vec::new());
    }

    let ransac = Ransac::new(RobustConfig {
        threshold: config.max_distance as f64,
        max_iterations: config.max_iterations,
        confidence: config.confidence,
        seed: config.seed,
    });
    let res = ransac.run(&PlaneEstimator, &pc.points);

    let Some(mut plane) = res.model else {
        return (None, Vec::new());
    };
    let mut inliers = mask_to_indices(&res.inliers);

    if config.refine && inliers.len() >= 3 {
        let members: Vec<&Point3<f32>> = inliers.iter().map(|&i| &pc.points[i]).collect();
        if let Some(refit) = Plane::fit(&members) {
            let refit_inliers: Vec<usize> = pc
                .points
                .iter()
                .enumerate()
                .filter(|(_, p)| refit.distance(p) <= config.max_distance)
                .map(|(i, _)| i)
                .collect();
            if refit_inliers.len() >= inliers.len() {
                plane = refit;
                inliers = refit_inliers;
            }
        }
    }

    let min_inliers = ((config.min_inlier_ratio.max(0.0) as f64) * n as f64).ceil() as usize;
    if inliers.len() < min_inliers.max(3) {
        tracing::debug!(
            inliers = inliers.len(),
            required = min_inliers.max(3),
            "best plane below inlier threshold"
        );
        return (None, Vec::new());
    }

    (Some(plane), inliers)
}

/// Split a cloud into the support surface and the objects resting on it.
///
/// Degrades to an empty surface and the full input as objects when no plane is found.
pub fn segment_plane(pc: &PointCloud, config: &PlaneConfig) -> Segmentation {
    let (plane, inliers) = fit_plane(pc, config);

    if plane.is_none() {
        if !pc.is_empty() {
            tracing::info!(points = pc.len(), "no support plane found, keeping all points as objects");
        }
        return Segmentation {
            surface: PointCloud::default(),
            objects: pc.clone(),
            plane: None,
            inliers: Vec::new(),
        };
    }

    let mut mask = vec![false; pc.len()];
    for &i in &inliers {
        mask[i] = true;
    }
    let outlier_mask: Vec<bool> = mask.iter().map(|&m| !m).collect();

    let segmentation = Segmentation {
        surface: pc.select_mask(&mask),
        objects: pc.select_mask(&outlier_mask),
        plane,
        inliers,
    };
    tracing::debug!(
        surface = segmentation.surface.len(),
        objects = segmentation.objects.len(),
        "plane segmentation"
    );
    segmentation
}

fn mask_to_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter(|(_, &is_inlier)| is_inlier)
        .map(|(i, _)| i)
        .collect()
}
