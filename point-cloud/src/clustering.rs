//! Euclidean (tolerance-based region growing) clustering.

use crate::spatial::PointIndex;
use serde::{Deserialize, Serialize};
use sorter_core::PointCloud;

/// Sorted, unique indices into the cloud a cluster was extracted from.
pub type ClusterIndices = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Max gap between neighboring points of one cluster.
    pub tolerance: f32,
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.03,
            min_size: 10,
            max_size: 1500,
        }
    }
}

/// Partition a cloud into spatially coherent clusters.
///
/// Seeds are taken in index order and grown breadth-first through every unvisited
/// point within `tolerance`. Clusters whose size falls outside
/// `[min_size, max_size]` are dropped whole. Output is in discovery order.
/// Colors and normals are ignored.
pub fn euclidean_clusters(pc: &PointCloud, config: &ClusterConfig) -> Vec<ClusterIndices> {
    let n = pc.len();
    if n == 0 {
        return Vec::new();
    }

    let index = PointIndex::build(&pc.points);
    let mut processed = vec![false; n];
    let mut clusters = Vec::new();
    let mut rejected = 0usize;

    for seed in 0..n {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;

        let mut members = vec![seed];
        let mut head = 0;
        while head < members.len() {
            let current = members[head];
            head += 1;

            for neighbor in index.within_radius(&pc.points[current], config.tolerance) {
                if !processed[neighbor] {
                    processed[neighbor] = true;
                    members.push(neighbor);
                }
            }
        }

        if members.len() >= config.min_size && members.len() <= config.max_size {
            members.sort_unstable();
            clusters.push(members);
        } else {
            rejected += 1;
        }
    }

    tracing::debug!(
        clusters = clusters.len(),
        rejected,
        points = n,
        "euclidean clustering"
    );
    clusters
}

/// Gather one cluster's points (with their colors and normals) into a new cloud.
pub fn extract_cluster_cloud(pc: &PointCloud, indices: &[usize]) -> PointCloud {
    pc.select(indices)
}
