//! R-tree backed neighbor queries over point positions.

use nalgebra::Point3;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// Wrapper for RTree
struct PointWrapper(usize, Point3<f32>);

impl RTreeObject for PointWrapper {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.1.x, self.1.y, self.1.z])
    }
}

impl PointDistance for PointWrapper {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let dx = self.1.x - point[0];
        let dy = self.1.y - point[1];
        let dz = self.1.z - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Spatial index over a point slice; query results are indices into that slice.
pub struct PointIndex {
    tree: RTree<PointWrapper>,
}

impl PointIndex {
    pub fn build(points: &[Point3<f32>]) -> Self {
        let wrappers: Vec<PointWrapper> = points
            .iter()
            .enumerate()
            .map(|(i, p)| PointWrapper(i, *p))
            .collect();
        Self {
            tree: RTree::bulk_load(wrappers),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// The `k` nearest points to `query` as `(index, distance)`, nearest first,
    /// never including `exclude`.
    pub fn k_nearest(
        &self,
        query: &Point3<f32>,
        k: usize,
        exclude: Option<usize>,
    ) -> Vec<(usize, f32)> {
        let q = [query.x, query.y, query.z];
        self.tree
            .nearest_neighbor_iter(&q)
            .filter(|w| Some(w.0) != exclude)
            .take(k)
            .map(|w| (w.0, w.distance_2(&q).sqrt()))
            .collect()
    }

    /// Indices of all points within `radius` of `query` (inclusive).
    pub fn within_radius(&self, query: &Point3<f32>, radius: f32) -> Vec<usize> {
        let q = [query.x, query.y, query.z];
        self.tree
            .locate_within_distance(q, radius * radius)
            .map(|w| w.0)
            .collect()
    }
}
