//! Surface-normal histograms.

use crate::histogram::{histogram, normalize};
use nalgebra::Vector3;

/// Per-component normalized histogram of unit normals over `[-1, 1]`.
///
/// Components are clamped into range; normals with a non-finite component are skipped.
pub fn normal_histogram(normals: &[Vector3<f32>], bins: usize) -> Vec<f32> {
    let finite: Vec<&Vector3<f32>> = normals
        .iter()
        .filter(|n| n.iter().all(|v| v.is_finite()))
        .collect();

    let mut out = Vec::with_capacity(3 * bins);
    for c in 0..3 {
        let mut hist = histogram(finite.iter().map(|n| n[c].clamp(-1.0, 1.0)), bins, -1.0, 1.0);
        normalize(&mut hist);
        out.extend(hist);
    }
    out
}
