//! Color histograms.

use crate::histogram::{histogram, normalize};
use sorter_core::{PointCloud, Rgb};

/// RGB (0-255) to HSV with every channel in `[0, 1]`.
pub fn rgb_to_hsv([r, g, b]: Rgb) -> [f32; 3] {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        ((g - b) / delta).rem_euclid(6.0) / 6.0
    } else if max == g {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };

    [h.clamp(0.0, 1.0), s, v]
}

/// Per-channel normalized color histogram over `[0, 256]`, channels concatenated.
///
/// With `use_hsv` each HSV channel is scaled to `[0, 255]` before binning.
pub fn color_histogram(cloud: &PointCloud, bins: usize, use_hsv: bool) -> Vec<f32> {
    let channels: Vec<[f32; 3]> = (0..cloud.len())
        .map(|i| {
            let rgb = cloud.color(i);
            if use_hsv {
                rgb_to_hsv(rgb).map(|c| c * 255.0)
            } else {
                rgb.map(|c| c as f32)
            }
        })
        .collect();

    let mut out = Vec::with_capacity(3 * bins);
    for c in 0..3 {
        let mut hist = histogram(channels.iter().map(|v| v[c]), bins, 0.0, 256.0);
        normalize(&mut hist);
        out.extend(hist);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_rgb_to_hsv() {
        assert!(close(rgb_to_hsv([255, 0, 0]), [0.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0, 255, 0]), [1.0 / 3.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0, 0, 255]), [2.0 / 3.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([255, 0, 255]), [5.0 / 6.0, 1.0, 1.0]));
        assert!(close(rgb_to_hsv([0, 0, 0]), [0.0, 0.0, 0.0]));
        assert!(close(rgb_to_hsv([128, 128, 128]), [0.0, 0.0, 128.0 / 255.0]));
    }

    #[test]
    fn test_pure_red_lands_in_expected_bins() {
        let cloud = PointCloud::new(vec![Point3::origin(); 3])
            .with_colors(vec![[255, 0, 0]; 3])
            .unwrap();
        let hist = color_histogram(&cloud, 4, true);
        // hue 0 -> bin 0, saturation 255 -> bin 3, value 255 -> bin 3
        assert_eq!(hist, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_uncolored_cloud_counts_as_black() {
        let cloud = PointCloud::new(vec![Point3::origin(); 2]);
        let hist = color_histogram(&cloud, 2, false);
        assert_eq!(hist, vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }
}
