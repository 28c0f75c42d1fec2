use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sorter_core::{PointCloud, Rgb};

/// Stable per-cluster display colors.
///
/// Color `i` never changes once handed out, so a cluster keeps its color across
/// frames as long as it keeps its position in the cluster list.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    rng: StdRng,
    colors: Vec<Rgb>,
}

impl ColorPalette {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            colors: Vec::new(),
        }
    }

    /// The first `n` colors, generating any that do not exist yet.
    pub fn colors(&mut self, n: usize) -> &[Rgb] {
        while self.colors.len() < n {
            let color: Rgb = [self.rng.gen(), self.rng.gen(), self.rng.gen()];
            self.colors.push(color);
        }
        &self.colors[..n]
    }

    pub fn color(&mut self, i: usize) -> Rgb {
        self.colors(i + 1)[i]
    }

    /// Merge the clusters of `cloud` into one cloud, each painted in its own color.
    pub fn colorize(&mut self, cloud: &PointCloud, clusters: &[Vec<usize>]) -> PointCloud {
        let colors = self.colors(clusters.len()).to_vec();
        let mut merged = PointCloud::default();
        for (indices, color) in clusters.iter().zip(colors) {
            merged.extend(&cloud.select(indices).painted(color));
        }
        merged
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new(0)
    }
}
