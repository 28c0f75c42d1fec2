//! Robust Estimation Module
//!
//! Provides a generic RANSAC implementation that can be used for any model estimation task.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::marker::PhantomData;

/// Configuration for robust estimation
#[derive(Debug, Clone)]
pub struct RobustConfig {
    /// Points with an error `<= threshold` count as inliers.
    pub threshold: f64,
    pub max_iterations: usize,
    /// Probability of having drawn at least one outlier-free sample; drives early termination.
    pub confidence: f64,
    /// Fixed seed for reproducible sampling. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for RobustConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            max_iterations: 1000,
            confidence: 0.99,
            seed: None,
        }
    }
}

/// Result of robust estimation
#[derive(Debug, Clone)]
pub struct RobustResult<M> {
    pub model: Option<M>,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
    pub residual: f64,
    pub iterations: usize,
}

impl<M> RobustResult<M> {
    fn empty(n: usize) -> Self {
        Self {
            model: None,
            inliers: vec![false; n],
            num_inliers: 0,
            residual: f64::INFINITY,
            iterations: 0,
        }
    }
}

/// Trait for models that can be estimated robustly
pub trait RobustModel<D> {
    type Model: Clone;

    /// Minimum number of data points required to estimate the model
    fn min_sample_size(&self) -> usize;

    /// Estimate model from a minimal sample
    fn estimate(&self, data: &[&D]) -> Option<Self::Model>;

    /// Compute error for a single data point against the model
    fn compute_error(&self, model: &Self::Model, data: &D) -> f64;
}

/// Generic RANSAC engine
pub struct Ransac<D, M: RobustModel<D>> {
    config: RobustConfig,
    _phantom: PhantomData<(D, M)>,
}

impl<D, M: RobustModel<D>> Ransac<D, M> {
    pub fn new(config: RobustConfig) -> Self {
        Self {
            config,
            _phantom: PhantomData,
        }
    }

    pub fn run(&self, estimator: &M, data: &[D]) -> RobustResult<M::Model> {
        let n = data.len();
        let k = estimator.min_sample_size();

        if n < k || k == 0 {
            return RobustResult::empty(n);
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut best_model = None;
        let mut best_num_inliers = 0;
        let mut best_residual = f64::INFINITY;
        let mut required_iterations = self.config.max_iterations;
        let mut iterations = 0;

        while iterations < required_iterations.min(self.config.max_iterations) {
            iterations += 1;

            // 1. Sample
            let picked = index::sample(&mut rng, n, k);
            let sample: Vec<&D> = picked.iter().map(|i| &data[i]).collect();

            // 2. Estimate
            let Some(model) = estimator.estimate(&sample) else {
                continue;
            };

            // 3. Score
            let mut num_inliers = 0;
            let mut total_error = 0.0;
            for d in data {
                let err = estimator.compute_error(&model, d);
                if err <= self.config.threshold {
                    num_inliers += 1;
                    total_error += err;
                }
            }

            let residual = if num_inliers > 0 {
                total_error / num_inliers as f64
            } else {
                f64::INFINITY
            };

            if num_inliers > best_num_inliers
                || (num_inliers == best_num_inliers && residual < best_residual)
            {
                best_num_inliers = num_inliers;
                best_model = Some(model);
                best_residual = residual;

                required_iterations =
                    adaptive_iterations(num_inliers, n, k, self.config.confidence)
                        .max(iterations);
            }
        }

        let inliers = match &best_model {
            Some(model) => data
                .iter()
                .map(|d| estimator.compute_error(model, d) <= self.config.threshold)
                .collect(),
            None => vec![false; n],
        };

        RobustResult {
            model: best_model,
            inliers,
            num_inliers: best_num_inliers,
            residual: best_residual,
            iterations,
        }
    }
}

/// Number of draws needed to hit an all-inlier sample with probability `confidence`
/// given the current inlier ratio.
fn adaptive_iterations(num_inliers: usize, n: usize, k: usize, confidence: f64) -> usize {
    let w = num_inliers as f64 / n as f64;
    let p_good = w.powi(k as i32);
    if p_good >= 1.0 {
        return 1;
    }
    if p_good <= f64::EPSILON {
        return usize::MAX;
    }
    let confidence = confidence.clamp(0.0, 1.0 - 1e-12);
    let needed = (1.0 - confidence).ln() / (1.0 - p_good).ln();
    if needed.is_finite() {
        needed.ceil().max(1.0) as usize
    } else {
        usize::MAX
    }
}
