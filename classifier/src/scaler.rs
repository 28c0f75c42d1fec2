use serde::{Deserialize, Serialize};

/// `(x - mean) / scale`, per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Scaler that leaves `len`-long vectors untouched.
    pub fn identity(len: usize) -> Self {
        Self {
            mean: vec![0.0; len],
            scale: vec![1.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Zero or non-finite scales mean a constant training feature; treat them as 1.
    pub(crate) fn sanitize(&mut self) {
        for s in &mut self.scale {
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }
    }

    /// Caller guarantees `feature.len() == self.len()`.
    pub fn transform(&self, feature: &[f32]) -> Vec<f64> {
        feature
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&m, &s))| (x as f64 - m) / s)
            .collect()
    }
}
