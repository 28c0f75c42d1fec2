//! Object classification from cluster descriptors.
//!
//! The classifier is consumed, never trained, here. A [`ModelArtifact`] bundles
//! the three pieces produced at training time:
//!
//! - a [`StandardScaler`] (per-feature centering and scaling)
//! - a [`Classifier`] (linear one-vs-rest or kernel SVC one-vs-one)
//! - the class labels, indexed by the classifier's output
//!
//! and exposes them through the [`Model`] trait.

pub mod artifact;
pub mod scaler;
pub mod svm;

pub use artifact::ModelArtifact;
pub use scaler::StandardScaler;
pub use svm::{Classifier, Kernel};

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Inconsistent model artifact: {0}")]
    Invalid(String),

    #[error("Feature length {got} does not match model input length {expected}")]
    FeatureLength { expected: usize, got: usize },

    #[error("Class index {0} has no label")]
    UnknownClass(usize),
}

/// A loaded classification model.
///
/// Implementations are shared read-only across threads for the life of the process.
pub trait Model: Send + Sync {
    /// Length of the feature vectors the model accepts.
    fn feature_len(&self) -> usize;

    /// Apply the training-time feature scaling.
    fn transform(&self, feature: &[f32]) -> Result<Vec<f64>>;

    /// Class index for an already scaled feature vector.
    fn predict(&self, scaled: &[f64]) -> Result<usize>;

    /// Human-readable label of a class index.
    fn decode(&self, class_index: usize) -> Result<&str>;
}

/// Scale, predict, decode.
pub fn classify(feature: &[f32], model: &dyn Model) -> Result<String> {
    let scaled = model.transform(feature)?;
    let class_index = model.predict(&scaled)?;
    Ok(model.decode(class_index)?.to_string())
}
