//! On-disk model bundle.
//!
//! ```json
//! {
//!   "scaler": { "mean": [..], "scale": [..] },
//!   "classifier": { "type": "svc", "kernel": { "type": "linear" }, .. },
//!   "classes": ["biscuits", "soap", "soap2"]
//! }
//! ```

use crate::{Classifier, Model, ModelError, Result, StandardScaler};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub scaler: StandardScaler,
    pub classifier: Classifier,
    pub classes: Vec<String>,
}

impl ModelArtifact {
    /// Validate and assemble a model from its parts.
    pub fn new(
        scaler: StandardScaler,
        classifier: Classifier,
        classes: Vec<String>,
    ) -> Result<Self> {
        let mut artifact = Self {
            scaler,
            classifier,
            classes,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut artifact: Self = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let artifact = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            classes = artifact.classes.len(),
            features = artifact.feature_len(),
            "Loaded model"
        );
        Ok(artifact)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Fail unless the model consumes the `produced`-long vectors of the feature extractor.
    pub fn ensure_feature_len(&self, produced: usize) -> Result<()> {
        if self.feature_len() != produced {
            return Err(ModelError::FeatureLength {
                expected: self.feature_len(),
                got: produced,
            });
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("no class labels".to_string()));
        }
        if self.scaler.mean.len() != self.scaler.scale.len() {
            return Err(ModelError::Invalid(format!(
                "scaler mean has {} entries, scale has {}",
                self.scaler.mean.len(),
                self.scaler.scale.len()
            )));
        }
        if self.scaler.is_empty() {
            return Err(ModelError::Invalid("scaler is empty".to_string()));
        }
        if let Some(len) = self.classifier.input_len() {
            if len != self.scaler.len() {
                return Err(ModelError::Invalid(format!(
                    "classifier expects {} features, scaler provides {}",
                    len,
                    self.scaler.len()
                )));
            }
        }
        self.classifier
            .validate(self.scaler.len(), self.classes.len())?;
        self.scaler.sanitize();
        Ok(())
    }
}

impl Model for ModelArtifact {
    fn feature_len(&self) -> usize {
        self.scaler.len()
    }

    fn transform(&self, feature: &[f32]) -> Result<Vec<f64>> {
        if feature.len() != self.feature_len() {
            return Err(ModelError::FeatureLength {
                expected: self.feature_len(),
                got: feature.len(),
            });
        }
        Ok(self.scaler.transform(feature))
    }

    fn predict(&self, scaled: &[f64]) -> Result<usize> {
        if scaled.len() != self.feature_len() {
            return Err(ModelError::FeatureLength {
                expected: self.feature_len(),
                got: scaled.len(),
            });
        }
        Ok(self.classifier.predict(scaled))
    }

    fn decode(&self, class_index: usize) -> Result<&str> {
        self.classes
            .get(class_index)
            .map(String::as_str)
            .ok_or(ModelError::UnknownClass(class_index))
    }
}
