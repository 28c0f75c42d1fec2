//! Per-frame perception: raw cloud in, labeled objects and pick/place commands out.

use crate::config::{ConfigError, PipelineConfig};
use crate::palette::ColorPalette;
use crate::publish::{FramePublisher, ObjectLabel, TransportError};
use nalgebra::Vector3;
use rayon::prelude::*;
use sorter_classifier::{classify, Model, ModelError};
use sorter_core::PointCloud;
use sorter_features::extract_features;
use sorter_planner::{plan, DetectedObject, PlanOutcome, SceneConfig};
use sorter_point_cloud::{
    euclidean_clusters, extract_cluster_cloud, preprocess, segment_plane, ClusterIndices,
    NormalError, NormalEstimator,
};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything one frame produced.
#[derive(Debug, Clone, Default)]
pub struct FrameResult {
    /// Preprocessed input.
    pub filtered: PointCloud,
    pub surface: PointCloud,
    pub objects: PointCloud,
    /// Indices into `objects`.
    pub clusters: Vec<ClusterIndices>,
    /// In cluster order; clusters that could not be described or classified are absent.
    pub detections: Vec<DetectedObject>,
    /// Aligned with `detections`.
    pub labels: Vec<ObjectLabel>,
    pub plan: PlanOutcome,
}

/// Perception node state: configuration, the loaded model and the outbound sink.
///
/// Frames are handled one at a time through [`Perception::on_frame`]; the work inside
/// a frame fans out over clusters on the rayon pool.
pub struct Perception<P> {
    config: PipelineConfig,
    scene: SceneConfig,
    model: Arc<dyn Model>,
    normals: Arc<dyn NormalEstimator>,
    publisher: P,
    palette: ColorPalette,
}

impl<P: FramePublisher> Perception<P> {
    /// Fails when the model does not accept the vectors this configuration produces.
    pub fn new(
        config: PipelineConfig,
        scene: SceneConfig,
        model: Arc<dyn Model>,
        normals: Arc<dyn NormalEstimator>,
        publisher: P,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let produced = config.features.feature_len();
        if model.feature_len() != produced {
            return Err(ModelError::FeatureLength {
                expected: model.feature_len(),
                got: produced,
            }
            .into());
        }

        let palette = ColorPalette::new(config.palette_seed);
        Ok(Self {
            config,
            scene,
            model,
            normals,
            publisher,
            palette,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Handle one sensor frame and publish everything it produced.
    pub fn on_frame(&mut self, cloud: &PointCloud) -> FrameResult {
        let result = self.process(cloud);
        let colorized = self.palette.colorize(&result.objects, &result.clusters);

        deliver("surface", self.publisher.publish_surface(&result.surface));
        deliver("objects", self.publisher.publish_objects(&result.objects));
        deliver("clusters", self.publisher.publish_clusters(&colorized));
        deliver("labels", self.publisher.publish_labels(&result.labels));
        deliver(
            "detections",
            self.publisher.publish_detections(&result.detections),
        );
        deliver(
            "commands",
            self.publisher
                .publish_commands(self.scene.test_scene_num, &result.plan.commands),
        );

        result
    }

    /// Run every stage on `cloud` without publishing anything.
    pub fn process(&self, cloud: &PointCloud) -> FrameResult {
        let filtered = preprocess(cloud, &self.config.preprocess);
        let segmentation = segment_plane(&filtered, &self.config.plane);
        let objects = segmentation.objects;
        let clusters = euclidean_clusters(&objects, &self.config.cluster);

        let stage = Recognizer {
            config: &self.config,
            model: self.model.as_ref(),
            normals: self.normals.as_ref(),
        };
        let recognized: Vec<(DetectedObject, ObjectLabel)> = clusters
            .par_iter()
            .enumerate()
            .filter_map(|(i, indices)| stage.recognize(i, &objects, indices))
            .collect();
        let (detections, labels): (Vec<_>, Vec<_>) = recognized.into_iter().unzip();

        let names: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        tracing::info!("Detected {} objects: {:?}", detections.len(), names);

        let outcome = plan(
            &detections,
            &self.scene.object_list,
            &self.scene.dropbox,
            self.scene.test_scene_num,
            &self.config.planner,
        );

        FrameResult {
            filtered,
            surface: segmentation.surface,
            objects,
            clusters,
            detections,
            labels,
            plan: outcome,
        }
    }
}

/// Read-only view of what per-cluster work needs, shared across rayon workers.
struct Recognizer<'a> {
    config: &'a PipelineConfig,
    model: &'a dyn Model,
    normals: &'a dyn NormalEstimator,
}

impl Recognizer<'_> {
    /// Describe and classify one cluster. `None` drops it from this frame.
    fn recognize(
        &self,
        index: usize,
        objects: &PointCloud,
        indices: &ClusterIndices,
    ) -> Option<(DetectedObject, ObjectLabel)> {
        let cloud = extract_cluster_cloud(objects, indices);

        let normals: Vec<Vector3<f32>> = match self.normals.estimate(&cloud).and_then(|n| {
            if n.len() == cloud.len() {
                Ok(n)
            } else {
                Err(NormalError::CountMismatch {
                    expected: cloud.len(),
                    got: n.len(),
                })
            }
        }) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(cluster = index, error = %e, "normal estimation failed");
                return None;
            }
        };

        let label = extract_features(&cloud, &normals, &self.config.features)
            .map_err(|e| e.to_string())
            .and_then(|feature| {
                classify(&feature, self.model).map_err(|e| e.to_string())
            });
        let label = match label {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(cluster = index, error = %e, "cluster not classified");
                return None;
            }
        };

        let centroid = cloud.centroid()?;
        let mut anchor = cloud.points[0];
        anchor.z += self.config.label_height;

        Some((
            DetectedObject {
                label: label.clone(),
                centroid: centroid.cast::<f64>(),
                cluster: indices.clone(),
                cloud,
            },
            ObjectLabel {
                text: label,
                anchor,
            },
        ))
    }
}

fn deliver(channel: &str, result: Result<(), TransportError>) {
    if let Err(e) = result {
        tracing::warn!(channel, error = %e, "publish failed");
    }
}
