//! End-to-end frames through `Perception` with synthetic tabletop scenes.

use nalgebra::{Point3, Vector3};
use sorter::classifier::{Classifier, Model, ModelArtifact, ModelError, StandardScaler};
use sorter::core::{PointCloud, Rgb};
use sorter::features::FeatureConfig;
use sorter::planner::{
    Arm, ClassificationGap, DetectedObject, DropboxSpec, PickPlaceCommand, PickPlaceDocument,
    SceneConfig, TargetObjectSpec,
};
use sorter::point_cloud::{NormalError, NormalEstimator, PcaNormalEstimator, PreprocessConfig};
use sorter::{
    DirectoryPublisher, FramePublisher, ObjectLabel, Perception, PipelineConfig, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const GRAY: Rgb = [128, 128, 128];
const RED: Rgb = [255, 0, 0];
const GREEN: Rgb = [0, 255, 0];

/// 40 x 25 table at z = 0, 2 cm spacing, plus a red and a green 5 x 5 x 2 block.
fn tabletop() -> PointCloud {
    let mut points = Vec::new();
    let mut colors = Vec::new();
    for i in 0..40 {
        for j in 0..25 {
            points.push(Point3::new(i as f32 * 0.02, j as f32 * 0.02, 0.0));
            colors.push(GRAY);
        }
    }
    for (x, y, color) in [(0.1, 0.1, RED), (0.5, 0.3, GREEN)] {
        for i in 0..5 {
            for j in 0..5 {
                for k in 0..2 {
                    points.push(Point3::new(
                        x + i as f32 * 0.01,
                        y + j as f32 * 0.01,
                        0.05 + k as f32 * 0.01,
                    ));
                    colors.push(color);
                }
            }
        }
    }
    PointCloud::new(points).with_colors(colors).unwrap()
}

/// The synthetic scene sits at z = 0 and is already clean.
fn config() -> PipelineConfig {
    PipelineConfig {
        preprocess: PreprocessConfig {
            statistical: None,
            leaf_size: 0.0,
            pass_through: Vec::new(),
        },
        ..PipelineConfig::default()
    }
}

/// Scores each class by the mass of one hue bin: bin 0 is red, bin 10 is green.
fn hue_model(features: &FeatureConfig) -> ModelArtifact {
    let len = features.feature_len();
    let mut soap = vec![0.0; len];
    soap[0] = 1.0;
    let mut biscuits = vec![0.0; len];
    biscuits[10] = 1.0;
    ModelArtifact::new(
        StandardScaler::identity(len),
        Classifier::Linear {
            coef: vec![soap, biscuits, vec![0.0; len]],
            intercept: vec![0.0, 0.0, 0.5],
        },
        vec![
            "soap".to_string(),
            "biscuits".to_string(),
            "glue".to_string(),
        ],
    )
    .unwrap()
}

fn scene() -> SceneConfig {
    SceneConfig {
        test_scene_num: 2,
        object_list: vec![
            TargetObjectSpec::new("biscuits", "green"),
            TargetObjectSpec::new("soap", "red"),
            TargetObjectSpec::new("glue", "red"),
        ],
        dropbox: vec![
            DropboxSpec::new("red", Arm::Left, Point3::new(0.0, 0.71, 0.605)),
            DropboxSpec::new("green", Arm::Right, Point3::new(0.0, -0.71, 0.605)),
        ],
    }
}

struct CountingModel {
    inner: ModelArtifact,
    calls: AtomicUsize,
}

impl Model for CountingModel {
    fn feature_len(&self) -> usize {
        self.inner.feature_len()
    }

    fn transform(&self, feature: &[f32]) -> Result<Vec<f64>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.transform(feature)
    }

    fn predict(&self, scaled: &[f64]) -> Result<usize, ModelError> {
        self.inner.predict(scaled)
    }

    fn decode(&self, class_index: usize) -> Result<&str, ModelError> {
        self.inner.decode(class_index)
    }
}

#[derive(Default)]
struct CountingNormals {
    calls: AtomicUsize,
}

impl NormalEstimator for CountingNormals {
    fn estimate(&self, cloud: &PointCloud) -> Result<Vec<Vector3<f32>>, NormalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PcaNormalEstimator::default().estimate(cloud)
    }
}

struct UnavailableNormals;

impl NormalEstimator for UnavailableNormals {
    fn estimate(&self, _: &PointCloud) -> Result<Vec<Vector3<f32>>, NormalError> {
        Err(NormalError::Unavailable("service down".to_string()))
    }
}

/// Returns a single normal however large the cluster is.
struct TruncatedNormals;

impl NormalEstimator for TruncatedNormals {
    fn estimate(&self, _: &PointCloud) -> Result<Vec<Vector3<f32>>, NormalError> {
        Ok(vec![Vector3::z()])
    }
}

#[derive(Default)]
struct RecordingPublisher {
    surface: Option<usize>,
    objects: Option<usize>,
    clusters: Option<PointCloud>,
    labels: Vec<ObjectLabel>,
    detections: Vec<String>,
    commands: Option<(i32, Vec<PickPlaceCommand>)>,
}

impl FramePublisher for RecordingPublisher {
    fn publish_surface(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.surface = Some(cloud.len());
        Ok(())
    }

    fn publish_objects(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.objects = Some(cloud.len());
        Ok(())
    }

    fn publish_clusters(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.clusters = Some(cloud.clone());
        Ok(())
    }

    fn publish_labels(&mut self, labels: &[ObjectLabel]) -> Result<(), TransportError> {
        self.labels = labels.to_vec();
        Ok(())
    }

    fn publish_detections(&mut self, detections: &[DetectedObject]) -> Result<(), TransportError> {
        self.detections = detections.iter().map(|d| d.label.clone()).collect();
        Ok(())
    }

    fn publish_commands(
        &mut self,
        scene_id: i32,
        commands: &[PickPlaceCommand],
    ) -> Result<(), TransportError> {
        self.commands = Some((scene_id, commands.to_vec()));
        Ok(())
    }
}

struct BrokenPublisher;

impl FramePublisher for BrokenPublisher {
    fn publish_surface(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Err(TransportError::Closed("surface".to_string()))
    }

    fn publish_objects(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Err(TransportError::Closed("objects".to_string()))
    }

    fn publish_clusters(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Err(TransportError::Closed("clusters".to_string()))
    }

    fn publish_labels(&mut self, _: &[ObjectLabel]) -> Result<(), TransportError> {
        Err(TransportError::Closed("labels".to_string()))
    }

    fn publish_detections(&mut self, _: &[DetectedObject]) -> Result<(), TransportError> {
        Err(TransportError::Closed("detections".to_string()))
    }

    fn publish_commands(&mut self, _: i32, _: &[PickPlaceCommand]) -> Result<(), TransportError> {
        Err(TransportError::Closed("commands".to_string()))
    }
}

#[test]
fn test_tabletop_frame_end_to_end() {
    let config = config();
    let model = hue_model(&config.features);
    let mut perception = Perception::new(
        config,
        scene(),
        Arc::new(model),
        Arc::new(PcaNormalEstimator::default()),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.on_frame(&tabletop());

    assert_eq!(result.surface.len(), 1000);
    assert_eq!(result.objects.len(), 100);
    assert_eq!(result.clusters.len(), 2);
    for cluster in &result.clusters {
        assert_eq!(cluster.len(), 50);
    }

    let labels: Vec<&str> = result.detections.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["soap", "biscuits"]);

    let soap = &result.detections[0];
    assert!((soap.centroid - Point3::new(0.12, 0.12, 0.055)).norm() < 1e-5);

    // Pick-list order, not detection order; glue was never seen.
    let names: Vec<&str> = result
        .plan
        .commands
        .iter()
        .map(|c| c.object_name.as_str())
        .collect();
    assert_eq!(names, vec!["biscuits", "soap"]);
    assert_eq!(result.plan.commands[0].arm, Arm::Right);
    assert_eq!(result.plan.commands[1].arm, Arm::Left);
    assert!(result.plan.gaps.contains(&ClassificationGap::MissingDetection {
        object_name: "glue".to_string()
    }));

    let published = perception.publisher();
    assert_eq!(published.surface, Some(1000));
    assert_eq!(published.objects, Some(100));
    assert_eq!(published.detections, vec!["soap", "biscuits"]);
    assert_eq!(published.labels.len(), 2);
    assert_eq!(published.labels[0].text, "soap");
    assert!((published.labels[0].anchor.z - (0.05 + 0.4)).abs() < 1e-5);

    let clusters = published.clusters.as_ref().unwrap();
    assert_eq!(clusters.len(), 100);
    let colors = clusters.colors.as_ref().unwrap();
    assert!(colors[..50].iter().all(|c| *c == colors[0]));
    assert!(colors[50..].iter().all(|c| *c == colors[50]));

    let (scene_id, commands) = published.commands.as_ref().unwrap();
    assert_eq!(*scene_id, 2);
    assert_eq!(commands, &result.plan.commands);
}

#[test]
fn test_empty_frame_never_reaches_features_or_model() {
    let config = PipelineConfig::default();
    let model = Arc::new(CountingModel {
        inner: hue_model(&config.features),
        calls: AtomicUsize::new(0),
    });
    let normals = Arc::new(CountingNormals::default());
    let mut perception = Perception::new(
        config,
        scene(),
        model.clone(),
        normals.clone(),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.on_frame(&PointCloud::default());

    assert!(result.clusters.is_empty());
    assert!(result.detections.is_empty());
    assert!(result.plan.commands.is_empty());
    assert_eq!(normals.calls.load(Ordering::SeqCst), 0);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);

    let (_, commands) = perception.publisher().commands.as_ref().unwrap();
    assert!(commands.is_empty());
}

#[test]
fn test_cropped_away_frame_is_empty() {
    // Default crop keeps z in [0.6, 1.1]; the synthetic table is at z = 0.
    let config = PipelineConfig::default();
    let model = hue_model(&config.features);
    let perception = Perception::new(
        config,
        scene(),
        Arc::new(model),
        Arc::new(PcaNormalEstimator::default()),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.process(&tabletop());
    assert!(result.filtered.is_empty());
    assert!(result.plan.commands.is_empty());
}

#[test]
fn test_every_cluster_classified_once() {
    let config = config();
    let model = Arc::new(CountingModel {
        inner: hue_model(&config.features),
        calls: AtomicUsize::new(0),
    });
    let normals = Arc::new(CountingNormals::default());
    let perception = Perception::new(
        config,
        scene(),
        model.clone(),
        normals.clone(),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.process(&tabletop());
    assert_eq!(result.detections.len(), 2);
    assert_eq!(normals.calls.load(Ordering::SeqCst), 2);
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_normal_service_failure_drops_clusters() {
    let config = config();
    let model = hue_model(&config.features);
    let perception = Perception::new(
        config,
        scene(),
        Arc::new(model),
        Arc::new(UnavailableNormals),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.process(&tabletop());
    assert_eq!(result.clusters.len(), 2);
    assert!(result.detections.is_empty());
    assert!(result.plan.commands.is_empty());
    assert_eq!(result.plan.gaps.len(), 3);
}

#[test]
fn test_misaligned_normals_drop_clusters() {
    let config = config();
    let model = Arc::new(CountingModel {
        inner: hue_model(&config.features),
        calls: AtomicUsize::new(0),
    });
    let perception = Perception::new(
        config,
        scene(),
        model.clone(),
        Arc::new(TruncatedNormals),
        RecordingPublisher::default(),
    )
    .unwrap();

    let result = perception.process(&tabletop());
    assert_eq!(result.clusters.len(), 2);
    assert!(result.detections.is_empty());
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_publish_failures_do_not_abort_frame() {
    let config = config();
    let model = hue_model(&config.features);
    let mut perception = Perception::new(
        config,
        scene(),
        Arc::new(model),
        Arc::new(PcaNormalEstimator::default()),
        BrokenPublisher,
    )
    .unwrap();

    let result = perception.on_frame(&tabletop());
    assert_eq!(result.plan.commands.len(), 2);
}

#[test]
fn test_directory_publisher_output_document() {
    let dir = tempfile::tempdir().unwrap();
    let config = config();
    let model = hue_model(&config.features);
    let mut perception = Perception::new(
        config,
        scene(),
        Arc::new(model),
        Arc::new(PcaNormalEstimator::default()),
        DirectoryPublisher::new(dir.path()).unwrap(),
    )
    .unwrap();

    let result = perception.on_frame(&tabletop());

    let doc = PickPlaceDocument::read_yaml(dir.path().join("output_2.yaml")).unwrap();
    assert_eq!(doc.object_list, result.plan.commands);
    for name in ["surface.ply", "objects.ply", "clusters.ply", "labels.json", "detections.json"] {
        assert!(dir.path().join(name).exists(), "{} missing", name);
    }
}
