//! Outbound side of the perception node.
//!
//! Publishing is fire-and-forget: the pipeline logs a failed publish and moves on.

use nalgebra::Point3;
use serde::Serialize;
use sorter_core::PointCloud;
use sorter_planner::{output_file_name, DetectedObject, PickPlaceCommand, PickPlaceDocument};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode cloud: {0}")]
    Cloud(#[from] sorter_core::Error),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to encode commands: {0}")]
    Commands(#[from] sorter_planner::PlannerError),

    #[error("Channel closed: {0}")]
    Closed(String),
}

/// Text marker floating above a recognized object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectLabel {
    pub text: String,
    pub anchor: Point3<f32>,
}

/// Sink for everything a frame produces.
pub trait FramePublisher {
    /// Points on the support plane.
    fn publish_surface(&mut self, cloud: &PointCloud) -> Result<(), TransportError>;

    /// Points above the support plane.
    fn publish_objects(&mut self, cloud: &PointCloud) -> Result<(), TransportError>;

    /// Clustered points, one flat color per cluster.
    fn publish_clusters(&mut self, cloud: &PointCloud) -> Result<(), TransportError>;

    fn publish_labels(&mut self, labels: &[ObjectLabel]) -> Result<(), TransportError>;

    fn publish_detections(&mut self, detections: &[DetectedObject]) -> Result<(), TransportError>;

    fn publish_commands(
        &mut self,
        scene_id: i32,
        commands: &[PickPlaceCommand],
    ) -> Result<(), TransportError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl FramePublisher for NullPublisher {
    fn publish_surface(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish_objects(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish_clusters(&mut self, _: &PointCloud) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish_labels(&mut self, _: &[ObjectLabel]) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish_detections(&mut self, _: &[DetectedObject]) -> Result<(), TransportError> {
        Ok(())
    }

    fn publish_commands(&mut self, _: i32, _: &[PickPlaceCommand]) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct DetectionSummary<'a> {
    label: &'a str,
    centroid: [f64; 3],
    points: usize,
    cluster: &'a [usize],
}

/// Writes every publication into a directory, overwriting the previous frame:
///
/// | file               | content                          |
/// |--------------------|----------------------------------|
/// | `surface.ply`      | table points                     |
/// | `objects.ply`      | points above the table           |
/// | `clusters.ply`     | colorized clusters               |
/// | `labels.json`      | label text and anchor            |
/// | `detections.json`  | label, centroid, cluster indices |
/// | `output_<n>.yaml`  | pick/place command document      |
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    dir: PathBuf,
}

impl DirectoryPublisher {
    /// Creates `dir` if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, TransportError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_cloud(&self, name: &str, cloud: &PointCloud) -> Result<(), TransportError> {
        sorter_io::write_cloud(self.dir.join(name), cloud)?;
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), TransportError> {
        std::fs::write(self.dir.join(name), serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}

impl FramePublisher for DirectoryPublisher {
    fn publish_surface(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.write_cloud("surface.ply", cloud)
    }

    fn publish_objects(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.write_cloud("objects.ply", cloud)
    }

    fn publish_clusters(&mut self, cloud: &PointCloud) -> Result<(), TransportError> {
        self.write_cloud("clusters.ply", cloud)
    }

    fn publish_labels(&mut self, labels: &[ObjectLabel]) -> Result<(), TransportError> {
        self.write_json("labels.json", labels)
    }

    fn publish_detections(&mut self, detections: &[DetectedObject]) -> Result<(), TransportError> {
        let summary: Vec<DetectionSummary> = detections
            .iter()
            .map(|d| DetectionSummary {
                label: &d.label,
                centroid: [d.centroid.x, d.centroid.y, d.centroid.z],
                points: d.cloud.len(),
                cluster: &d.cluster,
            })
            .collect();
        self.write_json("detections.json", &summary)
    }

    fn publish_commands(
        &mut self,
        scene_id: i32,
        commands: &[PickPlaceCommand],
    ) -> Result<(), TransportError> {
        let path = self.dir.join(output_file_name(scene_id));
        PickPlaceDocument::new(commands.to_vec()).write_yaml(&path)?;
        tracing::info!(path = %path.display(), commands = commands.len(), "Wrote pick/place commands");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorter_planner::Arm;
    use sorter_core::Pose;

    #[test]
    fn test_directory_publisher_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut publisher = DirectoryPublisher::new(dir.path().join("frame")).unwrap();

        let cloud = PointCloud::new(vec![Point3::new(0.0, 0.0, 0.7)]);
        publisher.publish_surface(&cloud).unwrap();
        publisher
            .publish_labels(&[ObjectLabel {
                text: "soap".to_string(),
                anchor: Point3::new(0.0, 0.0, 1.1),
            }])
            .unwrap();
        publisher
            .publish_commands(
                2,
                &[PickPlaceCommand {
                    scene_id: 2,
                    arm: Arm::Left,
                    object_name: "soap".to_string(),
                    pick_pose: Pose::default(),
                    place_pose: Pose::default(),
                }],
            )
            .unwrap();

        let surface = sorter_io::read_cloud(publisher.dir().join("surface.ply")).unwrap();
        assert_eq!(surface, cloud);

        let labels: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(publisher.dir().join("labels.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(labels[0]["text"], "soap");

        let doc = PickPlaceDocument::read_yaml(publisher.dir().join("output_2.yaml")).unwrap();
        assert_eq!(doc.object_list.len(), 1);
    }

    #[test]
    fn test_null_publisher_accepts_everything() {
        let mut publisher = NullPublisher;
        assert!(publisher.publish_clusters(&PointCloud::default()).is_ok());
        assert!(publisher.publish_commands(1, &[]).is_ok());
    }
}
