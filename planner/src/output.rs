//! YAML command document.
//!
//! ```yaml
//! object_list:
//! - arm_name: right
//!   object_name: soap
//!   pick_pose:
//!     orientation: {w: 1.0, x: 0.0, y: 0.0, z: 0.0}
//!     position: {x: 0.5, y: 0.2, z: 0.7}
//!   place_pose: ...
//!   test_scene_num: 1
//! ```

use crate::{Arm, PlannerError, Result};
use nalgebra::{Point3, Quaternion, UnitQuaternion};
use serde::{Deserialize, Serialize};
use sorter_core::Pose;
use std::path::Path;

/// One instruction for the manipulator: move `object_name` from `pick_pose` to `place_pose`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CommandRecord", into = "CommandRecord")]
pub struct PickPlaceCommand {
    pub scene_id: i32,
    pub arm: Arm,
    pub object_name: String,
    pub pick_pose: Pose,
    pub place_pose: Pose,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickPlaceDocument {
    pub object_list: Vec<PickPlaceCommand>,
}

/// Conventional artifact name for a scene's commands.
pub fn output_file_name(scene_id: i32) -> String {
    format!("output_{}.yaml", scene_id)
}

impl PickPlaceDocument {
    pub fn new(object_list: Vec<PickPlaceCommand>) -> Self {
        Self { object_list }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn write_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_yaml_string()?)?;
        tracing::debug!(path = %path.display(), commands = self.object_list.len(), "Wrote commands");
        Ok(())
    }

    pub fn read_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommandRecord {
    test_scene_num: i32,
    arm_name: Arm,
    object_name: String,
    pick_pose: PoseRecord,
    place_pose: PoseRecord,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PoseRecord {
    position: PositionRecord,
    orientation: OrientationRecord,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PositionRecord {
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct OrientationRecord {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl From<Pose> for PoseRecord {
    fn from(pose: Pose) -> Self {
        let q = pose.orientation.quaternion();
        Self {
            position: PositionRecord {
                x: pose.position.x,
                y: pose.position.y,
                z: pose.position.z,
            },
            orientation: OrientationRecord {
                x: q.i,
                y: q.j,
                z: q.k,
                w: q.w,
            },
        }
    }
}

impl TryFrom<PoseRecord> for Pose {
    type Error = PlannerError;

    fn try_from(record: PoseRecord) -> Result<Self> {
        let PositionRecord { x, y, z } = record.position;
        let o = record.orientation;
        let q = Quaternion::new(o.w, o.x, o.y, o.z);
        let norm = q.norm();
        if !norm.is_finite() || norm == 0.0 {
            return Err(PlannerError::InvalidScene(
                "pose orientation is not a rotation".to_string(),
            ));
        }
        // Already-unit quaternions are kept bit-for-bit.
        let orientation = if (norm - 1.0).abs() < 1e-9 {
            UnitQuaternion::new_unchecked(q)
        } else {
            UnitQuaternion::from_quaternion(q)
        };
        Ok(Pose::new(Point3::new(x, y, z), orientation))
    }
}

impl From<PickPlaceCommand> for CommandRecord {
    fn from(cmd: PickPlaceCommand) -> Self {
        Self {
            test_scene_num: cmd.scene_id,
            arm_name: cmd.arm,
            object_name: cmd.object_name,
            pick_pose: cmd.pick_pose.into(),
            place_pose: cmd.place_pose.into(),
        }
    }
}

impl TryFrom<CommandRecord> for PickPlaceCommand {
    type Error = PlannerError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        Ok(Self {
            scene_id: record.test_scene_num,
            arm: record.arm_name,
            object_name: record.object_name,
            pick_pose: record.pick_pose.try_into()?,
            place_pose: record.place_pose.try_into()?,
        })
    }
}
