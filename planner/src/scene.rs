//! Scene request, in the parameter layout used by the pick/place world files:
//!
//! ```yaml
//! test_scene_num: 3
//! object_list:
//!   - name: sticky_notes
//!     group: red
//! dropbox:
//!   - name: left
//!     group: red
//!     position: [0, 0.71, 0.605]
//! ```
//!
//! A dropbox's arm comes from an explicit `arm` key, or from `name` when that is
//! `left` or `right`.

use crate::{PlannerError, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    Left,
    Right,
}

impl Arm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::Left => "left",
            Arm::Right => "right",
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Arm::Left),
            "right" => Ok(Arm::Right),
            other => Err(format!("unknown arm '{}'", other)),
        }
    }
}

/// Object the scene asks to be moved. List order is pick order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetObjectSpec {
    pub name: String,
    pub group: String,
}

impl TargetObjectSpec {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DropboxRecord", into = "DropboxRecord")]
pub struct DropboxSpec {
    pub name: Option<String>,
    pub group: String,
    pub arm: Arm,
    pub position: Point3<f64>,
}

impl DropboxSpec {
    pub fn new(group: impl Into<String>, arm: Arm, position: Point3<f64>) -> Self {
        Self {
            name: None,
            group: group.into(),
            arm,
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DropboxRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    group: String,
    #[serde(default)]
    arm: Option<Arm>,
    position: [f64; 3],
}

impl TryFrom<DropboxRecord> for DropboxSpec {
    type Error = String;

    fn try_from(record: DropboxRecord) -> std::result::Result<Self, Self::Error> {
        let arm = match (record.arm, record.name.as_deref()) {
            (Some(arm), _) => arm,
            (None, Some(name)) => name.parse()?,
            (None, None) => {
                return Err(format!("dropbox for group '{}' names no arm", record.group))
            }
        };
        let [x, y, z] = record.position;
        Ok(Self {
            name: record.name,
            group: record.group,
            arm,
            position: Point3::new(x, y, z),
        })
    }
}

impl From<DropboxSpec> for DropboxRecord {
    fn from(spec: DropboxSpec) -> Self {
        Self {
            name: spec.name,
            group: spec.group,
            arm: Some(spec.arm),
            position: [spec.position.x, spec.position.y, spec.position.z],
        }
    }
}

/// Everything the planner needs to know about one scene, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub test_scene_num: i32,
    #[serde(default)]
    pub object_list: Vec<TargetObjectSpec>,
    #[serde(default)]
    pub dropbox: Vec<DropboxSpec>,
}

impl SceneConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scene: Self = serde_yaml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let scene = Self::from_yaml(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            scene = scene.test_scene_num,
            targets = scene.object_list.len(),
            dropboxes = scene.dropbox.len(),
            "Loaded scene"
        );
        Ok(scene)
    }

    fn validate(&self) -> Result<()> {
        if let Some(d) = self
            .dropbox
            .iter()
            .find(|d| !d.position.coords.iter().all(|v| v.is_finite()))
        {
            return Err(PlannerError::InvalidScene(format!(
                "dropbox for group '{}' has a non-finite position",
                d.group
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PICK_LIST: &str = "
test_scene_num: 2
object_list:
  - name: biscuits
    group: green
  - name: soap
    group: green
  - name: glue
    group: red
dropbox:
  - name: left
    group: red
    position: [0, 0.71, 0.605]
  - name: right
    group: green
    position: [0, -0.71, 0.605]
";

    #[test]
    fn test_parse_pick_list_layout() {
        let scene = SceneConfig::from_yaml(PICK_LIST).unwrap();
        assert_eq!(scene.test_scene_num, 2);
        assert_eq!(scene.object_list.len(), 3);
        assert_eq!(scene.object_list[2], TargetObjectSpec::new("glue", "red"));

        let red = &scene.dropbox[0];
        assert_eq!(red.arm, Arm::Left);
        assert_eq!(red.name.as_deref(), Some("left"));
        assert_eq!(red.position, Point3::new(0.0, 0.71, 0.605));
        assert_eq!(scene.dropbox[1].arm, Arm::Right);
    }

    #[test]
    fn test_explicit_arm_wins() {
        let text = "
test_scene_num: 1
dropbox:
  - name: blue_bin
    arm: right
    group: blue
    position: [1, 2, 3]
";
        let scene = SceneConfig::from_yaml(text).unwrap();
        assert_eq!(scene.dropbox[0].arm, Arm::Right);
        assert!(scene.object_list.is_empty());
    }

    #[test]
    fn test_dropbox_without_arm_is_rejected() {
        let text = "
test_scene_num: 1
dropbox:
  - name: middle
    group: blue
    position: [1, 2, 3]
";
        assert!(matches!(
            SceneConfig::from_yaml(text),
            Err(PlannerError::Yaml(_))
        ));
    }

    #[test]
    fn test_arm_from_str() {
        assert_eq!("Right".parse::<Arm>().unwrap(), Arm::Right);
        assert_eq!(Arm::Left.to_string(), "left");
        assert!("both".parse::<Arm>().is_err());
    }
}
