//! Matching recognized objects to the scene request.

use crate::{DropboxSpec, PickPlaceCommand, TargetObjectSpec};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use sorter_core::{PointCloud, Pose};
use std::fmt;

/// A labeled cluster from the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    pub label: String,
    pub centroid: Point3<f64>,
    /// Indices of the cluster within the frame's objects cloud.
    pub cluster: Vec<usize>,
    pub cloud: PointCloud,
}

/// Which candidate wins when several share a label (detections) or a group (dropboxes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Earliest in list order.
    #[default]
    First,
    /// Latest in list order.
    Last,
}

impl MatchPolicy {
    fn pick<'a, T, F>(&self, items: &'a [T], pred: F) -> Option<&'a T>
    where
        F: Fn(&T) -> bool,
    {
        match self {
            MatchPolicy::First => items.iter().find(|item| pred(*item)),
            MatchPolicy::Last => items.iter().rev().find(|item| pred(*item)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub match_policy: MatchPolicy,
}

/// Why a requested object produced no command, or a detection went unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationGap {
    MissingDetection { object_name: String },
    MissingDropbox { object_name: String, group: String },
    UnrequestedDetection { label: String },
}

impl fmt::Display for ClassificationGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationGap::MissingDetection { object_name } => {
                write!(f, "'{}' was requested but not detected", object_name)
            }
            ClassificationGap::MissingDropbox { object_name, group } => write!(
                f,
                "'{}' belongs to group '{}', which has no dropbox",
                object_name, group
            ),
            ClassificationGap::UnrequestedDetection { label } => {
                write!(f, "detected '{}' is not on the pick list", label)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOutcome {
    /// In pick-list order.
    pub commands: Vec<PickPlaceCommand>,
    pub gaps: Vec<ClassificationGap>,
}

/// Build one command per requested object that was both detected and has a bin.
///
/// Targets are visited in list order, which fixes the command order. Unresolvable
/// targets are skipped and reported as gaps.
pub fn plan(
    detected: &[DetectedObject],
    targets: &[TargetObjectSpec],
    dropboxes: &[DropboxSpec],
    scene_id: i32,
    config: &PlannerConfig,
) -> PlanOutcome {
    let policy = config.match_policy;
    let mut outcome = PlanOutcome::default();

    for target in targets {
        let Some(object) = policy.pick(detected, |d| d.label == target.name) else {
            outcome.gaps.push(ClassificationGap::MissingDetection {
                object_name: target.name.clone(),
            });
            continue;
        };
        let Some(dropbox) = policy.pick(dropboxes, |d| d.group == target.group) else {
            outcome.gaps.push(ClassificationGap::MissingDropbox {
                object_name: target.name.clone(),
                group: target.group.clone(),
            });
            continue;
        };

        outcome.commands.push(PickPlaceCommand {
            scene_id,
            arm: dropbox.arm,
            object_name: target.name.clone(),
            pick_pose: Pose::from_position(object.centroid),
            place_pose: Pose::from_position(dropbox.position),
        });
    }

    for object in detected {
        if !targets.iter().any(|t| t.name == object.label) {
            outcome.gaps.push(ClassificationGap::UnrequestedDetection {
                label: object.label.clone(),
            });
        }
    }

    for gap in &outcome.gaps {
        match gap {
            ClassificationGap::UnrequestedDetection { .. } => tracing::debug!("{}", gap),
            _ => tracing::warn!("{}", gap),
        }
    }
    tracing::debug!(
        scene = scene_id,
        commands = outcome.commands.len(),
        targets = targets.len(),
        "Planned pick/place"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arm;

    fn detection(label: &str, x: f64) -> DetectedObject {
        DetectedObject {
            label: label.to_string(),
            centroid: Point3::new(x, 0.0, 0.7),
            cluster: Vec::new(),
            cloud: PointCloud::default(),
        }
    }

    #[test]
    fn test_first_and_last_policy() {
        let detected = vec![detection("soap", 0.1), detection("soap", 0.2)];
        let targets = vec![TargetObjectSpec::new("soap", "green")];
        let dropboxes = vec![
            DropboxSpec::new("green", Arm::Right, Point3::new(0.0, -0.71, 0.605)),
            DropboxSpec::new("green", Arm::Left, Point3::new(0.0, 0.71, 0.605)),
        ];

        let first = plan(&detected, &targets, &dropboxes, 1, &PlannerConfig::default());
        assert_eq!(first.commands[0].pick_pose.position.x, 0.1);
        assert_eq!(first.commands[0].arm, Arm::Right);

        let config = PlannerConfig {
            match_policy: MatchPolicy::Last,
        };
        let last = plan(&detected, &targets, &dropboxes, 1, &config);
        assert_eq!(last.commands[0].pick_pose.position.x, 0.2);
        assert_eq!(last.commands[0].arm, Arm::Left);
    }

    #[test]
    fn test_missing_dropbox_skips_target() {
        let detected = vec![detection("glue", 0.3)];
        let targets = vec![TargetObjectSpec::new("glue", "red")];
        let dropboxes = vec![DropboxSpec::new("green", Arm::Right, Point3::origin())];

        let outcome = plan(&detected, &targets, &dropboxes, 2, &PlannerConfig::default());
        assert!(outcome.commands.is_empty());
        assert_eq!(
            outcome.gaps,
            vec![ClassificationGap::MissingDropbox {
                object_name: "glue".to_string(),
                group: "red".to_string()
            }]
        );
    }

    #[test]
    fn test_unrequested_detection_reported() {
        let detected = vec![detection("eraser", 0.3)];
        let outcome = plan(&detected, &[], &[], 1, &PlannerConfig::default());
        assert!(outcome.commands.is_empty());
        assert_eq!(
            outcome.gaps,
            vec![ClassificationGap::UnrequestedDetection {
                label: "eraser".to_string()
            }]
        );
    }

    #[test]
    fn test_policy_from_yaml() {
        let config: PlannerConfig = serde_yaml::from_str("match_policy: last").unwrap();
        assert_eq!(config.match_policy, MatchPolicy::Last);
        let config: PlannerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.match_policy, MatchPolicy::First);
    }
}
