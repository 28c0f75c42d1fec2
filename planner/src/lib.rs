//! Pick/place planning.
//!
//! - [`scene`]: the per-scene request (objects to move, bins to move them to)
//! - [`plan`]: matching detections and bins to requested objects
//! - [`output`]: the YAML command document handed to the manipulator side

pub mod output;
pub mod plan;
pub mod scene;

pub use output::*;
pub use plan::*;
pub use scene::*;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}
