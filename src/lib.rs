//! Tabletop object sorter.
//!
//! Turns a depth-sensor point cloud of a table into recognized objects and an
//! ordered list of pick/place commands. The stages live in their own crates and
//! are re-exported here; [`Perception`] runs them frame by frame.

pub use sorter_classifier as classifier;
pub use sorter_core as core;
pub use sorter_features as features;
pub use sorter_io as io;
pub use sorter_planner as planner;
pub use sorter_point_cloud as point_cloud;

pub mod config;
pub mod palette;
pub mod pipeline;
pub mod publish;

pub use config::{ConfigError, PipelineConfig};
pub use palette::ColorPalette;
pub use pipeline::{FrameResult, Perception, PipelineError};
pub use publish::{DirectoryPublisher, FramePublisher, NullPublisher, ObjectLabel, TransportError};

/// Initialize the global Rayon thread pool used for per-cluster work.
///
/// Call once at startup, before the first frame. Repeated calls return the first
/// initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `SORTER_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> Result<(), String> {
    sorter_core::init_global_thread_pool(num_threads)
}
