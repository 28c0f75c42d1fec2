//! Core types shared by every stage of the tabletop sorter.
//!
//! - [`PointCloud`]: immutable-by-convention point container with optional colors and normals
//! - [`Plane`] / [`Pose`]: geometry primitives
//! - [`Ransac`]: generic random-sample consensus engine
//! - [`init_global_thread_pool`]: one-shot rayon pool configuration

pub mod geometry;
pub mod point_cloud;
pub mod robust;
pub mod runtime;

pub use geometry::*;
pub use point_cloud::*;
pub use robust::*;
pub use runtime::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
