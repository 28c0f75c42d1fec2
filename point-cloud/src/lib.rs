//! Point cloud operations for tabletop perception.
//!
//! Stages, in the order the perception pipeline runs them:
//!
//! - [`filtering`]: non-finite removal, statistical outlier removal, voxel downsampling,
//!   pass-through cropping, composed by [`preprocess`]
//! - [`segmentation`]: RANSAC support-plane extraction
//! - [`clustering`]: tolerance-based Euclidean clustering
//! - [`normals`]: the normal-estimation capability and a local PCA implementation
//!
//! Every stage takes its input by reference and returns fresh data. An empty
//! input produces an empty output, never an error.

pub mod clustering;
pub mod filtering;
pub mod normals;
pub mod segmentation;
pub mod spatial;

pub use clustering::*;
pub use filtering::*;
pub use normals::*;
pub use segmentation::*;
pub use spatial::PointIndex;
