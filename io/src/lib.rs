//! Point cloud file I/O
//!
//! Supports reading and writing point clouds in:
//! - PLY (Polygon File Format), ASCII
//! - PCD (Point Cloud Data - PCL format), ASCII

pub mod pcd;
pub mod ply;

pub use pcd::{read_pcd, write_pcd, PcdData};
pub use ply::{read_ply, write_ply};

pub use sorter_core::{Error, Result};

/// Upper bound on rows reserved up front from a header's declared count.
const MAX_PREALLOC: usize = 1 << 20;

use sorter_core::PointCloud;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a cloud, choosing the format from the file extension (`.ply` or `.pcd`).
pub fn read_cloud(path: impl AsRef<Path>) -> Result<PointCloud> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    match extension(path).as_deref() {
        Some("ply") => read_ply(reader),
        Some("pcd") => read_pcd(reader),
        other => Err(Error::UnsupportedFormat(format!(
            "cannot infer point cloud format from extension {:?}",
            other
        ))),
    }
}

/// Write a cloud, choosing the format from the file extension (`.ply` or `.pcd`).
pub fn write_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> Result<()> {
    let path = path.as_ref();
    let format = extension(path);
    let mut writer = match format.as_deref() {
        Some("ply") | Some("pcd") => BufWriter::new(File::create(path)?),
        other => {
            return Err(Error::UnsupportedFormat(format!(
                "cannot infer point cloud format from extension {:?}",
                other
            )))
        }
    };
    if format.as_deref() == Some("ply") {
        write_ply(&mut writer, cloud)?;
    } else {
        write_pcd(&mut writer, cloud)?;
    }
    writer.flush()?;
    Ok(())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
