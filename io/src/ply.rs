//! PLY (Polygon File Format) I/O
//!
//! Only the ASCII encoding of the vertex element is handled. Properties are
//! matched by name, so `x y z` may be followed by normals and colors in any order.

use crate::{Error, Result};
use nalgebra::{Point3, Vector3};
use sorter_core::PointCloud;
use std::io::{BufRead, Write};

/// Read a PLY file from a reader
pub fn read_ply<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();

    // Parse header
    let mut in_header = true;
    let mut format = String::new();
    let mut num_vertices = 0;
    let mut in_vertex_element = false;
    let mut properties: Vec<String> = Vec::new();

    while in_header {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse("Unexpected EOF in header".to_string()))??;

        let line = line.trim();

        if line.starts_with("format ") {
            format = line
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| Error::Parse("Invalid format line".to_string()))?
                .to_string();
        } else if line.starts_with("element ") {
            in_vertex_element = line.starts_with("element vertex ");
            if in_vertex_element {
                num_vertices = line
                    .split_whitespace()
                    .nth(2)
                    .ok_or_else(|| Error::Parse("Invalid vertex count".to_string()))?
                    .parse()
                    .map_err(|_| Error::Parse("Invalid vertex count number".to_string()))?;
            }
        } else if line.starts_with("property ") && in_vertex_element {
            if let Some(name) = line.split_whitespace().last() {
                properties.push(name.to_string());
            }
        } else if line == "end_header" {
            in_header = false;
        }
    }

    if format != "ascii" {
        return Err(Error::UnsupportedFormat(format!(
            "PLY format '{}' not supported, only ASCII",
            format
        )));
    }

    let position = |name: &str| properties.iter().position(|p| p == name);
    let xyz = match (position("x"), position("y"), position("z")) {
        (Some(x), Some(y), Some(z)) => [x, y, z],
        _ => return Err(Error::Parse("PLY vertex element lacks x/y/z".to_string())),
    };
    let normal_idx = match (position("nx"), position("ny"), position("nz")) {
        (Some(x), Some(y), Some(z)) => Some([x, y, z]),
        _ => None,
    };
    let color_idx = match (position("red"), position("green"), position("blue")) {
        (Some(r), Some(g), Some(b)) => Some([r, g, b]),
        _ => None,
    };

    // Parse data. The declared count only sizes the first allocation.
    let reserve = num_vertices.min(crate::MAX_PREALLOC);
    let mut points = Vec::with_capacity(reserve);
    let mut colors = color_idx.map(|_| Vec::with_capacity(reserve));
    let mut normals = normal_idx.map(|_| Vec::with_capacity(reserve));

    for _ in 0..num_vertices {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse("Unexpected EOF in data".to_string()))??;

        let values: Vec<f32> = line
            .split_whitespace()
            .map(|s| {
                s.parse()
                    .map_err(|_| Error::Parse(format!("Invalid number: {}", s)))
            })
            .collect::<Result<Vec<_>>>()?;

        if values.len() < properties.len() {
            return Err(Error::Parse(format!(
                "Vertex has {} values, header declares {}",
                values.len(),
                properties.len()
            )));
        }

        points.push(Point3::new(values[xyz[0]], values[xyz[1]], values[xyz[2]]));

        if let (Some(idx), Some(n)) = (normal_idx, normals.as_mut()) {
            n.push(Vector3::new(values[idx[0]], values[idx[1]], values[idx[2]]));
        }

        if let (Some(idx), Some(c)) = (color_idx, colors.as_mut()) {
            c.push(idx.map(|i| values[i].clamp(0.0, 255.0) as u8));
        }
    }

    Ok(PointCloud {
        points,
        colors,
        normals,
    })
}

/// Write a point cloud to PLY format
pub fn write_ply<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<()> {
    let num_points = cloud.len();

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", num_points)?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;

    if cloud.normals.is_some() {
        writeln!(writer, "property float nx")?;
        writeln!(writer, "property float ny")?;
        writeln!(writer, "property float nz")?;
    }

    if cloud.colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }

    writeln!(writer, "end_header")?;

    // Write data
    for (i, p) in cloud.points.iter().enumerate() {
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;

        if let Some(ref normals) = cloud.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }

        if let Some(ref colors) = cloud.colors {
            let [r, g, b] = colors[i];
            write!(writer, " {} {} {}", r, g, b)?;
        }

        writeln!(writer)?;
    }

    Ok(())
}
