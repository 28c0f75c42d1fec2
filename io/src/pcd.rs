//! PCD (Point Cloud Data) I/O
//!
//! PCD is the native format for Point Cloud Library (PCL). Packed `rgb` fields are
//! decoded from either an unsigned integer or the bit pattern of a float. PCL
//! writes the integer form even when the field is declared `TYPE F`.

use crate::{Error, Result};
use nalgebra::{Point3, Vector3};
use sorter_core::{PointCloud, Rgb};
use std::io::{BufRead, Write};

/// PCD data format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PcdData {
    Ascii,
    Binary,
    BinaryCompressed,
}

#[derive(Debug, Default)]
struct PcdHeader {
    fields: Vec<String>,
    types: Vec<char>,
    points: usize,
}

/// Read a PCD file
pub fn read_pcd<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();

    // Parse header
    let mut header = PcdHeader::default();
    let mut width = 0;
    let mut height = 1;
    let mut data_format = PcdData::Ascii;

    let mut in_header = true;

    while in_header {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse("Unexpected EOF in header".to_string()))??;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "FIELDS" => {
                header.fields = parts[1..].iter().map(|s| s.to_string()).collect();
            }
            "TYPE" => {
                header.types = parts[1..].iter().filter_map(|s| s.chars().next()).collect();
            }
            "WIDTH" => {
                width = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
            }
            "HEIGHT" => {
                height = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
            }
            "POINTS" => {
                header.points = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
            }
            "DATA" => {
                data_format = match parts.get(1).copied() {
                    Some("binary") => PcdData::Binary,
                    Some("binary_compressed") => PcdData::BinaryCompressed,
                    _ => PcdData::Ascii,
                };
                in_header = false;
            }
            _ => {}
        }
    }

    if header.points == 0 {
        header.points = width * height;
    }

    // Parse data
    match data_format {
        PcdData::Ascii => parse_pcd_ascii(lines, &header),
        PcdData::Binary => Err(Error::UnsupportedFormat(
            "Binary PCD not supported, only ASCII".to_string(),
        )),
        PcdData::BinaryCompressed => Err(Error::UnsupportedFormat(
            "Binary compressed PCD not supported, only ASCII".to_string(),
        )),
    }
}

fn parse_pcd_ascii<I>(lines: I, header: &PcdHeader) -> Result<PointCloud>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let fields = &header.fields;

    let xyz = match (
        field_index(fields, &["x"]),
        field_index(fields, &["y"]),
        field_index(fields, &["z"]),
    ) {
        (Some(x), Some(y), Some(z)) => [x, y, z],
        _ => return Err(Error::Parse("PCD FIELDS lacks x/y/z".to_string())),
    };
    let normal_idx = match (
        field_index(fields, &["normal_x", "nx"]),
        field_index(fields, &["normal_y", "ny"]),
        field_index(fields, &["normal_z", "nz"]),
    ) {
        (Some(x), Some(y), Some(z)) => Some([x, y, z]),
        _ => None,
    };
    let packed_idx = field_index(fields, &["rgb", "rgba"]);
    let split_idx = match (
        field_index(fields, &["r"]),
        field_index(fields, &["g"]),
        field_index(fields, &["b"]),
    ) {
        (Some(r), Some(g), Some(b)) => Some([r, g, b]),
        _ => None,
    };
    let packed_is_float = packed_idx
        .and_then(|i| header.types.get(i))
        .map(|&t| t == 'F')
        .unwrap_or(false);

    let count = header.points;
    // The header count is untrusted; the vectors grow past this if the rows are there.
    let reserve = count.min(crate::MAX_PREALLOC);
    let mut points = Vec::with_capacity(reserve);
    let mut normals: Option<Vec<Vector3<f32>>> = normal_idx.map(|_| Vec::with_capacity(reserve));
    let mut colors: Option<Vec<Rgb>> = if packed_idx.is_some() || split_idx.is_some() {
        Some(Vec::with_capacity(reserve))
    } else {
        None
    };

    for line in lines {
        if points.len() >= count {
            break;
        }
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < fields.len() {
            return Err(Error::Parse(format!(
                "PCD row has {} values, FIELDS declares {}",
                tokens.len(),
                fields.len()
            )));
        }
        let number = |i: usize| -> Result<f32> {
            tokens[i]
                .parse()
                .map_err(|_| Error::Parse(format!("Invalid number: {}", tokens[i])))
        };

        points.push(Point3::new(number(xyz[0])?, number(xyz[1])?, number(xyz[2])?));

        if let (Some(idx), Some(n)) = (normal_idx, normals.as_mut()) {
            n.push(Vector3::new(number(idx[0])?, number(idx[1])?, number(idx[2])?));
        }

        if let Some(c) = colors.as_mut() {
            if let Some(idx) = packed_idx {
                let packed = match tokens[idx].parse::<u32>() {
                    Ok(value) => value,
                    Err(_) if packed_is_float => number(idx)?.to_bits(),
                    Err(_) => {
                        return Err(Error::Parse(format!(
                            "Invalid packed color: {}",
                            tokens[idx]
                        )))
                    }
                };
                c.push(unpack_rgb(packed));
            } else if let Some(idx) = split_idx {
                let mut rgb = [0u8; 3];
                for (dst, &i) in rgb.iter_mut().zip(idx.iter()) {
                    *dst = number(i)?.clamp(0.0, 255.0) as u8;
                }
                c.push(rgb);
            }
        }
    }

    if points.len() < count {
        return Err(Error::Parse(format!(
            "PCD declares {} points, found {}",
            count,
            points.len()
        )));
    }

    let mut cloud = PointCloud::new(points);
    cloud.normals = normals;
    cloud.colors = colors;

    Ok(cloud)
}

fn field_index(fields: &[String], names: &[&str]) -> Option<usize> {
    fields.iter().position(|f| names.contains(&f.as_str()))
}

fn unpack_rgb(packed: u32) -> Rgb {
    [
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    ]
}

fn pack_rgb([r, g, b]: Rgb) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Write point cloud to PCD format (ASCII). Colors are written as a packed
/// unsigned `rgb` field.
pub fn write_pcd<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<()> {
    let num_points = cloud.len();
    let has_normals = cloud.normals.is_some();
    let has_colors = cloud.colors.is_some();

    let mut fields = vec!["x", "y", "z"];
    let mut types = vec!["F", "F", "F"];
    if has_normals {
        fields.extend(["normal_x", "normal_y", "normal_z"]);
        types.extend(["F", "F", "F"]);
    }
    if has_colors {
        fields.push("rgb");
        types.push("U");
    }

    // Write header
    writeln!(writer, "# .PCD v0.7 - Point Cloud Data file format")?;
    writeln!(writer, "VERSION 0.7")?;
    writeln!(writer, "FIELDS {}", fields.join(" "))?;
    writeln!(writer, "SIZE {}", vec!["4"; fields.len()].join(" "))?;
    writeln!(writer, "TYPE {}", types.join(" "))?;
    writeln!(writer, "COUNT {}", vec!["1"; fields.len()].join(" "))?;
    writeln!(writer, "WIDTH {}", num_points)?;
    writeln!(writer, "HEIGHT 1")?;
    writeln!(writer, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(writer, "POINTS {}", num_points)?;
    writeln!(writer, "DATA ascii")?;

    // Write data
    for (i, p) in cloud.points.iter().enumerate() {
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;

        if let Some(ref normals) = cloud.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }

        if let Some(ref colors) = cloud.colors {
            write!(writer, " {}", pack_rgb(colors[i]))?;
        }

        writeln!(writer)?;
    }

    Ok(())
}
