use nalgebra::{Point3, Vector3};

/// 8-bit RGB color, 0-255 per channel.
pub type Rgb = [u8; 3];

/// Ordered point container.
///
/// Colors and normals are optional side channels; when present they are aligned
/// 1:1 with `points`. Stages never mutate an input cloud, they build a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3<f32>>,
    pub colors: Option<Vec<Rgb>>,
    pub normals: Option<Vec<Vector3<f32>>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<f32>>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Rgb>) -> crate::Result<Self> {
        if colors.len() == self.points.len() {
            self.colors = Some(colors);
            Ok(self)
        } else {
            Err(crate::Error::DimensionMismatch(format!(
                "Color count {} does not match point count {}",
                colors.len(),
                self.points.len()
            )))
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>) -> crate::Result<Self> {
        if normals.len() == self.points.len() {
            self.normals = Some(normals);
            Ok(self)
        } else {
            Err(crate::Error::DimensionMismatch(format!(
                "Normal count {} does not match point count {}",
                normals.len(),
                self.points.len()
            )))
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Color of point `i`, black when the cloud carries no colors.
    pub fn color(&self, i: usize) -> Rgb {
        self.colors.as_ref().map(|c| c[i]).unwrap_or([0, 0, 0])
    }

    /// Gather the given indices into a new cloud, carrying side channels.
    ///
    /// Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> PointCloud {
        let valid: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.points.len())
            .collect();

        PointCloud {
            points: valid.iter().map(|&i| self.points[i]).collect(),
            colors: self
                .colors
                .as_ref()
                .map(|c| valid.iter().map(|&i| c[i]).collect()),
            normals: self
                .normals
                .as_ref()
                .map(|n| valid.iter().map(|&i| n[i]).collect()),
        }
    }

    /// Keep the points whose mask entry is `true`.
    pub fn select_mask(&self, mask: &[bool]) -> PointCloud {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, &keep)| keep)
            .map(|(i, _)| i)
            .collect();
        self.select(&indices)
    }

    /// Same points, colors replaced by a single flat color.
    pub fn painted(&self, color: Rgb) -> PointCloud {
        PointCloud {
            points: self.points.clone(),
            colors: Some(vec![color; self.points.len()]),
            normals: None,
        }
    }

    /// Append another cloud. Side channels survive only when both clouds carry them.
    pub fn extend(&mut self, other: &PointCloud) {
        let was_empty = self.is_empty();
        self.colors = match (self.colors.take(), &other.colors) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs.clone()),
            _ => None,
        };
        self.normals = match (self.normals.take(), &other.normals) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs.clone()),
            _ => None,
        };
        self.points.extend_from_slice(&other.points);
    }

    /// Arithmetic mean of the point positions, `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self
            .points
            .iter()
            .fold(Vector3::<f64>::zeros(), |acc, p| {
                acc + Vector3::new(p.x as f64, p.y as f64, p.z as f64)
            });
        let mean = sum / self.points.len() as f64;
        Some(Point3::new(mean.x as f32, mean.y as f32, mean.z as f32))
    }
}
