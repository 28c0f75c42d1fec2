use nalgebra::{Matrix3, Point3, SymmetricEigen, UnitQuaternion, Vector3};

/// Plane in Hessian normal form: `normal · p + d = 0`, `|normal| = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    /// Plane through three points, `None` when they are (nearly) collinear.
    pub fn from_points(p1: &Point3<f32>, p2: &Point3<f32>, p3: &Point3<f32>) -> Option<Self> {
        let normal = (p2 - p1).cross(&(p3 - p1));
        let norm = normal.norm();
        if !norm.is_finite() || norm < 1e-12 {
            return None;
        }
        let normal = normal / norm;
        Some(Self {
            normal,
            d: -normal.dot(&p1.coords),
        })
    }

    /// Least-squares plane through a point set: the centroid plus the eigenvector
    /// of the smallest covariance eigenvalue.
    pub fn fit(points: &[&Point3<f32>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut centroid = Vector3::<f64>::zeros();
        for p in points {
            centroid += p.coords.cast::<f64>();
        }
        centroid /= points.len() as f64;

        let mut cov = Matrix3::<f64>::zeros();
        for p in points {
            let d = p.coords.cast::<f64>() - centroid;
            cov += d * d.transpose();
        }
        cov /= points.len() as f64;

        let eigen = SymmetricEigen::new(cov);
        let mut min_idx = 0;
        for i in 1..3 {
            if eigen.eigenvalues[i] < eigen.eigenvalues[min_idx] {
                min_idx = i;
            }
        }

        let normal: Vector3<f64> = eigen.eigenvectors.column(min_idx).into_owned();
        let norm = normal.norm();
        if !norm.is_finite() || norm < 1e-12 {
            return None;
        }
        let normal = normal / norm;
        Some(Self {
            normal: normal.cast::<f32>(),
            d: -normal.dot(&centroid) as f32,
        })
    }

    /// Unsigned point-to-plane distance.
    pub fn distance(&self, p: &Point3<f32>) -> f32 {
        (self.normal.dot(&p.coords) + self.d).abs()
    }

    /// Coefficients `[a, b, c, d]` of `ax + by + cz + d = 0`.
    pub fn coefficients(&self) -> [f32; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.d]
    }
}

/// Position plus orientation, as sent to the manipulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose at `position` with identity orientation.
    pub fn from_position(position: Point3<f64>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::from_position(Point3::origin())
    }
}
