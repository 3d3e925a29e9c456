//! Linear algebra type aliases, geometric tolerances and small vector helpers.

use nalgebra::{Rotation3, Unit};

pub type Point3 = nalgebra::Point3<f64>;
pub type Point2 = nalgebra::Point2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Geometric tolerance for point coincidence tests (distance in model units).
pub const TOLERANCE: f64 = 1e-7;

/// Angular tolerance (radians) for tangent/normal comparisons.
pub const ANGLE_TOL: f64 = 1e-6;

/// Global axes used by positioning rules.
pub fn x_axis() -> Vector3 {
    Vector3::new(1.0, 0.0, 0.0)
}

pub fn y_axis() -> Vector3 {
    Vector3::new(0.0, 1.0, 0.0)
}

pub fn z_axis() -> Vector3 {
    Vector3::new(0.0, 0.0, 1.0)
}

/// Rotate `v` counter-clockwise around `axis` by `angle_deg` degrees.
///
/// A zero-length axis leaves `v` untouched.
pub fn rotate_deg(v: &Vector3, axis: &Vector3, angle_deg: f64) -> Vector3 {
    if axis.norm() < ANGLE_TOL || angle_deg == 0.0 {
        return *v;
    }
    let rot = Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_deg.to_radians());
    rot * v
}

/// An arbitrary unit vector perpendicular to `v`.
///
/// Seeds with whichever global axis is least aligned with `v`.
pub fn perpendicular(v: &Vector3) -> Vector3 {
    let seed = if v.x.abs() < 0.9 { x_axis() } else { y_axis() };
    v.cross(&seed).normalize()
}

/// Linear interpolation between two points.
pub fn lerp(a: &Point3, b: &Point3, t: f64) -> Point3 {
    a + (b - a) * t
}

/// Apply a homogeneous transformation to a point.
pub fn transform_point(m: &Matrix4, p: &Point3) -> Point3 {
    m.transform_point(p)
}
