//! Small geometric helpers: the axis aligned bounding box and the plane
//! projection used for normal correction and polygon triangulation.

use cgmath::{Matrix3, Point3, Rad, Vector3, prelude::*};


/// An axis aligned bounding box.
///
/// A box created by [`Aabb::new`] contains nothing: the minimum corner sits
/// at `+∞`, the maximum at `-∞`. Adding points grows the box. Such an empty
/// box is not [valid][Aabb::is_valid].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    /// Creates a box containing nothing.
    pub fn new() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates the smallest box containing all given points.
    pub fn around(points: impl IntoIterator<Item = Point3<f64>>) -> Self {
        let mut out = Self::new();
        for p in points {
            out.add_point(p);
        }
        out
    }

    /// Creates a box directly from its two corners. No ordering is enforced;
    /// this is the inverse of reading back `min()`/`max()`.
    pub fn from_corners(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Grows the box to contain `p`.
    pub fn add_point(&mut self, p: Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Whether the box contains at least one point (min ≤ max on all axes).
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    pub fn min(&self) -> Point3<f64> {
        self.min
    }

    pub fn max(&self) -> Point3<f64> {
        self.max
    }

    /// The center of the box. Meaningless for an invalid box.
    pub fn center(&self) -> Point3<f64> {
        self.min + (self.max - self.min) / 2.0
    }

    /// Edge lengths per axis.
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}


/// Returns the rotation that maps the unit direction `dir` onto `+z`.
///
/// Built as the transpose of the axis-angle rotation about
/// `-(dir × z)` by `acos(dir · z)`. `dir == z` yields the identity; for
/// `dir == -z` the axis is degenerate and `x` is used instead. Applied to
/// the boundary of a planar polygon with normal `dir`, the result lies in a
/// plane parallel to xy.
pub(crate) fn rotation_onto_z(dir: Vector3<f64>) -> Matrix3<f64> {
    let z = Vector3::unit_z();
    if dir == z {
        return Matrix3::identity();
    }

    let axis = if dir == -z {
        Vector3::unit_x()
    } else {
        (-dir.cross(z)).normalize()
    };

    // acos is only defined on [-1, 1].
    let angle = dir.dot(z).min(1.0).max(-1.0).acos();
    Matrix3::from_axis_angle(axis, Rad(angle)).transpose()
}

/// Drops the z coordinate after rotating `p` by `m`.
pub(crate) fn project_to_xy(m: &Matrix3<f64>, p: Point3<f64>) -> (f64, f64) {
    let q = m * p.to_vec();
    (q.x, q.y)
}

/// Edge sum `Σ (x₂ - x₁)(y₂ + y₁)` over the closed 2D loop. Negative for a
/// counter-clockwise loop, positive for a clockwise one.
pub(crate) fn winding_sum(loop_2d: &[(f64, f64)]) -> f64 {
    let n = loop_2d.len();
    let mut sum = 0.0;
    for i in 0..n {
        let (x1, y1) = loop_2d[i];
        let (x2, y2) = loop_2d[(i + 1) % n];
        sum += (x2 - x1) * (y2 + y1);
    }
    sum
}
