#![warn(missing_docs)]

//! Math types for the dihedral B-rep analysis kernel.
//!
//! Thin wrappers around nalgebra providing the point, vector and direction
//! types used across the workspace, affine transforms for placing solids,
//! and the tolerance model that every geometric comparison goes through.
//!
//! Point equality is never exact. B-rep evaluation leaves rounding noise in
//! vertex coordinates, so two points are "the same" when they are closer than
//! [`Tolerance::linear`], and hashed lookups go through [`PointKey`], which
//! snaps coordinates to a fixed grid so that hashing and equality agree.

use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Length below which a vector, cross product or denominator counts as zero.
///
/// Scale-free guard for normalization and division; model-space comparisons
/// go through [`Tolerance`] instead.
pub const DEGENERACY_EPS: f64 = 1e-12;

/// Tolerance constants for geometric comparisons.
///
/// All distance checks are strict: a distance exactly equal to `linear` is
/// *not* within tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance, compared against the sine of the angle between
    /// two unit vectors.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Create a tolerance with explicit linear and angular values.
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Check if two points are coincident within tolerance (`|a - b| < linear`).
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two vectors point along the same line (same or opposite sense).
    ///
    /// A vector shorter than `linear` has no usable direction and is reported
    /// as parallel to everything.
    pub fn vectors_parallel(&self, a: &Vec3, b: &Vec3) -> bool {
        let (la, lb) = (a.norm(), b.norm());
        if la < self.linear || lb < self.linear {
            return true;
        }
        (a / la).cross(&(b / lb)).norm() < self.angular
    }

    /// Remove tolerance-duplicates from a point sequence.
    ///
    /// The first occurrence of each cluster is kept and input order is
    /// otherwise preserved. Quadratic in the number of unique points.
    pub fn dedup_points<I>(&self, points: I) -> Vec<Point3>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut unique: Vec<Point3> = Vec::new();
        for p in points {
            if !unique.iter().any(|q| self.points_equal(&p, q)) {
                unique.push(p);
            }
        }
        unique
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A point snapped to an integer grid with cell size `cell`.
///
/// Each coordinate maps to `round(coord / cell)` (halfway cases round away
/// from zero). Two points share a key exactly when every coordinate falls in
/// the same cell, which makes `Eq` and `Hash` consistent with each other.
/// Points closer than `cell` usually share a key but can straddle a cell
/// boundary; [`PointKey::candidates`] lists the neighbouring keys a nearby
/// point may have snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(pub [i64; 3]);

impl PointKey {
    /// Snap a point to the grid.
    pub fn snap(p: &Point3, cell: f64) -> Self {
        let q = |v: f64| (v / cell).round() as i64;
        Self([q(p.x), q(p.y), q(p.z)])
    }

    /// Every key a point within `margin` of `p` can snap to.
    ///
    /// A coordinate closer than `margin` to a cell boundary contributes
    /// both neighbouring cells, so the result holds between 1 and 8 keys.
    /// The first key is always `snap(p, cell)`.
    pub fn candidates(p: &Point3, cell: f64, margin: f64) -> Vec<Self> {
        let axis = |v: f64| -> [Option<i64>; 2] {
            let s = v / cell;
            let k = s.round();
            let near_boundary = (s - s.floor() - 0.5).abs() < margin / cell;
            let other = if k <= s { k + 1.0 } else { k - 1.0 };
            [Some(k as i64), near_boundary.then_some(other as i64)]
        };
        let (xs, ys, zs) = (axis(p.x), axis(p.y), axis(p.z));
        let mut keys = Vec::with_capacity(8);
        for x in xs.iter().flatten() {
            for y in ys.iter().flatten() {
                for z in zs.iter().flatten() {
                    keys.push(Self([*x, *y, *z]));
                }
            }
        }
        keys
    }
}

/// Midpoint of two points.
pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    nalgebra::center(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert_relative_eq!(result.x, 11.0, epsilon = 1e-12);
        assert_relative_eq!(result.y, 22.0, epsilon = 1e-12);
        assert_relative_eq!(result.z, 33.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_leaves_vectors_alone() {
        let t = Transform::translation(5.0, 5.0, 5.0);
        let v = t.apply_vec(&Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(PI / 2.0);
        let p = Point3::new(1.0, 0.0, 0.0);
        let result = t.apply_point(&p);
        assert!(result.x.abs() < 1e-12);
        assert_relative_eq!(result.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let translate = Transform::translation(1.0, 0.0, 0.0);
        let scale = Transform::scale(2.0, 2.0, 2.0);
        // scale.then(&translate) = scale * translate: translate first, then scale
        let composed = scale.then(&translate);
        let result = composed.apply_point(&Point3::origin());
        assert_relative_eq!(result.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_tolerance_boundary_is_strict() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::origin();
        let exactly = Point3::new(tol.linear, 0.0, 0.0);
        let just_inside = Point3::new(tol.linear * 0.5, 0.0, 0.0);
        assert!(!tol.points_equal(&a, &exactly));
        assert!(tol.points_equal(&a, &just_inside));
        assert!(!tol.is_zero(tol.linear));
    }

    #[test]
    fn test_vectors_parallel() {
        let tol = Tolerance::DEFAULT;
        let a = Vec3::new(1.0, 1.0, 0.0);
        assert!(tol.vectors_parallel(&a, &Vec3::new(3.0, 3.0, 0.0)));
        assert!(tol.vectors_parallel(&a, &Vec3::new(-2.0, -2.0, 0.0)));
        assert!(!tol.vectors_parallel(&a, &Vec3::new(1.0, 0.0, 0.0)));
        // zero-length vectors carry no direction
        assert!(tol.vectors_parallel(&a, &Vec3::zeros()));
    }

    #[test]
    fn test_dedup_points_keeps_first() {
        let tol = Tolerance::DEFAULT;
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1e-8, 0.0, 0.0),
            Point3::new(1.0, 1e-9, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let unique = tol.dedup_points(pts);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0], Point3::new(0.0, 0.0, 0.0));
        assert_eq!(unique[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_point_key_snapping() {
        let cell = 1e-4;
        let a = PointKey::snap(&Point3::new(0.3e-4, 0.0, 0.0), cell);
        let b = PointKey::snap(&Point3::new(-0.3e-4, 0.0, 0.0), cell);
        let c = PointKey::snap(&Point3::new(0.7e-4, 0.0, 0.0), cell);
        let d = PointKey::snap(&Point3::new(-0.7e-4, 0.0, 0.0), cell);
        assert_eq!(a, b);
        assert_eq!(a, PointKey([0, 0, 0]));
        assert_eq!(c, PointKey([1, 0, 0]));
        assert_eq!(d, PointKey([-1, 0, 0]));
    }

    #[test]
    fn test_point_key_noise_collapses() {
        let cell = 1e-4;
        let p = Point3::new(10.0, 20.0, 30.0);
        let noisy = Point3::new(10.0 + 3e-9, 20.0 - 2e-9, 30.0 + 1e-10);
        assert_eq!(PointKey::snap(&p, cell), PointKey::snap(&noisy, cell));
    }

    #[test]
    fn test_point_key_halfway_candidates() {
        let cell = 1e-4;
        let margin = Tolerance::DEFAULT.linear;
        let below = Point3::new(1.5e-4 - 1e-9, 0.0, 0.0);
        let above = Point3::new(1.5e-4 + 1e-9, 0.0, 0.0);
        // tolerance-equal, but on opposite sides of the cell boundary
        assert!(Tolerance::DEFAULT.points_equal(&below, &above));
        assert_eq!(PointKey::snap(&below, cell), PointKey([1, 0, 0]));
        assert_eq!(PointKey::snap(&above, cell), PointKey([2, 0, 0]));

        let from_below = PointKey::candidates(&below, cell, margin);
        let from_above = PointKey::candidates(&above, cell, margin);
        assert_eq!(from_below, vec![PointKey([1, 0, 0]), PointKey([2, 0, 0])]);
        assert_eq!(from_above, vec![PointKey([2, 0, 0]), PointKey([1, 0, 0])]);
    }

    #[test]
    fn test_point_key_candidates_corner() {
        let cell = 1e-4;
        let p = Point3::new(-0.5e-4, 2.5e-4 + 1e-10, 0.2e-4);
        let keys = PointKey::candidates(&p, cell, 1e-6);
        // x and y sit on boundaries, z does not
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[0], PointKey::snap(&p, cell));
        assert!(keys.contains(&PointKey([0, 2, 0])));
        assert!(keys.contains(&PointKey([-1, 3, 0])));

        let interior = PointKey::candidates(&Point3::new(1.0, 2.0, 3.0), cell, 1e-6);
        assert_eq!(interior, vec![PointKey::snap(&Point3::new(1.0, 2.0, 3.0), cell)]);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(&Point3::new(0.0, 0.0, 0.0), &Point3::new(2.0, 4.0, -6.0));
        assert_eq!(m, Point3::new(1.0, 2.0, -3.0));
    }
}
