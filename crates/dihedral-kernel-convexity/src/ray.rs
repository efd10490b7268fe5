//! Half-infinite rays and ray/triangle intersection.

use dihedral_kernel_math::{Dir3, Point3, Tolerance, Vec3, DEGENERACY_EPS};

use crate::approx::BoundedPlane;

/// Barycentric slack for hits on triangle edges and corners.
const BARYCENTRIC_EPS: f64 = 1e-9;

/// A ray in 3D space defined by origin and unit direction.
///
/// Hits are accepted for parameters `t >= t_min`. A slightly negative
/// `t_min` makes a hit at the origin itself count even when rounding puts
/// it just behind the origin.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Smallest accepted hit parameter.
    pub t_min: f64,
}

impl Ray {
    /// Ray from `origin` along `direction`; `None` for a zero direction.
    pub fn new(origin: Point3, direction: Vec3) -> Option<Self> {
        Dir3::try_new(direction, DEGENERACY_EPS).map(|direction| Self {
            origin,
            direction,
            t_min: 0.0,
        })
    }

    /// Ray from `origin` towards `target` that also accepts hits up to
    /// `tol.linear` behind the origin.
    ///
    /// `None` if the two points coincide within tolerance.
    pub fn through(origin: Point3, target: Point3, tol: &Tolerance) -> Option<Self> {
        let d = target - origin;
        if d.norm() < tol.linear {
            return None;
        }
        Self::new(origin, d).map(|r| r.with_t_min(-tol.linear))
    }

    /// Replace the smallest accepted hit parameter.
    pub fn with_t_min(mut self, t_min: f64) -> Self {
        self.t_min = t_min;
        self
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Intersect with a triangle, edges and corners included.
    ///
    /// Returns `None` for degenerate triangles, rays parallel to the
    /// triangle's plane (including rays lying in it), and hits before `t_min`.
    pub fn intersect_bounded_plane(&self, plane: &BoundedPlane) -> Option<Point3> {
        let normal = plane.normal()?;
        let denom = self.direction.dot(normal.as_ref());
        if denom.abs() < DEGENERACY_EPS {
            return None;
        }

        let t = (plane.a - self.origin).dot(normal.as_ref()) / denom;
        if t < self.t_min {
            return None;
        }
        let p = self.at(t);

        let v0 = plane.b - plane.a;
        let v1 = plane.c - plane.a;
        let v2 = p - plane.a;
        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let d20 = v2.dot(&v0);
        let d21 = v2.dot(&v1);
        let det = d00 * d11 - d01 * d01;
        let v = (d11 * d20 - d01 * d21) / det;
        let w = (d00 * d21 - d01 * d20) / det;
        let u = 1.0 - v - w;

        if u >= -BARYCENTRIC_EPS && v >= -BARYCENTRIC_EPS && w >= -BARYCENTRIC_EPS {
            Some(p)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> BoundedPlane {
        BoundedPlane::new(
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hit_interior() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 5.0), -Vec3::z()).unwrap();
        let hit = ray.intersect_bounded_plane(&unit_triangle()).unwrap();
        assert_relative_eq!(hit.x, 0.25, epsilon = 1e-12);
        assert!(hit.z.abs() < 1e-12);
    }

    #[test]
    fn test_hit_from_behind_plane_normal() {
        let ray = Ray::new(Point3::new(0.25, 0.25, -5.0), Vec3::z()).unwrap();
        assert!(ray.intersect_bounded_plane(&unit_triangle()).is_some());
    }

    #[test]
    fn test_miss_outside_triangle() {
        let ray = Ray::new(Point3::new(0.75, 0.75, 5.0), -Vec3::z()).unwrap();
        assert!(ray.intersect_bounded_plane(&unit_triangle()).is_none());
    }

    #[test]
    fn test_edge_and_corner_hits_count() {
        let edge = Ray::new(Point3::new(0.5, 0.5, 1.0), -Vec3::z()).unwrap();
        assert!(edge.intersect_bounded_plane(&unit_triangle()).is_some());
        let corner = Ray::new(Point3::new(1.0, 0.0, 1.0), -Vec3::z()).unwrap();
        assert!(corner.intersect_bounded_plane(&unit_triangle()).is_some());
    }

    #[test]
    fn test_behind_origin() {
        let ray = Ray::new(Point3::new(0.25, 0.25, 5.0), Vec3::z()).unwrap();
        assert!(ray.intersect_bounded_plane(&unit_triangle()).is_none());
    }

    #[test]
    fn test_anchor_on_plane_counts() {
        let tol = Tolerance::DEFAULT;
        let anchor = Point3::new(0.25, 0.25, 0.0);
        let ray = Ray::through(anchor, Point3::new(0.25, 0.25, 3.0), &tol).unwrap();
        let hit = ray.intersect_bounded_plane(&unit_triangle()).unwrap();
        assert!((hit - anchor).norm() < 1e-12);

        // a plain ray accepts t = 0 but not the rounding slack below it
        let shifted = Point3::new(0.25, 0.25, 1e-7);
        let plain = Ray::new(shifted, Vec3::z()).unwrap();
        assert!(plain.intersect_bounded_plane(&unit_triangle()).is_none());
        let slack = Ray::through(shifted, Point3::new(0.25, 0.25, 3.0), &tol).unwrap();
        assert!(slack.intersect_bounded_plane(&unit_triangle()).is_some());
    }

    #[test]
    fn test_parallel_and_degenerate() {
        let ray = Ray::new(Point3::new(-1.0, 0.25, 0.0), Vec3::x()).unwrap();
        assert!(ray.intersect_bounded_plane(&unit_triangle()).is_none());
        let flat = BoundedPlane::new(
            Point3::origin(),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        );
        let down = Ray::new(Point3::new(0.5, 0.5, 5.0), -Vec3::z()).unwrap();
        assert!(down.intersect_bounded_plane(&flat).is_none());
        // grazing the triangle's plane below the degeneracy bound
        let grazing = Ray::new(
            Point3::new(-1.0, 0.25, 0.0),
            Vec3::new(1.0, 0.0, 0.1 * DEGENERACY_EPS),
        )
        .unwrap();
        assert!(grazing.intersect_bounded_plane(&unit_triangle()).is_none());
    }

    #[test]
    fn test_zero_direction() {
        assert!(Ray::new(Point3::origin(), Vec3::zeros()).is_none());
        let tiny = Vec3::new(0.5 * DEGENERACY_EPS, 0.0, 0.0);
        assert!(Ray::new(Point3::origin(), tiny).is_none());
        assert!(Ray::new(Point3::origin(), tiny * 100.0).is_some());
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(Ray::through(p, p, &Tolerance::DEFAULT).is_none());
    }
}
