//! Point containment within a single face.
//!
//! The point is projected into the face surface's parameter space, and its
//! parameter-space image is tested against the projected loops.

use dihedral_kernel_geom::Surface;
use dihedral_kernel_math::{Point2, Point3, Tolerance, DEGENERACY_EPS};
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::{FaceId, LoopId};

/// Where a point lies relative to a bounded face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointContainment {
    /// On the surface, strictly within the outer loop and outside every hole.
    Inside,
    /// Off the surface, outside the outer loop, or inside a hole.
    Outside,
    /// Within tolerance of a loop.
    OnBoundary,
}

/// Classify `point` against face `face_id` of `solid`.
///
/// Points farther than `tol.linear` from the face's surface are
/// [`PointContainment::Outside`]. Faces whose outer loop projects to fewer
/// than three parameter-space points (circular caps, seam-only loops) have
/// no interior and report every point as outside.
pub fn face_point_containment(
    solid: &BRepSolid,
    face_id: FaceId,
    point: &Point3,
    tol: &Tolerance,
) -> PointContainment {
    let topo = &solid.topology;
    let Some(face) = topo.faces.get(face_id) else {
        return PointContainment::Outside;
    };
    let Some(surface) = solid.geometry.surfaces.get(face.surface_index) else {
        return PointContainment::Outside;
    };
    let surface = surface.as_ref();

    let uv = surface.project(point);
    if (surface.evaluate(uv) - point).norm() >= tol.linear {
        return PointContainment::Outside;
    }

    let outer = loop_uv_coords(solid, face.outer_loop, surface);
    if outer.len() < 3 {
        return PointContainment::Outside;
    }
    if near_polygon_boundary(&uv, &outer, tol.linear) {
        return PointContainment::OnBoundary;
    }
    if !point_in_polygon(&uv, &outer) {
        return PointContainment::Outside;
    }

    for &inner_loop in &face.inner_loops {
        let hole = loop_uv_coords(solid, inner_loop, surface);
        if hole.len() < 3 {
            continue;
        }
        if near_polygon_boundary(&uv, &hole, tol.linear) {
            return PointContainment::OnBoundary;
        }
        if point_in_polygon(&uv, &hole) {
            return PointContainment::Outside;
        }
    }

    PointContainment::Inside
}

fn loop_uv_coords(solid: &BRepSolid, loop_id: LoopId, surface: &dyn Surface) -> Vec<Point2> {
    solid
        .topology
        .loop_points(loop_id)
        .iter()
        .map(|p| surface.project(p))
        .collect()
}

/// Point-in-polygon test using the winding number algorithm.
///
/// Works for both convex and concave polygons of either winding.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut winding = 0i32;
    let n = polygon.len();

    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];

        if p1.y <= point.y {
            if p2.y > point.y && is_left(&p1, &p2, point) > 0.0 {
                winding += 1;
            }
        } else if p2.y <= point.y && is_left(&p1, &p2, point) < 0.0 {
            winding -= 1;
        }
    }

    winding != 0
}

/// Signed area of the triangle (p0, p1, p2); positive if p2 is left of p0->p1.
#[inline]
fn is_left(p0: &Point2, p1: &Point2, p2: &Point2) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

fn near_polygon_boundary(point: &Point2, polygon: &[Point2], tol: f64) -> bool {
    let n = polygon.len();
    (0..n).any(|i| point_to_segment_dist_2d(point, &polygon[i], &polygon[(i + 1) % n]) < tol)
}

fn point_to_segment_dist_2d(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < DEGENERACY_EPS * DEGENERACY_EPS {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + t * ab)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dihedral_kernel_primitives::{make_cube, make_cylinder, make_prism};

    fn top_face(solid: &BRepSolid) -> FaceId {
        solid.topology.solid_faces(solid.solid_id).nth(1).unwrap()
    }

    #[test]
    fn test_point_in_polygon_concave() {
        let l = [(0.0, 0.0), (3.0, 0.0), (3.0, 1.0), (1.0, 1.0), (1.0, 3.0), (0.0, 3.0)]
            .map(|(x, y)| Point2::new(x, y));
        assert!(point_in_polygon(&Point2::new(0.5, 2.5), &l));
        assert!(point_in_polygon(&Point2::new(2.5, 0.5), &l));
        assert!(!point_in_polygon(&Point2::new(2.0, 2.0), &l));
        let mut reversed = l.to_vec();
        reversed.reverse();
        assert!(point_in_polygon(&Point2::new(0.5, 2.5), &reversed));
    }

    #[test]
    fn test_cube_face_containment() {
        let cube = make_cube(1.0, 1.0, 1.0);
        let tol = Tolerance::DEFAULT;
        let top = top_face(&cube);
        let check = |p: Point3| face_point_containment(&cube, top, &p, &tol);
        assert_eq!(check(Point3::new(0.5, 0.5, 1.0)), PointContainment::Inside);
        assert_eq!(check(Point3::new(1.5, 0.5, 1.0)), PointContainment::Outside);
        assert_eq!(check(Point3::new(1.0, 0.5, 1.0)), PointContainment::OnBoundary);
        // off the plane
        assert_eq!(check(Point3::new(0.5, 0.5, 1.1)), PointContainment::Outside);
    }

    #[test]
    fn test_concave_face_containment() {
        let profile = [(0.0, 0.0), (3.0, 0.0), (3.0, 1.0), (1.0, 1.0), (1.0, 3.0), (0.0, 3.0)]
            .map(|(x, y)| Point2::new(x, y));
        let solid = make_prism(&profile, 1.0).unwrap();
        let tol = Tolerance::DEFAULT;
        let top = top_face(&solid);
        let inside = face_point_containment(&solid, top, &Point3::new(0.5, 2.0, 1.0), &tol);
        let notch = face_point_containment(&solid, top, &Point3::new(2.0, 2.0, 1.0), &tol);
        assert_eq!(inside, PointContainment::Inside);
        assert_eq!(notch, PointContainment::Outside);
    }

    #[test]
    fn test_circular_cap_has_no_interior() {
        let cyl = make_cylinder(1.0, 1.0).unwrap();
        let cap = top_face(&cyl);
        let c = face_point_containment(&cyl, cap, &Point3::origin(), &Tolerance::DEFAULT);
        assert_eq!(c, PointContainment::Outside);
    }
}
