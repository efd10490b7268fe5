//! Planar triangle approximations of faces.
//!
//! The point-in-solid test casts rays against triangles rather than exact
//! trimmed surfaces. Two strategies are provided behind
//! [`FaceApproximator`]: [`SortedFan`] triangulates boundary points in
//! lexicographic order and is cheap but only faithful for simple convex
//! faces; [`BoundaryFan`] ear-clips the outer loop in boundary order.

use dihedral_kernel_math::{Dir3, Point2, Point3, Tolerance, Vec3, DEGENERACY_EPS};
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::FaceId;

/// A triangular planar patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedPlane {
    /// First corner.
    pub a: Point3,
    /// Second corner.
    pub b: Point3,
    /// Third corner.
    pub c: Point3,
}

impl BoundedPlane {
    /// Triangle through three points.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Unit normal following the corner winding, `None` for a degenerate triangle.
    pub fn normal(&self) -> Option<Dir3> {
        Dir3::try_new((self.b - self.a).cross(&(self.c - self.a)), DEGENERACY_EPS)
    }
}

/// Decomposes a face into triangles.
pub trait FaceApproximator {
    /// Triangles covering (approximately) the face; empty for degenerate faces.
    fn approximate(&self, solid: &BRepSolid, face: FaceId) -> Vec<BoundedPlane>;
}

/// Both endpoints of every half-edge in every loop of a face, in traversal order.
pub fn face_boundary_points(solid: &BRepSolid, face: FaceId) -> Vec<Point3> {
    let topo = &solid.topology;
    topo.face_loops(face)
        .flat_map(|l| topo.loop_half_edges(l))
        .flat_map(|he| {
            let (a, b) = topo.half_edge_endpoints(he);
            [a, b]
        })
        .collect()
}

/// Average of a face's distinct boundary vertices.
pub fn face_centroid(solid: &BRepSolid, face: FaceId, tol: &Tolerance) -> Option<Point3> {
    let unique = tol.dedup_points(face_boundary_points(solid, face));
    if unique.is_empty() {
        return None;
    }
    let sum = unique.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / unique.len() as f64))
}

/// Sorted-fan surrogate triangulation.
///
/// Deduplicates the face's boundary points, sorts them by `(x, y, z)`, and
/// emits one triangle per consecutive triple. This is not a triangulation
/// of the face: for non-convex boundaries the triangles can cover area
/// outside the face and miss area inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortedFan {
    /// Point deduplication tolerance.
    pub tolerance: Tolerance,
}

impl SortedFan {
    /// Sorted fan with the given tolerance.
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

impl FaceApproximator for SortedFan {
    fn approximate(&self, solid: &BRepSolid, face: FaceId) -> Vec<BoundedPlane> {
        let mut points = self.tolerance.dedup_points(face_boundary_points(solid, face));
        if points.len() < 3 {
            return Vec::new();
        }
        points.sort_by(|p, q| {
            p.x.total_cmp(&q.x)
                .then(p.y.total_cmp(&q.y))
                .then(p.z.total_cmp(&q.z))
        });
        points
            .windows(3)
            .map(|w| BoundedPlane::new(w[0], w[1], w[2]))
            .collect()
    }
}

/// Ear-clipping of the outer loop in boundary order.
///
/// The loop is projected onto the coordinate plane that drops the dominant
/// axis of its Newell normal. Holes are not subtracted, so a face with inner
/// loops is approximated by its filled outer boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryFan {
    /// Point deduplication tolerance.
    pub tolerance: Tolerance,
}

impl BoundaryFan {
    /// Boundary fan with the given tolerance.
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

impl FaceApproximator for BoundaryFan {
    fn approximate(&self, solid: &BRepSolid, face: FaceId) -> Vec<BoundedPlane> {
        let Some(f) = solid.topology.faces.get(face) else {
            return Vec::new();
        };
        let points = self
            .tolerance
            .dedup_points(solid.topology.loop_points(f.outer_loop));
        if points.len() < 3 {
            return Vec::new();
        }

        let normal = newell_normal(&points);
        if normal.norm() < DEGENERACY_EPS {
            return Vec::new();
        }
        let axis = normal.iamax();
        let (i, j) = ((axis + 1) % 3, (axis + 2) % 3);
        let projected: Vec<Point2> = points.iter().map(|p| Point2::new(p[i], p[j])).collect();

        ear_clip(&projected)
            .into_iter()
            .map(|[a, b, c]| BoundedPlane::new(points[a], points[b], points[c]))
            .collect()
    }
}

fn newell_normal(points: &[Point3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for (k, p) in points.iter().enumerate() {
        let q = points[(k + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n
}

/// Ear-clipping triangulation of a simple polygon of either winding.
///
/// Returns index triples into `verts`. If no ear can be found (a
/// self-intersecting or badly degenerate polygon), the remaining vertices
/// are closed with a fan.
fn ear_clip(verts: &[Point2]) -> Vec<[usize; 3]> {
    let n = verts.len();
    let twice_area: f64 = (0..n)
        .map(|k| {
            let (p, q) = (verts[k], verts[(k + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum();
    let ccw = twice_area > 0.0;

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut out = Vec::with_capacity(n.saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&k| {
            let prev = (k + m - 1) % m;
            let next = (k + 1) % m;
            let (a, b, c) = (
                verts[remaining[prev]],
                verts[remaining[k]],
                verts[remaining[next]],
            );

            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if cross.abs() < DEGENERACY_EPS || (cross > 0.0) != ccw {
                return false;
            }
            (0..m)
                .filter(|&o| o != prev && o != k && o != next)
                .all(|o| !point_in_triangle_2d(&verts[remaining[o]], &a, &b, &c))
        });

        match ear {
            Some(k) => {
                let m = remaining.len();
                out.push([remaining[(k + m - 1) % m], remaining[k], remaining[(k + 1) % m]]);
                remaining.remove(k);
            }
            None => {
                for w in 1..remaining.len() - 1 {
                    out.push([remaining[0], remaining[w], remaining[w + 1]]);
                }
                return out;
            }
        }
    }

    if remaining.len() == 3 {
        out.push([remaining[0], remaining[1], remaining[2]]);
    }
    out
}

/// Strict barycentric containment; points on the triangle's edges are outside.
fn point_in_triangle_2d(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    let eps = 1e-10;
    u > eps && v > eps && (u + v) < 1.0 - eps
}
