//! Ray-parity point-in-solid classification.
//!
//! A ray from the anchor towards the target is intersected with every
//! triangle of every face that has a usable normal. Hits are merged by
//! tolerance, and the count is corrected for collinear hit triples before
//! the parity decides containment.
//!
//! The anchor itself is a hit whenever it lies on the boundary, which is
//! always the case for the edge-midpoint anchors used by the convexity pass.

use dihedral_kernel_math::{Point3, Tolerance};
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::FaceId;
use slotmap::SecondaryMap;
use tracing::trace;

use crate::approx::{BoundedPlane, FaceApproximator};
use crate::normal::{face_normal, NormalEstimate};
use crate::ray::Ray;

/// Parity verdict for a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// Odd corrected hit count.
    Inside,
    /// Even corrected hit count, or no usable ray.
    Outside,
}

/// Outcome of one point-in-solid query, with its intermediate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointQuery {
    /// The verdict.
    pub containment: Containment,
    /// Distinct hit points before collinearity correction.
    pub raw_hits: usize,
    /// Hit count after subtracting one per collinear triple. Can be negative.
    pub corrected_count: i64,
}

impl PointQuery {
    fn empty() -> Self {
        Self {
            containment: Containment::Outside,
            raw_hits: 0,
            corrected_count: 0,
        }
    }
}

/// A face's normal and its triangle approximation.
#[derive(Debug, Clone)]
pub struct FacePatches {
    /// Representative normal.
    pub normal: NormalEstimate,
    /// Triangles used for ray casting.
    pub planes: Vec<BoundedPlane>,
}

/// Per-run cache of face normals and approximations.
///
/// Built once per solid and shared by every point query of a run.
#[derive(Debug, Clone)]
pub struct SolidApproximation {
    faces: SecondaryMap<FaceId, FacePatches>,
    order: Vec<FaceId>,
}

impl SolidApproximation {
    /// Estimate normals and approximate every face of `solid`.
    ///
    /// Faces without a normal get no triangles.
    pub fn build<A: FaceApproximator + ?Sized>(solid: &BRepSolid, approximator: &A) -> Self {
        let mut faces = SecondaryMap::new();
        let mut order = Vec::new();
        for face in solid.topology.solid_faces(solid.solid_id) {
            let normal = face_normal(solid, face);
            let planes = if normal.is_available() {
                approximator.approximate(solid, face)
            } else {
                Vec::new()
            };
            trace!(?face, available = normal.is_available(), planes = planes.len(), "face approximated");
            faces.insert(face, FacePatches { normal, planes });
            order.push(face);
        }
        Self { faces, order }
    }

    /// Cached data for `face`.
    pub fn face(&self, face: FaceId) -> Option<&FacePatches> {
        self.faces.get(face)
    }

    /// Faces in shell order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FacePatches)> {
        self.order.iter().filter_map(|&f| self.faces.get(f).map(|p| (f, p)))
    }

    /// Classify `target` by casting from `anchor` through it.
    ///
    /// A target within `tol.linear` of the anchor gives no direction and is
    /// reported as outside with no hits.
    pub fn query(&self, anchor: &Point3, target: &Point3, tol: &Tolerance) -> PointQuery {
        let Some(ray) = Ray::through(*anchor, *target, tol) else {
            return PointQuery::empty();
        };

        let hits = self
            .faces()
            .filter(|(_, p)| p.normal.is_available())
            .flat_map(|(_, p)| p.planes.iter())
            .filter_map(|plane| ray.intersect_bounded_plane(plane));
        let unique = tol.dedup_points(hits);

        let raw_hits = unique.len();
        let corrected_count = raw_hits as i64 - collinear_triples(&unique, tol) as i64;
        let containment = if corrected_count.rem_euclid(2) == 1 {
            Containment::Inside
        } else {
            Containment::Outside
        };
        trace!(raw_hits, corrected_count, ?containment, "point query");

        PointQuery {
            containment,
            raw_hits,
            corrected_count,
        }
    }
}

/// Number of index triples `i < j < k` whose points are collinear.
///
/// Every hit lies on one ray, so any three distinct hits are collinear and
/// this is `C(n, 3)` for well-conditioned input. The correction
/// over-subtracts once four or more hits survive deduplication.
pub fn collinear_triples(points: &[Point3], tol: &Tolerance) -> usize {
    let n = points.len();
    let mut count = 0;
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if tol.vectors_parallel(&(points[j] - points[i]), &(points[k] - points[i])) {
                    count += 1;
                }
            }
        }
    }
    count
}
