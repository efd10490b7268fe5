//! Edge convexity classification.
//!
//! For every edge shared by exactly two faces, a probe point is stepped
//! from the edge midpoint into each face, perpendicular to the edge. The
//! midpoint of the two probes lies inside the solid for a convex edge and
//! outside it for a concave one. Because the point-in-solid ray is anchored
//! on the edge itself and the anchor counts as a hit, the parity verdict is
//! inverted: an odd count (reported as inside) marks a concave edge.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use dihedral_kernel_math::{midpoint, Dir3, Point3, Tolerance, DEGENERACY_EPS};
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::FaceId;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use crate::adjacency::{build_adjacency, AdjacencyEntry};
use crate::approx::{BoundaryFan, FaceApproximator, SortedFan};
use crate::config::{Approximation, ConvexityConfig};
use crate::containment::{face_point_containment, PointContainment};
use crate::error::{ConvexityError, Result};
use crate::inside::{Containment, PointQuery, SolidApproximation};

/// Local shape of the solid along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    /// Interior dihedral angle below 180°.
    Convex,
    /// Interior dihedral angle above 180°.
    Concave,
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeLabel::Convex => f.write_str("convex"),
            EdgeLabel::Concave => f.write_str("concave"),
        }
    }
}

/// Intermediate values behind one classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDiagnostics {
    /// Normals of the two faces, in face order.
    pub normals: [Dir3; 2],
    /// Sign of `(n1 × n2) · (b − a)`: `1`, `-1`, or `0` for parallel normals.
    pub dihedral_sign: i8,
    /// Angle between the normals in degrees, carrying the dihedral sign.
    pub normal_angle_deg: f64,
    /// Distinct ray hits.
    pub raw_hits: usize,
    /// Hits after collinearity correction.
    pub corrected_count: i64,
}

/// A classified edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeClassification {
    /// First endpoint.
    pub a: Point3,
    /// Second endpoint.
    pub b: Point3,
    /// Convex or concave.
    pub label: EdgeLabel,
    /// The two faces meeting at the edge.
    pub faces: [FaceId; 2],
    /// Supporting values.
    pub diagnostics: EdgeDiagnostics,
}

/// Classifies the edges of a solid.
#[derive(Debug, Clone, Default)]
pub struct ConvexityClassifier {
    config: ConvexityConfig,
}

impl ConvexityClassifier {
    /// Classifier with the given configuration.
    ///
    /// The configuration is validated when a run starts.
    pub fn new(config: ConvexityConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &ConvexityConfig {
        &self.config
    }

    /// Classify every manifold edge of `solid`, using the configured
    /// approximation strategy.
    pub fn classify_edges(&self, solid: &BRepSolid) -> Result<Vec<EdgeClassification>> {
        self.run(solid, None)
    }

    /// Like [`classify_edges`](Self::classify_edges), but checks `cancel`
    /// before each edge and stops with [`ConvexityError::Cancelled`] once it
    /// is set.
    pub fn classify_edges_cancellable(
        &self,
        solid: &BRepSolid,
        cancel: &AtomicBool,
    ) -> Result<Vec<EdgeClassification>> {
        self.run(solid, Some(cancel))
    }

    fn run(&self, solid: &BRepSolid, cancel: Option<&AtomicBool>) -> Result<Vec<EdgeClassification>> {
        let tol = self.config.tolerance();
        match self.config.approximation {
            Approximation::SortedFan => self.classify_edges_with(solid, &SortedFan::new(tol), cancel),
            Approximation::BoundaryFan => {
                self.classify_edges_with(solid, &BoundaryFan::new(tol), cancel)
            }
        }
    }

    /// Classify every manifold edge of `solid` with a caller-chosen face
    /// approximation.
    ///
    /// Results are sorted by endpoints. Edges bounded by fewer or more than
    /// two faces, and edges next to a face without a normal, are skipped.
    #[instrument(skip_all, fields(parallel = self.config.parallel))]
    pub fn classify_edges_with<A: FaceApproximator + ?Sized>(
        &self,
        solid: &BRepSolid,
        approximator: &A,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<EdgeClassification>> {
        self.config.validate()?;
        validate_solid(solid)?;
        let tol = self.config.tolerance();

        let adjacency = build_adjacency(solid, self.config.edge_key_tolerance, &tol);
        let approximation = SolidApproximation::build(solid, approximator);
        let candidates: Vec<&AdjacencyEntry> = adjacency.manifold().collect();
        debug!(
            edges = adjacency.len(),
            manifold = candidates.len(),
            "edge adjacency built"
        );

        let classify = |entry: &&AdjacencyEntry| -> Result<Option<EdgeClassification>> {
            if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                return Err(ConvexityError::Cancelled);
            }
            Ok(self.classify_edge(solid, &approximation, entry, &tol))
        };
        let results: Vec<Option<EdgeClassification>> = if self.config.parallel {
            candidates.par_iter().map(classify).collect::<Result<_>>()?
        } else {
            candidates.iter().map(classify).collect::<Result<_>>()?
        };

        let skipped = results.iter().filter(|r| r.is_none()).count();
        let mut classified: Vec<EdgeClassification> = results.into_iter().flatten().collect();
        classified.sort_by(|x, y| cmp_points(&x.a, &y.a).then_with(|| cmp_points(&x.b, &y.b)));

        let concave = classified
            .iter()
            .filter(|c| c.label == EdgeLabel::Concave)
            .count();
        debug!(
            classified = classified.len(),
            concave,
            convex = classified.len() - concave,
            skipped,
            "classification complete"
        );
        Ok(classified)
    }

    /// Point-in-solid query from `anchor` through `target`, with counts.
    pub fn classify_point(
        &self,
        solid: &BRepSolid,
        anchor: &Point3,
        target: &Point3,
    ) -> Result<PointQuery> {
        self.config.validate()?;
        validate_solid(solid)?;
        let tol = self.config.tolerance();
        let approximation = match self.config.approximation {
            Approximation::SortedFan => SolidApproximation::build(solid, &SortedFan::new(tol)),
            Approximation::BoundaryFan => SolidApproximation::build(solid, &BoundaryFan::new(tol)),
        };
        Ok(approximation.query(anchor, target, &tol))
    }

    fn classify_edge(
        &self,
        solid: &BRepSolid,
        approximation: &SolidApproximation,
        entry: &AdjacencyEntry,
        tol: &Tolerance,
    ) -> Option<EdgeClassification> {
        let &[f1, f2] = entry.faces.as_slice() else {
            return None;
        };
        let normal = |f: FaceId| approximation.face(f).and_then(|p| p.normal.direction()).copied();
        let (Some(n1), Some(n2)) = (normal(f1), normal(f2)) else {
            trace!(a = ?entry.a, b = ?entry.b, "skipping edge next to a face without a normal");
            return None;
        };

        let edge = entry.b - entry.a;
        let dir = Dir3::try_new(edge, DEGENERACY_EPS)?;
        let mid = midpoint(&entry.a, &entry.b);
        let d = self.config.offset_distance;

        let probe = |face: FaceId, n: &Dir3| {
            let step = n.cross(dir.as_ref()) * d;
            let forward = mid + step;
            if face_point_containment(solid, face, &forward, tol) == PointContainment::Inside {
                forward
            } else {
                mid - step
            }
        };
        let target = midpoint(&probe(f1, &n1), &probe(f2, &n2));
        let query = approximation.query(&mid, &target, tol);

        let label = match query.containment {
            Containment::Inside => EdgeLabel::Concave,
            Containment::Outside => EdgeLabel::Convex,
        };

        let triple = n1.cross(n2.as_ref()).dot(&edge);
        let dihedral_sign = if triple.abs() < tol.angular * edge.norm() {
            0
        } else if triple > 0.0 {
            1
        } else {
            -1
        };
        let angle = n1.angle(n2.as_ref()).to_degrees();
        let normal_angle_deg = if dihedral_sign < 0 { -angle } else { angle };

        trace!(a = ?entry.a, b = ?entry.b, %label, raw = query.raw_hits, corrected = query.corrected_count, "edge classified");

        Some(EdgeClassification {
            a: entry.a,
            b: entry.b,
            label,
            faces: [f1, f2],
            diagnostics: EdgeDiagnostics {
                normals: [n1, n2],
                dihedral_sign,
                normal_angle_deg,
                raw_hits: query.raw_hits,
                corrected_count: query.corrected_count,
            },
        })
    }
}

/// Fail unless `solid` names a solid in its own topology that has faces.
pub fn validate_solid(solid: &BRepSolid) -> Result<()> {
    if !solid.topology.solids.contains_key(solid.solid_id) {
        return Err(ConvexityError::InvalidSolid(
            "solid id is not present in the topology".into(),
        ));
    }
    if solid.topology.solid_faces(solid.solid_id).next().is_none() {
        return Err(ConvexityError::InvalidSolid("solid has no faces".into()));
    }
    Ok(())
}

fn cmp_points(p: &Point3, q: &Point3) -> CmpOrdering {
    p.x.total_cmp(&q.x)
        .then(p.y.total_cmp(&q.y))
        .then(p.z.total_cmp(&q.z))
}
