#![warn(missing_docs)]

//! Edge convexity classification for B-rep solids.
//!
//! Every edge shared by exactly two faces is labeled convex or concave. The
//! pipeline is:
//!
//! 1. [`adjacency`]: match edges across faces by tolerance-bucketed endpoints.
//! 2. [`normal`]: one representative normal per face, or a reason why not.
//! 3. [`approx`]: decompose each face into triangles.
//! 4. [`classify`]: step a probe point into both faces from the edge
//!    midpoint and ask [`inside`] whether their midpoint is in the solid,
//!    using a ray-parity count over the triangles ([`ray`]).
//!
//! The whole pass is a pure function of the solid and a
//! [`ConvexityConfig`]; nothing is cached between runs.
//!
//! ```
//! use dihedral_kernel_convexity::{classify_edges, EdgeLabel};
//! use dihedral_kernel_primitives::make_cube;
//!
//! let edges = classify_edges(&make_cube(1.0, 1.0, 1.0)).unwrap();
//! assert_eq!(edges.len(), 12);
//! assert!(edges.iter().all(|e| e.label == EdgeLabel::Convex));
//! ```

pub mod adjacency;
pub mod approx;
pub mod classify;
pub mod config;
pub mod containment;
pub mod error;
pub mod inside;
pub mod normal;
pub mod ray;

pub use adjacency::{build_adjacency, AdjacencyEntry, EdgeAdjacency, EdgeKey};
pub use self::approx::{face_centroid, BoundaryFan, BoundedPlane, FaceApproximator, SortedFan};
pub use classify::{
    validate_solid, ConvexityClassifier, EdgeClassification, EdgeDiagnostics, EdgeLabel,
};
pub use config::{Approximation, ConvexityConfig};
pub use containment::{face_point_containment, PointContainment};
pub use error::{ConvexityError, Result};
pub use inside::{Containment, PointQuery, SolidApproximation};
pub use normal::{estimate_normal, face_normal, NormalEstimate, NormalUnavailable};
pub use ray::Ray;

use dihedral_kernel_math::Point3;
use dihedral_kernel_primitives::BRepSolid;

/// Classify every manifold edge of `solid` with the default configuration.
pub fn classify_edges(solid: &BRepSolid) -> Result<Vec<EdgeClassification>> {
    ConvexityClassifier::default().classify_edges(solid)
}

/// Whether `target` is inside `solid`, by ray parity from `anchor` through
/// `target`, with the default configuration.
pub fn classify_point(solid: &BRepSolid, anchor: &Point3, target: &Point3) -> Result<Containment> {
    ConvexityClassifier::default()
        .classify_point(solid, anchor, target)
        .map(|q| q.containment)
}
