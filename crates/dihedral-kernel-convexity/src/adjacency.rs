//! Edge-to-face adjacency.
//!
//! Faces of a B-rep do not always share vertex entities along a common
//! edge (imported or sewn models often carry duplicate vertices with
//! rounding noise), so edges are matched geometrically: each endpoint is
//! snapped to a grid and the unordered pair of grid cells is the key.
//! Endpoints lying on a cell boundary are also looked up in the
//! neighbouring cells, where a match must be tolerance-equal.

use std::collections::HashMap;

use dihedral_kernel_math::{Point3, PointKey, Tolerance};
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::FaceId;
use tracing::trace;

/// Order-independent key of an edge: the sorted pair of endpoint grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(PointKey, PointKey);

impl EdgeKey {
    /// Key of the edge `a`–`b` at grid cell size `cell`.
    ///
    /// Also reports whether the endpoints had to be swapped into canonical
    /// order.
    pub fn new(a: &Point3, b: &Point3, cell: f64) -> (Self, bool) {
        Self::from_keys(PointKey::snap(a, cell), PointKey::snap(b, cell))
    }

    fn from_keys(ka: PointKey, kb: PointKey) -> (Self, bool) {
        if kb < ka {
            (Self(kb, ka), true)
        } else {
            (Self(ka, kb), false)
        }
    }
}

/// One geometric edge and the distinct faces bounded by it.
#[derive(Debug, Clone)]
pub struct AdjacencyEntry {
    /// The edge's key.
    pub key: EdgeKey,
    /// First endpoint in canonical order.
    pub a: Point3,
    /// Second endpoint in canonical order.
    pub b: Point3,
    /// Distinct faces, in the order they were first seen.
    pub faces: Vec<FaceId>,
}

impl AdjacencyEntry {
    /// Whether exactly two faces meet here.
    pub fn is_manifold(&self) -> bool {
        self.faces.len() == 2
    }
}

/// All edges of a solid keyed by [`EdgeKey`], in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct EdgeAdjacency {
    entries: Vec<AdjacencyEntry>,
    index: HashMap<EdgeKey, usize>,
    cell: f64,
    tol: Tolerance,
}

impl EdgeAdjacency {
    /// All entries, including boundary and non-manifold ones.
    pub fn entries(&self) -> &[AdjacencyEntry] {
        &self.entries
    }

    /// Entries shared by exactly two faces.
    pub fn manifold(&self) -> impl Iterator<Item = &AdjacencyEntry> {
        self.entries.iter().filter(|e| e.is_manifold())
    }

    /// Look up the entry for the edge `a`–`b` (either direction).
    pub fn get(&self, a: &Point3, b: &Point3) -> Option<&AdjacencyEntry> {
        self.find(a, b).map(|i| &self.entries[i])
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no edges were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry matching `a`–`b`.
    ///
    /// The primary key pair matches on its own. Any other candidate pair
    /// must also carry tolerance-equal endpoints, in either order.
    fn find(&self, a: &Point3, b: &Point3) -> Option<usize> {
        let (primary, _) = EdgeKey::new(a, b, self.cell);
        if let Some(&i) = self.index.get(&primary) {
            return Some(i);
        }
        let margin = self.tol.linear;
        let near_a = PointKey::candidates(a, self.cell, margin);
        let near_b = PointKey::candidates(b, self.cell, margin);
        for ka in &near_a {
            for kb in &near_b {
                let (key, _) = EdgeKey::from_keys(*ka, *kb);
                let Some(&i) = self.index.get(&key) else {
                    continue;
                };
                let e = &self.entries[i];
                let eq = |p: &Point3, q: &Point3| self.tol.points_equal(p, q);
                if (eq(&e.a, a) && eq(&e.b, b)) || (eq(&e.a, b) && eq(&e.b, a)) {
                    trace!(?key, "edge matched in a neighbouring cell");
                    return Some(i);
                }
            }
        }
        None
    }
}

/// Collect every non-degenerate edge of `solid` with the faces it bounds.
///
/// Faces are visited in shell order, loops outer-first, half-edges in loop
/// order. Edges shorter than `edge_key_tolerance` (such as the closed
/// single-vertex loop of a circular edge) are skipped. `tol` decides which
/// endpoints on a cell boundary count as the same point.
pub fn build_adjacency(
    solid: &BRepSolid,
    edge_key_tolerance: f64,
    tol: &Tolerance,
) -> EdgeAdjacency {
    let topo = &solid.topology;
    let mut adjacency = EdgeAdjacency {
        cell: edge_key_tolerance,
        tol: *tol,
        ..Default::default()
    };

    for face in topo.solid_faces(solid.solid_id) {
        for loop_id in topo.face_loops(face) {
            for he in topo.loop_half_edges(loop_id) {
                let (v1, v2) = topo.half_edge_endpoints(he);
                if (v2 - v1).norm() < edge_key_tolerance {
                    trace!(?face, "skipping zero-length edge");
                    continue;
                }
                let idx = match adjacency.find(&v1, &v2) {
                    Some(idx) => idx,
                    None => {
                        let (key, swapped) = EdgeKey::new(&v1, &v2, edge_key_tolerance);
                        let (a, b) = if swapped { (v2, v1) } else { (v1, v2) };
                        adjacency.entries.push(AdjacencyEntry {
                            key,
                            a,
                            b,
                            faces: Vec::with_capacity(2),
                        });
                        let idx = adjacency.entries.len() - 1;
                        adjacency.index.insert(key, idx);
                        idx
                    }
                };
                let faces = &mut adjacency.entries[idx].faces;
                if !faces.contains(&face) {
                    faces.push(face);
                }
            }
        }
    }

    adjacency
}
