#![warn(missing_docs)]

//! Half-edge B-rep topology for the dihedral kernel.
//!
//! Entities live in [`slotmap`] arenas and refer to each other by typed keys.
//! A solid owns shells, a shell owns faces, a face owns one outer loop and
//! any number of inner loops, and a loop is a closed cycle of half-edges.
//! Two twin half-edges (one per adjacent face) form an [`Edge`].
//!
//! The analysis passes only read topology; construction goes through the
//! `add_*` methods, which keep the back-references consistent.

use dihedral_kernel_math::Point3;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Key of a [`Vertex`].
    pub struct VertexId;
    /// Key of a [`HalfEdge`].
    pub struct HalfEdgeId;
    /// Key of an [`Edge`].
    pub struct EdgeId;
    /// Key of a [`Loop`].
    pub struct LoopId;
    /// Key of a [`Face`].
    pub struct FaceId;
    /// Key of a [`Shell`].
    pub struct ShellId;
    /// Key of a [`Solid`].
    pub struct SolidId;
}

/// Face orientation relative to its underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Face normal agrees with the surface normal.
    Forward,
    /// Face normal is the negated surface normal.
    Reversed,
}

/// Whether a shell bounds the solid from outside or is a void.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// The outer boundary.
    Outer,
    /// An internal cavity.
    Void,
}

/// A topological vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in model space.
    pub point: Point3,
    /// One outgoing half-edge, if any.
    pub half_edge: Option<HalfEdgeId>,
}

/// A directed side of an edge, owned by one loop.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    /// Start vertex.
    pub origin: VertexId,
    /// The opposite half-edge on the neighboring face.
    pub twin: Option<HalfEdgeId>,
    /// Next half-edge in the loop.
    pub next: Option<HalfEdgeId>,
    /// Previous half-edge in the loop.
    pub prev: Option<HalfEdgeId>,
    /// Owning edge.
    pub edge: Option<EdgeId>,
    /// Owning loop.
    pub loop_id: Option<LoopId>,
}

/// An edge joining two twin half-edges.
#[derive(Debug, Clone)]
pub struct Edge {
    /// One of the two half-edges.
    pub half_edge: HalfEdgeId,
}

/// A closed cycle of half-edges.
#[derive(Debug, Clone)]
pub struct Loop {
    /// First half-edge of the cycle.
    pub half_edge: HalfEdgeId,
    /// Owning face.
    pub face: Option<FaceId>,
}

/// A bounded region of a surface.
#[derive(Debug, Clone)]
pub struct Face {
    /// Outer boundary.
    pub outer_loop: LoopId,
    /// Holes.
    pub inner_loops: Vec<LoopId>,
    /// Index into the geometry store's surfaces.
    pub surface_index: usize,
    /// Orientation relative to the surface.
    pub orientation: Orientation,
    /// Owning shell.
    pub shell: Option<ShellId>,
}

/// A connected set of faces.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Faces in construction order.
    pub faces: Vec<FaceId>,
    /// Outer boundary or void.
    pub shell_type: ShellType,
    /// Owning solid.
    pub solid: Option<SolidId>,
}

/// A solid bounded by one outer shell and optional voids.
#[derive(Debug, Clone)]
pub struct Solid {
    /// The outer boundary shell.
    pub outer_shell: ShellId,
    /// Cavities.
    pub inner_shells: Vec<ShellId>,
}

/// Arena storage for all topological entities of one model.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Vertices.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Half-edges.
    pub half_edges: SlotMap<HalfEdgeId, HalfEdge>,
    /// Edges.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Loops.
    pub loops: SlotMap<LoopId, Loop>,
    /// Faces.
    pub faces: SlotMap<FaceId, Face>,
    /// Shells.
    pub shells: SlotMap<ShellId, Shell>,
    /// Solids.
    pub solids: SlotMap<SolidId, Solid>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex at `point`.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            point,
            half_edge: None,
        })
    }

    /// Add a dangling half-edge starting at `origin`.
    pub fn add_half_edge(&mut self, origin: VertexId) -> HalfEdgeId {
        let he = self.half_edges.insert(HalfEdge {
            origin,
            twin: None,
            next: None,
            prev: None,
            edge: None,
            loop_id: None,
        });
        if let Some(v) = self.vertices.get_mut(origin) {
            v.half_edge.get_or_insert(he);
        }
        he
    }

    /// Link `hes` into a closed cycle and wrap it in a loop.
    ///
    /// A single half-edge becomes a self-loop (a closed curve such as a circle).
    ///
    /// # Panics
    ///
    /// Panics if `hes` is empty.
    pub fn add_loop(&mut self, hes: &[HalfEdgeId]) -> LoopId {
        assert!(!hes.is_empty(), "a loop needs at least one half-edge");
        let loop_id = self.loops.insert(Loop {
            half_edge: hes[0],
            face: None,
        });
        let n = hes.len();
        for (i, &he) in hes.iter().enumerate() {
            let next = hes[(i + 1) % n];
            let prev = hes[(i + n - 1) % n];
            let h = &mut self.half_edges[he];
            h.next = Some(next);
            h.prev = Some(prev);
            h.loop_id = Some(loop_id);
        }
        loop_id
    }

    /// Create a face bounded by `outer_loop`.
    pub fn add_face(
        &mut self,
        outer_loop: LoopId,
        surface_index: usize,
        orientation: Orientation,
    ) -> FaceId {
        let face = self.faces.insert(Face {
            outer_loop,
            inner_loops: Vec::new(),
            surface_index,
            orientation,
            shell: None,
        });
        self.loops[outer_loop].face = Some(face);
        face
    }

    /// Attach a hole loop to `face`.
    pub fn add_inner_loop(&mut self, face: FaceId, inner: LoopId) {
        self.faces[face].inner_loops.push(inner);
        self.loops[inner].face = Some(face);
    }

    /// Pair two half-edges as twins of one edge.
    pub fn add_edge(&mut self, he1: HalfEdgeId, he2: HalfEdgeId) -> EdgeId {
        let edge = self.edges.insert(Edge { half_edge: he1 });
        self.half_edges[he1].twin = Some(he2);
        self.half_edges[he1].edge = Some(edge);
        self.half_edges[he2].twin = Some(he1);
        self.half_edges[he2].edge = Some(edge);
        edge
    }

    /// Group faces into a shell.
    pub fn add_shell(&mut self, faces: Vec<FaceId>, shell_type: ShellType) -> ShellId {
        let shell = self.shells.insert(Shell {
            faces,
            shell_type,
            solid: None,
        });
        for &f in &self.shells[shell].faces {
            self.faces[f].shell = Some(shell);
        }
        shell
    }

    /// Create a solid bounded by `outer_shell`.
    pub fn add_solid(&mut self, outer_shell: ShellId) -> SolidId {
        let solid = self.solids.insert(Solid {
            outer_shell,
            inner_shells: Vec::new(),
        });
        self.shells[outer_shell].solid = Some(solid);
        solid
    }

    /// Iterate the half-edges of a loop, starting at its first half-edge.
    ///
    /// Stops early on a broken `next` link, and never yields more half-edges
    /// than the topology holds.
    pub fn loop_half_edges(&self, loop_id: LoopId) -> LoopIter<'_> {
        let start = self.loops.get(loop_id).map(|l| l.half_edge);
        LoopIter {
            topo: self,
            start,
            current: start,
            remaining: self.half_edges.len(),
        }
    }

    /// Destination vertex of a half-edge (the origin of its successor).
    ///
    /// An unlinked half-edge ends where it starts.
    pub fn half_edge_dest(&self, he: HalfEdgeId) -> VertexId {
        let h = &self.half_edges[he];
        h.next
            .and_then(|n| self.half_edges.get(n))
            .map_or(h.origin, |n| n.origin)
    }

    /// Start and end positions of a half-edge.
    pub fn half_edge_endpoints(&self, he: HalfEdgeId) -> (Point3, Point3) {
        let origin = self.half_edges[he].origin;
        let dest = self.half_edge_dest(he);
        (self.vertices[origin].point, self.vertices[dest].point)
    }

    /// Loops of a face: the outer loop first, then the holes in order.
    pub fn face_loops(&self, face: FaceId) -> impl Iterator<Item = LoopId> + '_ {
        self.faces.get(face).into_iter().flat_map(|f| {
            std::iter::once(f.outer_loop).chain(f.inner_loops.iter().copied())
        })
    }

    /// Faces of a solid in shell order: outer shell first, then voids.
    ///
    /// Yields nothing if `solid` is not in this topology.
    pub fn solid_faces(&self, solid: SolidId) -> impl Iterator<Item = FaceId> + '_ {
        self.solids
            .get(solid)
            .into_iter()
            .flat_map(|s| std::iter::once(s.outer_shell).chain(s.inner_shells.iter().copied()))
            .filter_map(|sh| self.shells.get(sh))
            .flat_map(|sh| sh.faces.iter().copied())
    }

    /// Origin points of a loop's half-edges, in loop order.
    pub fn loop_points(&self, loop_id: LoopId) -> Vec<Point3> {
        self.loop_half_edges(loop_id)
            .map(|he| self.vertices[self.half_edges[he].origin].point)
            .collect()
    }
}

/// Iterator over the half-edges of one loop.
#[derive(Debug, Clone)]
pub struct LoopIter<'a> {
    topo: &'a Topology,
    start: Option<HalfEdgeId>,
    current: Option<HalfEdgeId>,
    remaining: usize,
}

impl Iterator for LoopIter<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        if self.remaining == 0 {
            return None;
        }
        let he = self.current?;
        self.remaining -= 1;
        let next = self.topo.half_edges.get(he).and_then(|h| h.next);
        self.current = if next == self.start { None } else { next };
        Some(he)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(topo: &mut Topology) -> (FaceId, [VertexId; 3]) {
        let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let hes: Vec<_> = [v0, v1, v2].iter().map(|&v| topo.add_half_edge(v)).collect();
        let l = topo.add_loop(&hes);
        (topo.add_face(l, 0, Orientation::Forward), [v0, v1, v2])
    }

    #[test]
    fn test_loop_iteration() {
        let mut topo = Topology::new();
        let (face, verts) = triangle(&mut topo);
        let outer = topo.faces[face].outer_loop;
        let origins: Vec<_> = topo
            .loop_half_edges(outer)
            .map(|he| topo.half_edges[he].origin)
            .collect();
        assert_eq!(origins, verts.to_vec());
    }

    #[test]
    fn test_half_edge_endpoints_wrap_around() {
        let mut topo = Topology::new();
        let (face, _) = triangle(&mut topo);
        let outer = topo.faces[face].outer_loop;
        let last = topo.loop_half_edges(outer).last().unwrap();
        let (a, b) = topo.half_edge_endpoints(last);
        assert_eq!(a, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(b, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_self_loop_has_coincident_endpoints() {
        let mut topo = Topology::new();
        let v = topo.add_vertex(Point3::new(2.0, 0.0, 0.0));
        let he = topo.add_half_edge(v);
        let l = topo.add_loop(&[he]);
        assert_eq!(topo.loop_half_edges(l).count(), 1);
        let (a, b) = topo.half_edge_endpoints(he);
        assert_eq!(a, b);
    }

    #[test]
    fn test_face_loops_outer_first() {
        let mut topo = Topology::new();
        let (face, _) = triangle(&mut topo);
        let v = topo.add_vertex(Point3::new(0.2, 0.2, 0.0));
        let he = topo.add_half_edge(v);
        let hole = topo.add_loop(&[he]);
        topo.add_inner_loop(face, hole);
        let loops: Vec<_> = topo.face_loops(face).collect();
        assert_eq!(loops, vec![topo.faces[face].outer_loop, hole]);
        assert_eq!(topo.loops[hole].face, Some(face));
    }

    #[test]
    fn test_solid_faces() {
        let mut topo = Topology::new();
        let (f1, _) = triangle(&mut topo);
        let (f2, _) = triangle(&mut topo);
        let shell = topo.add_shell(vec![f1, f2], ShellType::Outer);
        let solid = topo.add_solid(shell);
        assert_eq!(topo.solid_faces(solid).collect::<Vec<_>>(), vec![f1, f2]);
        assert_eq!(topo.faces[f2].shell, Some(shell));

        let mut other = Topology::new();
        let (g, _) = triangle(&mut other);
        let sh = other.add_shell(vec![g], ShellType::Outer);
        let foreign = other.add_solid(sh);
        other.solids.remove(foreign);
        assert_eq!(other.solid_faces(foreign).count(), 0);
    }

    #[test]
    fn test_twins() {
        let mut topo = Topology::new();
        let a = topo.add_vertex(Point3::origin());
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let he1 = topo.add_half_edge(a);
        let he2 = topo.add_half_edge(b);
        let e = topo.add_edge(he1, he2);
        assert_eq!(topo.half_edges[he1].twin, Some(he2));
        assert_eq!(topo.half_edges[he2].edge, Some(e));
        // unlinked half-edges end where they start
        assert_eq!(topo.half_edge_dest(he1), a);
    }

    #[test]
    fn test_loop_points() {
        let mut topo = Topology::new();
        let (face, _) = triangle(&mut topo);
        let pts = topo.loop_points(topo.faces[face].outer_loop);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1], Point3::new(1.0, 0.0, 0.0));
    }
}
