#![warn(missing_docs)]

//! B-rep solid construction for the dihedral kernel.
//!
//! Builds valid topology + geometry for the solids the analysis passes are
//! exercised on: boxes, extruded polygon profiles, arbitrary planar-faced
//! polyhedra, and a cylinder (whose circular edges are closed self-loops).

use std::collections::HashMap;

use dihedral_kernel_geom::{CylinderSurface, GeometryStore, Plane};
use dihedral_kernel_math::{Point2, Point3, Transform, Vec3, DEGENERACY_EPS};
use dihedral_kernel_topo::{HalfEdgeId, Orientation, ShellType, SolidId, Topology, VertexId};
use thiserror::Error;

/// Errors from solid construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrimitiveError {
    /// A face lists fewer than three vertices.
    #[error("face {face} has {count} vertices, need at least 3")]
    TooFewVertices {
        /// Face index in the input.
        face: usize,
        /// Number of vertex indices given.
        count: usize,
    },

    /// A face refers to a vertex that does not exist.
    #[error("face {face} refers to vertex {index}, but only {count} vertices exist")]
    VertexOutOfRange {
        /// Face index in the input.
        face: usize,
        /// Offending vertex index.
        index: usize,
        /// Number of vertices.
        count: usize,
    },

    /// A face has no well-defined normal (zero area or collinear vertices).
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// Face index in the input.
        face: usize,
    },

    /// The same directed edge is used by two faces.
    #[error("directed edge {from} -> {to} appears in more than one face")]
    NonManifold {
        /// Start vertex index.
        from: usize,
        /// End vertex index.
        to: usize,
    },

    /// A size parameter is not a positive finite number.
    #[error("invalid dimension {name} = {value}")]
    InvalidDimension {
        /// Parameter name.
        name: &'static str,
        /// Given value.
        value: f64,
    },
}

/// Result type for solid construction.
pub type Result<T> = std::result::Result<T, PrimitiveError>;

/// Result of constructing a B-rep solid: topology + geometry.
#[derive(Debug, Clone)]
pub struct BRepSolid {
    /// The topological structure.
    pub topology: Topology,
    /// The geometric data (surfaces).
    pub geometry: GeometryStore,
    /// The solid entity.
    pub solid_id: SolidId,
}

impl BRepSolid {
    /// A copy of this solid with every vertex and surface transformed.
    ///
    /// Loop orientation is kept as is, so the result is only well-formed for
    /// transforms that preserve handedness (rigid motions, positive scales).
    pub fn transformed(&self, t: &Transform) -> Self {
        let mut topology = self.topology.clone();
        for v in topology.vertices.values_mut() {
            v.point = t.apply_point(&v.point);
        }
        Self {
            topology,
            geometry: self.geometry.transformed(t),
            solid_id: self.solid_id,
        }
    }
}

fn check_dimension(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PrimitiveError::InvalidDimension { name, value })
    }
}

/// Pair every half-edge with the half-edge running the opposite way.
///
/// Half-edges without an opposite stay unpaired (open boundary).
fn pair_twins<K>(topo: &mut Topology, he_map: &HashMap<(K, K), HalfEdgeId>)
where
    K: Copy + Eq + std::hash::Hash + Ord,
{
    let mut keys: Vec<_> = he_map.keys().copied().collect();
    keys.sort();
    for (from, to) in keys {
        if from > to {
            continue;
        }
        if let Some(&he2) = he_map.get(&(to, from)) {
            topo.add_edge(he_map[&(from, to)], he2);
        }
    }
}

/// Newell normal of a closed polygon (area-weighted, not normalized).
fn newell_normal(points: &[Point3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    n
}

/// Build a B-rep box (cuboid) with corner at origin and dimensions `(sx, sy, sz)`.
///
/// The box has 6 planar faces, 12 edges, and 8 vertices.
/// Vertex layout (corner-aligned at origin):
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
pub fn make_cube(sx: f64, sy: f64, sz: f64) -> BRepSolid {
    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let v1 = topo.add_vertex(Point3::new(sx, 0.0, 0.0));
    let v2 = topo.add_vertex(Point3::new(sx, sy, 0.0));
    let v3 = topo.add_vertex(Point3::new(0.0, sy, 0.0));
    let v4 = topo.add_vertex(Point3::new(0.0, 0.0, sz));
    let v5 = topo.add_vertex(Point3::new(sx, 0.0, sz));
    let v6 = topo.add_vertex(Point3::new(sx, sy, sz));
    let v7 = topo.add_vertex(Point3::new(0.0, sy, sz));

    // CCW vertex order viewed from outside; plane normal = x_dir × y_dir points outward.
    let face_defs: [([VertexId; 4], Point3, Vec3, Vec3); 6] = [
        // Bottom (z=0): -Z
        ([v0, v3, v2, v1], Point3::new(0.0, 0.0, 0.0), Vec3::y(), Vec3::x()),
        // Top (z=sz): +Z
        ([v4, v5, v6, v7], Point3::new(0.0, 0.0, sz), Vec3::x(), Vec3::y()),
        // Front (y=0): -Y
        ([v0, v1, v5, v4], Point3::new(0.0, 0.0, 0.0), Vec3::z(), Vec3::x()),
        // Back (y=sy): +Y
        ([v2, v3, v7, v6], Point3::new(0.0, sy, 0.0), Vec3::x(), Vec3::z()),
        // Left (x=0): -X
        ([v0, v4, v7, v3], Point3::new(0.0, 0.0, 0.0), Vec3::z(), Vec3::y()),
        // Right (x=sx): +X
        ([v1, v2, v6, v5], Point3::new(sx, 0.0, 0.0), Vec3::y(), Vec3::z()),
    ];

    let mut he_map: HashMap<(VertexId, VertexId), HalfEdgeId> = HashMap::new();
    let mut all_faces = Vec::new();

    for (verts, plane_origin, x_dir, y_dir) in face_defs.iter() {
        let surface_idx = geom.add_surface(Box::new(Plane::new(*plane_origin, *x_dir, *y_dir)));

        let mut hes = Vec::new();
        for j in 0..4 {
            let he = topo.add_half_edge(verts[j]);
            hes.push(he);
            he_map.insert((verts[j], verts[(j + 1) % 4]), he);
        }

        let loop_id = topo.add_loop(&hes);
        all_faces.push(topo.add_face(loop_id, surface_idx, Orientation::Forward));
    }

    pair_twins(&mut topo, &he_map);

    let shell = topo.add_shell(all_faces, ShellType::Outer);
    let solid_id = topo.add_solid(shell);

    BRepSolid {
        topology: topo,
        geometry: geom,
        solid_id,
    }
}

/// Build a closed polyhedron from a vertex list and planar faces.
///
/// Each face lists vertex indices counter-clockwise as seen from outside
/// the solid. Every face gets its own [`Plane`] whose normal follows that
/// winding; half-edges running in opposite directions between the same two
/// vertices become twins.
pub fn make_polyhedron(vertices: &[Point3], faces: &[Vec<usize>]) -> Result<BRepSolid> {
    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let vids: Vec<VertexId> = vertices.iter().map(|&p| topo.add_vertex(p)).collect();
    let mut he_map: HashMap<(usize, usize), HalfEdgeId> = HashMap::new();
    let mut all_faces = Vec::with_capacity(faces.len());

    for (fi, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(PrimitiveError::TooFewVertices {
                face: fi,
                count: face.len(),
            });
        }
        if let Some(&index) = face.iter().find(|&&i| i >= vertices.len()) {
            return Err(PrimitiveError::VertexOutOfRange {
                face: fi,
                index,
                count: vertices.len(),
            });
        }

        let pts: Vec<Point3> = face.iter().map(|&i| vertices[i]).collect();
        let normal = newell_normal(&pts);
        let x_dir = pts
            .iter()
            .zip(pts.iter().cycle().skip(1))
            .map(|(a, b)| b - a)
            .find(|d| d.norm() > DEGENERACY_EPS);
        let x_dir = match x_dir {
            Some(d) if normal.norm() > DEGENERACY_EPS => d,
            _ => return Err(PrimitiveError::DegenerateFace { face: fi }),
        };
        let y_dir = normal.cross(&x_dir);
        let surface_idx = geom.add_surface(Box::new(Plane::new(pts[0], x_dir, y_dir)));

        let mut hes = Vec::with_capacity(face.len());
        for (j, &from) in face.iter().enumerate() {
            let to = face[(j + 1) % face.len()];
            let he = topo.add_half_edge(vids[from]);
            if he_map.insert((from, to), he).is_some() {
                return Err(PrimitiveError::NonManifold { from, to });
            }
            hes.push(he);
        }
        let loop_id = topo.add_loop(&hes);
        all_faces.push(topo.add_face(loop_id, surface_idx, Orientation::Forward));
    }

    pair_twins(&mut topo, &he_map);

    let shell = topo.add_shell(all_faces, ShellType::Outer);
    let solid_id = topo.add_solid(shell);

    Ok(BRepSolid {
        topology: topo,
        geometry: geom,
        solid_id,
    })
}

/// Extrude a simple polygon profile in the XY plane along +Z by `height`.
///
/// The profile may be given in either winding. The result has one bottom
/// face, one top face, and one quad side face per profile edge.
pub fn make_prism(profile: &[Point2], height: f64) -> Result<BRepSolid> {
    check_dimension("height", height)?;
    let n = profile.len();
    if n < 3 {
        return Err(PrimitiveError::TooFewVertices { face: 0, count: n });
    }

    let twice_area: f64 = (0..n)
        .map(|i| {
            let (p, q) = (profile[i], profile[(i + 1) % n]);
            p.x * q.y - q.x * p.y
        })
        .sum();
    if twice_area.abs() < DEGENERACY_EPS {
        return Err(PrimitiveError::DegenerateFace { face: 0 });
    }
    let ccw: Vec<Point2> = if twice_area > 0.0 {
        profile.to_vec()
    } else {
        profile.iter().rev().copied().collect()
    };

    // Vertices 0..n on the bottom, n..2n on the top.
    let mut vertices: Vec<Point3> = ccw.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect();
    vertices.extend(ccw.iter().map(|p| Point3::new(p.x, p.y, height)));

    let mut faces = Vec::with_capacity(n + 2);
    faces.push((0..n).rev().collect());
    faces.push((n..2 * n).collect());
    for i in 0..n {
        let j = (i + 1) % n;
        faces.push(vec![i, j, n + j, n + i]);
    }

    make_polyhedron(&vertices, &faces)
}

/// Build a B-rep cylinder with the given radius and height, axis along Z.
///
/// The cylinder has:
/// - 1 cylindrical lateral face
/// - 2 planar cap faces (top and bottom)
/// - 2 circular edges (top and bottom), each a closed single-vertex loop
/// - 1 seam edge at u=0, used twice by the lateral face
pub fn make_cylinder(radius: f64, height: f64) -> Result<BRepSolid> {
    check_dimension("radius", radius)?;
    check_dimension("height", height)?;

    let mut topo = Topology::new();
    let mut geom = GeometryStore::new();

    let v_bot = topo.add_vertex(Point3::new(radius, 0.0, 0.0));
    let v_top = topo.add_vertex(Point3::new(radius, 0.0, height));

    let cyl_idx = geom.add_surface(Box::new(CylinderSurface::new(radius)));
    // Reversed Y so the bottom normal points -Z
    let bot_idx = geom.add_surface(Box::new(Plane::new(
        Point3::origin(),
        Vec3::x(),
        -Vec3::y(),
    )));
    let top_idx = geom.add_surface(Box::new(Plane::new(
        Point3::new(0.0, 0.0, height),
        Vec3::x(),
        Vec3::y(),
    )));

    // Lateral loop: bottom circle, seam up, top circle, seam down.
    let he_bot_lat = topo.add_half_edge(v_bot);
    let he_seam_up = topo.add_half_edge(v_bot);
    let he_top_lat = topo.add_half_edge(v_top);
    let he_seam_down = topo.add_half_edge(v_top);
    let lat_loop = topo.add_loop(&[he_bot_lat, he_seam_up, he_top_lat, he_seam_down]);
    let lat_face = topo.add_face(lat_loop, cyl_idx, Orientation::Forward);

    let he_bot_cap = topo.add_half_edge(v_bot);
    let bot_loop = topo.add_loop(&[he_bot_cap]);
    let bot_face = topo.add_face(bot_loop, bot_idx, Orientation::Forward);

    let he_top_cap = topo.add_half_edge(v_top);
    let top_loop = topo.add_loop(&[he_top_cap]);
    let top_face = topo.add_face(top_loop, top_idx, Orientation::Forward);

    topo.add_edge(he_bot_lat, he_bot_cap);
    topo.add_edge(he_top_lat, he_top_cap);
    topo.add_edge(he_seam_up, he_seam_down);

    let shell = topo.add_shell(vec![lat_face, bot_face, top_face], ShellType::Outer);
    let solid_id = topo.add_solid(shell);

    Ok(BRepSolid {
        topology: topo,
        geometry: geom,
        solid_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dihedral_kernel_geom::SurfaceKind;

    fn l_profile() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 3.0),
            Point2::new(0.0, 3.0),
        ]
    }

    #[test]
    fn test_cube_topology() {
        let brep = make_cube(10.0, 20.0, 30.0);
        let topo = &brep.topology;
        assert_eq!(topo.vertices.len(), 8);
        assert_eq!(topo.faces.len(), 6);
        // 6 faces × 4 half-edges = 24 half-edges
        assert_eq!(topo.half_edges.len(), 24);
        assert_eq!(topo.edges.len(), 12);
        assert_eq!(topo.shells.len(), 1);
        assert_eq!(topo.solids.len(), 1);
        assert!(topo.half_edges.values().all(|he| he.twin.is_some()));
    }

    #[test]
    fn test_cube_geometry() {
        let brep = make_cube(10.0, 20.0, 30.0);
        assert_eq!(brep.geometry.surfaces.len(), 6);
        for s in &brep.geometry.surfaces {
            assert_eq!(s.surface_type(), SurfaceKind::Plane);
        }
    }

    #[test]
    fn test_cube_vertex_positions() {
        let brep = make_cube(10.0, 20.0, 30.0);
        let positions: Vec<_> = brep.topology.vertices.values().map(|v| v.point).collect();
        let min_x = positions.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let max_x = positions.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!((min_x - 0.0).abs() < 1e-12);
        assert!((max_x - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_prism_topology() {
        let brep = make_prism(&l_profile(), 1.0).unwrap();
        let topo = &brep.topology;
        assert_eq!(topo.vertices.len(), 12);
        assert_eq!(topo.faces.len(), 8);
        assert_eq!(topo.edges.len(), 18);
        assert!(topo.half_edges.values().all(|he| he.twin.is_some()));
    }

    #[test]
    fn test_prism_normals_point_outward() {
        // clockwise input is reoriented
        let profile = vec![
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 2.0),
            Point2::new(3.0, 2.0),
            Point2::new(3.0, 0.0),
        ];
        let brep = make_prism(&profile, 2.0).unwrap();
        let centroid = Point3::new(1.5, 1.0, 1.0);
        for face in brep.topology.faces.values() {
            let plane = brep.geometry.surfaces[face.surface_index]
                .as_any()
                .downcast_ref::<Plane>()
                .unwrap();
            let pts = brep.topology.loop_points(face.outer_loop);
            let center = pts.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / pts.len() as f64;
            let outward = center - centroid.coords;
            assert!(outward.dot(plane.normal_dir.as_ref()) > 0.0);
        }
    }

    #[test]
    fn test_prism_rejects_bad_input() {
        let line = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert_eq!(
            make_prism(&line, 1.0).unwrap_err(),
            PrimitiveError::DegenerateFace { face: 0 }
        );
        assert!(matches!(
            make_prism(&l_profile(), 0.0),
            Err(PrimitiveError::InvalidDimension { name: "height", .. })
        ));
        assert!(matches!(
            make_prism(&l_profile()[..2], 1.0),
            Err(PrimitiveError::TooFewVertices { count: 2, .. })
        ));
    }

    #[test]
    fn test_polyhedron_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![1, 2, 3], vec![0, 3, 2]];
        let brep = make_polyhedron(&vertices, &faces).unwrap();
        assert_eq!(brep.topology.faces.len(), 4);
        assert_eq!(brep.topology.edges.len(), 6);
    }

    #[test]
    fn test_polyhedron_errors() {
        let vertices = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            make_polyhedron(&vertices, &[vec![0, 1, 5]]),
            Err(PrimitiveError::VertexOutOfRange { index: 5, .. })
        ));
        let vertices = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(matches!(
            make_polyhedron(&vertices, &[vec![0, 1, 2]]),
            Err(PrimitiveError::DegenerateFace { face: 0 })
        ));
        let vertices = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(
            make_polyhedron(&vertices, &[vec![0, 1, 2], vec![0, 1, 2]]),
            Err(PrimitiveError::NonManifold { from: 0, to: 1 })
        ));
    }

    #[test]
    fn test_open_polyhedron_leaves_boundary_unpaired() {
        let vertices = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let brep = make_polyhedron(&vertices, &[vec![0, 1, 2]]).unwrap();
        assert_eq!(brep.topology.edges.len(), 0);
    }

    #[test]
    fn test_cylinder_topology() {
        let brep = make_cylinder(5.0, 10.0).unwrap();
        let topo = &brep.topology;
        assert_eq!(topo.vertices.len(), 2); // top + bottom seam points
        assert_eq!(topo.faces.len(), 3); // lateral + top + bottom
        assert_eq!(topo.edges.len(), 3); // 2 circles + 1 seam
        assert_eq!(
            brep.geometry.surfaces[0].surface_type(),
            SurfaceKind::Cylinder
        );
        assert!(make_cylinder(-1.0, 1.0).is_err());
    }

    #[test]
    fn test_transformed() {
        let brep = make_cube(1.0, 1.0, 1.0);
        let moved = brep.transformed(&Transform::translation(5.0, 0.0, 0.0));
        let min_x = moved
            .topology
            .vertices
            .values()
            .map(|v| v.point.x)
            .fold(f64::MAX, f64::min);
        assert_relative_eq!(min_x, 5.0, epsilon = 1e-12);
        let plane = moved.geometry.surfaces[5]
            .as_any()
            .downcast_ref::<Plane>()
            .unwrap();
        assert_relative_eq!(plane.origin.x, 6.0, epsilon = 1e-12);
    }
}
