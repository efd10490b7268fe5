//! Solids to classify: built-in fixtures and JSON polyhedra.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use dihedral_kernel_math::{Point2, Point3};
use dihedral_kernel_primitives::{make_cube, make_cylinder, make_polyhedron, make_prism, BRepSolid};
use serde::Deserialize;

/// Built-in reference solids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fixture {
    /// Unit cube; every edge convex.
    Cube,
    /// 3x3 L-shaped prism with one concave edge.
    LBracket,
    /// Unit block with one vertical edge beveled by 0.4.
    ChamferedCube,
    /// Cylinder; no edge has two planar faces.
    Cylinder,
}

impl Fixture {
    pub fn build(self) -> Result<BRepSolid> {
        let prism = |pts: &[(f64, f64)]| {
            let profile: Vec<Point2> = pts.iter().map(|&(x, y)| Point2::new(x, y)).collect();
            make_prism(&profile, 1.0)
        };
        let solid = match self {
            Fixture::Cube => make_cube(1.0, 1.0, 1.0),
            Fixture::LBracket => prism(&[
                (0.0, 0.0),
                (3.0, 0.0),
                (3.0, 1.0),
                (1.0, 1.0),
                (1.0, 3.0),
                (0.0, 3.0),
            ])?,
            Fixture::ChamferedCube => {
                prism(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.6), (0.6, 1.0), (0.0, 1.0)])?
            }
            Fixture::Cylinder => make_cylinder(1.0, 2.0)?,
        };
        Ok(solid)
    }
}

/// Polyhedron file contents: vertex coordinates and faces as
/// counter-clockwise (seen from outside) vertex index lists.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolyhedronFile {
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
}

impl PolyhedronFile {
    pub fn build(&self) -> Result<BRepSolid> {
        let vertices: Vec<Point3> = self
            .vertices
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();
        make_polyhedron(&vertices, &self.faces).context("invalid polyhedron")
    }
}

pub fn parse_polyhedron(json: &str) -> Result<BRepSolid> {
    let file: PolyhedronFile = serde_json::from_str(json).context("malformed polyhedron JSON")?;
    file.build()
}

pub fn load_polyhedron(path: &Path) -> Result<BRepSolid> {
    let json =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_polyhedron(&json).with_context(|| format!("failed to load {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TETRA: &str = r#"{
        "vertices": [[0,0,0],[1,0,0],[0,1,0],[0,0,1]],
        "faces": [[0,2,1],[0,1,3],[0,3,2],[1,2,3]]
    }"#;

    #[test]
    fn test_fixtures_build() {
        for fixture in [
            Fixture::Cube,
            Fixture::LBracket,
            Fixture::ChamferedCube,
            Fixture::Cylinder,
        ] {
            let solid = fixture.build().unwrap();
            assert!(solid.topology.solid_faces(solid.solid_id).count() >= 3);
        }
    }

    #[test]
    fn test_parse_tetrahedron() {
        let solid = parse_polyhedron(TETRA).unwrap();
        assert_eq!(solid.topology.faces.len(), 4);
        assert_eq!(solid.topology.vertices.len(), 4);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_polyhedron("{").is_err());
        assert!(parse_polyhedron(r#"{"vertices": [], "faces": [], "extra": 1}"#).is_err());
        let bad_index = r#"{"vertices": [[0,0,0],[1,0,0],[0,1,0]], "faces": [[0,1,7]]}"#;
        let err = parse_polyhedron(bad_index).unwrap_err();
        assert!(format!("{err:#}").contains("refers to vertex 7"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TETRA.as_bytes()).unwrap();
        let solid = load_polyhedron(file.path()).unwrap();
        assert_eq!(solid.topology.faces.len(), 4);

        let missing = load_polyhedron(Path::new("/nonexistent/solid.json")).unwrap_err();
        assert!(missing.to_string().contains("failed to read"));
    }
}
