//! Line markup for classified edges.
//!
//! Every classified edge becomes one colored line. The set remembers what it
//! has emitted so a later run can clear the previous markup first.

use std::fmt;

use dihedral_kernel_convexity::{EdgeClassification, EdgeLabel};
use serde::Serialize;

/// Color index for concave edges (red).
pub const COLOR_CONCAVE: u8 = 1;
/// Color index for convex edges (green).
pub const COLOR_CONVEX: u8 = 3;

/// Color index for an edge label.
pub fn color_index(label: EdgeLabel) -> u8 {
    match label {
        EdgeLabel::Concave => COLOR_CONCAVE,
        EdgeLabel::Convex => COLOR_CONVEX,
    }
}

/// One emitted line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkupLine {
    pub id: usize,
    pub start: [f64; 3],
    pub end: [f64; 3],
    pub color_index: u8,
    pub label: String,
    /// Signed angle between the two face normals, degrees.
    pub normal_angle_deg: f64,
}

impl fmt::Display for MarkupLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x0, y0, z0] = self.start;
        let [x1, y1, z1] = self.end;
        write!(
            f,
            "line {:>4}  ({x0:.4}, {y0:.4}, {z0:.4}) -> ({x1:.4}, {y1:.4}, {z1:.4})  color {}  {}",
            self.id, self.color_index, self.label
        )
    }
}

/// Registry of lines emitted so far.
#[derive(Debug, Default)]
pub struct MarkupSet {
    lines: Vec<MarkupLine>,
    next_id: usize,
}

impl MarkupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a line for `edge` and return its id.
    pub fn draw(&mut self, edge: &EdgeClassification) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.lines.push(MarkupLine {
            id,
            start: [edge.a.x, edge.a.y, edge.a.z],
            end: [edge.b.x, edge.b.y, edge.b.z],
            color_index: color_index(edge.label),
            label: edge.label.to_string(),
            normal_angle_deg: edge.diagnostics.normal_angle_deg,
        });
        id
    }

    /// Draw every edge in order.
    pub fn draw_all<'a>(&mut self, edges: impl IntoIterator<Item = &'a EdgeClassification>) {
        for edge in edges {
            self.draw(edge);
        }
    }

    pub fn lines(&self) -> &[MarkupLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Forget every drawn line; returns how many were removed.
    ///
    /// Ids keep increasing across clears.
    pub fn clear(&mut self) -> usize {
        let removed = self.lines.len();
        self.lines.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dihedral_kernel_convexity::classify_edges;
    use dihedral_kernel_primitives::make_cube;

    #[test]
    fn test_cube_markup() {
        let edges = classify_edges(&make_cube(1.0, 1.0, 1.0)).unwrap();
        let mut set = MarkupSet::new();
        set.draw_all(&edges);
        assert_eq!(set.len(), 12);
        assert!(set.lines().iter().all(|l| l.color_index == COLOR_CONVEX));
        assert_eq!(set.lines()[0].start, [0.0, 0.0, 0.0]);
        assert!(set.lines()[0].to_string().contains("convex"));
    }

    #[test]
    fn test_clear_keeps_ids_unique() {
        let edges = classify_edges(&make_cube(1.0, 1.0, 1.0)).unwrap();
        let mut set = MarkupSet::new();
        set.draw_all(&edges);
        assert_eq!(set.clear(), 12);
        assert!(set.is_empty());
        assert_eq!(set.draw(&edges[0]), 12);
        assert_eq!(set.clear(), 1);
        assert_eq!(set.clear(), 0);
    }

    #[test]
    fn test_color_mapping() {
        assert_eq!(color_index(EdgeLabel::Concave), 1);
        assert_eq!(color_index(EdgeLabel::Convex), 3);
    }
}
