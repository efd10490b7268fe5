//! Run configuration.

use dihedral_kernel_math::Tolerance;
use serde::{Deserialize, Serialize};

use crate::error::{ConvexityError, Result};

/// How each face is decomposed into triangles for ray casting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approximation {
    /// Lexicographically sorted boundary points, one triangle per consecutive triple.
    ///
    /// Only covers convex faces whose sorted order happens to walk the
    /// boundary; a tilted quadrilateral such as a chamfer cap is misread.
    SortedFan,
    /// Ear-clipped outer loop in boundary order.
    #[default]
    BoundaryFan,
}

/// Tolerances and options for a classification run.
///
/// Every field has a default, so a partial TOML table deserializes:
///
/// ```toml
/// offset_distance = 0.25
/// approximation = "sorted-fan"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvexityConfig {
    /// Point coincidence distance (strict `<`).
    pub point_tolerance: f64,
    /// Grid cell size used to match edges between faces.
    pub edge_key_tolerance: f64,
    /// Bound on the sine of the angle between parallel directions.
    pub angular_tolerance: f64,
    /// Distance from the edge midpoint to each in-face probe point.
    pub offset_distance: f64,
    /// Face decomposition strategy.
    pub approximation: Approximation,
    /// Classify edges on the rayon pool.
    pub parallel: bool,
}

impl Default for ConvexityConfig {
    fn default() -> Self {
        Self {
            point_tolerance: Tolerance::DEFAULT.linear,
            edge_key_tolerance: 1e-4,
            angular_tolerance: Tolerance::DEFAULT.angular,
            offset_distance: 0.5,
            approximation: Approximation::BoundaryFan,
            parallel: false,
        }
    }
}

impl ConvexityConfig {
    /// Reject non-positive or non-finite tolerances and offsets.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("point_tolerance", self.point_tolerance),
            ("edge_key_tolerance", self.edge_key_tolerance),
            ("angular_tolerance", self.angular_tolerance),
            ("offset_distance", self.offset_distance),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConvexityError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    /// The point/angle tolerance pair used by geometric predicates.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.point_tolerance, self.angular_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ConvexityConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tolerance(), Tolerance::DEFAULT);
        assert_eq!(config.approximation, Approximation::BoundaryFan);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = ConvexityConfig {
            offset_distance: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConvexityError::InvalidConfig {
                field: "offset_distance",
                value: 0.0
            })
        );
        let config = ConvexityConfig {
            edge_key_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConvexityError::InvalidConfig {
                field: "edge_key_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_toml() {
        let config: ConvexityConfig = toml::from_str(
            r#"
            offset_distance = 0.25
            approximation = "sorted-fan"
            "#,
        )
        .unwrap();
        assert_eq!(config.offset_distance, 0.25);
        assert_eq!(config.approximation, Approximation::SortedFan);
        assert_eq!(config.edge_key_tolerance, 1e-4);
        assert!(!config.parallel);
    }
}
