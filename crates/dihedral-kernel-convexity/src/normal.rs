//! Representative surface normals.

use dihedral_kernel_geom::{Surface, SurfaceError};
use dihedral_kernel_math::Dir3;
use dihedral_kernel_primitives::BRepSolid;
use dihedral_kernel_topo::{FaceId, Orientation};
use thiserror::Error;

/// Why a face has no usable normal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalUnavailable {
    /// The face's surface index is out of range.
    #[error("face refers to missing surface {0}")]
    MissingSurface(usize),
    /// The face is not part of the topology.
    #[error("face is not in the topology")]
    MissingFace,
    /// Surface evaluation failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A face normal, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalEstimate {
    /// Unit normal at the middle of the parameter envelope.
    Available(Dir3),
    /// Evaluation failed; the face takes no part in classification.
    Unavailable(NormalUnavailable),
}

impl NormalEstimate {
    /// The normal, if one was computed.
    pub fn direction(&self) -> Option<&Dir3> {
        match self {
            NormalEstimate::Available(n) => Some(n),
            NormalEstimate::Unavailable(_) => None,
        }
    }

    /// Whether a normal was computed.
    pub fn is_available(&self) -> bool {
        matches!(self, NormalEstimate::Available(_))
    }
}

/// Normal of `surface` at the midpoint of its parameter envelope.
///
/// Never fails: an invalid envelope or a singular parameterization at the
/// midpoint is returned as [`NormalEstimate::Unavailable`].
pub fn estimate_normal(surface: &dyn Surface) -> NormalEstimate {
    let result = surface
        .envelope()
        .and_then(|env| surface.evaluate_normal(env.mid()));
    match result {
        Ok(sp) => NormalEstimate::Available(sp.normal),
        Err(e) => NormalEstimate::Unavailable(e.into()),
    }
}

/// Representative normal of a face, flipped for reversed faces.
pub fn face_normal(solid: &BRepSolid, face_id: FaceId) -> NormalEstimate {
    let Some(face) = solid.topology.faces.get(face_id) else {
        return NormalEstimate::Unavailable(NormalUnavailable::MissingFace);
    };
    let Some(surface) = solid.geometry.surfaces.get(face.surface_index) else {
        return NormalEstimate::Unavailable(NormalUnavailable::MissingSurface(face.surface_index));
    };
    match (estimate_normal(surface.as_ref()), face.orientation) {
        (NormalEstimate::Available(n), Orientation::Reversed) => {
            NormalEstimate::Available(-n)
        }
        (estimate, _) => estimate,
    }
}
