#![warn(missing_docs)]

//! Parametric surface types for the dihedral kernel.
//!
//! Provides a trait-based abstraction for the surfaces underlying B-rep
//! faces, with concrete implementations for planes, cylinders and spheres.
//!
//! Evaluation that can fail is explicit: [`Surface::envelope`] and
//! [`Surface::evaluate_normal`] return [`SurfaceError`] for non-finite
//! parameter ranges and singular parameterizations (a collapsed radius, a
//! sphere pole) instead of producing NaN directions.

use std::any::Any;
use std::f64::consts::PI;

use dihedral_kernel_math::{Dir3, Point2, Point3, Transform, Vec3, DEGENERACY_EPS};
use thiserror::Error;

/// Errors raised while evaluating a surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The parameter envelope is not a finite, ordered pair of ranges.
    #[error("invalid parameter envelope: u=({u0}, {u1}), v=({v0}, {v1})")]
    InvalidEnvelope {
        /// Lower u bound.
        u0: f64,
        /// Upper u bound.
        u1: f64,
        /// Lower v bound.
        v0: f64,
        /// Upper v bound.
        v1: f64,
    },

    /// The first derivatives are parallel or vanish, so no normal exists.
    #[error("singular parameterization at (u={u}, v={v})")]
    Singular {
        /// u parameter.
        u: f64,
        /// v parameter.
        v: f64,
    },

    /// Evaluation produced NaN or infinite components.
    #[error("non-finite evaluation at (u={u}, v={v})")]
    NonFinite {
        /// u parameter.
        u: f64,
        /// v parameter.
        v: f64,
    },
}

/// Result type for surface evaluation.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// The kind of a surface (for match-based dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Cylindrical surface (infinite extent along axis).
    Cylinder,
    /// Spherical surface.
    Sphere,
}

/// A validated parametric bounding envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    /// `(u_min, u_max)`.
    pub u: (f64, f64),
    /// `(v_min, v_max)`.
    pub v: (f64, f64),
}

impl Envelope {
    /// Midpoint of both parameter ranges.
    pub fn mid(&self) -> Point2 {
        Point2::new((self.u.0 + self.u.1) / 2.0, (self.v.0 + self.v.1) / 2.0)
    }
}

/// A surface point with first derivatives and the unit normal they span.
#[derive(Debug, Clone, Copy)]
pub struct SurfacePoint {
    /// Evaluated position.
    pub point: Point3,
    /// Partial derivative with respect to u.
    pub d_du: Vec3,
    /// Partial derivative with respect to v.
    pub d_dv: Vec3,
    /// `normalize(d_du × d_dv)`.
    pub normal: Dir3,
}

/// A parametric surface in 3D space.
pub trait Surface: Send + Sync + std::fmt::Debug {
    /// Evaluate the surface at parameter `(u, v)` to get a 3D point.
    fn evaluate(&self, uv: Point2) -> Point3;

    /// Partial derivative with respect to u at `(u, v)`.
    fn d_du(&self, uv: Point2) -> Vec3;

    /// Partial derivative with respect to v at `(u, v)`.
    fn d_dv(&self, uv: Point2) -> Vec3;

    /// Parameter domain as `((u_min, u_max), (v_min, v_max))`.
    fn domain(&self) -> ((f64, f64), (f64, f64));

    /// Inverse evaluation: the `(u, v)` whose image is closest to `p`.
    fn project(&self, p: &Point3) -> Point2;

    /// The kind of this surface.
    fn surface_type(&self) -> SurfaceKind;

    /// Clone this surface into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Surface>;

    /// Downcast to a concrete type via `Any`.
    fn as_any(&self) -> &dyn Any;

    /// Apply an affine transform to this surface, returning a new surface.
    fn transform(&self, t: &Transform) -> Box<dyn Surface>;

    /// The parameter domain, checked to be finite and ordered.
    fn envelope(&self) -> Result<Envelope> {
        let ((u0, u1), (v0, v1)) = self.domain();
        let finite = [u0, u1, v0, v1].iter().all(|x| x.is_finite());
        if !finite || u0 > u1 || v0 > v1 {
            return Err(SurfaceError::InvalidEnvelope { u0, u1, v0, v1 });
        }
        Ok(Envelope {
            u: (u0, u1),
            v: (v0, v1),
        })
    }

    /// Evaluate position and first derivatives at `uv` and derive the normal.
    fn evaluate_normal(&self, uv: Point2) -> Result<SurfacePoint> {
        let (u, v) = (uv.x, uv.y);
        let point = self.evaluate(uv);
        let d_du = self.d_du(uv);
        let d_dv = self.d_dv(uv);
        let finite = point.coords.iter().chain(d_du.iter()).chain(d_dv.iter());
        if !finite.into_iter().all(|x| x.is_finite()) {
            return Err(SurfaceError::NonFinite { u, v });
        }
        let normal = Dir3::try_new(d_du.cross(&d_dv), DEGENERACY_EPS)
            .ok_or(SurfaceError::Singular { u, v })?;
        Ok(SurfacePoint {
            point,
            d_du,
            d_dv,
            normal,
        })
    }
}

impl Clone for Box<dyn Surface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Wrap an angle into `[0, 2π)`.
fn wrap_angle(a: f64) -> f64 {
    if a < 0.0 {
        a + 2.0 * PI
    } else {
        a
    }
}

// =============================================================================
// Plane
// =============================================================================

/// An infinite plane defined by an origin point and a coordinate frame.
///
/// Parameterization: `P(u, v) = origin + u * x_dir + v * y_dir`
#[derive(Debug, Clone)]
pub struct Plane {
    /// Origin point on the plane.
    pub origin: Point3,
    /// Unit vector along the u direction.
    pub x_dir: Dir3,
    /// Unit vector along the v direction.
    pub y_dir: Dir3,
    /// Unit normal (x_dir × y_dir).
    pub normal_dir: Dir3,
}

impl Plane {
    /// Create a plane from origin and two orthogonal direction vectors.
    /// The vectors do not need to be normalized.
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3) -> Self {
        let x = Dir3::new_normalize(x_dir);
        let y = Dir3::new_normalize(y_dir);
        let n = Dir3::new_normalize(x_dir.cross(&y_dir));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }
}

impl Surface for Plane {
    fn evaluate(&self, uv: Point2) -> Point3 {
        self.origin + uv.x * self.x_dir.as_ref() + uv.y * self.y_dir.as_ref()
    }

    fn d_du(&self, _uv: Point2) -> Vec3 {
        *self.x_dir.as_ref()
    }

    fn d_dv(&self, _uv: Point2) -> Vec3 {
        *self.y_dir.as_ref()
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((-1e10, 1e10), (-1e10, 1e10))
    }

    fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_dir.as_ref()), d.dot(self.y_dir.as_ref()))
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        let new_origin = t.apply_point(&self.origin);
        let new_x = t.apply_vec(self.x_dir.as_ref());
        let new_y = t.apply_vec(self.y_dir.as_ref());
        Box::new(Plane::new(new_origin, new_x, new_y))
    }
}

// =============================================================================
// Cylinder
// =============================================================================

/// A cylindrical surface defined by an axis line and radius.
///
/// Parameterization: `P(u, v) = center + radius * (cos(u) * x_dir + sin(u) * y_dir) + v * axis`
///
/// Where `u ∈ [0, 2π)` is the angular parameter and `v` is the height along the axis.
#[derive(Debug, Clone)]
pub struct CylinderSurface {
    /// Center point at the base of the cylinder axis.
    pub center: Point3,
    /// Unit direction along the cylinder axis.
    pub axis: Dir3,
    /// Reference direction for u=0 (perpendicular to axis).
    pub ref_dir: Dir3,
    /// Radius of the cylinder.
    pub radius: f64,
}

impl CylinderSurface {
    /// Create a cylinder with axis along Z, centered at origin.
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point3::origin(),
            axis: Dir3::new_normalize(Vec3::z()),
            ref_dir: Dir3::new_normalize(Vec3::x()),
            radius,
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.as_ref().cross(self.ref_dir.as_ref())
    }
}

impl Surface for CylinderSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        self.center
            + self.radius * (cos_u * self.ref_dir.as_ref() + sin_u * self.y_dir())
            + uv.y * self.axis.as_ref()
    }

    fn d_du(&self, uv: Point2) -> Vec3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        self.radius * (-sin_u * self.ref_dir.as_ref() + cos_u * self.y_dir())
    }

    fn d_dv(&self, _uv: Point2) -> Vec3 {
        *self.axis.as_ref()
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, 2.0 * PI), (-1e10, 1e10))
    }

    fn project(&self, p: &Point3) -> Point2 {
        let axis = self.axis.as_ref();
        let to_point = p - self.center;
        let v = to_point.dot(axis);
        let radial = to_point - v * axis;
        let u = radial.dot(&self.y_dir()).atan2(radial.dot(self.ref_dir.as_ref()));
        Point2::new(wrap_angle(u), v)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        let new_center = t.apply_point(&self.center);
        let new_axis = t.apply_vec(self.axis.as_ref());
        let new_ref = t.apply_vec(self.ref_dir.as_ref());
        // Scale factor affects radius; use the length of the transformed ref_dir
        let scale = new_ref.norm();
        Box::new(CylinderSurface {
            center: new_center,
            axis: Dir3::new_normalize(new_axis),
            ref_dir: Dir3::new_normalize(new_ref),
            radius: self.radius * scale,
        })
    }
}

// =============================================================================
// Sphere
// =============================================================================

/// A spherical surface defined by center and radius.
///
/// Parameterization: `P(u, v) = center + radius * (cos(v) * (cos(u) * x + sin(u) * y) + sin(v) * z)`
///
/// Where `u ∈ [0, 2π)` is longitude and `v ∈ [-π/2, π/2]` is latitude.
/// The poles are singular: `∂P/∂u` vanishes there.
#[derive(Debug, Clone)]
pub struct SphereSurface {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
    /// Reference direction for u=0 (perpendicular to axis).
    pub ref_dir: Dir3,
    /// Axis direction (north pole).
    pub axis: Dir3,
}

impl SphereSurface {
    /// Create a sphere centered at origin with the given radius.
    pub fn new(radius: f64) -> Self {
        Self {
            center: Point3::origin(),
            radius,
            ref_dir: Dir3::new_normalize(Vec3::x()),
            axis: Dir3::new_normalize(Vec3::z()),
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.as_ref().cross(self.ref_dir.as_ref())
    }
}

impl Surface for SphereSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        let (sin_v, cos_v) = uv.y.sin_cos();
        self.center
            + self.radius
                * (cos_v * (cos_u * self.ref_dir.as_ref() + sin_u * self.y_dir())
                    + sin_v * self.axis.as_ref())
    }

    fn d_du(&self, uv: Point2) -> Vec3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        let cos_v = uv.y.cos();
        self.radius * cos_v * (-sin_u * self.ref_dir.as_ref() + cos_u * self.y_dir())
    }

    fn d_dv(&self, uv: Point2) -> Vec3 {
        let (sin_u, cos_u) = uv.x.sin_cos();
        let (sin_v, cos_v) = uv.y.sin_cos();
        self.radius
            * (-sin_v * (cos_u * self.ref_dir.as_ref() + sin_u * self.y_dir())
                + cos_v * self.axis.as_ref())
    }

    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        ((0.0, 2.0 * PI), (-PI / 2.0, PI / 2.0))
    }

    fn project(&self, p: &Point3) -> Point2 {
        let axis = self.axis.as_ref();
        let to_point = (p - self.center) / self.radius;
        let z = to_point.dot(axis).clamp(-1.0, 1.0);
        let v = z.asin();
        let radial = to_point - z * axis;
        let u = if radial.norm() > DEGENERACY_EPS {
            wrap_angle(radial.dot(&self.y_dir()).atan2(radial.dot(self.ref_dir.as_ref())))
        } else {
            0.0
        };
        Point2::new(u, v)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }

    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transform(&self, t: &Transform) -> Box<dyn Surface> {
        let new_center = t.apply_point(&self.center);
        let new_ref = t.apply_vec(self.ref_dir.as_ref());
        let new_axis = t.apply_vec(self.axis.as_ref());
        let scale = new_ref.norm();
        Box::new(SphereSurface {
            center: new_center,
            radius: self.radius * scale,
            ref_dir: Dir3::new_normalize(new_ref),
            axis: Dir3::new_normalize(new_axis),
        })
    }
}

// =============================================================================
// Geometry store
// =============================================================================

/// Storage for the surfaces referenced by faces.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    /// Surfaces indexed by position (Face.surface_index refers to these).
    pub surfaces: Vec<Box<dyn Surface>>,
}

impl GeometryStore {
    /// Create an empty geometry store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface and return its index.
    pub fn add_surface(&mut self, surface: Box<dyn Surface>) -> usize {
        let idx = self.surfaces.len();
        self.surfaces.push(surface);
        idx
    }

    /// Return a copy of every surface with `t` applied.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            surfaces: self.surfaces.iter().map(|s| s.transform(t)).collect(),
        }
    }
}
