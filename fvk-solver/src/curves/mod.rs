//! Parametric boundary curves and the local boundary frame
//!
//! Every boundary of the domain is described by a [`ParametricCurve`] whose
//! parameter increases in the anticlockwise direction around the domain.
//! From the first two parametric derivatives we build a [`BoundaryFrame`]:
//! unit tangent `t`, unit normal `n = (t_y, -t_x)` (outward for anticlockwise
//! traversal) and their arc-length derivatives.

mod circle;
mod ellipse;
mod line;

use std::fmt;

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{FvkError, FvkResult};
use crate::math::CoordinateJet;

pub use circle::{circle_frame, CircularArc};
pub use ellipse::{ellipse_intersection, EllipticalArc};
pub use line::{straight_frame, StraightLine};

/// A 2D curve with a scalar boundary coordinate
pub trait ParametricCurve: fmt::Debug + Send + Sync {
    /// Position at parameter `zeta`
    fn position(&self, zeta: f64) -> Vector2<f64>;

    /// First derivative with respect to the parameter
    fn dposition(&self, zeta: f64) -> Vector2<f64>;

    /// Second derivative with respect to the parameter
    fn d2position(&self, zeta: f64) -> Vector2<f64>;

    /// Parameter of a point on the curve. Points off the curve give an
    /// approximate answer only.
    fn zeta(&self, x: &Vector2<f64>) -> f64;

    /// Local frame at parameter `zeta`
    fn frame(&self, zeta: f64) -> FvkResult<BoundaryFrame> {
        BoundaryFrame::from_derivatives(
            self.position(zeta),
            self.dposition(zeta),
            self.d2position(zeta),
        )
    }
}

/// Tangent, normal and their arc-length derivatives at a boundary point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFrame {
    pub position: Vector2<f64>,
    pub tangent: Vector2<f64>,
    pub normal: Vector2<f64>,
    pub dtangent_ds: Vector2<f64>,
    pub dnormal_ds: Vector2<f64>,
}

impl BoundaryFrame {
    /// Build the frame from a point and its first two parametric derivatives
    pub fn from_derivatives(
        position: Vector2<f64>,
        dx: Vector2<f64>,
        ddx: Vector2<f64>,
    ) -> FvkResult<Self> {
        let speed2 = dx.norm_squared();
        if speed2 < 1e-28 {
            return Err(FvkError::InvalidGeometry(format!(
                "degenerate parametrisation at ({}, {}): zero tangent",
                position.x, position.y
            )));
        }
        let speed = speed2.sqrt();
        let tangent = dx / speed;

        // d/ds = (1/|x'|) d/dζ applied to x'/|x'|
        let dtangent_ds = ddx / speed2 - dx * (dx.dot(&ddx) / (speed2 * speed2));

        Ok(Self::new(position, tangent, dtangent_ds))
    }

    /// Build the frame from a unit tangent and its arc-length derivative
    pub fn new(position: Vector2<f64>, tangent: Vector2<f64>, dtangent_ds: Vector2<f64>) -> Self {
        Self {
            position,
            tangent,
            normal: Vector2::new(tangent.y, -tangent.x),
            dtangent_ds,
            dnormal_ds: Vector2::new(dtangent_ds.y, -dtangent_ds.x),
        }
    }

    /// `∂n_i/∂x_j`, extending the normal off the curve along the normal lines
    pub fn dnormal_dx(&self) -> Matrix2<f64> {
        self.dnormal_ds * self.tangent.transpose()
    }

    /// `∂t_i/∂x_j`
    pub fn dtangent_dx(&self) -> Matrix2<f64> {
        self.dtangent_ds * self.tangent.transpose()
    }

    /// Signed curvature, positive where the domain is locally convex
    pub fn curvature(&self) -> f64 {
        -self.normal.dot(&self.dtangent_ds)
    }

    /// Jet of the map from (normal offset, arc length) to Cartesian position.
    ///
    /// Jacobian columns are `n` and `t`; the Hessian holds the frame's own
    /// rotation, `H[γ](0,1) = dn_γ/ds` and `H[γ](1,1) = dt_γ/ds`.
    pub fn jet(&self) -> CoordinateJet {
        let jacobian = Matrix2::new(
            self.normal.x,
            self.tangent.x,
            self.normal.y,
            self.tangent.y,
        );
        let slice = |gamma: usize| {
            Matrix2::new(
                0.0,
                self.dnormal_ds[gamma],
                self.dnormal_ds[gamma],
                self.dtangent_ds[gamma],
            )
        };
        CoordinateJet::new(jacobian, [slice(0), slice(1)])
    }
}
