//! Curved-edge geometry for triangles on a parametric boundary
//!
//! A triangle with vertex `i` interior and vertices `j = i+1`, `k = i+2`
//! (mod 3) on the boundary is mapped by
//!
//! ```text
//! x(L) = L_i x_i + λ c(t),   λ = L_j + L_k,   t = L_k / λ
//! ```
//!
//! where `c` interpolates the boundary curve over `[s_ubar, s_obar]`. Along
//! the edge (`L_i = 0`) the map follows `c`; towards the interior vertex the
//! curve correction fades out linearly.

use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};

use crate::config::BoundaryOrder;
use crate::curves::ParametricCurve;
use crate::math::{hermite, quadrature};

/// Which vertex of a curved triangle is interior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    InteriorNode0,
    InteriorNode1,
    InteriorNode2,
}

impl Edge {
    pub fn from_interior_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Edge::InteriorNode0),
            1 => Some(Edge::InteriorNode1),
            2 => Some(Edge::InteriorNode2),
            _ => None,
        }
    }

    /// Local index of the interior vertex
    pub fn interior_index(self) -> usize {
        match self {
            Edge::InteriorNode0 => 0,
            Edge::InteriorNode1 => 1,
            Edge::InteriorNode2 => 2,
        }
    }

    /// Local indices `(i, j, k)`: interior vertex, then edge start and end
    pub fn vertex_order(self) -> (usize, usize, usize) {
        let i = self.interior_index();
        (i, (i + 1) % 3, (i + 2) % 3)
    }
}

/// Hermite interpolant of a curve segment on `t ∈ [0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveInterpolant {
    order: BoundaryOrder,
    p0: Vector2<f64>,
    p1: Vector2<f64>,
    d0: Vector2<f64>,
    d1: Vector2<f64>,
    s0: Vector2<f64>,
    s1: Vector2<f64>,
}

impl CurveInterpolant {
    /// Sample `curve` at the segment ends. Derivatives are rescaled to `t`.
    pub fn new(curve: &dyn ParametricCurve, s_ubar: f64, s_obar: f64, order: BoundaryOrder) -> Self {
        let ds = s_obar - s_ubar;
        Self {
            order,
            p0: curve.position(s_ubar),
            p1: curve.position(s_obar),
            d0: curve.dposition(s_ubar) * ds,
            d1: curve.dposition(s_obar) * ds,
            s0: curve.d2position(s_ubar) * (ds * ds),
            s1: curve.d2position(s_obar) * (ds * ds),
        }
    }

    pub fn position(&self, t: f64) -> Vector2<f64> {
        match self.order {
            BoundaryOrder::Cubic => {
                let h = hermite::cubic(t);
                self.p0 * h[0] + self.d0 * h[1] + self.d1 * h[2] + self.p1 * h[3]
            }
            BoundaryOrder::Quintic => {
                let h = hermite::quintic(t);
                self.p0 * h[0]
                    + self.d0 * h[1]
                    + self.s0 * h[2]
                    + self.s1 * h[3]
                    + self.d1 * h[4]
                    + self.p1 * h[5]
            }
        }
    }

    pub fn derivative(&self, t: f64) -> Vector2<f64> {
        match self.order {
            BoundaryOrder::Cubic => {
                let h = hermite::cubic_d1(t);
                self.p0 * h[0] + self.d0 * h[1] + self.d1 * h[2] + self.p1 * h[3]
            }
            BoundaryOrder::Quintic => {
                let h = hermite::quintic_d1(t);
                self.p0 * h[0]
                    + self.d0 * h[1]
                    + self.s0 * h[2]
                    + self.s1 * h[3]
                    + self.d1 * h[4]
                    + self.p1 * h[5]
            }
        }
    }
}

/// Curve data attached to an upgraded boundary element
#[derive(Clone)]
pub struct CurvedEdge {
    pub edge: Edge,
    pub s_ubar: f64,
    pub s_obar: f64,
    pub boundary: usize,
    pub curve: Arc<dyn ParametricCurve>,
    pub order: BoundaryOrder,
    interpolant: CurveInterpolant,
}

impl CurvedEdge {
    pub fn new(
        edge: Edge,
        s_ubar: f64,
        s_obar: f64,
        boundary: usize,
        curve: Arc<dyn ParametricCurve>,
        order: BoundaryOrder,
    ) -> Self {
        let interpolant = CurveInterpolant::new(curve.as_ref(), s_ubar, s_obar, order);
        Self {
            edge,
            s_ubar,
            s_obar,
            boundary,
            curve,
            order,
            interpolant,
        }
    }

    pub fn interpolant(&self) -> &CurveInterpolant {
        &self.interpolant
    }
}

impl fmt::Debug for CurvedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurvedEdge")
            .field("edge", &self.edge)
            .field("s_ubar", &self.s_ubar)
            .field("s_obar", &self.s_obar)
            .field("boundary", &self.boundary)
            .field("order", &self.order)
            .finish()
    }
}

/// Map from the reference triangle `{ξ1, ξ2 ≥ 0, ξ1 + ξ2 ≤ 1}` to the plane
pub trait GeometricMap {
    fn position(&self, xi: &Vector2<f64>) -> Vector2<f64>;

    /// `J[(i, a)] = ∂x_i/∂ξ_a`
    fn jacobian(&self, xi: &Vector2<f64>) -> Matrix2<f64>;

    /// Area of the mapped element
    fn area(&self) -> f64 {
        quadrature::triangle_7()
            .iter()
            .map(|&(x1, x2, w)| w * self.jacobian(&Vector2::new(x1, x2)).determinant())
            .sum()
    }

    /// Integral of a scalar function over the mapped element
    fn integrate(&self, f: &dyn Fn(&Vector2<f64>) -> f64) -> f64 {
        quadrature::triangle_7()
            .iter()
            .map(|&(x1, x2, w)| {
                let xi = Vector2::new(x1, x2);
                w * self.jacobian(&xi).determinant() * f(&self.position(&xi))
            })
            .sum()
    }

    /// Area-weighted centroid
    fn centroid(&self) -> Vector2<f64> {
        let area = self.area();
        Vector2::new(
            self.integrate(&|x| x.x) / area,
            self.integrate(&|x| x.y) / area,
        )
    }
}

/// Geometry of a plate element: straight-sided or with one curved edge
#[derive(Debug, Clone)]
pub enum ElementGeometry<'a> {
    Straight {
        vertices: [Vector2<f64>; 3],
    },
    Curved {
        vertices: [Vector2<f64>; 3],
        edge: &'a CurvedEdge,
    },
}

impl ElementGeometry<'_> {
    pub fn vertices(&self) -> &[Vector2<f64>; 3] {
        match self {
            ElementGeometry::Straight { vertices } => vertices,
            ElementGeometry::Curved { vertices, .. } => vertices,
        }
    }
}

fn barycentric(xi: &Vector2<f64>) -> [f64; 3] {
    [1.0 - xi.x - xi.y, xi.x, xi.y]
}

/// `∂L/∂ξ_a` for the three barycentric coordinates
const DL_DXI: [[f64; 3]; 2] = [[-1.0, 1.0, 0.0], [-1.0, 0.0, 1.0]];

impl GeometricMap for ElementGeometry<'_> {
    fn position(&self, xi: &Vector2<f64>) -> Vector2<f64> {
        let l = barycentric(xi);
        match self {
            ElementGeometry::Straight { vertices } => {
                vertices[0] * l[0] + vertices[1] * l[1] + vertices[2] * l[2]
            }
            ElementGeometry::Curved { vertices, edge } => {
                let (i, j, k) = edge.edge.vertex_order();
                let lambda = l[j] + l[k];
                if lambda < 1e-14 {
                    return vertices[i];
                }
                let t = l[k] / lambda;
                vertices[i] * l[i] + edge.interpolant().position(t) * lambda
            }
        }
    }

    fn jacobian(&self, xi: &Vector2<f64>) -> Matrix2<f64> {
        match self {
            ElementGeometry::Straight { vertices } => {
                let e1 = vertices[1] - vertices[0];
                let e2 = vertices[2] - vertices[0];
                Matrix2::new(e1.x, e2.x, e1.y, e2.y)
            }
            ElementGeometry::Curved { vertices, edge } => {
                let l = barycentric(xi);
                let (i, j, k) = edge.edge.vertex_order();
                let lambda = l[j] + l[k];
                // t is arbitrary at the interior vertex; the formula stays finite
                let t = if lambda < 1e-14 { 0.5 } else { l[k] / lambda };
                let c = edge.interpolant().position(t);
                let dc = edge.interpolant().derivative(t);

                let mut jac = Matrix2::zeros();
                for (a, dl) in DL_DXI.iter().enumerate() {
                    let dlambda = dl[j] + dl[k];
                    let column = vertices[i] * dl[i] + c * dlambda + dc * (dl[k] - t * dlambda);
                    jac.set_column(a, &column);
                }
                jac
            }
        }
    }
}
