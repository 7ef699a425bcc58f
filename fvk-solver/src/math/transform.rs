//! Hermite data under a smooth change of coordinates
//!
//! A [`CoordinateJet`] is the second-order Taylor data of a map `x(l)` at a
//! point. It is all that is needed to re-express a Hermite block
//! `[w, ∂w, ∂²w]` from one coordinate system in another.

use nalgebra::{Matrix2, Matrix6};
use serde::{Deserialize, Serialize};

use crate::error::{FvkError, FvkResult};

/// One 2x2 slice per output component: `H[γ](α, β) = ∂²x_γ / ∂l_α ∂l_β`
pub type Hessian2 = [Matrix2<f64>; 2];

/// Symmetric second-derivative pairs in Hermite block order
pub(crate) const SECOND_DERIVATIVE_PAIRS: [(usize, usize); 3] = [(0, 0), (0, 1), (1, 1)];

/// Jacobian and Hessian of a coordinate map `x(l)` at a point
///
/// `jacobian[(β, α)] = ∂x_β / ∂l_α`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateJet {
    pub jacobian: Matrix2<f64>,
    pub hessian: Hessian2,
}

impl CoordinateJet {
    pub fn new(jacobian: Matrix2<f64>, hessian: Hessian2) -> Self {
        Self { jacobian, hessian }
    }

    /// The identity map
    pub fn identity() -> Self {
        Self {
            jacobian: Matrix2::identity(),
            hessian: [Matrix2::zeros(); 2],
        }
    }

    /// True when the map has no second-order part
    pub fn is_affine(&self, tol: f64) -> bool {
        self.hessian.iter().all(|h| h.amax() <= tol)
    }

    /// Jet of the inverse map `l(x)`
    pub fn inverse(&self) -> FvkResult<Self> {
        let jinv = self.jacobian.try_inverse().ok_or_else(|| {
            FvkError::InvalidGeometry(format!(
                "singular coordinate Jacobian {:?}",
                self.jacobian
            ))
        })?;

        // ∂²l_a/∂x_b∂x_c = -Σ Jinv(a, a2) H[a2](b2, c2) Jinv(b2, b) Jinv(c2, c)
        let mut hessian = [Matrix2::zeros(); 2];
        for (a, slice) in hessian.iter_mut().enumerate() {
            let mut contracted = Matrix2::zeros();
            for a2 in 0..2 {
                contracted += self.hessian[a2] * jinv[(a, a2)];
            }
            *slice = -(jinv.transpose() * contracted * jinv);
        }

        Ok(Self {
            jacobian: jinv,
            hessian,
        })
    }

    /// Jet of `self ∘ inner`, i.e. of `x(l(r))` where `inner` is `l(r)`
    pub fn compose(&self, inner: &CoordinateJet) -> Self {
        let jacobian = self.jacobian * inner.jacobian;
        let mut hessian = [Matrix2::zeros(); 2];
        for (a, slice) in hessian.iter_mut().enumerate() {
            let mut h = inner.jacobian.transpose() * self.hessian[a] * inner.jacobian;
            for mu in 0..2 {
                h += inner.hessian[mu] * self.jacobian[(a, mu)];
            }
            *slice = h;
        }
        Self { jacobian, hessian }
    }

    /// Matrix taking a Hermite block `[w, w_x1, w_x2, w_x1x1, w_x1x2, w_x2x2]`
    /// in `x` coordinates to the same block in `l` coordinates.
    ///
    /// First derivatives pick up `J`, second derivatives `J ⊗ J` plus the
    /// curvature term `Σ_γ w_xγ H[γ]`.
    pub fn hermite_matrix(&self) -> Matrix6<f64> {
        let j = &self.jacobian;
        let mut m = Matrix6::zeros();
        m[(0, 0)] = 1.0;

        for alpha in 0..2 {
            for beta in 0..2 {
                m[(1 + alpha, 1 + beta)] = j[(beta, alpha)];
            }
        }

        for (alpha, beta) in SECOND_DERIVATIVE_PAIRS {
            let row = 3 + alpha + beta;
            m[(row, 3)] = j[(0, alpha)] * j[(0, beta)];
            m[(row, 4)] = j[(0, alpha)] * j[(1, beta)] + j[(1, alpha)] * j[(0, beta)];
            m[(row, 5)] = j[(1, alpha)] * j[(1, beta)];
            for gamma in 0..2 {
                m[(row, 1 + gamma)] = self.hessian[gamma][(alpha, beta)];
            }
        }
        m
    }
}

impl Default for CoordinateJet {
    fn default() -> Self {
        Self::identity()
    }
}
