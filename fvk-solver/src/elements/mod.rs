//! Elements assembled into the global system
//!
//! Every element exposes the same contract to the solver: a list of local
//! unknowns and contributions to the residual and Jacobian. Nodal data is
//! owned by the mesh; multipliers are owned by the constraint element.

mod constraint;
mod curved;
mod node;
mod plate;
mod support;

use nalgebra::{DMatrix, DVector};

use crate::error::FvkResult;
use crate::mesh::{Mesh, NodeId};

pub use constraint::{
    ClaimedDof, ConstraintEnd, ConstraintState, DuplicateNodeConstraintElement, Side,
};
pub use curved::{CurveInterpolant, CurvedEdge, Edge, ElementGeometry, GeometricMap};
pub use node::{hermite_index, DofBlock, NodalRotation, Node, N_HERMITE, N_VALUE, U1, U2, W};
pub use plate::{PlateElement, PlateMaterial};
pub use support::EdgeCondition;

/// Finite-difference step for the default Jacobian
pub const FD_STEP: f64 = 1e-8;

/// A local unknown of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalDof {
    /// Value `value` of a mesh node
    Nodal { node: NodeId, value: usize },
    /// Multiplier `value` owned by constraint element `constraint`
    Lagrange { constraint: usize, value: usize },
}

/// Contract between an element and the assembly loop
pub trait Element {
    /// Local unknowns in local equation order
    fn local_dofs(&self) -> Vec<LocalDof>;

    /// Add this element's residuals. `values` follows `local_dofs()`.
    fn fill_in_contribution_to_residuals(
        &self,
        mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
    ) -> FvkResult<()>;

    /// Add residuals and the Jacobian `∂r_i/∂v_j`. Defaults to forward
    /// differences of the residual.
    fn fill_in_contribution_to_jacobian(
        &self,
        mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
    ) -> FvkResult<()> {
        let n = values.len();
        let mut base = DVector::zeros(n);
        self.fill_in_contribution_to_residuals(mesh, values, &mut base)?;
        *residuals += &base;

        let mut perturbed = values.clone();
        let mut r_plus = DVector::zeros(n);
        for j in 0..n {
            perturbed[j] += FD_STEP;
            r_plus.fill(0.0);
            self.fill_in_contribution_to_residuals(mesh, &perturbed, &mut r_plus)?;
            for i in 0..n {
                jacobian[(i, j)] += (r_plus[i] - base[i]) / FD_STEP;
            }
            perturbed[j] = values[j];
        }
        Ok(())
    }
}
