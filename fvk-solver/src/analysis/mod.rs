//! Newton solver options
//!
//! Each iteration assembles the residual and Jacobian, checks the largest
//! residual against `tolerance` and `max_residual`, then takes a full LU step.

use serde::{Deserialize, Serialize};

/// Options for [`FvkProblem::newton_solve`](crate::model::FvkProblem::newton_solve)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Newton steps taken before giving up with `ConvergenceFailed`
    pub max_iterations: usize,
    /// Converged once the largest residual entry drops below this. Checked
    /// before any step, so a problem that starts converged takes none.
    pub tolerance: f64,
    /// A residual entry above this aborts the solve with `Diverged`
    pub max_residual: f64,
    /// Report every iteration's residual at info level instead of debug
    pub log: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-8,
            max_residual: 1e10,
            log: false,
        }
    }
}

impl SolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote per-iteration residual reports to info
    pub fn with_logging(mut self) -> Self {
        self.log = true;
        self
    }

    /// Cap on Newton steps. The FvK membrane terms are cubic in `w`, so
    /// large loads need more than the default.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Absolute tolerance on the largest residual entry
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_max_residual(mut self, max_residual: f64) -> Self {
        self.max_residual = max_residual;
        self
    }
}
