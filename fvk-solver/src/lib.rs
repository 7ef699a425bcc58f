//! FvK Solver - C1 Föppl-von Kármán plate elements on curved boundaries
//!
//! This library covers the boundary machinery a C1 Hermite discretisation
//! needs on domains bounded by parametric curves:
//! - Parametric boundary curves and their normal-tangential frames
//! - Upgrading boundary triangles so their edge follows the true curve
//! - Rotating boundary Hermite data into `(n, t)` components
//! - Duplicating corner nodes and gluing the copies with Lagrange multipliers,
//!   including detection of redundant multipliers
//!
//! A triangle plate element, equation numbering and a Newton driver complete
//! the pipeline.
//!
//! ## Example
//! ```rust
//! use fvk_solver::prelude::*;
//!
//! let params = ProblemParameters::default().with_pressure(0.5);
//! let mut problem = FvkProblem::circular_sector(
//!     params,
//!     CircularSector::eighth_disc(),
//!     &EdgeCondition::clamped().with_in_plane_pinned(),
//! )
//! .unwrap();
//!
//! let summary = problem.newton_solve(&SolverOptions::default()).unwrap();
//! assert!(summary.max_abs_w > 0.0);
//! ```

pub mod analysis;
pub mod boundary;
pub mod config;
pub mod curves;
pub mod elements;
pub mod error;
pub mod math;
pub mod mesh;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::SolverOptions;
    pub use crate::boundary::{
        duplicate_corner_nodes, rotate_boundary_nodes, upgrade_all_boundaries,
    };
    pub use crate::config::{
        homogeneous, BoundaryFunction, BoundaryOrder, ProblemParameters, ScalarField, VectorField,
    };
    pub use crate::curves::{
        BoundaryFrame, CircularArc, EllipticalArc, ParametricCurve, StraightLine,
    };
    pub use crate::elements::{
        ClaimedDof, ConstraintState, DuplicateNodeConstraintElement, EdgeCondition, Element,
        GeometricMap, LocalDof, PlateElement, Side,
    };
    pub use crate::error::{FvkError, FvkResult};
    pub use crate::mesh::{CircularSector, ElementId, Mesh, NodeId};
    pub use crate::model::{EquationNumbering, FvkProblem};
    pub use crate::results::{NodeSolution, SolutionSummary};
}
