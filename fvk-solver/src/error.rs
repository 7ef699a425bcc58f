//! Error types for the FvK solver

use thiserror::Error;

/// Main error type for mesh setup, constraint validation and solving
#[derive(Error, Debug)]
pub enum FvkError {
    #[error("Element {element} on boundary {boundary} has no interior vertex; a curved boundary element needs exactly one")]
    NoInteriorNode { element: usize, boundary: usize },

    #[error("Element {element} on boundary {boundary} has {count} interior vertices; a curved boundary element needs exactly one")]
    MultipleInteriorNodes {
        element: usize,
        boundary: usize,
        count: usize,
    },

    #[error("Mesh topology error: {0}")]
    MeshTopology(String),

    #[error(
        "Decreasing parametric coordinate on element {element} (boundary {boundary}): \
         s_ubar = {s_ubar} must be smaller than s_obar = {s_obar} along an anticlockwise edge"
    )]
    DecreasingParametricCoordinate {
        element: usize,
        boundary: usize,
        s_ubar: f64,
        s_obar: f64,
    },

    #[error(
        "Constraint {index} at the corner ({x}, {y}) has no free variables \
         but is violated: |residual| = {residual:e} exceeds {tolerance:e}"
    )]
    UnsatisfiableConstraint {
        index: usize,
        x: f64,
        y: f64,
        residual: f64,
        tolerance: f64,
    },

    #[error("Node {0} not found in mesh")]
    NodeNotFound(usize),

    #[error("Element {0} not found in mesh")]
    ElementNotFound(usize),

    #[error("Boundary {0} not found in mesh")]
    BoundaryNotFound(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular Jacobian matrix - check boundary conditions and corner constraints")]
    SingularMatrix,

    #[error("Newton solver did not converge after {0} iterations")]
    ConvergenceFailed(usize),

    #[error("Newton solver diverged: max residual {residual:e} exceeds {max_residual:e}")]
    Diverged { residual: f64, max_residual: f64 },

    #[error("Equations not numbered - call assign_eqn_numbers() first")]
    NotNumbered,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for FvK operations
pub type FvkResult<T> = Result<T, FvkError>;
