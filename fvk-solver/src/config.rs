//! Problem parameters and the boundary/forcing function capabilities
//!
//! All physical constants live in one immutable [`ProblemParameters`] value
//! that is handed to every component needing them.

use std::fs;
use std::path::Path;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{FvkError, FvkResult};

/// Polynomial order of the curved-edge interpolant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryOrder {
    /// Cubic: positions and first parametric derivatives
    Cubic,
    /// Quintic: also second parametric derivatives
    Quintic,
}

impl BoundaryOrder {
    /// Polynomial order as an integer (3 or 5)
    pub fn order(self) -> usize {
        match self {
            BoundaryOrder::Cubic => 3,
            BoundaryOrder::Quintic => 5,
        }
    }

    /// Parse an integer order
    pub fn from_order(order: usize) -> FvkResult<Self> {
        match order {
            3 => Ok(BoundaryOrder::Cubic),
            5 => Ok(BoundaryOrder::Quintic),
            other => Err(FvkError::InvalidInput(format!(
                "boundary order must be 3 or 5, got {}",
                other
            ))),
        }
    }
}

impl Default for BoundaryOrder {
    fn default() -> Self {
        Self::Cubic
    }
}

/// Physical and discretisation parameters of a plate problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemParameters {
    /// Poisson ratio
    pub nu: f64,
    /// FvK coupling between bending and stretching
    pub eta: f64,
    /// Uniform transverse pressure
    pub pressure: f64,
    /// Uniform in-plane body force along x
    pub in_plane_traction: f64,
    /// Order of the curved-edge interpolant
    pub boundary_order: BoundaryOrder,
    /// Tolerance used when checking fully pinned corner constraints
    pub constraint_tolerance: f64,
    /// Target element area for the built-in meshers
    pub element_area: f64,
    /// Solve the linear bending problem (all in-plane displacements pinned)
    pub linear_bending: bool,
}

impl Default for ProblemParameters {
    fn default() -> Self {
        Self {
            nu: 0.5,
            eta: 1.0,
            pressure: 0.0,
            in_plane_traction: 0.0,
            boundary_order: BoundaryOrder::Cubic,
            constraint_tolerance: 1e-10,
            element_area: 0.09,
            linear_bending: false,
        }
    }
}

impl ProblemParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Poisson ratio
    pub fn with_nu(mut self, nu: f64) -> Self {
        self.nu = nu;
        self
    }

    /// Set the FvK coupling constant
    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    /// Set the uniform pressure
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    /// Set the in-plane body force along x
    pub fn with_in_plane_traction(mut self, traction: f64) -> Self {
        self.in_plane_traction = traction;
        self
    }

    /// Set the curved-edge order
    pub fn with_boundary_order(mut self, order: BoundaryOrder) -> Self {
        self.boundary_order = order;
        self
    }

    /// Set the target element area
    pub fn with_element_area(mut self, area: f64) -> Self {
        self.element_area = area;
        self
    }

    /// Switch to linear bending
    pub fn with_linear_bending(mut self) -> Self {
        self.linear_bending = true;
        self
    }

    /// Check that the parameters describe a solvable problem
    pub fn validate(&self) -> FvkResult<()> {
        if !(0.0..0.5 + f64::EPSILON).contains(&self.nu) {
            return Err(FvkError::InvalidInput(format!(
                "Poisson ratio must lie in [0, 0.5], got {}",
                self.nu
            )));
        }
        if self.eta < 0.0 {
            return Err(FvkError::InvalidInput(format!(
                "eta must be non-negative, got {}",
                self.eta
            )));
        }
        if self.eta == 0.0 && !self.linear_bending {
            return Err(FvkError::InvalidInput(
                "eta = 0 leaves the in-plane displacements unconstrained; enable linear_bending"
                    .to_string(),
            ));
        }
        if self.element_area <= 0.0 {
            return Err(FvkError::InvalidInput(format!(
                "element area must be positive, got {}",
                self.element_area
            )));
        }
        if self.constraint_tolerance <= 0.0 {
            return Err(FvkError::InvalidInput(
                "constraint tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse parameters from a JSON string; missing fields take their defaults
    pub fn from_json_str(json: &str) -> FvkResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Read parameters from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> FvkResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// Prescribed boundary value as a function of position
pub trait BoundaryFunction {
    fn value(&self, x: &Vector2<f64>) -> f64;
}

impl<F> BoundaryFunction for F
where
    F: Fn(&Vector2<f64>) -> f64,
{
    fn value(&self, x: &Vector2<f64>) -> f64 {
        self(x)
    }
}

/// Homogeneous boundary data
pub fn homogeneous(_x: &Vector2<f64>) -> f64 {
    0.0
}

/// Scalar forcing field (transverse pressure)
pub trait ScalarField: Send + Sync {
    fn value(&self, x: &Vector2<f64>) -> f64;
}

impl<F> ScalarField for F
where
    F: Fn(&Vector2<f64>) -> f64 + Send + Sync,
{
    fn value(&self, x: &Vector2<f64>) -> f64 {
        self(x)
    }
}

/// Vector forcing field (in-plane body force)
pub trait VectorField: Send + Sync {
    fn value(&self, x: &Vector2<f64>) -> Vector2<f64>;
}

impl<F> VectorField for F
where
    F: Fn(&Vector2<f64>) -> Vector2<f64> + Send + Sync,
{
    fn value(&self, x: &Vector2<f64>) -> Vector2<f64> {
        self(x)
    }
}
