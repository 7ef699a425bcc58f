//! Mathematical utilities for the plate and constraint elements

pub mod hermite;
pub mod quadrature;
pub mod sparse;
pub mod transform;

use nalgebra::{DMatrix, DVector, Matrix6, Vector2};

pub use sparse::{asymmetry, SparseMatrixBuilder};
pub use transform::{CoordinateJet, Hessian2};

pub type Mat6 = Matrix6<f64>;
pub type Vec2 = Vector2<f64>;

/// Twice the signed area of the triangle (a, b, c); positive when anticlockwise
pub fn signed_area2(a: &Vec2, b: &Vec2, c: &Vec2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// Solve a linear system using LU decomposition
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    a.clone().lu().solve(b)
}
