//! Circular arcs parametrised by polar angle

use std::f64::consts::PI;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{BoundaryFrame, ParametricCurve};

/// Circle of radius `radius` about `centre`. The parameter is the polar
/// angle, so it increases anticlockwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularArc {
    pub centre: Vector2<f64>,
    pub radius: f64,
    /// Inverse map returns angles in `[branch_start, branch_start + 2π)`
    pub branch_start: f64,
}

impl CircularArc {
    pub fn new(centre: Vector2<f64>, radius: f64) -> Self {
        Self {
            centre,
            radius,
            branch_start: -PI,
        }
    }

    /// Move the branch cut of the inverse map
    pub fn with_branch_start(mut self, branch_start: f64) -> Self {
        self.branch_start = branch_start;
        self
    }
}

impl ParametricCurve for CircularArc {
    fn position(&self, zeta: f64) -> Vector2<f64> {
        self.centre + Vector2::new(zeta.cos(), zeta.sin()) * self.radius
    }

    fn dposition(&self, zeta: f64) -> Vector2<f64> {
        Vector2::new(-zeta.sin(), zeta.cos()) * self.radius
    }

    fn d2position(&self, zeta: f64) -> Vector2<f64> {
        Vector2::new(-zeta.cos(), -zeta.sin()) * self.radius
    }

    fn zeta(&self, x: &Vector2<f64>) -> f64 {
        let d = x - self.centre;
        let theta = d.y.atan2(d.x);
        let shifted = (theta - self.branch_start).rem_euclid(2.0 * PI);
        self.branch_start + shifted
    }
}

/// Closed-form frame of a circle of radius `radius` centred at the origin
pub fn circle_frame(x: &Vector2<f64>, radius: f64) -> BoundaryFrame {
    let normal = x / x.norm();
    let tangent = Vector2::new(-normal.y, normal.x);
    BoundaryFrame::new(*x, tangent, -normal / radius)
}
