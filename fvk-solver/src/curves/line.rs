//! Straight boundary segments

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{BoundaryFrame, ParametricCurve};

/// Straight line through `start` towards `end`, parametrised by arc length
/// from `start`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StraightLine {
    pub start: Vector2<f64>,
    pub end: Vector2<f64>,
}

impl StraightLine {
    pub fn new(start: Vector2<f64>, end: Vector2<f64>) -> Self {
        Self { start, end }
    }

    /// Segment length
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    fn direction(&self) -> Vector2<f64> {
        (self.end - self.start) / self.length()
    }
}

impl ParametricCurve for StraightLine {
    fn position(&self, zeta: f64) -> Vector2<f64> {
        self.start + self.direction() * zeta
    }

    fn dposition(&self, _zeta: f64) -> Vector2<f64> {
        self.direction()
    }

    fn d2position(&self, _zeta: f64) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn zeta(&self, x: &Vector2<f64>) -> f64 {
        (x - self.start).dot(&self.direction())
    }
}

/// Closed-form frame of a straight boundary with unit tangent `tangent`
pub fn straight_frame(x: &Vector2<f64>, tangent: &Vector2<f64>) -> BoundaryFrame {
    BoundaryFrame::new(*x, tangent.normalize(), Vector2::zeros())
}
