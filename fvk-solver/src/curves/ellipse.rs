//! Elliptical arcs measured by the angle about the positive y axis
//!
//! `x = ∓a sin ζ`, `y = b cos ζ`. The anticlockwise variant (upper sign)
//! runs from right to left over the top of the ellipse as `ζ` increases; the
//! clockwise variant runs left to right. A crescent domain bounded by an
//! outer anticlockwise arc and an inner clockwise arc is therefore traversed
//! anticlockwise with increasing parameter on both boundaries.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::ParametricCurve;
use crate::error::{FvkError, FvkResult};

/// Top arc of the centred ellipse `x²/a² + y²/b² = 1`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalArc {
    pub a: f64,
    pub b: f64,
    pub clockwise: bool,
}

impl EllipticalArc {
    pub fn new(a: f64, b: f64, clockwise: bool) -> Self {
        Self { a, b, clockwise }
    }

    fn sign(&self) -> f64 {
        if self.clockwise {
            1.0
        } else {
            -1.0
        }
    }
}

impl ParametricCurve for EllipticalArc {
    fn position(&self, zeta: f64) -> Vector2<f64> {
        Vector2::new(self.sign() * self.a * zeta.sin(), self.b * zeta.cos())
    }

    fn dposition(&self, zeta: f64) -> Vector2<f64> {
        Vector2::new(self.sign() * self.a * zeta.cos(), -self.b * zeta.sin())
    }

    fn d2position(&self, zeta: f64) -> Vector2<f64> {
        Vector2::new(-self.sign() * self.a * zeta.sin(), -self.b * zeta.cos())
    }

    fn zeta(&self, x: &Vector2<f64>) -> f64 {
        (self.sign() * x.x / self.a).atan2(x.y / self.b)
    }
}

/// Intersection in the upper right quadrant of two centred ellipses
/// `x²/a1² + y²/b1² = 1` and `x²/a2² + y²/b2² = 1`
pub fn ellipse_intersection(a1: f64, b1: f64, a2: f64, b2: f64) -> FvkResult<Vector2<f64>> {
    let denominator = a2 * a2 * b1 * b1 - a1 * a1 * b2 * b2;
    let x2 = a1 * a1 * a2 * a2 * (b1 * b1 - b2 * b2) / denominator;
    let y2 = b1 * b1 * (1.0 - x2 / (a1 * a1));
    if denominator == 0.0 || !(x2 >= 0.0) || !(y2 >= 0.0) {
        return Err(FvkError::InvalidGeometry(format!(
            "ellipses ({}, {}) and ({}, {}) do not intersect in the upper half plane",
            a1, b1, a2, b2
        )));
    }
    Ok(Vector2::new(x2.sqrt(), y2.sqrt()))
}
