//! Structured triangulation of a circular sector
//!
//! The sector `{(r cos θ, r sin θ) : 0 ≤ r ≤ R, 0 ≤ θ ≤ α}` is covered by
//! concentric rings. Ring `k` carries `k m + 1` equally spaced nodes, so
//! neighbouring rings are stitched by a merge over their angles.

use std::f64::consts::PI;
use std::sync::Arc;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Mesh, NodeId};
use crate::curves::{CircularArc, ParametricCurve, StraightLine};
use crate::error::{FvkError, FvkResult};

/// Boundary index of the straight edge along θ = 0
pub const LOWER_EDGE: usize = 0;
/// Boundary index of the arc r = R
pub const ARC: usize = 1;
/// Boundary index of the straight edge along θ = α
pub const UPPER_EDGE: usize = 2;

/// Circular sector with its apex at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularSector {
    pub radius: f64,
    /// Opening angle α in radians
    pub opening_angle: f64,
}

impl CircularSector {
    pub fn new(radius: f64, opening_angle: f64) -> FvkResult<Self> {
        if radius <= 0.0 {
            return Err(FvkError::InvalidInput(format!(
                "sector radius must be positive, got {}",
                radius
            )));
        }
        if opening_angle <= 0.0 || opening_angle >= 2.0 * PI {
            return Err(FvkError::InvalidInput(format!(
                "opening angle must lie in (0, 2π), got {}",
                opening_angle
            )));
        }
        Ok(Self {
            radius,
            opening_angle,
        })
    }

    /// Unit radius, opening angle π/4
    pub fn eighth_disc() -> Self {
        Self {
            radius: 1.0,
            opening_angle: PI / 4.0,
        }
    }

    fn corner(&self) -> Vector2<f64> {
        Vector2::new(
            self.radius * self.opening_angle.cos(),
            self.radius * self.opening_angle.sin(),
        )
    }

    /// Boundary curves in anticlockwise order
    pub fn curves(&self) -> Vec<Arc<dyn ParametricCurve>> {
        let arc = CircularArc::new(Vector2::zeros(), self.radius)
            .with_branch_start(0.5 * self.opening_angle - PI);
        vec![
            Arc::new(StraightLine::new(
                Vector2::zeros(),
                Vector2::new(self.radius, 0.0),
            )),
            Arc::new(arc),
            Arc::new(StraightLine::new(self.corner(), Vector2::zeros())),
        ]
    }

    /// Angular segments per ring step and number of rings for a target area
    pub fn resolution(&self, element_area: f64) -> FvkResult<(usize, usize)> {
        if element_area <= 0.0 {
            return Err(FvkError::InvalidInput(format!(
                "element area must be positive, got {}",
                element_area
            )));
        }
        let segments = ((2.0 * self.opening_angle / PI).ceil() as usize).max(1);
        let total = 0.5 * self.opening_angle * self.radius * self.radius;
        // Ring k contributes (2k - 1) m triangles, n_r^2 m in total
        let rings = ((total / (segments as f64 * element_area)).sqrt().ceil() as usize).max(1);
        Ok((segments, rings))
    }

    /// Triangulate with elements no larger than `element_area`
    pub fn build(&self, element_area: f64) -> FvkResult<Mesh> {
        let (m, n_rings) = self.resolution(element_area)?;
        let mut mesh = Mesh::new(self.curves());

        let apex = mesh.add_node(0.0, 0.0);
        let mut rings: Vec<Vec<NodeId>> = vec![vec![apex]];
        for k in 1..=n_rings {
            let r = self.radius * k as f64 / n_rings as f64;
            let count = k * m;
            let ring: Vec<NodeId> = (0..=count)
                .map(|j| {
                    if j == 0 {
                        return mesh.add_node(r, 0.0);
                    }
                    let theta = self.opening_angle * j as f64 / count as f64;
                    mesh.add_node(r * theta.cos(), r * theta.sin())
                })
                .collect();
            rings.push(ring);
        }

        for k in 1..=n_rings {
            self.stitch(&mut mesh, &rings[k - 1], &rings[k])?;
        }

        for ring in &rings {
            mesh.add_boundary_node(LOWER_EDGE, ring[0])?;
        }
        if let Some(outer) = rings.last() {
            for &n in outer {
                mesh.add_boundary_node(ARC, n)?;
            }
        }
        for ring in rings.iter().rev() {
            if let Some(&n) = ring.last() {
                mesh.add_boundary_node(UPPER_EDGE, n)?;
            }
        }
        mesh.setup_boundary_element_info();

        log::info!(
            "sector mesh: R = {}, α = {:.4}, {} rings, {} nodes, {} elements",
            self.radius,
            self.opening_angle,
            n_rings,
            mesh.nnode(),
            mesh.nelement()
        );
        Ok(mesh)
    }

    /// Triangulate the strip between two consecutive rings
    fn stitch(&self, mesh: &mut Mesh, inner: &[NodeId], outer: &[NodeId]) -> FvkResult<()> {
        let fraction = |ring: &[NodeId], j: usize| {
            if ring.len() == 1 {
                0.0
            } else {
                j as f64 / (ring.len() - 1) as f64
            }
        };
        let (mut i, mut j) = (0, 0);
        while i + 1 < inner.len() || j + 1 < outer.len() {
            let advance_outer = j + 1 < outer.len()
                && (i + 1 == inner.len() || fraction(outer, j + 1) <= fraction(inner, i + 1) + 1e-12);
            if advance_outer {
                mesh.add_element([inner[i], outer[j], outer[j + 1]])?;
                j += 1;
            } else {
                mesh.add_element([inner[i], outer[j], inner[i + 1]])?;
                i += 1;
            }
        }
        Ok(())
    }
}
