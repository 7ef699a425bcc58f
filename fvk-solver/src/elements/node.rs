//! Mesh node - a 2D point carrying in-plane and Hermite out-of-plane data

use std::collections::BTreeSet;

use nalgebra::{Vector2, Vector6};
use serde::{Deserialize, Serialize};

use crate::curves::BoundaryFrame;
use crate::error::FvkResult;
use crate::math::{CoordinateJet, Mat6};

/// Values stored per node
pub const N_VALUE: usize = 8;
/// In-plane displacement components
pub const U1: usize = 0;
pub const U2: usize = 1;
/// Start of the Hermite block `[w, w_1, w_2, w_11, w_12, w_22]`
pub const W: usize = 2;
/// Hermite dofs per node
pub const N_HERMITE: usize = 6;

/// Node value index of out-of-plane Hermite dof `k`
pub fn hermite_index(k: usize) -> usize {
    W + k
}

/// Fixed-size block of values, each either free or pinned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DofBlock {
    values: [f64; N_VALUE],
    pinned: [bool; N_VALUE],
}

impl DofBlock {
    pub fn new() -> Self {
        Self {
            values: [0.0; N_VALUE],
            pinned: [false; N_VALUE],
        }
    }

    pub fn value(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn values(&self) -> &[f64; N_VALUE] {
        &self.values
    }

    pub fn set_value(&mut self, i: usize, value: f64) {
        self.values[i] = value;
    }

    pub fn is_pinned(&self, i: usize) -> bool {
        self.pinned[i]
    }

    pub fn pin(&mut self, i: usize) {
        self.pinned[i] = true;
    }

    pub fn unpin(&mut self, i: usize) {
        self.pinned[i] = false;
    }

    pub fn unpin_all(&mut self) {
        self.pinned = [false; N_VALUE];
    }

    /// Number of free values
    pub fn nfree(&self) -> usize {
        self.pinned.iter().filter(|&&p| !p).count()
    }
}

impl Default for DofBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotation of a node's Hermite block into a boundary's normal-tangential frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodalRotation {
    /// Boundary whose frame is active
    pub boundary: usize,
    /// Boundary coordinate of the node
    pub zeta: f64,
    pub frame: BoundaryFrame,
    to_local: Mat6,
    to_global: Mat6,
}

impl NodalRotation {
    pub fn new(boundary: usize, zeta: f64, frame: BoundaryFrame) -> FvkResult<Self> {
        let jet = frame.jet();
        Ok(Self {
            boundary,
            zeta,
            frame,
            to_local: jet.hermite_matrix(),
            to_global: jet.inverse()?.hermite_matrix(),
        })
    }

    /// Jet of the frame map at the node
    pub fn jet(&self) -> CoordinateJet {
        self.frame.jet()
    }

    /// Cartesian Hermite block to `(n, t)` components
    pub fn to_local(&self) -> &Mat6 {
        &self.to_local
    }

    /// `(n, t)` Hermite block to Cartesian components
    pub fn to_global(&self) -> &Mat6 {
        &self.to_global
    }
}

/// A node of the triangulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    pub(crate) data: DofBlock,
    pub(crate) boundaries: BTreeSet<usize>,
    pub(crate) rotation: Option<NodalRotation>,
}

impl Node {
    /// Create a new interior node at the given coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            data: DofBlock::new(),
            boundaries: BTreeSet::new(),
            rotation: None,
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    pub fn data(&self) -> &DofBlock {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DofBlock {
        &mut self.data
    }

    pub fn is_on_boundary(&self, b: usize) -> bool {
        self.boundaries.contains(&b)
    }

    /// True if the node lies on any boundary
    pub fn is_boundary_node(&self) -> bool {
        !self.boundaries.is_empty()
    }

    pub fn boundaries(&self) -> impl Iterator<Item = usize> + '_ {
        self.boundaries.iter().copied()
    }

    /// Active rotation, if the node's Hermite block is in a boundary frame
    pub fn rotation(&self) -> Option<&NodalRotation> {
        self.rotation.as_ref()
    }

    /// Stored Hermite block, in whatever frame is active
    pub fn hermite_values(&self) -> Vector6<f64> {
        Vector6::from_fn(|k, _| self.data.value(hermite_index(k)))
    }

    /// Hermite block in Cartesian components
    pub fn global_hermite_values(&self) -> Vector6<f64> {
        let stored = self.hermite_values();
        match &self.rotation {
            Some(rotation) => rotation.to_global() * stored,
            None => stored,
        }
    }

    /// Switch the node into a boundary frame, converting stored values so the
    /// represented field is unchanged
    pub(crate) fn set_rotation(&mut self, rotation: NodalRotation) {
        let global = self.global_hermite_values();
        let local = rotation.to_local() * global;
        for k in 0..N_HERMITE {
            self.data.set_value(hermite_index(k), local[k]);
        }
        self.rotation = Some(rotation);
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::circle_frame;
    use approx::assert_relative_eq;

    #[test]
    fn test_node_creation() {
        let node = Node::new(1.0, 2.0);
        assert_eq!(node.x, 1.0);
        assert_eq!(node.y, 2.0);
        assert!(!node.is_boundary_node());
        assert_eq!(node.data().nfree(), N_VALUE);
    }

    #[test]
    fn test_dof_block_pinning() {
        let mut block = DofBlock::new();
        block.pin(3);
        block.set_value(3, 1.5);
        assert!(block.is_pinned(3));
        assert_eq!(block.nfree(), N_VALUE - 1);
        block.unpin_all();
        assert_eq!(block.nfree(), N_VALUE);
        assert_eq!(block.value(3), 1.5);
    }

    #[test]
    fn test_rotation_preserves_field() {
        let x = Vector2::new(0.6, 0.8);
        let mut node = Node::new(x.x, x.y);
        let global = [0.3, -1.0, 2.0, 0.5, 0.25, -0.75];
        for (k, v) in global.iter().enumerate() {
            node.data_mut().set_value(hermite_index(k), *v);
        }
        let rotation = NodalRotation::new(1, 0.927, circle_frame(&x, 1.0)).unwrap();
        node.set_rotation(rotation);

        // dw/dn = ∇w · n for the unit circle normal
        assert_relative_eq!(
            node.data().value(hermite_index(1)),
            -1.0 * 0.6 + 2.0 * 0.8,
            epsilon = 1e-14
        );
        let back = node.global_hermite_values();
        for k in 0..N_HERMITE {
            assert_relative_eq!(back[k], global[k], epsilon = 1e-13);
        }
    }
}
