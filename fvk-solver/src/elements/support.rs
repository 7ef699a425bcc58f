//! Boundary conditions along an edge
//!
//! Out-of-plane dof indices refer to the rotated Hermite block
//! `[w, dw/dn, dw/dt, d²w/dn², d²w/dndt, d²w/dt²]`; in-plane indices to the
//! Cartesian displacement `[u_x, u_y]`.

use serde::{Deserialize, Serialize};

/// Which values are pinned along a boundary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeCondition {
    /// Pinned in-plane displacement components
    pub in_plane: Vec<usize>,
    /// Pinned out-of-plane Hermite dofs
    pub out_of_plane: Vec<usize>,
}

impl EdgeCondition {
    /// Create a condition with no restraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Free edge
    pub fn free() -> Self {
        Self::default()
    }

    /// Resting pin: w and its tangential derivatives
    pub fn resting_pin() -> Self {
        Self {
            in_plane: Vec::new(),
            out_of_plane: vec![0, 2, 5],
        }
    }

    /// Sliding clamp: normal slope and its tangential derivative
    pub fn sliding_clamp() -> Self {
        Self {
            in_plane: Vec::new(),
            out_of_plane: vec![1, 4],
        }
    }

    /// True clamp: everything except the normal curvature
    pub fn clamped() -> Self {
        Self {
            in_plane: Vec::new(),
            out_of_plane: vec![0, 1, 2, 4, 5],
        }
    }

    /// Every in-plane and out-of-plane value pinned
    pub fn fully_fixed() -> Self {
        Self {
            in_plane: vec![0, 1],
            out_of_plane: (0..6).collect(),
        }
    }

    /// Also pin both in-plane displacement components
    pub fn with_in_plane_pinned(mut self) -> Self {
        self.in_plane = vec![0, 1];
        self
    }

    /// Pin a single in-plane component
    pub fn with_in_plane_dof(mut self, dof: usize) -> Self {
        if !self.in_plane.contains(&dof) {
            self.in_plane.push(dof);
        }
        self
    }

    /// Pin an additional out-of-plane dof
    pub fn with_out_of_plane_dof(mut self, dof: usize) -> Self {
        if !self.out_of_plane.contains(&dof) {
            self.out_of_plane.push(dof);
        }
        self
    }

    /// Check if any value is restrained
    pub fn is_restrained(&self) -> bool {
        !self.in_plane.is_empty() || !self.out_of_plane.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(!EdgeCondition::free().is_restrained());
        assert_eq!(EdgeCondition::clamped().out_of_plane, vec![0, 1, 2, 4, 5]);
        assert_eq!(EdgeCondition::fully_fixed().out_of_plane.len(), 6);
        let c = EdgeCondition::resting_pin().with_in_plane_pinned();
        assert_eq!(c.in_plane, vec![0, 1]);
    }

    #[test]
    fn test_no_duplicate_dofs() {
        let c = EdgeCondition::sliding_clamp()
            .with_out_of_plane_dof(1)
            .with_out_of_plane_dof(3)
            .with_in_plane_dof(0)
            .with_in_plane_dof(0);
        assert_eq!(c.out_of_plane, vec![1, 4, 3]);
        assert_eq!(c.in_plane, vec![0]);
    }
}
