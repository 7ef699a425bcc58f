//! Result types for the FvK solve

use serde::{Deserialize, Serialize};

use crate::elements::{Node, U1, U2};

/// Solution at a node, with the Hermite block in Cartesian components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSolution {
    pub node: usize,
    pub x: f64,
    pub y: f64,
    /// In-plane displacement `[u_x, u_y]`
    pub u: [f64; 2],
    /// `[w, w_x, w_y, w_xx, w_xy, w_yy]`
    pub hermite: [f64; 6],
    /// Boundaries the node lies on
    pub boundaries: Vec<usize>,
}

impl NodeSolution {
    pub fn from_node(id: usize, node: &Node) -> Self {
        let global = node.global_hermite_values();
        Self {
            node: id,
            x: node.x,
            y: node.y,
            u: [node.data().value(U1), node.data().value(U2)],
            hermite: std::array::from_fn(|k| global[k]),
            boundaries: node.boundaries().collect(),
        }
    }

    /// Transverse displacement
    pub fn w(&self) -> f64 {
        self.hermite[0]
    }

    /// Magnitude of the in-plane displacement
    pub fn in_plane_magnitude(&self) -> f64 {
        (self.u[0].powi(2) + self.u[1].powi(2)).sqrt()
    }
}

/// Summary of a Newton solve
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolutionSummary {
    /// Newton iterations taken
    pub newton_iterations: usize,
    /// Maximum residual at convergence
    pub residual_norm: f64,
    /// Largest |w| over all nodes
    pub max_abs_w: f64,
    /// Number of unknowns
    pub n_dof: usize,
    pub n_nodes: usize,
    pub n_elements: usize,
    /// Corner multipliers left as unknowns
    pub n_active_multipliers: usize,
    /// Corner multipliers pinned to zero
    pub n_redundant_multipliers: usize,
}
