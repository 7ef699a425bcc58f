//! Mesh arena - nodes, triangles and boundary registries
//!
//! The mesh owns all node and element storage. Everything else refers to
//! nodes and elements by index.

pub mod sector;

use std::sync::Arc;

use crate::config::BoundaryFunction;
use crate::curves::ParametricCurve;
use crate::elements::{hermite_index, Node, PlateElement, N_HERMITE, U1, U2};
use crate::error::{FvkError, FvkResult};
use crate::math::signed_area2;

pub use sector::CircularSector;

/// Index of a node in the mesh
pub type NodeId = usize;
/// Index of an element in the mesh
pub type ElementId = usize;

/// Triangulated domain with boundary bookkeeping
#[derive(Debug, Clone)]
pub struct Mesh {
    nodes: Vec<Node>,
    elements: Vec<PlateElement>,
    curves: Vec<Arc<dyn ParametricCurve>>,
    boundary_nodes: Vec<Vec<NodeId>>,
    boundary_elements: Vec<Vec<ElementId>>,
}

impl Mesh {
    /// Create an empty mesh with one boundary per curve
    pub fn new(curves: Vec<Arc<dyn ParametricCurve>>) -> Self {
        let nboundary = curves.len();
        Self {
            nodes: Vec::new(),
            elements: Vec::new(),
            curves,
            boundary_nodes: vec![Vec::new(); nboundary],
            boundary_elements: vec![Vec::new(); nboundary],
        }
    }

    // ========================
    // Nodes and elements
    // ========================

    pub fn add_node(&mut self, x: f64, y: f64) -> NodeId {
        self.nodes.push(Node::new(x, y));
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> FvkResult<&Node> {
        self.nodes.get(id).ok_or(FvkError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> FvkResult<&mut Node> {
        self.nodes.get_mut(id).ok_or(FvkError::NodeNotFound(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nnode(&self) -> usize {
        self.nodes.len()
    }

    /// Add a triangle; vertices must be anticlockwise
    pub fn add_element(&mut self, nodes: [NodeId; 3]) -> FvkResult<ElementId> {
        let [a, b, c] = nodes;
        let area2 = signed_area2(
            &self.node(a)?.position(),
            &self.node(b)?.position(),
            &self.node(c)?.position(),
        );
        if area2 <= 0.0 {
            return Err(FvkError::InvalidGeometry(format!(
                "triangle {:?} is clockwise or degenerate (2A = {:e})",
                nodes, area2
            )));
        }
        self.elements.push(PlateElement::new(nodes));
        Ok(self.elements.len() - 1)
    }

    pub fn element(&self, id: ElementId) -> FvkResult<&PlateElement> {
        self.elements.get(id).ok_or(FvkError::ElementNotFound(id))
    }

    pub fn element_mut(&mut self, id: ElementId) -> FvkResult<&mut PlateElement> {
        self.elements.get_mut(id).ok_or(FvkError::ElementNotFound(id))
    }

    pub fn elements(&self) -> &[PlateElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [PlateElement] {
        &mut self.elements
    }

    pub fn nelement(&self) -> usize {
        self.elements.len()
    }

    // ========================
    // Boundaries
    // ========================

    pub fn nboundary(&self) -> usize {
        self.curves.len()
    }

    pub fn curve(&self, b: usize) -> FvkResult<&Arc<dyn ParametricCurve>> {
        self.curves.get(b).ok_or(FvkError::BoundaryNotFound(b))
    }

    pub fn boundary_nodes(&self, b: usize) -> FvkResult<&[NodeId]> {
        self.boundary_nodes
            .get(b)
            .map(Vec::as_slice)
            .ok_or(FvkError::BoundaryNotFound(b))
    }

    pub fn boundary_elements(&self, b: usize) -> FvkResult<&[ElementId]> {
        self.boundary_elements
            .get(b)
            .map(Vec::as_slice)
            .ok_or(FvkError::BoundaryNotFound(b))
    }

    /// Register `node` on boundary `b`
    pub fn add_boundary_node(&mut self, b: usize, node: NodeId) -> FvkResult<()> {
        let registry = self
            .boundary_nodes
            .get_mut(b)
            .ok_or(FvkError::BoundaryNotFound(b))?;
        let node_ref = self.nodes.get_mut(node).ok_or(FvkError::NodeNotFound(node))?;
        if !registry.contains(&node) {
            registry.push(node);
        }
        node_ref.boundaries.insert(b);
        Ok(())
    }

    /// Remove `node` from boundary `b`
    pub fn remove_boundary_node(&mut self, b: usize, node: NodeId) -> FvkResult<()> {
        let registry = self
            .boundary_nodes
            .get_mut(b)
            .ok_or(FvkError::BoundaryNotFound(b))?;
        let node_ref = self.nodes.get_mut(node).ok_or(FvkError::NodeNotFound(node))?;
        registry.retain(|&n| n != node);
        node_ref.boundaries.remove(&b);
        Ok(())
    }

    /// Rebuild the boundary-element registries: an element belongs to
    /// boundary `b` if one of its edges has both ends on `b`
    pub fn setup_boundary_element_info(&mut self) {
        for registry in self.boundary_elements.iter_mut() {
            registry.clear();
        }
        for (e, element) in self.elements.iter().enumerate() {
            for b in 0..self.curves.len() {
                let on_b = element.nodes.map(|n| self.nodes[n].is_on_boundary(b));
                if (0..3).any(|i| on_b[i] && on_b[(i + 1) % 3]) {
                    self.boundary_elements[b].push(e);
                }
            }
        }
    }

    /// Number of edges of `element` whose ends share a boundary
    fn boundary_edge_count(&self, element: &PlateElement) -> usize {
        (0..3)
            .filter(|&i| {
                let a = &self.nodes[element.nodes[i]];
                let b = &self.nodes[element.nodes[(i + 1) % 3]];
                a.boundaries.intersection(&b.boundaries).next().is_some()
            })
            .count()
    }

    /// Split every element with more than one boundary edge into three
    /// about its centroid. Returns the number of elements split.
    pub fn split_elements_with_multiple_boundary_edges(&mut self) -> FvkResult<usize> {
        let n_original = self.elements.len();
        let mut nsplit = 0;
        for e in 0..n_original {
            if self.boundary_edge_count(&self.elements[e]) < 2 {
                continue;
            }
            let [a, b, c] = self.elements[e].nodes;
            let centroid = (self.node(a)?.position()
                + self.node(b)?.position()
                + self.node(c)?.position())
                / 3.0;
            let g = self.add_node(centroid.x, centroid.y);

            let template = self.elements[e].clone();
            self.elements[e].nodes = [a, b, g];
            for nodes in [[b, c, g], [c, a, g]] {
                let mut child = template.clone();
                child.nodes = nodes;
                self.elements.push(child);
            }
            nsplit += 1;
        }
        if nsplit > 0 {
            log::info!("split {} elements with multiple boundary edges", nsplit);
        }
        self.setup_boundary_element_info();
        Ok(nsplit)
    }

    /// Replace `old` by `new` in element `element`
    pub fn substitute_node(&mut self, element: ElementId, old: NodeId, new: NodeId) -> FvkResult<()> {
        self.node(new)?;
        let el = self.element_mut(element)?;
        if el.substitute_node(old, new) {
            Ok(())
        } else {
            Err(FvkError::MeshTopology(format!(
                "node {} is not a vertex of element {}",
                old, element
            )))
        }
    }

    /// Nodes of `element` lying on boundary `b`
    fn nodes_of_element_on_boundary(&self, element: ElementId, b: usize) -> FvkResult<Vec<NodeId>> {
        if b >= self.nboundary() {
            return Err(FvkError::BoundaryNotFound(b));
        }
        Ok(self
            .element(element)?
            .nodes
            .iter()
            .copied()
            .filter(|&n| self.nodes[n].is_on_boundary(b))
            .collect())
    }

    // ========================
    // Boundary conditions
    // ========================

    /// Pin in-plane component `dof` (0 or 1) at the nodes of `element` on
    /// boundary `b`, with values from `fct`
    pub fn fix_in_plane_displacement_dof(
        &mut self,
        element: ElementId,
        dof: usize,
        b: usize,
        fct: &dyn BoundaryFunction,
    ) -> FvkResult<()> {
        let value_index = match dof {
            0 => U1,
            1 => U2,
            _ => {
                return Err(FvkError::InvalidInput(format!(
                    "in-plane dof must be 0 or 1, got {}",
                    dof
                )))
            }
        };
        for n in self.nodes_of_element_on_boundary(element, b)? {
            let node = &mut self.nodes[n];
            let value = fct.value(&node.position());
            node.data.set_value(value_index, value);
            node.data.pin(value_index);
        }
        Ok(())
    }

    /// Pin Hermite dof `dof` (in the node's active frame) at the nodes of
    /// `element` on boundary `b`, with values from `fct`
    pub fn fix_out_of_plane_displacement_dof(
        &mut self,
        element: ElementId,
        dof: usize,
        b: usize,
        fct: &dyn BoundaryFunction,
    ) -> FvkResult<()> {
        if dof >= N_HERMITE {
            return Err(FvkError::InvalidInput(format!(
                "out-of-plane dof must be below {}, got {}",
                N_HERMITE, dof
            )));
        }
        let value_index = hermite_index(dof);
        for n in self.nodes_of_element_on_boundary(element, b)? {
            let node = &mut self.nodes[n];
            let value = fct.value(&node.position());
            node.data.set_value(value_index, value);
            node.data.pin(value_index);
        }
        Ok(())
    }

    /// Pin both in-plane components at every node to zero
    pub fn pin_all_in_plane_displacements(&mut self) {
        for node in self.nodes.iter_mut() {
            for i in [U1, U2] {
                node.data.set_value(i, 0.0);
                node.data.pin(i);
            }
        }
    }

    /// Release every pinned nodal value
    pub fn unpin_all(&mut self) {
        for node in self.nodes.iter_mut() {
            node.data.unpin_all();
        }
    }
}
