//! Plate element - three-node Hermite triangle with FvK membrane coupling
//!
//! Each vertex carries `[u_x, u_y, w, w_x, w_y, w_xx, w_xy, w_yy]`, or the
//! normal-tangential Hermite block if the node has been rotated onto a
//! boundary. The discrete energy is built in Cartesian components:
//!
//! - bending: a quintic Hermite beam along every edge, `∫ (w_ss)²`
//! - curvature consistency: nodal second derivatives against the
//!   symmetrised gradient of the linearly interpolated slopes
//! - membrane: von Kármán bars, `ε = e·Δu / L + ½ (Δw / L)²`, scaled by `eta`
//!
//! Pressure and in-plane forcing are integrated over the mapped geometry,
//! so curved boundary elements carry the load of their true area.

use std::fmt;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Vector2};
use serde::{Deserialize, Serialize};

use super::curved::{CurvedEdge, ElementGeometry, GeometricMap};
use super::node::{N_HERMITE, N_VALUE, U1, U2, W};
use super::{Element, LocalDof};
use crate::config::{ScalarField, VectorField};
use crate::error::{FvkError, FvkResult};
use crate::math::{hermite, signed_area2, Vec2};
use crate::mesh::{Mesh, NodeId};

/// Local unknowns of a plate element
const N_LOCAL: usize = 3 * N_VALUE;

/// Vertex pairs forming the element edges
const EDGES: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 0)];

fn idx(vertex: usize, value: usize) -> usize {
    vertex * N_VALUE + value
}

/// Material constants of the plate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateMaterial {
    /// Poisson ratio
    pub nu: f64,
    /// FvK coupling constant
    pub eta: f64,
}

impl Default for PlateMaterial {
    fn default() -> Self {
        Self { nu: 0.5, eta: 1.0 }
    }
}

/// A triangular plate element
#[derive(Clone)]
pub struct PlateElement {
    pub(crate) nodes: [NodeId; 3],
    pub(crate) curved_edge: Option<CurvedEdge>,
    pub(crate) material: PlateMaterial,
    pressure: Option<Arc<dyn ScalarField>>,
    in_plane_forcing: Option<Arc<dyn VectorField>>,
}

impl PlateElement {
    /// Create a straight-sided element on three anticlockwise nodes
    pub fn new(nodes: [NodeId; 3]) -> Self {
        Self {
            nodes,
            curved_edge: None,
            material: PlateMaterial::default(),
            pressure: None,
            in_plane_forcing: None,
        }
    }

    pub fn nodes(&self) -> &[NodeId; 3] {
        &self.nodes
    }

    /// Local index of `node`, if the element uses it
    pub fn local_index_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    pub fn curved_edge(&self) -> Option<&CurvedEdge> {
        self.curved_edge.as_ref()
    }

    pub fn is_curved(&self) -> bool {
        self.curved_edge.is_some()
    }

    pub(crate) fn set_curved_edge(&mut self, edge: CurvedEdge) {
        self.curved_edge = Some(edge);
    }

    pub fn material(&self) -> &PlateMaterial {
        &self.material
    }

    pub fn set_material(&mut self, material: PlateMaterial) {
        self.material = material;
    }

    pub fn pressure_fct(&self) -> Option<&Arc<dyn ScalarField>> {
        self.pressure.as_ref()
    }

    pub fn set_pressure_fct(&mut self, pressure: Arc<dyn ScalarField>) {
        self.pressure = Some(pressure);
    }

    pub fn in_plane_forcing_fct(&self) -> Option<&Arc<dyn VectorField>> {
        self.in_plane_forcing.as_ref()
    }

    pub fn set_in_plane_forcing_fct(&mut self, forcing: Arc<dyn VectorField>) {
        self.in_plane_forcing = Some(forcing);
    }

    /// Replace `old` by `new` in the connectivity; returns false if `old`
    /// is not a vertex of this element
    pub(crate) fn substitute_node(&mut self, old: NodeId, new: NodeId) -> bool {
        match self.local_index_of(old) {
            Some(a) => {
                self.nodes[a] = new;
                true
            }
            None => false,
        }
    }

    /// Geometric map of the element, curved if it has been upgraded
    pub fn geometry<'a>(&'a self, mesh: &Mesh) -> FvkResult<ElementGeometry<'a>> {
        let mut vertices = [Vector2::zeros(); 3];
        for (a, &id) in self.nodes.iter().enumerate() {
            vertices[a] = mesh.node(id)?.position();
        }
        Ok(match &self.curved_edge {
            Some(edge) => ElementGeometry::Curved { vertices, edge },
            None => ElementGeometry::Straight { vertices },
        })
    }

    /// `T` with `global values = T * stored values`
    fn transformation(&self, mesh: &Mesh) -> FvkResult<DMatrix<f64>> {
        let mut t = DMatrix::identity(N_LOCAL, N_LOCAL);
        for (a, &id) in self.nodes.iter().enumerate() {
            if let Some(rotation) = mesh.node(id)?.rotation() {
                let base = idx(a, W);
                t.view_mut((base, base), (N_HERMITE, N_HERMITE))
                    .copy_from(rotation.to_global());
            }
        }
        Ok(t)
    }

    /// Residual and Jacobian with respect to Cartesian values `q`
    fn global_residual_and_jacobian(
        &self,
        mesh: &Mesh,
        q: &DVector<f64>,
    ) -> FvkResult<(DVector<f64>, DMatrix<f64>)> {
        let geometry = self.geometry(mesh)?;
        let x = *geometry.vertices();
        let area2 = signed_area2(&x[0], &x[1], &x[2]);
        if area2 <= 0.0 {
            return Err(FvkError::InvalidGeometry(format!(
                "element {:?} is degenerate or clockwise (2A = {:e})",
                self.nodes, area2
            )));
        }
        let area = 0.5 * area2;

        let mut k = DMatrix::zeros(N_LOCAL, N_LOCAL);
        add_edge_bending(&x, area, &mut k);
        add_curvature_consistency(&x, area2, self.material.nu, &mut k);

        let mut r = &k * q;
        if self.material.eta != 0.0 {
            add_membrane(&x, area, self.material.eta, q, &mut r, &mut k);
        }

        if let Some(pressure) = &self.pressure {
            let total = geometry.integrate(&|p| ScalarField::value(pressure.as_ref(), p));
            for a in 0..3 {
                r[idx(a, W)] -= total / 3.0;
            }
        }
        if let Some(forcing) = &self.in_plane_forcing {
            let fx = geometry.integrate(&|p| VectorField::value(forcing.as_ref(), p).x);
            let fy = geometry.integrate(&|p| VectorField::value(forcing.as_ref(), p).y);
            for a in 0..3 {
                r[idx(a, U1)] -= fx / 3.0;
                r[idx(a, U2)] -= fy / 3.0;
            }
        }
        Ok((r, k))
    }
}

impl fmt::Debug for PlateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlateElement")
            .field("nodes", &self.nodes)
            .field("curved_edge", &self.curved_edge)
            .field("material", &self.material)
            .field("pressure", &self.pressure.is_some())
            .field("in_plane_forcing", &self.in_plane_forcing.is_some())
            .finish()
    }
}

/// Quintic edge beams: `E = A / (6 L⁴) cᵀ G c` per edge
fn add_edge_bending(x: &[Vec2; 3], area: f64, k: &mut DMatrix<f64>) {
    let gram = DMatrix::from_column_slice(6, 6, hermite::quintic_bending_gram().as_slice());

    for (a, b) in EDGES {
        let d = x[b] - x[a];
        let len = d.norm();
        let e = d / len;
        let len2 = len * len;

        let mut bmat = DMatrix::zeros(6, N_LOCAL);
        let mut second = |row: usize, v: usize| {
            bmat[(row, idx(v, W + 3))] = len2 * e.x * e.x;
            bmat[(row, idx(v, W + 4))] = 2.0 * len2 * e.x * e.y;
            bmat[(row, idx(v, W + 5))] = len2 * e.y * e.y;
        };
        second(2, a);
        second(3, b);
        bmat[(0, idx(a, W))] = 1.0;
        bmat[(1, idx(a, W + 1))] = len * e.x;
        bmat[(1, idx(a, W + 2))] = len * e.y;
        bmat[(4, idx(b, W + 1))] = len * e.x;
        bmat[(4, idx(b, W + 2))] = len * e.y;
        bmat[(5, idx(b, W))] = 1.0;

        let scale = area / (3.0 * len2 * len2);
        *k += bmat.transpose() * (&gram * &bmat) * scale;
    }
}

/// `Σ_a (A/3) |K_a - sym ∇g|²` in the Poisson-weighted norm
fn add_curvature_consistency(x: &[Vec2; 3], area2: f64, nu: f64, k: &mut DMatrix<f64>) {
    let dl = [
        Vec2::new(x[1].y - x[2].y, x[2].x - x[1].x) / area2,
        Vec2::new(x[2].y - x[0].y, x[0].x - x[2].x) / area2,
        Vec2::new(x[0].y - x[1].y, x[1].x - x[0].x) / area2,
    ];
    let weight = DMatrix::from_row_slice(
        3,
        3,
        &[1.0, 0.0, nu, 0.0, 2.0 * (1.0 - nu), 0.0, nu, 0.0, 1.0],
    );
    let scale = area2 / 6.0;

    for a in 0..3 {
        let mut c = DMatrix::zeros(3, N_LOCAL);
        for row in 0..3 {
            c[(row, idx(a, W + 3 + row))] = 1.0;
        }
        for (b, grad) in dl.iter().enumerate() {
            let gx = idx(b, W + 1);
            let gy = idx(b, W + 2);
            c[(0, gx)] -= grad.x;
            c[(1, gx)] -= 0.5 * grad.y;
            c[(1, gy)] -= 0.5 * grad.x;
            c[(2, gy)] -= grad.y;
        }
        *k += c.transpose() * (&weight * &c) * scale;
    }
}

/// Nonlinear bars along the edges: residual and tangent stiffness
fn add_membrane(
    x: &[Vec2; 3],
    area: f64,
    eta: f64,
    q: &DVector<f64>,
    r: &mut DVector<f64>,
    k: &mut DMatrix<f64>,
) {
    let stiffness = eta * area / 3.0;

    for (a, b) in EDGES {
        let d = x[b] - x[a];
        let len = d.norm();
        let e = d / len;
        let len2 = len * len;

        let du = Vec2::new(
            q[idx(b, U1)] - q[idx(a, U1)],
            q[idx(b, U2)] - q[idx(a, U2)],
        );
        let dw = q[idx(b, W)] - q[idx(a, W)];
        let strain = e.dot(&du) / len + 0.5 * dw * dw / len2;

        let mut grad = DVector::zeros(N_LOCAL);
        grad[idx(a, U1)] = -e.x / len;
        grad[idx(a, U2)] = -e.y / len;
        grad[idx(b, U1)] = e.x / len;
        grad[idx(b, U2)] = e.y / len;
        grad[idx(a, W)] = -dw / len2;
        grad[idx(b, W)] = dw / len2;

        r.axpy(stiffness * strain, &grad, 1.0);
        k.ger(stiffness, &grad, &grad, 1.0);

        let c = stiffness * strain / len2;
        let (wa, wb) = (idx(a, W), idx(b, W));
        k[(wa, wa)] += c;
        k[(wb, wb)] += c;
        k[(wa, wb)] -= c;
        k[(wb, wa)] -= c;
    }
}

impl Element for PlateElement {
    fn local_dofs(&self) -> Vec<LocalDof> {
        self.nodes
            .iter()
            .flat_map(|&node| (0..N_VALUE).map(move |value| LocalDof::Nodal { node, value }))
            .collect()
    }

    fn fill_in_contribution_to_residuals(
        &self,
        mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
    ) -> FvkResult<()> {
        let t = self.transformation(mesh)?;
        let q = &t * values;
        let (r, _) = self.global_residual_and_jacobian(mesh, &q)?;
        *residuals += t.transpose() * r;
        Ok(())
    }

    fn fill_in_contribution_to_jacobian(
        &self,
        mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
    ) -> FvkResult<()> {
        let t = self.transformation(mesh)?;
        let q = &t * values;
        let (r, k) = self.global_residual_and_jacobian(mesh, &q)?;
        let tt = t.transpose();
        *residuals += &tt * r;
        *jacobian += &tt * k * &t;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::circle_frame;
    use crate::elements::{hermite_index, NodalRotation};
    use approx::assert_relative_eq;

    fn single_element_mesh() -> Mesh {
        let mut mesh = Mesh::new(Vec::new());
        let a = mesh.add_node(0.1, 0.0);
        let b = mesh.add_node(1.0, 0.2);
        let c = mesh.add_node(0.3, 0.9);
        mesh.add_element([a, b, c]).unwrap();
        mesh
    }

    fn gather(mesh: &Mesh, element: &PlateElement) -> DVector<f64> {
        DVector::from_iterator(
            N_LOCAL,
            element.local_dofs().iter().map(|dof| match *dof {
                LocalDof::Nodal { node, value } => mesh.node(node).unwrap().data().value(value),
                LocalDof::Lagrange { .. } => unreachable!(),
            }),
        )
    }

    #[test]
    fn test_linear_field_has_no_bending_residual() {
        let mut mesh = single_element_mesh();
        mesh.element_mut(0).unwrap().set_material(PlateMaterial { nu: 0.3, eta: 0.0 });
        for id in 0..3 {
            let p = mesh.node(id).unwrap().position();
            let data = mesh.node_mut(id).unwrap().data_mut();
            data.set_value(W, 1.0 + 2.0 * p.x - 0.5 * p.y);
            data.set_value(W + 1, 2.0);
            data.set_value(W + 2, -0.5);
        }
        let element = mesh.element(0).unwrap().clone();
        let values = gather(&mesh, &element);
        let mut r = DVector::zeros(N_LOCAL);
        element
            .fill_in_contribution_to_residuals(&mesh, &values, &mut r)
            .unwrap();
        assert!(r.amax() < 1e-10, "max residual {}", r.amax());
    }

    #[test]
    fn test_pressure_load_balances_area() {
        let mut mesh = single_element_mesh();
        mesh.element_mut(0)
            .unwrap()
            .set_pressure_fct(Arc::new(|_x: &Vector2<f64>| 2.0));
        let element = mesh.element(0).unwrap().clone();
        let values = DVector::zeros(N_LOCAL);
        let mut r = DVector::zeros(N_LOCAL);
        element
            .fill_in_contribution_to_residuals(&mesh, &values, &mut r)
            .unwrap();
        let area = element.geometry(&mesh).unwrap().area();
        let total: f64 = (0..3).map(|a| r[idx(a, W)]).sum();
        assert_relative_eq!(total, -2.0 * area, epsilon = 1e-12);
    }

    #[test]
    fn test_analytic_jacobian_matches_finite_differences() {
        let mut mesh = single_element_mesh();
        mesh.element_mut(0).unwrap().set_material(PlateMaterial { nu: 0.4, eta: 3.0 });
        let p = mesh.node(1).unwrap().position();
        let rotation = NodalRotation::new(0, 0.0, circle_frame(&p, p.norm())).unwrap();
        mesh.node_mut(1).unwrap().set_rotation(rotation);

        let element = mesh.element(0).unwrap().clone();
        let values = DVector::from_fn(N_LOCAL, |i, _| 0.05 * ((i * 7 % 11) as f64 - 5.0));

        let mut r = DVector::zeros(N_LOCAL);
        let mut jac = DMatrix::zeros(N_LOCAL, N_LOCAL);
        element
            .fill_in_contribution_to_jacobian(&mesh, &values, &mut r, &mut jac)
            .unwrap();

        let h = 1e-7;
        for j in 0..N_LOCAL {
            let mut plus = values.clone();
            let mut minus = values.clone();
            plus[j] += h;
            minus[j] -= h;
            let mut rp = DVector::zeros(N_LOCAL);
            let mut rm = DVector::zeros(N_LOCAL);
            element
                .fill_in_contribution_to_residuals(&mesh, &plus, &mut rp)
                .unwrap();
            element
                .fill_in_contribution_to_residuals(&mesh, &minus, &mut rm)
                .unwrap();
            for i in 0..N_LOCAL {
                let fd = (rp[i] - rm[i]) / (2.0 * h);
                assert_relative_eq!(jac[(i, j)], fd, epsilon = 1e-5, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_rotated_node_sees_same_field() {
        let mut mesh = single_element_mesh();
        mesh.element_mut(0).unwrap().set_material(PlateMaterial { nu: 0.3, eta: 0.0 });
        // Quadratic field w = x^2 + xy stored in Cartesian form
        for id in 0..3 {
            let p = mesh.node(id).unwrap().position();
            let data = mesh.node_mut(id).unwrap().data_mut();
            let block = [p.x * p.x + p.x * p.y, 2.0 * p.x + p.y, p.x, 2.0, 1.0, 0.0];
            for (k, v) in block.iter().enumerate() {
                data.set_value(hermite_index(k), *v);
            }
        }
        let element = mesh.element(0).unwrap().clone();
        let mut before = DVector::zeros(N_LOCAL);
        element
            .fill_in_contribution_to_residuals(&mesh, &gather(&mesh, &element), &mut before)
            .unwrap();

        let p = mesh.node(2).unwrap().position();
        let rotation = NodalRotation::new(0, 0.0, circle_frame(&p, p.norm())).unwrap();
        mesh.node_mut(2).unwrap().set_rotation(rotation);
        let mut after = DVector::zeros(N_LOCAL);
        element
            .fill_in_contribution_to_residuals(&mesh, &gather(&mesh, &element), &mut after)
            .unwrap();

        // Unrotated nodes see identical residuals
        for i in 0..2 * N_VALUE {
            assert_relative_eq!(before[i], after[i], epsilon = 1e-10);
        }
        // The rotated node's residual is the transformed Cartesian one
        let to_global = *mesh.node(2).unwrap().rotation().unwrap().to_global();
        let cart = before.rows(idx(2, W), N_HERMITE).into_owned();
        let expected = to_global.transpose() * nalgebra::Vector6::from_column_slice(cart.as_slice());
        for k in 0..N_HERMITE {
            assert_relative_eq!(after[idx(2, W) + k], expected[k], epsilon = 1e-10);
        }
    }
}
