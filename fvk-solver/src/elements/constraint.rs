//! Duplicate-node constraint at a boundary corner
//!
//! Where two boundaries meet, the corner node is split into a `left` copy
//! (rotated into the frame of the boundary ending at the corner) and a
//! `right` copy (frame of the boundary starting there). Eight multipliers
//! tie the copies together:
//!
//! ```text
//! u_right = u_left
//! h_right = M h_left
//! ```
//!
//! where `h` is the Hermite block and `M` the chain-rule matrix of the map
//! from right to left boundary coordinates. Some rows become redundant once
//! boundary conditions pin both sides; [`DuplicateNodeConstraintElement::validate_redundancy`]
//! finds them and pins their multipliers to zero.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::node::{DofBlock, N_VALUE, W};
use super::{Element, LocalDof};
use crate::curves::{BoundaryFrame, ParametricCurve};
use crate::error::{FvkError, FvkResult};
use crate::math::CoordinateJet;
use crate::mesh::{Mesh, NodeId};

/// Which copy of the corner node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Outcome of the redundancy check for one constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintState {
    Unchecked,
    /// Row owns a free value and keeps its multiplier
    Active,
    /// Row is implied by pinned values; multiplier pinned to zero
    Redundant,
}

/// Free value claimed by an active constraint row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimedDof {
    pub side: Side,
    /// Node value index
    pub value: usize,
}

/// One end of a corner constraint: node, boundary and frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintEnd {
    pub node: NodeId,
    pub boundary: usize,
    pub zeta: f64,
    pub frame: BoundaryFrame,
}

impl ConstraintEnd {
    /// Evaluate the frame of `curve` at `zeta`
    pub fn on_curve(
        node: NodeId,
        boundary: usize,
        zeta: f64,
        curve: &dyn ParametricCurve,
    ) -> FvkResult<Self> {
        Ok(Self {
            node,
            boundary,
            zeta,
            frame: curve.frame(zeta)?,
        })
    }
}

/// Left values that may absorb constraint row `row`, after the right value
fn left_candidates(row: usize) -> std::ops::Range<usize> {
    match row {
        0..=2 => row..row + 1,
        3 | 4 => W + 1..W + 3,
        _ => W + 1..N_VALUE,
    }
}

/// Lagrange-multiplier element gluing the two copies of a corner node
#[derive(Debug, Clone)]
pub struct DuplicateNodeConstraintElement {
    index: usize,
    left: ConstraintEnd,
    right: ConstraintEnd,
    transform: CoordinateJet,
    /// `G` with `G [q_left; q_right] = 0`
    matrix: DMatrix<f64>,
    multipliers: DofBlock,
    states: [ConstraintState; N_VALUE],
    claimed: [Option<ClaimedDof>; N_VALUE],
}

impl DuplicateNodeConstraintElement {
    /// Create the constraint; `index` is its position in the problem's
    /// constraint list and names its multipliers
    pub fn new(index: usize, left: ConstraintEnd, right: ConstraintEnd) -> FvkResult<Self> {
        let transform = left.frame.jet().inverse()?.compose(&right.frame.jet());
        let chain = transform.hermite_matrix();

        let mut matrix = DMatrix::zeros(N_VALUE, 2 * N_VALUE);
        for i in 0..N_VALUE {
            matrix[(i, N_VALUE + i)] = 1.0;
        }
        matrix[(0, 0)] = -1.0;
        matrix[(1, 1)] = -1.0;
        for i in 0..6 {
            for j in 0..6 {
                matrix[(W + i, W + j)] = -chain[(i, j)];
            }
        }

        Ok(Self {
            index,
            left,
            right,
            transform,
            matrix,
            multipliers: DofBlock::new(),
            states: [ConstraintState::Unchecked; N_VALUE],
            claimed: [None; N_VALUE],
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn left(&self) -> &ConstraintEnd {
        &self.left
    }

    pub fn right(&self) -> &ConstraintEnd {
        &self.right
    }

    pub fn left_node(&self) -> NodeId {
        self.left.node
    }

    pub fn right_node(&self) -> NodeId {
        self.right.node
    }

    /// Jet of the map from right to left boundary coordinates
    pub fn transform(&self) -> &CoordinateJet {
        &self.transform
    }

    pub fn constraint_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn multipliers(&self) -> &DofBlock {
        &self.multipliers
    }

    pub fn multipliers_mut(&mut self) -> &mut DofBlock {
        &mut self.multipliers
    }

    pub fn states(&self) -> &[ConstraintState; N_VALUE] {
        &self.states
    }

    pub fn state(&self, row: usize) -> ConstraintState {
        self.states[row]
    }

    pub fn claimed(&self, row: usize) -> Option<ClaimedDof> {
        self.claimed[row]
    }

    pub fn n_active(&self) -> usize {
        self.count(ConstraintState::Active)
    }

    pub fn n_redundant(&self) -> usize {
        self.count(ConstraintState::Redundant)
    }

    fn count(&self, state: ConstraintState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    /// Stored values of both copies, left first
    fn nodal_values(&self, mesh: &Mesh) -> FvkResult<DVector<f64>> {
        let left = mesh.node(self.left.node)?.data();
        let right = mesh.node(self.right.node)?.data();
        Ok(DVector::from_iterator(
            2 * N_VALUE,
            left.values().iter().chain(right.values().iter()).copied(),
        ))
    }

    /// Decide which rows are independent of the pinned values.
    ///
    /// Each row tries to claim a free, unclaimed value with a non-negligible
    /// coefficient: the matching right value first, then left values in
    /// order. A row that cannot claim anything must already be satisfied by
    /// the pinned data; its multiplier is pinned to zero.
    pub fn validate_redundancy(&mut self, mesh: &Mesh, tolerance: f64) -> FvkResult<()> {
        self.multipliers.unpin_all();
        self.states = [ConstraintState::Unchecked; N_VALUE];
        self.claimed = [None; N_VALUE];

        let left = *mesh.node(self.left.node)?.data();
        let right = *mesh.node(self.right.node)?.data();
        let values = self.nodal_values(mesh)?;
        let position = mesh.node(self.left.node)?.position();

        let mut left_used = [false; N_VALUE];
        let mut right_used = [false; N_VALUE];

        for row in 0..N_VALUE {
            let claim = if !right.is_pinned(row) && !right_used[row] {
                Some(ClaimedDof {
                    side: Side::Right,
                    value: row,
                })
            } else {
                left_candidates(row)
                    .find(|&j| {
                        !left.is_pinned(j)
                            && !left_used[j]
                            // skip zero transform factors; an active row must own a live coefficient
                            && self.matrix[(row, j)].abs() > tolerance
                    })
                    .map(|j| ClaimedDof {
                        side: Side::Left,
                        value: j,
                    })
            };

            match claim {
                Some(dof) => {
                    match dof.side {
                        Side::Left => left_used[dof.value] = true,
                        Side::Right => right_used[dof.value] = true,
                    }
                    self.claimed[row] = Some(dof);
                    self.states[row] = ConstraintState::Active;
                }
                None => {
                    let residual = self.matrix.row(row).dot(&values.transpose());
                    if residual.abs() > tolerance {
                        return Err(FvkError::UnsatisfiableConstraint {
                            index: row,
                            x: position.x,
                            y: position.y,
                            residual,
                            tolerance,
                        });
                    }
                    self.multipliers.set_value(row, 0.0);
                    self.multipliers.pin(row);
                    self.states[row] = ConstraintState::Redundant;
                }
            }
        }

        log::debug!(
            "corner constraint {} at ({:.4}, {:.4}): {} active, {} redundant",
            self.index,
            position.x,
            position.y,
            self.n_active(),
            self.n_redundant()
        );
        Ok(())
    }

    /// Constraint residuals `G q` for the current nodal values
    pub fn violation(&self, mesh: &Mesh) -> FvkResult<DVector<f64>> {
        Ok(&self.matrix * self.nodal_values(mesh)?)
    }
}

impl Element for DuplicateNodeConstraintElement {
    fn local_dofs(&self) -> Vec<LocalDof> {
        let nodal = [self.left.node, self.right.node]
            .into_iter()
            .flat_map(|node| (0..N_VALUE).map(move |value| LocalDof::Nodal { node, value }));
        let lagrange = (0..N_VALUE).map(|value| LocalDof::Lagrange {
            constraint: self.index,
            value,
        });
        nodal.chain(lagrange).collect()
    }

    fn fill_in_contribution_to_residuals(
        &self,
        _mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
    ) -> FvkResult<()> {
        let q = values.rows(0, 2 * N_VALUE);
        let lambda = values.rows(2 * N_VALUE, N_VALUE);
        let mut nodal = residuals.rows_mut(0, 2 * N_VALUE);
        nodal += self.matrix.transpose() * lambda;
        let mut rows = residuals.rows_mut(2 * N_VALUE, N_VALUE);
        rows += &self.matrix * q;
        Ok(())
    }

    fn fill_in_contribution_to_jacobian(
        &self,
        mesh: &Mesh,
        values: &DVector<f64>,
        residuals: &mut DVector<f64>,
        jacobian: &mut DMatrix<f64>,
    ) -> FvkResult<()> {
        self.fill_in_contribution_to_residuals(mesh, values, residuals)?;
        let mut lower = jacobian.view_mut((2 * N_VALUE, 0), (N_VALUE, 2 * N_VALUE));
        lower += &self.matrix;
        let mut upper = jacobian.view_mut((0, 2 * N_VALUE), (2 * N_VALUE, N_VALUE));
        upper += self.matrix.transpose();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{ellipse_intersection, CircularArc, EllipticalArc, StraightLine};
    use crate::elements::{hermite_index, NodalRotation};
    use approx::assert_relative_eq;
    use nalgebra::Vector2;
    use std::sync::Arc;

    /// Corner at `x` where boundary 0 (`incoming`) hands over to boundary 1
    /// (`outgoing`)
    fn corner(
        incoming: Arc<dyn ParametricCurve>,
        outgoing: Arc<dyn ParametricCurve>,
        x: Vector2<f64>,
    ) -> (Mesh, DuplicateNodeConstraintElement) {
        let mut mesh = Mesh::new(vec![incoming.clone(), outgoing.clone()]);
        let left = mesh.add_node(x.x, x.y);
        let right = mesh.add_node(x.x, x.y);

        let left_end =
            ConstraintEnd::on_curve(left, 0, incoming.zeta(&x), incoming.as_ref()).unwrap();
        let right_end =
            ConstraintEnd::on_curve(right, 1, outgoing.zeta(&x), outgoing.as_ref()).unwrap();
        let constraint = DuplicateNodeConstraintElement::new(0, left_end, right_end).unwrap();
        (mesh, constraint)
    }

    /// Two straight boundaries meeting at the origin at a right angle:
    /// boundary 0 runs along the x-axis into the corner, boundary 1 leaves
    /// it up the y-axis.
    fn right_angle_corner() -> (Mesh, DuplicateNodeConstraintElement) {
        corner(
            Arc::new(StraightLine::new(Vector2::new(-1.0, 0.0), Vector2::zeros())),
            Arc::new(StraightLine::new(Vector2::zeros(), Vector2::new(0.0, 1.0))),
            Vector2::zeros(),
        )
    }

    /// Store `w = 1 + x - 2y + 3x² + xy - y² + x³/2 - x²y + 0.7y³` and a
    /// constant `u` at both copies in Cartesian form, then rotate each copy
    /// into its own boundary frame
    fn impose_global_cubic(mesh: &mut Mesh, constraint: &DuplicateNodeConstraintElement) {
        let p = mesh.node(constraint.left_node()).unwrap().position();
        let (x, y) = (p.x, p.y);
        let global = [
            1.0 + x - 2.0 * y + 3.0 * x * x + x * y - y * y + 0.5 * x.powi(3) - x * x * y
                + 0.7 * y.powi(3),
            1.0 + 6.0 * x + y + 1.5 * x * x - 2.0 * x * y,
            -2.0 + x - 2.0 * y - x * x + 2.1 * y * y,
            6.0 + 3.0 * x - 2.0 * y,
            1.0 - 2.0 * x,
            -2.0 + 4.2 * y,
        ];
        for node in [constraint.left_node(), constraint.right_node()] {
            let data = mesh.node_mut(node).unwrap().data_mut();
            data.set_value(0, 0.1);
            data.set_value(1, -0.2);
            for (k, v) in global.iter().enumerate() {
                data.set_value(hermite_index(k), *v);
            }
        }
        let (left, right) = (*constraint.left(), *constraint.right());
        rotate(mesh, &left);
        rotate(mesh, &right);
    }

    fn rotate(mesh: &mut Mesh, end: &ConstraintEnd) {
        let rotation = NodalRotation::new(end.boundary, end.zeta, end.frame).unwrap();
        mesh.node_mut(end.node).unwrap().set_rotation(rotation);
    }

    fn pin_clamped(mesh: &mut Mesh, node: NodeId) {
        let data = mesh.node_mut(node).unwrap().data_mut();
        data.pin(0);
        data.pin(1);
        for k in [0, 1, 2, 4, 5] {
            data.pin(hermite_index(k));
        }
    }

    #[test]
    fn test_right_angle_transform() {
        let (_, constraint) = right_angle_corner();
        let jac = constraint.transform().jacobian;
        assert_relative_eq!(jac[(0, 0)], 0.0, epsilon = 1e-14);
        assert_relative_eq!(jac[(0, 1)], -1.0, epsilon = 1e-14);
        assert_relative_eq!(jac[(1, 0)], 1.0, epsilon = 1e-14);
        assert_relative_eq!(jac[(1, 1)], 0.0, epsilon = 1e-14);
        assert!(constraint.transform().is_affine(1e-14));
    }

    #[test]
    fn test_free_nodes_claim_right_values() {
        let (mesh, mut constraint) = right_angle_corner();
        constraint.validate_redundancy(&mesh, 1e-10).unwrap();
        assert_eq!(constraint.n_active(), N_VALUE);
        for row in 0..N_VALUE {
            assert_eq!(
                constraint.claimed(row),
                Some(ClaimedDof {
                    side: Side::Right,
                    value: row
                })
            );
        }
    }

    #[test]
    fn test_clamped_corner_keeps_curvature_rows() {
        let (mut mesh, mut constraint) = right_angle_corner();
        let (left, right) = (*constraint.left(), *constraint.right());
        rotate(&mut mesh, &left);
        rotate(&mut mesh, &right);
        pin_clamped(&mut mesh, left.node);
        pin_clamped(&mut mesh, right.node);

        constraint.validate_redundancy(&mesh, 1e-10).unwrap();

        let active: Vec<usize> = (0..N_VALUE)
            .filter(|&row| constraint.state(row) == ConstraintState::Active)
            .collect();
        assert_eq!(active, vec![5, 7]);
        assert_eq!(
            constraint.claimed(7),
            Some(ClaimedDof {
                side: Side::Left,
                value: hermite_index(3)
            })
        );
        for row in [0, 1, 2, 3, 4, 6] {
            assert!(constraint.multipliers().is_pinned(row));
            assert_eq!(constraint.multipliers().value(row), 0.0);
        }
    }

    #[test]
    fn test_validation_is_idempotent() {
        let (mut mesh, mut constraint) = right_angle_corner();
        let (left, right) = (*constraint.left(), *constraint.right());
        rotate(&mut mesh, &left);
        rotate(&mut mesh, &right);
        pin_clamped(&mut mesh, right.node);

        constraint.validate_redundancy(&mesh, 1e-10).unwrap();
        let first = (*constraint.states(), constraint.n_active());
        constraint.validate_redundancy(&mesh, 1e-10).unwrap();
        assert_eq!((*constraint.states(), constraint.n_active()), first);
        assert_eq!(constraint.multipliers().nfree(), first.1);
    }

    #[test]
    fn test_moving_pins_across_the_corner_flips_claims() {
        let (mut mesh, mut constraint) = right_angle_corner();
        let (left, right) = (*constraint.left(), *constraint.right());
        rotate(&mut mesh, &left);
        rotate(&mut mesh, &right);
        let sides = |c: &DuplicateNodeConstraintElement| -> Vec<Option<(Side, usize)>> {
            (0..N_VALUE)
                .map(|row| c.claimed(row).map(|d| (d.side, d.value)))
                .collect()
        };

        pin_clamped(&mut mesh, left.node);
        constraint.validate_redundancy(&mesh, 1e-10).unwrap();
        assert_eq!(constraint.n_active(), N_VALUE);
        assert!(sides(&constraint)
            .iter()
            .enumerate()
            .all(|(row, claim)| *claim == Some((Side::Right, row))));

        mesh.node_mut(left.node).unwrap().data_mut().unpin_all();
        pin_clamped(&mut mesh, right.node);
        constraint.validate_redundancy(&mesh, 1e-10).unwrap();
        assert_eq!(constraint.n_active(), N_VALUE);
        assert_eq!(constraint.multipliers().nfree(), N_VALUE);
        let l = |j| Some((Side::Left, j));
        assert_eq!(
            sides(&constraint),
            vec![
                l(0),
                l(1),
                l(2),
                l(hermite_index(2)),
                l(hermite_index(1)),
                Some((Side::Right, hermite_index(3))),
                l(hermite_index(4)),
                l(hermite_index(3)),
            ]
        );
    }

    #[test]
    fn test_conflicting_pinned_values_are_rejected() {
        let (mut mesh, mut constraint) = right_angle_corner();
        let right = constraint.right_node();
        let left = constraint.left_node();
        mesh.node_mut(left).unwrap().data_mut().pin(W);
        let data = mesh.node_mut(right).unwrap().data_mut();
        data.pin(W);
        data.set_value(W, 1.0);

        match constraint.validate_redundancy(&mesh, 1e-10) {
            Err(FvkError::UnsatisfiableConstraint {
                index, residual, ..
            }) => {
                assert_eq!(index, W);
                assert_relative_eq!(residual, 1.0);
            }
            other => panic!("expected unsatisfiable constraint, got {other:?}"),
        }
    }

    #[test]
    fn test_consistent_field_satisfies_constraint() {
        let (mut mesh, constraint) = right_angle_corner();
        impose_global_cubic(&mut mesh, &constraint);

        let violation = constraint.violation(&mesh).unwrap();
        assert!(violation.amax() < 1e-12, "violation {}", violation.amax());
    }

    #[test]
    fn test_line_to_arc_corner_is_consistent() {
        // Corner (R, 0) of a sector: radial edge into the arc
        let (mut mesh, constraint) = corner(
            Arc::new(StraightLine::new(Vector2::zeros(), Vector2::new(1.0, 0.0))),
            Arc::new(CircularArc::new(Vector2::zeros(), 1.0)),
            Vector2::new(1.0, 0.0),
        );
        assert!(!constraint.transform().is_affine(1e-8));
        impose_global_cubic(&mut mesh, &constraint);

        let violation = constraint.violation(&mesh).unwrap();
        assert!(violation.amax() < 1e-12, "violation {}", violation.amax());
    }

    #[test]
    fn test_ellipse_to_ellipse_corner_is_consistent() {
        // Left-hand corner of a crescent: the upper arc hands over to the
        // clockwise lower arc
        let x = ellipse_intersection(0.5, 1.0, 0.55, 0.5).unwrap();
        let (mut mesh, constraint) = corner(
            Arc::new(EllipticalArc::new(0.5, 1.0, false)),
            Arc::new(EllipticalArc::new(0.55, 0.5, true)),
            Vector2::new(-x.x, x.y),
        );
        assert!(!constraint.transform().is_affine(1e-8));
        impose_global_cubic(&mut mesh, &constraint);

        let violation = constraint.violation(&mesh).unwrap();
        assert!(violation.amax() < 1e-12, "violation {}", violation.amax());
    }

    #[test]
    fn test_jacobian_is_saddle_block() {
        let (mesh, constraint) = right_angle_corner();
        let n = 3 * N_VALUE;
        let values = DVector::from_fn(n, |i, _| (i as f64 * 0.37).sin());
        let mut r = DVector::zeros(n);
        let mut jac = DMatrix::zeros(n, n);
        constraint
            .fill_in_contribution_to_jacobian(&mesh, &values, &mut r, &mut jac)
            .unwrap();

        assert_relative_eq!(jac.clone(), jac.transpose(), epsilon = 1e-14);
        assert!(jac.view((0, 0), (2 * N_VALUE, 2 * N_VALUE)).amax() == 0.0);
        assert!(jac.view((2 * N_VALUE, 2 * N_VALUE), (N_VALUE, N_VALUE)).amax() == 0.0);
        let expected = &jac * &values;
        assert_relative_eq!(r, expected, epsilon = 1e-12);
    }
}
