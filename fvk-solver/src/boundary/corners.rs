//! Split corner nodes shared by consecutive boundaries
//!
//! Boundaries are taken in cyclic order. At the corner where boundary `i`
//! hands over to boundary `i + 1`, the shared node stays with boundary `i`
//! (the left copy) and a new colocated node replaces it on the first
//! boundary element of `i + 1` (the right copy).

use crate::elements::{ConstraintEnd, DuplicateNodeConstraintElement};
use crate::error::{FvkError, FvkResult};
use crate::mesh::{Mesh, NodeId};

/// Duplicate the corner between boundary `i` and the next boundary and
/// build its constraint, numbered `index`
pub fn duplicate_corner(
    mesh: &mut Mesh,
    i: usize,
    index: usize,
) -> FvkResult<DuplicateNodeConstraintElement> {
    let next = (i + 1) % mesh.nboundary();

    let corner = first_shared_node(mesh, i, next)?;
    let element = mesh
        .boundary_elements(next)?
        .iter()
        .copied()
        .find(|&e| {
            mesh.element(e)
                .map(|el| el.local_index_of(corner).is_some())
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            FvkError::MeshTopology(format!(
                "no boundary element of boundary {} contains corner node {}",
                next, corner
            ))
        })?;

    let position = mesh.node(corner)?.position();
    let copy = mesh.add_node(position.x, position.y);
    mesh.substitute_node(element, corner, copy)?;
    mesh.remove_boundary_node(next, corner)?;
    mesh.add_boundary_node(next, copy)?;

    let left_curve = mesh.curve(i)?;
    let right_curve = mesh.curve(next)?;
    let left = ConstraintEnd::on_curve(corner, i, left_curve.zeta(&position), left_curve.as_ref())?;
    let right =
        ConstraintEnd::on_curve(copy, next, right_curve.zeta(&position), right_curve.as_ref())?;

    log::debug!(
        "corner between boundaries {} and {} at ({:.4}, {:.4}): node {} duplicated as {} in element {}",
        i,
        next,
        position.x,
        position.y,
        corner,
        copy,
        element
    );
    DuplicateNodeConstraintElement::new(index, left, right)
}

fn first_shared_node(mesh: &Mesh, i: usize, next: usize) -> FvkResult<NodeId> {
    for &n in mesh.boundary_nodes(i)? {
        if mesh.node(n)?.is_on_boundary(next) {
            return Ok(n);
        }
    }
    Err(FvkError::MeshTopology(format!(
        "boundaries {} and {} share no node",
        i, next
    )))
}

/// Duplicate every corner of a closed boundary loop. Constraint indices
/// start at `first_index`.
pub fn duplicate_corner_nodes(
    mesh: &mut Mesh,
    first_index: usize,
) -> FvkResult<Vec<DuplicateNodeConstraintElement>> {
    let nboundary = mesh.nboundary();
    if nboundary < 2 {
        return Ok(Vec::new());
    }
    let mut constraints = Vec::with_capacity(nboundary);
    for i in 0..nboundary {
        constraints.push(duplicate_corner(mesh, i, first_index + i)?);
    }
    mesh.setup_boundary_element_info();
    log::info!("duplicated {} corner nodes", constraints.len());
    Ok(constraints)
}
