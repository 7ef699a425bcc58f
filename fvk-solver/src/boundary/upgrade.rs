//! Promote boundary elements to curved elements

use std::sync::Arc;

use crate::config::BoundaryOrder;
use crate::elements::{CurvedEdge, Edge};
use crate::error::{FvkError, FvkResult};
use crate::mesh::{ElementId, Mesh};

/// Attach the curve of boundary `b` to one of its boundary elements
pub fn upgrade_element(
    mesh: &mut Mesh,
    element: ElementId,
    b: usize,
    order: BoundaryOrder,
) -> FvkResult<()> {
    let curve = Arc::clone(mesh.curve(b)?);
    let nodes = *mesh.element(element)?.nodes();

    let mut interior = Vec::with_capacity(3);
    for (i, &n) in nodes.iter().enumerate() {
        if !mesh.node(n)?.is_on_boundary(b) {
            interior.push(i);
        }
    }
    let i = match interior.as_slice() {
        [] => {
            return Err(FvkError::NoInteriorNode {
                element,
                boundary: b,
            })
        }
        [i] => *i,
        _ => {
            return Err(FvkError::MultipleInteriorNodes {
                element,
                boundary: b,
                count: interior.len(),
            })
        }
    };
    let edge = Edge::from_interior_index(i).ok_or_else(|| {
        FvkError::MeshTopology(format!("invalid interior vertex index {}", i))
    })?;

    let (_, j, k) = edge.vertex_order();
    let s_ubar = curve.zeta(&mesh.node(nodes[j])?.position());
    let s_obar = curve.zeta(&mesh.node(nodes[k])?.position());
    if s_ubar >= s_obar {
        return Err(FvkError::DecreasingParametricCoordinate {
            element,
            boundary: b,
            s_ubar,
            s_obar,
        });
    }

    log::debug!(
        "element {} on boundary {}: {:?}, s in [{:.6}, {:.6}]",
        element,
        b,
        edge,
        s_ubar,
        s_obar
    );
    let curved = CurvedEdge::new(edge, s_ubar, s_obar, b, curve, order);
    mesh.element_mut(element)?.set_curved_edge(curved);
    Ok(())
}

/// Upgrade every boundary element of boundary `b`; returns the count
pub fn upgrade_boundary(mesh: &mut Mesh, b: usize, order: BoundaryOrder) -> FvkResult<usize> {
    let elements = mesh.boundary_elements(b)?.to_vec();
    for &element in &elements {
        upgrade_element(mesh, element, b, order)?;
    }
    Ok(elements.len())
}

/// Upgrade the boundary elements of every boundary
pub fn upgrade_all_boundaries(mesh: &mut Mesh, order: BoundaryOrder) -> FvkResult<usize> {
    let mut total = 0;
    for b in 0..mesh.nboundary() {
        total += upgrade_boundary(mesh, b, order)?;
    }
    log::info!(
        "upgraded {} boundary elements to order {}",
        total,
        order.order()
    );
    Ok(total)
}
