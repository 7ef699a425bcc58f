//! Rotate boundary nodes into their normal-tangential frames
//!
//! Boundaries are visited in increasing index, and the boundary elements of
//! each in registry order. The first boundary to reach a node fixes its
//! frame; a node reached again from another boundary keeps that frame.

use crate::elements::NodalRotation;
use crate::error::FvkResult;
use crate::mesh::Mesh;

/// Rotate the Hermite block of every node on boundary `b` that has not been
/// rotated yet. Returns the number of nodes rotated.
pub fn rotate_boundary(mesh: &mut Mesh, b: usize) -> FvkResult<usize> {
    let curve = std::sync::Arc::clone(mesh.curve(b)?);
    let elements = mesh.boundary_elements(b)?.to_vec();
    let mut count = 0;

    for element in elements {
        let nodes = *mesh.element(element)?.nodes();
        for n in nodes {
            let node = mesh.node(n)?;
            if !node.is_on_boundary(b) {
                continue;
            }
            match node.rotation() {
                Some(existing) if existing.boundary == b => continue,
                Some(existing) => {
                    log::warn!(
                        "node {} at ({:.4}, {:.4}) lies on boundaries {} and {}; keeping the frame of boundary {}",
                        n,
                        node.x,
                        node.y,
                        existing.boundary,
                        b,
                        existing.boundary
                    );
                    continue;
                }
                None => {}
            }
            let zeta = curve.zeta(&node.position());
            let rotation = NodalRotation::new(b, zeta, curve.frame(zeta)?)?;
            mesh.node_mut(n)?.set_rotation(rotation);
            count += 1;
        }
    }
    Ok(count)
}

/// Rotate the nodes of every boundary in increasing boundary order
pub fn rotate_boundary_nodes(mesh: &mut Mesh) -> FvkResult<usize> {
    let mut total = 0;
    for b in 0..mesh.nboundary() {
        let count = rotate_boundary(mesh, b)?;
        log::debug!("boundary {}: rotated {} nodes", b, count);
        total += count;
    }
    log::info!("rotated {} boundary nodes into their boundary frames", total);
    Ok(total)
}
