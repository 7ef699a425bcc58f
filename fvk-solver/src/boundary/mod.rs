//! Boundary post-processing of a triangulated domain
//!
//! Run in this order after meshing and before equation numbering:
//!
//! 1. [`duplicate_corner_nodes`]: split each corner node and build its constraint
//! 2. [`upgrade_all_boundaries`]: attach the boundary curves to boundary elements
//! 3. [`rotate_boundary_nodes`]: rotate boundary Hermite data into `(n, t)` frames

pub mod corners;
pub mod rotation;
pub mod upgrade;

pub use corners::{duplicate_corner, duplicate_corner_nodes};
pub use rotation::{rotate_boundary, rotate_boundary_nodes};
pub use upgrade::{upgrade_all_boundaries, upgrade_boundary, upgrade_element};
