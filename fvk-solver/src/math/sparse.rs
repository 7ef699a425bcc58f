//! Sparse assembly of the global Jacobian
//!
//! Element contributions are accumulated as COO triplets and converted once
//! per Newton step, either to CSR for inspection or to a dense matrix for
//! the LU solve.

use nalgebra::DMatrix;
use nalgebra_sparse::convert::serial::convert_csr_dense;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format
/// More efficient for incremental assembly
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // Hermite triangles couple 24 local unknowns; ~50 entries per row is typical
        let estimated_nnz = size * 50;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Matrix dimension
    pub fn size(&self) -> usize {
        self.size
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.entries.push((row, col, value));
        }
    }

    /// Scatter a local element matrix using its equation map.
    /// Rows and columns whose equation is `None` (pinned values) are skipped.
    pub fn add_element_matrix(&mut self, eqns: &[Option<usize>], k_elem: &DMatrix<f64>) {
        for (i, ei) in eqns.iter().enumerate() {
            let Some(row) = *ei else { continue };
            for (j, ej) in eqns.iter().enumerate() {
                if let Some(col) = *ej {
                    self.add(row, col, k_elem[(i, j)]);
                }
            }
        }
    }

    /// Convert to CSR format
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Convert to dense matrix
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut mat = DMatrix::zeros(self.size, self.size);

        for &(row, col, val) in &self.entries {
            mat[(row, col)] += val;
        }

        mat
    }
}

/// Largest entry of `|A - Aᵀ|`
pub fn asymmetry(csr: &CsrMatrix<f64>) -> f64 {
    let dense = convert_csr_dense(csr);
    (&dense - dense.transpose()).amax()
}
