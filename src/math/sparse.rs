//! Sparse matrix utilities for larger trusses
//!
//! Truss stiffness matrices are mostly zeros once the node count grows. The
//! skyline factorization only stores each row from its first non-zero to the
//! diagonal, so well-numbered trusses factor in far less than O(n³).

use nalgebra::{DMatrix, DVector, SMatrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

use super::{GlobalMatrix, Mat4};
use crate::error::{TrussError, TrussResult};

/// Sparse matrix builder using COO format
/// More efficient for incremental assembly
#[derive(Debug, Clone)]
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // 2 DOFs per node, ~6 bars per node
        let estimated_nnz = size * 14;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Collect the non-zero entries of a dense matrix
    pub fn from_dense(mat: &DMatrix<f64>) -> Self {
        let mut builder = Self::new(mat.nrows());
        for col in 0..mat.ncols() {
            for row in 0..mat.nrows() {
                builder.add(row, col, mat[(row, col)]);
            }
        }
        builder
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Add values from a small fixed-size element matrix
    pub fn add_element_matrix<const N: usize>(
        &mut self,
        dofs: &[usize; N],
        k_elem: &SMatrix<f64, N, N>,
    ) {
        for (i, &di) in dofs.iter().enumerate() {
            for (j, &dj) in dofs.iter().enumerate() {
                self.add(di, dj, k_elem[(i, j)]);
            }
        }
    }

    /// Convert to CSR format for efficient solves
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }
}

impl GlobalMatrix for SparseMatrixBuilder {
    fn zeros(size: usize) -> Self {
        Self::new(size)
    }

    fn add_element(&mut self, dofs: &[usize; 4], k_elem: &Mat4) {
        self.add_element_matrix(dofs, k_elem);
    }

    fn eliminate(&mut self, dofs: &[usize]) {
        let mut constrained = vec![false; self.size];
        for &var in dofs {
            constrained[var] = true;
        }
        self.entries
            .retain(|&(row, col, _)| !constrained[row] && !constrained[col]);
        for (var, _) in constrained.iter().enumerate().filter(|(_, &c)| c) {
            self.entries.push((var, var, 1.0));
        }
    }

    fn multiply_vector(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.size);
        for &(row, col, val) in &self.entries {
            y[row] += val * x[col];
        }
        y
    }
}

/// Skyline (profile) Cholesky factorization for symmetric positive definite
/// matrices.
///
/// Row `i` stores L[i, i - heights[i] ..= i].
#[derive(Debug, Clone)]
pub struct SkylineCholesky {
    size: usize,
    skyline: Vec<Vec<f64>>,
    heights: Vec<usize>,
}

impl SkylineCholesky {
    /// Load the lower triangle of a CSR matrix into skyline storage
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut skyline: Vec<Vec<f64>> = heights.iter().map(|&h| vec![0.0; h + 1]).collect();

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                let idx = col - (row - heights[row]);
                skyline[row][idx] += val;
            }
        }

        Self { size, skyline, heights }
    }

    /// Number of equations
    pub fn size(&self) -> usize {
        self.size
    }

    /// Stored entries of the profile
    pub fn profile_len(&self) -> usize {
        self.skyline.iter().map(|row| row.len()).sum()
    }

    /// Factorize in place.
    ///
    /// Equation `i` is singular when its pivot is not larger than
    /// `pivot_tolerance` times its own diagonal entry K_ii. The test is
    /// relative per equation, so it does not depend on the units of K or on
    /// the unit diagonal of eliminated DOFs.
    pub fn factorize(&mut self, pivot_tolerance: f64) -> TrussResult<()> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let k_ii = self.skyline[i][hi];
            let start_i = i - hi;

            for j in start_i..i {
                let start_j = j - self.heights[j];
                let start = start_i.max(start_j);

                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }

                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / self.get(j, j);
            }

            let mut sum = 0.0;
            for j in start_i..i {
                let val = self.get(i, j);
                sum += val * val;
            }

            let diag = k_ii - sum;
            if !(diag > pivot_tolerance * k_ii) {
                return Err(TrussError::SingularSystem { equation: i });
            }
            self.skyline[i][hi] = diag.sqrt();
        }

        Ok(())
    }

    /// Entry of the lower triangle, zero outside the profile
    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = row - self.heights[row];
        if col < start {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Solve L * L^T * x = b with a factorized matrix
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        // Forward substitution: L * y = b
        for i in 0..self.size {
            let start = i - self.heights[i];

            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }

            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // Backward substitution: L^T * x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);

            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        x
    }
}
