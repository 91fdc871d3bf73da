//! Linear solver adapter for the symmetric stiffness systems
//!
//! Every design point needs one factorization of K; the same factorization
//! then serves the displacement solve and any adjoint solve of that point.

use log::debug;
use nalgebra::{Cholesky, Dyn};
use serde::{Deserialize, Serialize};

use super::sparse::{SkylineCholesky, SparseMatrixBuilder};
use super::{Mat, Vec};
use crate::error::{TrussError, TrussResult};

/// Factorization backend used for K
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Dense Cholesky factorization
    Dense,
    /// Skyline (profile) Cholesky on the sparse pattern of K
    Skyline,
}

impl Default for SolverKind {
    fn default() -> Self {
        Self::Dense
    }
}

/// A factorized stiffness matrix, reusable for any number of right-hand sides
pub enum Factorization {
    Dense(Cholesky<f64, Dyn>),
    Skyline(SkylineCholesky),
}

impl Factorization {
    /// Factorize a dense symmetric matrix with the chosen backend.
    ///
    /// Equation `i` is reported as `SingularSystem` when its pivot is not
    /// larger than `pivot_tolerance` times its own diagonal entry K_ii, so
    /// the test is independent of the units of K.
    pub fn new(k: &Mat, kind: SolverKind, pivot_tolerance: f64) -> TrussResult<Self> {
        match kind {
            SolverKind::Dense => Self::dense(k, pivot_tolerance),
            SolverKind::Skyline => {
                Self::skyline(&SparseMatrixBuilder::from_dense(k), pivot_tolerance)
            }
        }
    }

    /// Dense Cholesky factorization
    pub fn dense(k: &Mat, pivot_tolerance: f64) -> TrussResult<Self> {
        let chol = Cholesky::new_unchecked(k.clone());
        let l = chol.l_dirty();
        for i in 0..l.nrows() {
            let pivot = l[(i, i)] * l[(i, i)];
            if !(pivot > pivot_tolerance * k[(i, i)]) {
                return Err(TrussError::SingularSystem { equation: i });
            }
        }
        Ok(Self::Dense(chol))
    }

    /// Skyline Cholesky factorization of an assembled sparse matrix
    pub fn skyline(k: &SparseMatrixBuilder, pivot_tolerance: f64) -> TrussResult<Self> {
        let mut chol = SkylineCholesky::new(&k.to_csr());
        debug!(
            "skyline profile: {} entries for {} equations",
            chol.profile_len(),
            chol.size()
        );
        chol.factorize(pivot_tolerance)?;
        Ok(Self::Skyline(chol))
    }

    /// Backend that produced this factorization
    pub fn kind(&self) -> SolverKind {
        match self {
            Self::Dense(_) => SolverKind::Dense,
            Self::Skyline(_) => SolverKind::Skyline,
        }
    }

    /// Solve K x = b
    pub fn solve(&self, b: &Vec) -> Vec {
        match self {
            Self::Dense(chol) => chol.solve(b),
            Self::Skyline(chol) => chol.solve(b),
        }
    }
}

impl std::fmt::Debug for Factorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dense(chol) => write!(f, "Factorization::Dense({}x{})", chol.l_dirty().nrows(), chol.l_dirty().ncols()),
            Self::Skyline(chol) => write!(f, "Factorization::Skyline({} equations)", chol.size()),
        }
    }
}

/// Solve a single symmetric system K x = b
pub fn solve_linear_system(
    k: &Mat,
    b: &Vec,
    kind: SolverKind,
    pivot_tolerance: f64,
) -> TrussResult<Vec> {
    Ok(Factorization::new(k, kind, pivot_tolerance)?.solve(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spd_matrix() -> Mat {
        #[rustfmt::skip]
        let k = Mat::from_row_slice(3, 3, &[
            10.0, -2.0,  0.0,
            -2.0,  5.0, -1.0,
             0.0, -1.0,  3.0,
        ]);
        k
    }

    #[test]
    fn test_backends_agree() {
        let k = spd_matrix();
        let b = Vec::from_vec(vec![1.0, -2.0, 0.5]);

        let dense = solve_linear_system(&k, &b, SolverKind::Dense, 1e-12).unwrap();
        let skyline = solve_linear_system(&k, &b, SolverKind::Skyline, 1e-12).unwrap();

        assert!((&k * &dense - &b).norm() < 1e-12);
        for i in 0..3 {
            assert_relative_eq!(dense[i], skyline[i], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_factorization_reuse() {
        let k = spd_matrix();
        let fact = Factorization::new(&k, SolverKind::Dense, 1e-12).unwrap();
        for rhs in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [3.0, -1.0, 2.0]] {
            let b = Vec::from_vec(rhs.to_vec());
            assert!((&k * fact.solve(&b) - &b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_pivot_test_ignores_stiffness_units() {
        // eliminated unit row next to free equations that are far stiffer
        // or far softer than 1
        for scale in [1e15, 1e-15] {
            #[rustfmt::skip]
            let k = Mat::from_row_slice(3, 3, &[
                1.0,  0.0,          0.0,
                0.0,  2.0 * scale, -scale,
                0.0, -scale,        2.0 * scale,
            ]);
            let b = Vec::from_vec(vec![0.0, scale, 0.0]);
            for kind in [SolverKind::Dense, SolverKind::Skyline] {
                let fact = Factorization::new(&k, kind, 1e-12).unwrap();
                assert_eq!(fact.kind(), kind);
                let x = fact.solve(&b);
                assert_relative_eq!(x[1], 2.0 / 3.0, max_relative = 1e-12);
                assert_relative_eq!(x[2], 1.0 / 3.0, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix_detected() {
        // Unsupported bar: rigid-body translation in x, nothing in y
        #[rustfmt::skip]
        let k = Mat::from_row_slice(4, 4, &[
             1.0, 0.0, -1.0, 0.0,
             0.0, 0.0,  0.0, 0.0,
            -1.0, 0.0,  1.0, 0.0,
             0.0, 0.0,  0.0, 0.0,
        ]);
        for kind in [SolverKind::Dense, SolverKind::Skyline] {
            let err = Factorization::new(&k, kind, 1e-12).unwrap_err();
            assert!(matches!(err, TrussError::SingularSystem { equation: 1 }), "{:?}", kind);
        }
    }
}
