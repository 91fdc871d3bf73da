//! Exact first and second derivatives of compliance with respect to areas
//!
//! K(A) = Σ A_i K_i with K_i the unit-area bar stiffness, and the loads do
//! not depend on A. With C = ½ uᵀf and K u = f:
//!
//!   dC/dA_i        = -½ u_iᵀ K_i u_i
//!   (∇²C · p)_i    =  φ_iᵀ K_i u_i,   K φ = (Σ p_j K_j) u
//!
//! so the gradient needs no solve beyond u, and a Hessian-vector product
//! needs one more solve with the existing factorization of K.

use log::debug;

use super::StaticState;
use crate::error::TrussResult;
use crate::math::{self, GlobalMatrix, Mat, SolverKind, SparseMatrixBuilder, Vec4};

impl StaticState<'_> {
    /// u_iᵀ K_i(unit area) v_i for every bar
    fn unit_energy_products(&self, v: &crate::math::Vec) -> Vec<f64> {
        let e = self.model.material().e;
        self.model
            .bars()
            .iter()
            .zip(&self.geometries)
            .enumerate()
            .map(|(index, (bar, geom))| {
                let k_unit = math::bar_stiffness(e, 1.0, geom);
                let u_bar: Vec4 = self.bar_displacements(index);
                let v_bar = math::gather(v, &bar.dofs());
                v_bar.dot(&(k_unit * u_bar))
            })
            .collect()
    }

    /// dC/dA for every bar.
    ///
    /// The displacement field doubles as the adjoint variable, which holds
    /// only because the loads are independent of the areas.
    pub fn compliance_gradient(&self) -> Vec<f64> {
        self.unit_energy_products(&self.displacements)
            .into_iter()
            .map(|w| -0.5 * w)
            .collect()
    }

    /// dM/dA for every bar: ρ·L_i
    pub fn mass_gradient(&self) -> Vec<f64> {
        let rho = self.model.material().rho;
        self.geometries.iter().map(|geom| rho * geom.length).collect()
    }

    /// Product of the compliance Hessian with `direction` (one entry per bar,
    /// any sign). Costs one extra solve with the factorization of K.
    pub fn hessian_vector_product(&self, direction: &[f64]) -> TrussResult<Vec<f64>> {
        let mut r_p = match self.factorization.kind() {
            SolverKind::Dense => self.direction_product::<Mat>(direction)?,
            SolverKind::Skyline => self.direction_product::<SparseMatrixBuilder>(direction)?,
        };
        self.model.apply_bcs_to_vector(&mut r_p);

        let phi = self.factorization.solve(&r_p);
        debug!("hessian-vector product: |phi| = {:e}", phi.norm());

        Ok(self.unit_energy_products(&phi))
    }

    /// (Σ p_j K_j) u, assembled in the same storage as K
    fn direction_product<K: GlobalMatrix>(&self, direction: &[f64]) -> TrussResult<math::Vec> {
        let k_p: K = self.model.assemble_stiffness_direction_as(direction)?;
        Ok(k_p.multiply_vector(&self.displacements))
    }
}
