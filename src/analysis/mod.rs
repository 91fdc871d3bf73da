//! Analysis driver, sensitivities and analysis options

mod fully_stressed;
mod sensitivity;
mod state;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::TrussResult;
use crate::math::SolverKind;
use crate::model::TrussModel;
use crate::results::{Response, TrussReport};

pub use fully_stressed::{FullyStressedDesign, FullyStressedOptions};
pub use state::StaticState;

/// Options for structural analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Factorization backend for K
    pub solver: SolverKind,
    /// Relative pivot size below which K is reported singular
    pub pivot_tolerance: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::Dense,
            pivot_tolerance: 1e-12,
        }
    }
}

impl AnalysisOptions {
    /// Dense Cholesky options
    pub fn dense() -> Self {
        Self::default()
    }

    /// Skyline Cholesky options, for larger trusses
    pub fn skyline() -> Self {
        Self {
            solver: SolverKind::Skyline,
            ..Self::default()
        }
    }

    /// Set the factorization backend
    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Set the singular pivot tolerance
    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }
}

/// Analysis driver: evaluates a truss for any number of area vectors.
///
/// Holds no per-evaluation state; every call assembles, factorizes and
/// solves from scratch, so one driver can be shared by independent callers.
#[derive(Debug, Clone, Copy)]
pub struct TrussAnalysis<'a> {
    model: &'a TrussModel,
    options: AnalysisOptions,
}

impl<'a> TrussAnalysis<'a> {
    /// Create a driver with default options
    pub fn new(model: &'a TrussModel) -> Self {
        Self::with_options(model, AnalysisOptions::default())
    }

    /// Create a driver with custom options
    pub fn with_options(model: &'a TrussModel, options: AnalysisOptions) -> Self {
        Self { model, options }
    }

    pub fn model(&self) -> &'a TrussModel {
        self.model
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Assemble, apply supports, factorize and solve for the displacements
    pub fn solve(&self, areas: &[f64]) -> TrussResult<StaticState<'a>> {
        StaticState::solve(self.model, areas, &self.options)
    }

    /// Compliance ½uᵀf and mass of a design, unscaled
    pub fn evaluate(&self, areas: &[f64]) -> TrussResult<Response> {
        let state = self.solve(areas)?;
        let response = state.response();
        debug!(
            "evaluate: compliance = {:e}, mass = {:e}",
            response.compliance, response.mass
        );
        Ok(response)
    }

    /// dC/dA for every bar
    pub fn compliance_gradient(&self, areas: &[f64]) -> TrussResult<Vec<f64>> {
        Ok(self.solve(areas)?.compliance_gradient())
    }

    /// dM/dA for every bar
    pub fn mass_gradient(&self) -> TrussResult<Vec<f64>> {
        self.model.mass_gradient()
    }

    /// Product of the compliance Hessian with a direction in area space
    pub fn hessian_vector_product(&self, areas: &[f64], direction: &[f64]) -> TrussResult<Vec<f64>> {
        self.solve(areas)?.hessian_vector_product(direction)
    }

    /// Read-only snapshot for reporting and visualization
    pub fn report(&self, areas: &[f64]) -> TrussResult<TrussReport> {
        Ok(self.solve(areas)?.report())
    }
}
