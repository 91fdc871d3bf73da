//! Solved state of one design point

use log::debug;

use super::AnalysisOptions;
use crate::error::TrussResult;
use crate::math::{
    self, BarGeometry, Factorization, Mat, SolverKind, SparseMatrixBuilder, Vec as FEVec,
};
use crate::model::TrussModel;
use crate::results::{
    BarReport, BarResult, EvaluationSummary, NodeDisplacement, Reactions, Response, TrussReport,
};

/// Everything computed for one area vector: f with supports applied, the
/// factorization of K, and the displacements.
///
/// Gradients and Hessian-vector products of the same design reuse the
/// factorization, so build one of these per design point and query it.
#[derive(Debug)]
pub struct StaticState<'a> {
    pub(super) model: &'a TrussModel,
    pub(super) areas: Vec<f64>,
    pub(super) geometries: Vec<BarGeometry>,
    pub(super) loads: FEVec,
    pub(super) factorization: Factorization,
    pub(super) displacements: FEVec,
}

impl<'a> StaticState<'a> {
    /// Assemble K and f, eliminate supported DOFs, factorize and solve
    pub fn solve(
        model: &'a TrussModel,
        areas: &[f64],
        options: &AnalysisOptions,
    ) -> TrussResult<Self> {
        let mut loads = model.assemble_loads();
        let factorization = match options.solver {
            SolverKind::Dense => {
                let mut k: Mat = model.assemble_stiffness_as(areas)?;
                model.apply_bcs(&mut k, &mut loads);
                Factorization::dense(&k, options.pivot_tolerance)?
            }
            SolverKind::Skyline => {
                let mut k: SparseMatrixBuilder = model.assemble_stiffness_as(areas)?;
                model.apply_bcs(&mut k, &mut loads);
                Factorization::skyline(&k, options.pivot_tolerance)?
            }
        };
        let geometries = model.bar_geometries()?;
        let displacements = factorization.solve(&loads);

        debug!(
            "solved {} DOFs ({} bars) with {:?}",
            model.num_dofs(),
            model.num_bars(),
            options.solver
        );

        Ok(Self {
            model,
            areas: areas.to_vec(),
            geometries,
            loads,
            factorization,
            displacements,
        })
    }

    pub fn model(&self) -> &'a TrussModel {
        self.model
    }

    pub fn areas(&self) -> &[f64] {
        &self.areas
    }

    /// Load vector with supported entries zeroed
    pub fn loads(&self) -> &FEVec {
        &self.loads
    }

    pub fn factorization(&self) -> &Factorization {
        &self.factorization
    }

    pub fn displacements(&self) -> &FEVec {
        &self.displacements
    }

    /// Compliance ½uᵀf
    pub fn compliance(&self) -> f64 {
        0.5 * self.displacements.dot(&self.loads)
    }

    /// Total mass Σ ρ·L·A
    pub fn mass(&self) -> f64 {
        let rho = self.model.material().rho;
        self.geometries
            .iter()
            .zip(&self.areas)
            .map(|(geom, area)| rho * geom.length * area)
            .sum()
    }

    pub fn response(&self) -> Response {
        Response {
            compliance: self.compliance(),
            mass: self.mass(),
        }
    }

    /// Displacement of one node
    pub fn node_displacement(&self, node: usize) -> Option<NodeDisplacement> {
        if node >= self.model.num_nodes() {
            return None;
        }
        Some(NodeDisplacement::from_array([
            self.displacements[2 * node],
            self.displacements[2 * node + 1],
        ]))
    }

    /// Element displacements of bar `index`
    pub(super) fn bar_displacements(&self, index: usize) -> math::Vec4 {
        math::gather(&self.displacements, &self.model.bars()[index].dofs())
    }

    /// Axial force, strain and stress of every bar
    pub fn bar_results(&self) -> Vec<BarResult> {
        let e = self.model.material().e;
        self.geometries
            .iter()
            .zip(&self.areas)
            .enumerate()
            .map(|(bar, (geom, &area))| {
                let strain = geom.axial_strain(&self.bar_displacements(bar));
                BarResult {
                    bar,
                    area,
                    length: geom.length,
                    strain,
                    stress: e * strain,
                    force: e * area * strain,
                }
            })
            .collect()
    }

    /// Axial force of every bar (positive = tension)
    pub fn bar_forces(&self) -> Vec<f64> {
        self.bar_results().iter().map(|r| r.force).collect()
    }

    /// Support reactions, from the bar end forces at each supported node
    pub fn reactions(&self) -> Vec<Reactions> {
        let e = self.model.material().e;
        let mut internal = FEVec::zeros(self.model.num_dofs());
        for (index, (bar, geom)) in self.model.bars().iter().zip(&self.geometries).enumerate() {
            let k_bar = math::bar_stiffness(e, self.areas[index], geom);
            let f_bar = k_bar * self.bar_displacements(index);
            for (a, &dof) in bar.dofs().iter().enumerate() {
                internal[dof] += f_bar[a];
            }
        }

        let applied = self.model.assemble_loads();
        self.model
            .supports()
            .iter()
            .map(|(&node, support)| {
                let mut r = [0.0; 2];
                for dof in support.restrained_dofs() {
                    let var = 2 * node + dof;
                    r[dof] = internal[var] - applied[var];
                }
                Reactions { node, fx: r[0], fy: r[1] }
            })
            .collect()
    }

    /// Compliance, mass and strain/displacement extremes
    pub fn summary(&self) -> EvaluationSummary {
        let results = self.bar_results();
        let strains = results.iter().map(|r| r.strain);
        let max_strain = strains.clone().fold(f64::NEG_INFINITY, f64::max);
        let min_strain = strains.clone().fold(f64::INFINITY, f64::min);
        let max_abs_strain = strains.map(f64::abs).fold(0.0, f64::max);

        let (max_disp_node, max_displacement) = (0..self.model.num_nodes())
            .filter_map(|n| self.node_displacement(n).map(|d| (n, d.magnitude())))
            .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        let total_dofs = self.model.num_dofs();
        EvaluationSummary {
            compliance: self.compliance(),
            mass: self.mass(),
            max_strain,
            min_strain,
            max_abs_strain,
            max_displacement,
            max_disp_node,
            num_nodes: self.model.num_nodes(),
            num_bars: self.model.num_bars(),
            total_dofs,
            free_dofs: total_dofs - self.model.constrained_dofs().len(),
        }
    }

    /// Read-only snapshot for reporting and visualization
    pub fn report(&self) -> TrussReport {
        let bars = self
            .model
            .bars()
            .iter()
            .zip(self.bar_results())
            .map(|(&bar, result)| BarReport { bar, result })
            .collect();

        TrussReport {
            nodes: self.model.nodes().to_vec(),
            bars,
            displacements: (0..self.model.num_nodes())
                .filter_map(|n| self.node_displacement(n))
                .collect(),
            reactions: self.reactions(),
            response: self.response(),
        }
    }
}
