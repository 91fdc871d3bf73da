//! Optimizer adapter: minimum-compliance sizing under a mass budget
//!
//! The optimizer works in normalized design variables x = A / area_scale.
//! The objective is compliance divided by the compliance of the first design
//! that could be analyzed, and the single constraint is
//! (m_fixed - mass) / mass_scale, feasible when non-negative.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisOptions, TrussAnalysis};
use crate::error::{TrussError, TrussResult};
use crate::model::TrussModel;
use crate::results::EvaluationSummary;

/// Outcome of one optimizer callback.
///
/// `Failed` is the fail flag: the trial design could not be analyzed
/// (zero-length bar, singular stiffness) and the optimizer should reject the
/// step. Caller mistakes such as a wrong-length vector come back as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation<T> {
    Success(T),
    Failed { reason: String },
}

impl<T> Evaluation<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Evaluation::Failed { .. })
    }

    /// The value, if the evaluation succeeded
    pub fn ok(self) -> Option<T> {
        match self {
            Evaluation::Success(value) => Some(value),
            Evaluation::Failed { .. } => None,
        }
    }
}

/// Scaled objective and constraint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjCon {
    pub objective: f64,
    pub constraint: f64,
}

/// Scaled objective gradient and constraint gradient row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjConGradient {
    pub objective: Vec<f64>,
    pub constraint: Vec<f64>,
}

/// Callbacks a gradient-based optimizer drives.
///
/// All vectors are in the optimizer's normalized variables. There is a
/// single inequality constraint `c(x) >= 0`.
pub trait OptimizationProblem {
    /// Number of design variables
    fn num_vars(&self) -> usize;

    /// Number of inequality constraints
    fn num_constraints(&self) -> usize {
        1
    }

    /// Starting point, lower bounds and upper bounds
    fn vars_and_bounds(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>);

    fn eval_obj_con(&mut self, x: &[f64]) -> TrussResult<Evaluation<ObjCon>>;

    fn eval_obj_con_gradient(&mut self, x: &[f64]) -> TrussResult<Evaluation<ObjConGradient>>;

    /// Hessian of the Lagrangian f - zᵀc times `px`, with constraint
    /// multipliers `z`
    fn eval_hvec_product(
        &mut self,
        x: &[f64],
        z: &[f64],
        px: &[f64],
    ) -> TrussResult<Evaluation<Vec<f64>>>;
}

/// Bounds, scaling and mass budget of a sizing problem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProblemSettings {
    /// Lower area bound
    pub a_min: f64,
    /// Upper area bound
    pub a_max: f64,
    /// Starting area for every bar, midpoint of the bounds when unset
    pub a_init: Option<f64>,
    /// Area represented by one unit of a design variable
    pub area_scale: f64,
    /// Mass budget
    pub m_fixed: f64,
    /// Constraint scale, m_fixed / number of bars when unset
    pub mass_scale: Option<f64>,
}

impl ProblemSettings {
    pub fn new(a_min: f64, a_max: f64, m_fixed: f64) -> Self {
        Self {
            a_min,
            a_max,
            a_init: None,
            area_scale: 1e-3,
            m_fixed,
            mass_scale: None,
        }
    }

    pub fn with_a_init(mut self, a_init: f64) -> Self {
        self.a_init = Some(a_init);
        self
    }

    pub fn with_area_scale(mut self, area_scale: f64) -> Self {
        self.area_scale = area_scale;
        self
    }

    pub fn with_mass_scale(mut self, mass_scale: f64) -> Self {
        self.mass_scale = Some(mass_scale);
        self
    }

    /// Starting area
    pub fn initial_area(&self) -> f64 {
        self.a_init.unwrap_or(0.5 * (self.a_min + self.a_max))
    }

    fn validate(&self) -> TrussResult<()> {
        let positive = |name: &str, value: f64| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(TrussError::InvalidInput(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        };
        positive("a_min", self.a_min)?;
        positive("a_max", self.a_max)?;
        positive("area_scale", self.area_scale)?;
        positive("m_fixed", self.m_fixed)?;
        if let Some(mass_scale) = self.mass_scale {
            positive("mass_scale", mass_scale)?;
        }
        if self.a_min > self.a_max {
            return Err(TrussError::InvalidInput(format!(
                "a_min ({}) exceeds a_max ({})",
                self.a_min, self.a_max
            )));
        }
        let a_init = self.initial_area();
        if !(self.a_min..=self.a_max).contains(&a_init) {
            return Err(TrussError::InvalidInput(format!(
                "a_init ({}) outside [{}, {}]",
                a_init, self.a_min, self.a_max
            )));
        }
        Ok(())
    }
}

/// Minimum-compliance problem for one truss model.
///
/// Owns the objective scale: it is fixed by the first design that analyzes
/// successfully and never changes afterwards.
#[derive(Debug, Clone)]
pub struct ComplianceProblem {
    model: TrussModel,
    options: AnalysisOptions,
    settings: ProblemSettings,
    mass_scale: f64,
    obj_scale: Option<f64>,
}

impl ComplianceProblem {
    pub fn new(model: TrussModel, settings: ProblemSettings) -> TrussResult<Self> {
        Self::with_options(model, settings, AnalysisOptions::default())
    }

    pub fn with_options(
        model: TrussModel,
        settings: ProblemSettings,
        options: AnalysisOptions,
    ) -> TrussResult<Self> {
        settings.validate()?;
        if model.num_bars() == 0 {
            return Err(TrussError::InvalidInput("model has no bars".into()));
        }
        let mass_scale = settings
            .mass_scale
            .unwrap_or(settings.m_fixed / model.num_bars() as f64);

        Ok(Self {
            model,
            options,
            settings,
            mass_scale,
            obj_scale: None,
        })
    }

    pub fn model(&self) -> &TrussModel {
        &self.model
    }

    pub fn settings(&self) -> &ProblemSettings {
        &self.settings
    }

    pub fn mass_scale(&self) -> f64 {
        self.mass_scale
    }

    /// Objective scale, once a design has been analyzed
    pub fn obj_scale(&self) -> Option<f64> {
        self.obj_scale
    }

    fn analysis(&self) -> TrussAnalysis<'_> {
        TrussAnalysis::with_options(&self.model, self.options)
    }

    /// Bar areas for normalized variables
    pub fn areas(&self, x: &[f64]) -> TrussResult<Vec<f64>> {
        self.model.check_len("design variable", x.len())?;
        Ok(x.iter().map(|xi| self.settings.area_scale * xi).collect())
    }

    fn scale_from(&mut self, compliance: f64) -> f64 {
        *self.obj_scale.get_or_insert_with(|| {
            if compliance > 0.0 && compliance.is_finite() {
                debug!("objective scale set to {:e}", compliance);
                compliance
            } else {
                warn!(
                    "first compliance {:e} cannot scale the objective; using 1",
                    compliance
                );
                1.0
            }
        })
    }

    /// Unscaled compliance, mass and strain extremes of a design
    pub fn summary(&self, x: &[f64]) -> TrussResult<EvaluationSummary> {
        let areas = self.areas(x)?;
        let summary = self.analysis().solve(&areas)?.summary();
        info!(
            "compliance = {:e}, mass = {:e}, strain max/min/abs = {:e}/{:e}/{:e}",
            summary.compliance,
            summary.mass,
            summary.max_strain,
            summary.min_strain,
            summary.max_abs_strain
        );
        Ok(summary)
    }
}

/// Turn analysis failures of a trial design into the fail flag
fn flag_failure<T>(result: TrussResult<T>) -> TrussResult<Evaluation<T>> {
    match result {
        Ok(value) => Ok(Evaluation::Success(value)),
        Err(err) if err.is_evaluation_failure() => {
            warn!("evaluation failed: {}", err);
            Ok(Evaluation::Failed {
                reason: err.to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

impl OptimizationProblem for ComplianceProblem {
    fn num_vars(&self) -> usize {
        self.model.num_bars()
    }

    fn vars_and_bounds(&self) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = self.num_vars();
        let s = &self.settings;
        (
            vec![s.initial_area() / s.area_scale; n],
            vec![s.a_min / s.area_scale; n],
            vec![s.a_max / s.area_scale; n],
        )
    }

    fn eval_obj_con(&mut self, x: &[f64]) -> TrussResult<Evaluation<ObjCon>> {
        let areas = self.areas(x)?;
        let response = match flag_failure(self.analysis().evaluate(&areas))? {
            Evaluation::Success(response) => response,
            Evaluation::Failed { reason } => return Ok(Evaluation::Failed { reason }),
        };

        let obj_scale = self.scale_from(response.compliance);
        Ok(Evaluation::Success(ObjCon {
            objective: response.compliance / obj_scale,
            constraint: (self.settings.m_fixed - response.mass) / self.mass_scale,
        }))
    }

    fn eval_obj_con_gradient(&mut self, x: &[f64]) -> TrussResult<Evaluation<ObjConGradient>> {
        let areas = self.areas(x)?;
        let state = match flag_failure(self.analysis().solve(&areas))? {
            Evaluation::Success(state) => state,
            Evaluation::Failed { reason } => return Ok(Evaluation::Failed { reason }),
        };

        let compliance_gradient = state.compliance_gradient();
        let mass_gradient = state.mass_gradient();
        let compliance = state.compliance();
        drop(state);

        let area_scale = self.settings.area_scale;
        let obj_factor = area_scale / self.scale_from(compliance);
        let con_factor = -area_scale / self.mass_scale;

        let gradient = ObjConGradient {
            objective: compliance_gradient.iter().map(|g| g * obj_factor).collect(),
            constraint: mass_gradient.iter().map(|g| g * con_factor).collect(),
        };
        debug!(
            "max |gobj| = {:e}, max |gcon| = {:e}",
            gradient.objective.iter().map(|g| g.abs()).fold(0.0, f64::max),
            gradient.constraint.iter().map(|g| g.abs()).fold(0.0, f64::max)
        );
        Ok(Evaluation::Success(gradient))
    }

    /// The mass constraint is linear in x, so the multipliers do not
    /// contribute and only the objective Hessian remains.
    fn eval_hvec_product(
        &mut self,
        x: &[f64],
        _z: &[f64],
        px: &[f64],
    ) -> TrussResult<Evaluation<Vec<f64>>> {
        let areas = self.areas(x)?;
        self.model.check_len("direction", px.len())?;
        let area_scale = self.settings.area_scale;
        let direction: Vec<f64> = px.iter().map(|p| area_scale * p).collect();

        let analysis = self.analysis();
        let outcome = analysis.solve(&areas).and_then(|state| {
            let hvec = state.hessian_vector_product(&direction)?;
            Ok((hvec, state.compliance()))
        });
        let (hvec, compliance) = match flag_failure(outcome)? {
            Evaluation::Success(value) => value,
            Evaluation::Failed { reason } => return Ok(Evaluation::Failed { reason }),
        };

        let factor = area_scale / self.scale_from(compliance);
        Ok(Evaluation::Success(hvec.into_iter().map(|h| h * factor).collect()))
    }
}
