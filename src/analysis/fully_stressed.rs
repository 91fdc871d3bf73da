//! Fully-stressed redesign: resize every bar so it carries its current force
//! at the allowable stress, then reanalyze.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::TrussAnalysis;
use crate::error::{TrussError, TrussResult};

/// Options for the fully-stressed heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullyStressedOptions {
    /// Allowable stress. Falls back to the material yield strength.
    pub sigma_max: Option<f64>,
    /// Lower area bound, keeps zero-force bars in the structure
    pub a_min: f64,
    /// Number of redesign passes
    pub max_iterations: usize,
    /// Stop early once max |ΔA_i|/A_i drops below this
    pub tolerance: Option<f64>,
}

impl Default for FullyStressedOptions {
    fn default() -> Self {
        Self {
            sigma_max: None,
            a_min: 1e-6,
            max_iterations: 100,
            tolerance: None,
        }
    }
}

impl FullyStressedOptions {
    pub fn with_sigma_max(mut self, sigma_max: f64) -> Self {
        self.sigma_max = Some(sigma_max);
        self
    }

    pub fn with_a_min(mut self, a_min: f64) -> Self {
        self.a_min = a_min;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// Outcome of a fully-stressed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullyStressedDesign {
    /// Final bar areas
    pub areas: Vec<f64>,
    /// Redesign passes performed
    pub iterations: usize,
    /// Mass of the resized areas produced by each pass, i.e. of the design
    /// the next pass analyzes; the last entry is the mass of `areas`
    pub mass_history: Vec<f64>,
    /// Whether the tolerance test stopped the run early
    pub converged: bool,
}

impl TrussAnalysis<'_> {
    /// Run the fully-stressed heuristic from `initial` areas.
    ///
    /// Each pass solves the current design and sets
    /// A_i = max(|force_i| / σ_max, A_min). There is no optimality
    /// guarantee; for statically indeterminate trusses the iteration only
    /// redistributes load.
    pub fn fully_stressed(
        &self,
        initial: &[f64],
        options: &FullyStressedOptions,
    ) -> TrussResult<FullyStressedDesign> {
        let model = self.model();
        model.validate_areas(initial)?;

        let sigma_max = options
            .sigma_max
            .or(model.material().fy)
            .ok_or_else(|| {
                TrussError::InvalidInput(
                    "fully-stressed design needs sigma_max or a material yield strength".into(),
                )
            })?;
        if !(sigma_max > 0.0) {
            return Err(TrussError::InvalidInput(format!(
                "sigma_max must be positive, got {}",
                sigma_max
            )));
        }
        if !(options.a_min > 0.0) {
            return Err(TrussError::InvalidInput(format!(
                "a_min must be positive, got {}",
                options.a_min
            )));
        }

        let mut areas = initial.to_vec();
        let mut mass_history = Vec::with_capacity(options.max_iterations);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < options.max_iterations {
            let forces = self.solve(&areas)?.bar_forces();
            let next: Vec<f64> = forces
                .iter()
                .map(|force| (force.abs() / sigma_max).max(options.a_min))
                .collect();

            let change = areas
                .iter()
                .zip(&next)
                .map(|(old, new)| ((new - old) / old).abs())
                .fold(0.0, f64::max);

            areas = next;
            iterations += 1;

            let mass = model.mass(&areas)?;
            mass_history.push(mass);
            debug!(
                "fully-stressed pass {}: mass = {:e}, max area change = {:e}",
                iterations, mass, change
            );

            if options.tolerance.is_some_and(|tol| change < tol) {
                converged = true;
                break;
            }
        }

        info!(
            "fully-stressed design after {} passes: mass = {:e}",
            iterations,
            mass_history.last().copied().unwrap_or_default()
        );

        Ok(FullyStressedDesign {
            areas,
            iterations,
            mass_history,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Bar, Material, Node, Support};
    use crate::loads::NodeLoad;
    use crate::model::TrussModel;
    use approx::assert_relative_eq;

    /// Two-bar bracket: horizontal bar 0-2 in compression (-1),
    /// diagonal bar 1-2 in tension (√2) under a unit downward tip load
    fn bracket(material: Material) -> TrussModel {
        let mut model = TrussModel::new(material);
        model.add_node(Node::new(0.0, 0.0));
        model.add_node(Node::new(0.0, 1.0));
        model.add_node(Node::new(1.0, 0.0));
        model.add_bar(Bar::new(0, 2)).unwrap();
        model.add_bar(Bar::new(1, 2)).unwrap();
        model.add_support(0, Support::pinned()).unwrap();
        model.add_support(1, Support::pinned()).unwrap();
        model.add_node_load(2, NodeLoad::fy(-1.0)).unwrap();
        model
    }

    #[test]
    fn test_determinate_sizing() {
        let model = bracket(Material::new(1000.0, 1.0));
        let options = FullyStressedOptions::default()
            .with_sigma_max(10.0)
            .with_max_iterations(3);
        let design = TrussAnalysis::new(&model)
            .fully_stressed(&[1.0, 1.0], &options)
            .unwrap();

        assert_eq!(design.iterations, 3);
        assert_eq!(design.mass_history.len(), 3);
        // already resized after the first pass: 0.1·1 + (√2/10)·√2
        assert_relative_eq!(design.mass_history[0], 0.3, max_relative = 1e-10);
        assert_relative_eq!(
            *design.mass_history.last().unwrap(),
            model.mass(&design.areas).unwrap(),
            max_relative = 1e-14
        );
        assert!(!design.converged);
        assert_relative_eq!(design.areas[0], 0.1, max_relative = 1e-10);
        assert_relative_eq!(design.areas[1], 2f64.sqrt() / 10.0, max_relative = 1e-10);
    }

    #[test]
    fn test_tolerance_stops_early() {
        let model = bracket(Material::new(1000.0, 1.0).with_yield_strength(10.0));
        let options = FullyStressedOptions::default().with_tolerance(1e-9);
        let design = TrussAnalysis::new(&model)
            .fully_stressed(&[1.0, 1.0], &options)
            .unwrap();

        // forces do not depend on areas here, so the second pass changes nothing
        assert!(design.converged);
        assert_eq!(design.iterations, 2);
    }

    #[test]
    fn test_missing_allowable_stress() {
        let model = bracket(Material::new(1000.0, 1.0));
        let err = TrussAnalysis::new(&model)
            .fully_stressed(&[1.0, 1.0], &FullyStressedOptions::default())
            .unwrap_err();
        assert!(matches!(err, TrussError::InvalidInput(_)));
    }

    #[test]
    fn test_a_min_floor() {
        let mut model = bracket(Material::new(1000.0, 1.0));
        // unloaded extra node, braced to both supports: zero-force bars
        model.add_node(Node::new(-1.0, 0.5));
        model.add_bar(Bar::new(3, 0)).unwrap();
        model.add_bar(Bar::new(3, 1)).unwrap();

        let options = FullyStressedOptions::default()
            .with_sigma_max(10.0)
            .with_a_min(1e-3)
            .with_max_iterations(1);
        let design = TrussAnalysis::new(&model)
            .fully_stressed(&[1.0; 4], &options)
            .unwrap();
        assert_relative_eq!(design.areas[2], 1e-3);
        assert_relative_eq!(design.areas[3], 1e-3);
    }
}
