//! Truss Opt - 2D truss analysis and sensitivities for sizing optimization
//!
//! This library analyzes pin-jointed plane trusses whose bar areas are the
//! design variables, supporting:
//! - Linear static analysis (dense or skyline Cholesky)
//! - Compliance and mass, with exact gradients
//! - Compliance Hessian-vector products
//! - Fully-stressed redesign
//! - An optimizer adapter for minimum compliance under a mass budget
//!
//! ## Example
//! ```rust
//! use truss_opt::prelude::*;
//!
//! let mut model = TrussModel::new(Material::new(70e9, 2700.0));
//!
//! // Add nodes
//! let a = model.add_node(Node::new(0.0, 0.0));
//! let b = model.add_node(Node::new(0.0, 1.0));
//! let tip = model.add_node(Node::new(1.0, 0.0));
//!
//! // Add bars
//! model.add_bar(Bar::new(a, tip)).unwrap();
//! model.add_bar(Bar::new(b, tip)).unwrap();
//!
//! // Add supports and loads
//! model.add_support(a, Support::pinned()).unwrap();
//! model.add_support(b, Support::pinned()).unwrap();
//! model.add_node_load(tip, NodeLoad::fy(-1000.0)).unwrap();
//!
//! // Analyze
//! let analysis = TrussAnalysis::new(&model);
//! let areas = [1e-4, 1e-4];
//! let response = analysis.evaluate(&areas).unwrap();
//! let gradient = analysis.compliance_gradient(&areas).unwrap();
//! assert!(response.compliance > 0.0);
//! assert!(gradient.iter().all(|g| *g < 0.0));
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod optimization;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{
        AnalysisOptions, FullyStressedDesign, FullyStressedOptions, StaticState, TrussAnalysis,
    };
    pub use crate::elements::{Bar, Material, Node, Support};
    pub use crate::error::{TrussError, TrussResult};
    pub use crate::loads::NodeLoad;
    pub use crate::math::SolverKind;
    pub use crate::model::TrussModel;
    pub use crate::optimization::{
        ComplianceProblem, Evaluation, ObjCon, ObjConGradient, OptimizationProblem,
        ProblemSettings,
    };
    pub use crate::results::{
        BarResult, EvaluationSummary, NodeDisplacement, Reactions, Response, TrussReport,
    };
}
