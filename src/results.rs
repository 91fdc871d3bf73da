//! Result types for truss analysis

use serde::{Deserialize, Serialize};

use crate::elements::{Bar, Node};
use crate::error::TrussResult;

/// Unscaled objective and constraint quantities of one design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Compliance ½uᵀf
    pub compliance: f64,
    /// Total mass Σ ρ·L·A
    pub mass: f64,
}

/// Displacement results at a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
}

impl NodeDisplacement {
    /// Create from array [DX, DY]
    pub fn from_array(arr: [f64; 2]) -> Self {
        Self { dx: arr[0], dy: arr[1] }
    }

    /// Get translation magnitude
    pub fn magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2)).sqrt()
    }
}

/// Reaction forces at a supported node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    /// Supported node
    pub node: usize,
    /// Reaction force in X direction
    pub fx: f64,
    /// Reaction force in Y direction
    pub fy: f64,
}

/// Axial response of a single bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarResult {
    /// Bar (design variable) index
    pub bar: usize,
    /// Cross-sectional area
    pub area: f64,
    /// Bar length
    pub length: f64,
    /// Axial strain (positive = tension)
    pub strain: f64,
    /// Axial stress E·ε
    pub stress: f64,
    /// Axial force E·A·ε (positive = tension)
    pub force: f64,
}

/// Summary of analysis results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Compliance ½uᵀf
    pub compliance: f64,
    /// Total mass
    pub mass: f64,
    /// Largest (most tensile) bar strain
    pub max_strain: f64,
    /// Smallest (most compressive) bar strain
    pub min_strain: f64,
    /// Largest absolute bar strain
    pub max_abs_strain: f64,
    /// Maximum nodal displacement magnitude
    pub max_displacement: f64,
    /// Node with maximum displacement
    pub max_disp_node: usize,
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of bars
    pub num_bars: usize,
    /// Total DOFs
    pub total_dofs: usize,
    /// Free DOFs (not eliminated by supports)
    pub free_dofs: usize,
}

/// Bar connectivity plus its analysis results, as handed to a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarReport {
    /// Connectivity
    #[serde(flatten)]
    pub bar: Bar,
    /// Axial response
    #[serde(flatten)]
    pub result: BarResult,
}

/// Read-only snapshot of one analyzed design: geometry, areas, per-bar
/// forces, displacements and reactions. Renderers draw member thickness from
/// `area` and color from `force`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrussReport {
    /// Node positions
    pub nodes: Vec<Node>,
    /// Bars with areas and forces
    pub bars: Vec<BarReport>,
    /// Displacement of every node
    pub displacements: Vec<NodeDisplacement>,
    /// Reactions at supported nodes
    pub reactions: Vec<Reactions>,
    /// Objective and constraint quantities
    pub response: Response,
}

impl TrussReport {
    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> TrussResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
