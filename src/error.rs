//! Error types for truss analysis

use thiserror::Error;

/// Main error type for truss analysis and sensitivity operations
#[derive(Error, Debug)]
pub enum TrussError {
    #[error("Bar {bar} has zero length (nodes {n1} and {n2} coincide)")]
    DegenerateGeometry { bar: usize, n1: usize, n2: usize },

    #[error("Singular stiffness matrix at equation {equation} - structure may be unstable or have insufficient supports")]
    SingularSystem { equation: usize },

    #[error("Bar {bar} has non-positive area {area}")]
    InvalidArea { bar: usize, area: f64 },

    #[error("Inconsistent topology: {0}")]
    InconsistentTopology(String),

    #[error("Expected {expected} {what} values, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrussError {
    /// Whether this error means the trial design cannot be analyzed, as opposed
    /// to a bug in the caller. The optimizer adapter reports these as a failed
    /// evaluation instead of aborting.
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(
            self,
            TrussError::DegenerateGeometry { .. } | TrussError::SingularSystem { .. }
        )
    }
}

/// Result type for truss operations
pub type TrussResult<T> = Result<T, TrussError>;
