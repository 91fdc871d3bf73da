//! Node loads - forces applied directly to nodes

use serde::{Deserialize, Serialize};

/// A force applied directly to a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    /// Force in X direction (N)
    pub fx: f64,
    /// Force in Y direction (N)
    pub fy: f64,
}

impl NodeLoad {
    /// Create a new node load
    pub fn new(fx: f64, fy: f64) -> Self {
        Self { fx, fy }
    }

    /// Create a load in X direction
    pub fn fx(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Create a load in Y direction
    pub fn fy(value: f64) -> Self {
        Self::new(0.0, value)
    }
}

impl From<[f64; 2]> for NodeLoad {
    fn from(f: [f64; 2]) -> Self {
        Self::new(f[0], f[1])
    }
}
