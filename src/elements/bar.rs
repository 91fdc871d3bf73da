//! Bar element - 2-node axial member

use serde::{Deserialize, Serialize};

/// A pin-jointed bar between two nodes.
///
/// The bar's position in the model's bar list is also the index of its
/// cross-sectional area in every design vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Index of the first node
    pub n1: usize,
    /// Index of the second node
    pub n2: usize,
}

impl Bar {
    /// Create a new bar
    pub fn new(n1: usize, n2: usize) -> Self {
        Self { n1, n2 }
    }

    /// Global DOF indices in element order [n1.x, n1.y, n2.x, n2.y]
    pub fn dofs(&self) -> [usize; 4] {
        [2 * self.n1, 2 * self.n1 + 1, 2 * self.n2, 2 * self.n2 + 1]
    }
}

impl From<[usize; 2]> for Bar {
    fn from(pair: [usize; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}
