//! Node element - represents a joint in the plane

use serde::{Deserialize, Serialize};

/// A 2D joint of the truss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Node {
    /// Create a new node at the given coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
