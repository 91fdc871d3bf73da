//! Material properties

use serde::{Deserialize, Serialize};

/// Material shared by every bar of a truss
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Density in kg/m³
    pub rho: f64,
    /// Allowable axial stress (optional) in Pa
    pub fy: Option<f64>,
}

impl Material {
    /// Create a new material with given properties
    pub fn new(e: f64, rho: f64) -> Self {
        Self { e, rho, fy: None }
    }

    /// Create a material with an allowable stress
    pub fn with_yield_strength(mut self, fy: f64) -> Self {
        self.fy = Some(fy);
        self
    }

    /// Create a standard steel material (A36)
    pub fn steel() -> Self {
        Self {
            e: 200e9,        // 200 GPa
            rho: 7850.0,     // kg/m³
            fy: Some(250e6), // 250 MPa
        }
    }

    /// Create an aluminum material (6061-T6)
    pub fn aluminum() -> Self {
        Self {
            e: 70e9,         // 70 GPa
            rho: 2700.0,     // kg/m³
            fy: Some(276e6), // 276 MPa
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}
