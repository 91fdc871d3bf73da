//! Support conditions

use serde::{Deserialize, Serialize};

use crate::error::{TrussError, TrussResult};

/// Support conditions at a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// Restrained in X translation (local DOF 0)
    pub dx: bool,
    /// Restrained in Y translation (local DOF 1)
    pub dy: bool,
}

impl Support {
    /// Create a new support with no restraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pinned support (both translations restrained)
    pub fn pinned() -> Self {
        Self { dx: true, dy: true }
    }

    /// Create a roller support (Y translation restrained only)
    pub fn roller_y() -> Self {
        Self { dx: false, dy: true }
    }

    /// Create a roller support (X translation restrained only)
    pub fn roller_x() -> Self {
        Self { dx: true, dy: false }
    }

    /// Create a support from a list of local DOF indices (0 = x, 1 = y)
    pub fn from_dofs(dofs: &[usize]) -> TrussResult<Self> {
        let mut support = Self::new();
        for &dof in dofs {
            match dof {
                0 => support.dx = true,
                1 => support.dy = true,
                _ => {
                    return Err(TrussError::InconsistentTopology(format!(
                        "support DOF {} is not 0 (x) or 1 (y)",
                        dof
                    )))
                }
            }
        }
        Ok(support)
    }

    /// Get list of restrained local DOF indices
    pub fn restrained_dofs(&self) -> Vec<usize> {
        let mut dofs = Vec::new();
        if self.dx { dofs.push(0); }
        if self.dy { dofs.push(1); }
        dofs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_support() {
        let support = Support::pinned();
        assert_eq!(support.restrained_dofs(), vec![0, 1]);
    }

    #[test]
    fn test_from_dofs() {
        assert_eq!(Support::from_dofs(&[1]).unwrap(), Support::roller_y());
        assert_eq!(Support::from_dofs(&[0, 1, 0]).unwrap(), Support::pinned());
        assert_eq!(Support::from_dofs(&[]).unwrap(), Support::new());
    }

    #[test]
    fn test_from_dofs_rejects_unknown_dof() {
        let err = Support::from_dofs(&[2]).unwrap_err();
        assert!(matches!(err, TrussError::InconsistentTopology(_)));
    }
}
