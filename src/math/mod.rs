//! Mathematical utilities for truss calculations

pub mod solver;
pub mod sparse;

use nalgebra::{DMatrix, DVector, Matrix4, Vector4};

pub use solver::{solve_linear_system, Factorization, SolverKind};
pub use sparse::{SkylineCholesky, SparseMatrixBuilder};

pub type Mat = DMatrix<f64>;
pub type Vec = DVector<f64>;

/// 4x4 matrix for bar stiffness
pub type Mat4 = Matrix4<f64>;
/// 4-element vector for bar end displacements [u1, v1, u2, v2]
pub type Vec4 = Vector4<f64>;

/// Length and direction cosines of a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    /// Bar length
    pub length: f64,
    /// cos of the angle between the bar and global X
    pub c: f64,
    /// sin of the angle between the bar and global X
    pub s: f64,
}

impl BarGeometry {
    /// Compute the geometry of a bar from its end coordinates.
    ///
    /// Returns `None` when the two ends coincide exactly or the length is
    /// not finite, since the direction cosines are undefined there. Any
    /// positive length is accepted, whatever the unit system.
    pub fn from_coords(i_node: &[f64; 2], j_node: &[f64; 2]) -> Option<Self> {
        let dx = j_node[0] - i_node[0];
        let dy = j_node[1] - i_node[1];
        let length = dx.hypot(dy);

        if !(length > 0.0) || !length.is_finite() {
            return None;
        }

        Some(Self {
            length,
            c: dx / length,
            s: dy / length,
        })
    }

    /// Project the end displacements onto the bar axis: [u_hat1, u_hat2]
    pub fn axial_displacements(&self, u: &Vec4) -> [f64; 2] {
        [
            self.c * u[0] + self.s * u[1],
            self.c * u[2] + self.s * u[3],
        ]
    }

    /// Axial strain from the end displacements (positive = tension)
    pub fn axial_strain(&self, u: &Vec4) -> f64 {
        let [u1_hat, u2_hat] = self.axial_displacements(u);
        (u2_hat - u1_hat) / self.length
    }
}

/// Compute the global stiffness matrix of a 2D bar
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `a` - Cross-sectional area (any real weight; the matrix is linear in it)
/// * `geom` - Bar length and direction cosines
///
/// # Returns
/// 4x4 stiffness matrix ordered [n1.x, n1.y, n2.x, n2.y]
pub fn bar_stiffness(e: f64, a: f64, geom: &BarGeometry) -> Mat4 {
    let ea_l = e * a / geom.length;

    // Each distinct entry is computed once so the matrix is exactly symmetric
    let cc = ea_l * (geom.c * geom.c);
    let cs = ea_l * (geom.c * geom.s);
    let ss = ea_l * (geom.s * geom.s);

    #[rustfmt::skip]
    let data = [
         cc,  cs, -cc, -cs,
         cs,  ss, -cs, -ss,
        -cc, -cs,  cc,  cs,
        -cs, -ss,  cs,  ss,
    ];

    Mat4::from_row_slice(&data)
}

/// Gather the four element DOF values of a global vector
pub fn gather(global: &Vec, dofs: &[usize; 4]) -> Vec4 {
    Vec4::new(global[dofs[0]], global[dofs[1]], global[dofs[2]], global[dofs[3]])
}

/// Scatter-add a 4x4 element matrix into a global matrix
pub fn scatter_add(global: &mut Mat, dofs: &[usize; 4], k_elem: &Mat4) {
    for (a, &ga) in dofs.iter().enumerate() {
        for (b, &gb) in dofs.iter().enumerate() {
            global[(ga, gb)] += k_elem[(a, b)];
        }
    }
}

/// Storage a global stiffness matrix can be assembled into.
///
/// Dense `Mat` backs the dense solver; `SparseMatrixBuilder` collects
/// triplets for the skyline solver without ever forming the full matrix.
pub trait GlobalMatrix: Sized {
    /// Empty square matrix of the given size
    fn zeros(size: usize) -> Self;

    /// Add a bar stiffness at the given global DOFs
    fn add_element(&mut self, dofs: &[usize; 4], k_elem: &Mat4);

    /// Replace the rows and columns of `dofs` by unit basis vectors
    fn eliminate(&mut self, dofs: &[usize]);

    /// Matrix-vector product
    fn multiply_vector(&self, x: &Vec) -> Vec;
}

impl GlobalMatrix for Mat {
    fn zeros(size: usize) -> Self {
        Mat::zeros(size, size)
    }

    fn add_element(&mut self, dofs: &[usize; 4], k_elem: &Mat4) {
        scatter_add(self, dofs, k_elem);
    }

    fn eliminate(&mut self, dofs: &[usize]) {
        for &var in dofs {
            self.row_mut(var).fill(0.0);
            self.column_mut(var).fill(0.0);
            self[(var, var)] = 1.0;
        }
    }

    fn multiply_vector(&self, x: &Vec) -> Vec {
        self * x
    }
}
