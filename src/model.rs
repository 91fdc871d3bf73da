//! Truss model - geometry, topology, loads and supports, plus global assembly

use std::collections::BTreeMap;

use serde::Serialize;

use crate::elements::{Bar, Material, Node, Support};
use crate::error::{TrussError, TrussResult};
use crate::loads::NodeLoad;
use crate::math::{self, BarGeometry, GlobalMatrix, Mat, Vec as FEVec};

/// A 2D pin-jointed truss.
///
/// Nodes and bars are identified by their insertion index. Every `add_*`
/// method validates the indices it is given, so a built model is always
/// topologically consistent. Analysis only ever borrows the model immutably.
#[derive(Debug, Clone, Serialize)]
pub struct TrussModel {
    /// Material shared by all bars
    material: Material,
    /// Joints of the truss
    nodes: Vec<Node>,
    /// Bars, in design-variable order
    bars: Vec<Bar>,
    /// Support conditions by node index
    supports: BTreeMap<usize, Support>,
    /// Node loads by node index
    node_loads: BTreeMap<usize, Vec<NodeLoad>>,
}

impl Default for TrussModel {
    fn default() -> Self {
        Self::new(Material::default())
    }
}

impl TrussModel {
    /// Create a new empty model
    pub fn new(material: Material) -> Self {
        Self {
            material,
            nodes: Vec::new(),
            bars: Vec::new(),
            supports: BTreeMap::new(),
            node_loads: BTreeMap::new(),
        }
    }

    /// Build a model from flat arrays.
    ///
    /// # Arguments
    /// * `xpos` - Interleaved node coordinates [x0, y0, x1, y1, ...]
    /// * `conn` - Bar connectivity as node index pairs
    /// * `loads` - (node, [fx, fy]) pairs; repeated nodes accumulate
    /// * `bcs` - (node, constrained local DOFs) pairs, 0 = x and 1 = y
    pub fn from_arrays(
        material: Material,
        xpos: &[f64],
        conn: &[[usize; 2]],
        loads: &[(usize, [f64; 2])],
        bcs: &[(usize, &[usize])],
    ) -> TrussResult<Self> {
        if xpos.len() % 2 != 0 {
            return Err(TrussError::InvalidInput(format!(
                "node coordinate array has odd length {}",
                xpos.len()
            )));
        }

        let mut model = Self::new(material);
        for xy in xpos.chunks_exact(2) {
            model.add_node(Node::new(xy[0], xy[1]));
        }
        for &pair in conn {
            model.add_bar(Bar::from(pair))?;
        }
        for &(node, dofs) in bcs {
            model.add_support(node, Support::from_dofs(dofs)?)?;
        }
        for &(node, force) in loads {
            model.add_node_load(node, NodeLoad::from(force))?;
        }
        Ok(model)
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a node to the model, returning its index
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Add a bar to the model, returning its index (= its design variable)
    pub fn add_bar(&mut self, bar: Bar) -> TrussResult<usize> {
        for node in [bar.n1, bar.n2] {
            self.check_node(node, "bar")?;
        }
        self.bars.push(bar);
        Ok(self.bars.len() - 1)
    }

    /// Restrain DOFs of a node; restraints given for the same node add up
    pub fn add_support(&mut self, node: usize, support: Support) -> TrussResult<()> {
        self.check_node(node, "support")?;
        self.supports
            .entry(node)
            .and_modify(|existing| {
                existing.dx |= support.dx;
                existing.dy |= support.dy;
            })
            .or_insert(support);
        Ok(())
    }

    /// Add a node load; several loads on one node add up
    pub fn add_node_load(&mut self, node: usize, load: NodeLoad) -> TrussResult<()> {
        self.check_node(node, "load")?;
        self.node_loads.entry(node).or_default().push(load);
        Ok(())
    }

    fn check_node(&self, node: usize, what: &str) -> TrussResult<()> {
        if node >= self.nodes.len() {
            return Err(TrussError::InconsistentTopology(format!(
                "{} references node {} but the model has {} nodes",
                what,
                node,
                self.nodes.len()
            )));
        }
        Ok(())
    }

    // ========================
    // Accessors
    // ========================

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn supports(&self) -> &BTreeMap<usize, Support> {
        &self.supports
    }

    pub fn node_loads(&self) -> &BTreeMap<usize, Vec<NodeLoad>> {
        &self.node_loads
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_bars(&self) -> usize {
        self.bars.len()
    }

    /// Total number of DOFs (2 per node)
    pub fn num_dofs(&self) -> usize {
        2 * self.nodes.len()
    }

    /// Node coordinates as [x0, y0, x1, y1, ...]
    pub fn positions(&self) -> Vec<f64> {
        self.nodes.iter().flat_map(|n| n.coords()).collect()
    }

    /// Global indices of every constrained DOF, in ascending order
    pub fn constrained_dofs(&self) -> Vec<usize> {
        self.supports
            .iter()
            .flat_map(|(&node, support)| {
                support.restrained_dofs().into_iter().map(move |dof| 2 * node + dof)
            })
            .collect()
    }

    /// Length and direction cosines of a bar
    pub fn bar_geometry(&self, index: usize) -> TrussResult<BarGeometry> {
        let bar = self.bars.get(index).ok_or_else(|| {
            TrussError::InconsistentTopology(format!(
                "bar {} does not exist; the model has {} bars",
                index,
                self.bars.len()
            ))
        })?;
        let i_node = self.nodes[bar.n1].coords();
        let j_node = self.nodes[bar.n2].coords();

        BarGeometry::from_coords(&i_node, &j_node).ok_or(TrussError::DegenerateGeometry {
            bar: index,
            n1: bar.n1,
            n2: bar.n2,
        })
    }

    /// Geometry of every bar, failing on the first zero-length bar
    pub fn bar_geometries(&self) -> TrussResult<Vec<BarGeometry>> {
        (0..self.bars.len()).map(|i| self.bar_geometry(i)).collect()
    }

    // ========================
    // Assembly
    // ========================

    /// Check that an area vector has one positive, finite entry per bar
    pub fn validate_areas(&self, areas: &[f64]) -> TrussResult<()> {
        self.check_len("area", areas.len())?;
        for (bar, &area) in areas.iter().enumerate() {
            if !(area > 0.0) || !area.is_finite() {
                return Err(TrussError::InvalidArea { bar, area });
            }
        }
        Ok(())
    }

    pub(crate) fn check_len(&self, what: &'static str, actual: usize) -> TrussResult<()> {
        if actual != self.bars.len() {
            return Err(TrussError::DimensionMismatch {
                what,
                expected: self.bars.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Build the dense global stiffness matrix for the given bar areas (no BCs)
    pub fn assemble_stiffness(&self, areas: &[f64]) -> TrussResult<Mat> {
        self.assemble_stiffness_as(areas)
    }

    /// Build the global stiffness matrix into any storage (dense or sparse)
    pub fn assemble_stiffness_as<K: GlobalMatrix>(&self, areas: &[f64]) -> TrussResult<K> {
        self.validate_areas(areas)?;
        self.assemble_weighted(areas)
    }

    /// Build dK/dA · p, the stiffness matrix assembled with an arbitrary
    /// per-bar weight vector in place of the areas. K is linear in the
    /// areas, so this is exactly the directional derivative of K along p.
    pub fn assemble_stiffness_direction(&self, direction: &[f64]) -> TrussResult<Mat> {
        self.assemble_stiffness_direction_as(direction)
    }

    /// Directional stiffness derivative into any storage
    pub fn assemble_stiffness_direction_as<K: GlobalMatrix>(
        &self,
        direction: &[f64],
    ) -> TrussResult<K> {
        self.check_len("direction", direction.len())?;
        self.assemble_weighted(direction)
    }

    fn assemble_weighted<K: GlobalMatrix>(&self, weights: &[f64]) -> TrussResult<K> {
        let mut k_global = K::zeros(self.num_dofs());

        for (index, (bar, &w)) in self.bars.iter().zip(weights).enumerate() {
            let geom = self.bar_geometry(index)?;
            let k_bar = math::bar_stiffness(self.material.e, w, &geom);
            k_global.add_element(&bar.dofs(), &k_bar);
        }

        Ok(k_global)
    }

    /// Build the global load vector (no BCs)
    pub fn assemble_loads(&self) -> FEVec {
        let mut f = FEVec::zeros(self.num_dofs());

        for (&node, loads) in &self.node_loads {
            for load in loads {
                f[2 * node] += load.fx;
                f[2 * node + 1] += load.fy;
            }
        }

        f
    }

    /// Eliminate the constrained DOFs: zero their rows and columns, put 1 on
    /// the diagonal, and zero the matching load entries.
    pub fn apply_bcs<K: GlobalMatrix>(&self, k: &mut K, f: &mut FEVec) {
        let constrained = self.constrained_dofs();
        k.eliminate(&constrained);
        for var in constrained {
            f[var] = 0.0;
        }
    }

    /// Zero the constrained entries of a right-hand side
    pub fn apply_bcs_to_vector(&self, f: &mut FEVec) {
        for var in self.constrained_dofs() {
            f[var] = 0.0;
        }
    }

    // ========================
    // Mass
    // ========================

    /// Total mass Σ ρ·L·A
    pub fn mass(&self, areas: &[f64]) -> TrussResult<f64> {
        self.check_len("area", areas.len())?;
        let rho = self.material.rho;
        let mut mass = 0.0;
        for (index, &area) in areas.iter().enumerate() {
            mass += rho * self.bar_geometry(index)?.length * area;
        }
        Ok(mass)
    }

    /// dM/dA_i = ρ·L_i, independent of the areas
    pub fn mass_gradient(&self) -> TrussResult<Vec<f64>> {
        let rho = self.material.rho;
        Ok(self
            .bar_geometries()?
            .iter()
            .map(|geom| rho * geom.length)
            .collect())
    }
}
