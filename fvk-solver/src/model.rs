//! FvK problem - mesh, corner constraints, equation numbering and Newton solve

use std::fs;
use std::path::Path;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Vector2};
use nalgebra_sparse::CsrMatrix;

use crate::analysis::SolverOptions;
use crate::boundary;
use crate::config::{homogeneous, BoundaryFunction, ProblemParameters, ScalarField, VectorField};
use crate::elements::{
    DuplicateNodeConstraintElement, EdgeCondition, Element, LocalDof, PlateMaterial, N_VALUE, W,
};
use crate::error::{FvkError, FvkResult};
use crate::math::{solve_linear_system, SparseMatrixBuilder};
use crate::mesh::{CircularSector, Mesh};
use crate::results::{NodeSolution, SolutionSummary};

/// Global equation numbers of every nodal value and multiplier
#[derive(Debug, Clone, PartialEq)]
pub struct EquationNumbering {
    nodal: Vec<[Option<usize>; N_VALUE]>,
    lagrange: Vec<[Option<usize>; N_VALUE]>,
    ndof: usize,
}

impl EquationNumbering {
    /// Number all unpinned values: nodal data first, then multipliers
    pub fn new(mesh: &Mesh, constraints: &[DuplicateNodeConstraintElement]) -> Self {
        let mut ndof = 0;
        let mut next = |pinned: bool| {
            if pinned {
                None
            } else {
                ndof += 1;
                Some(ndof - 1)
            }
        };
        let nodal = mesh
            .nodes()
            .iter()
            .map(|node| std::array::from_fn(|v| next(node.data().is_pinned(v))))
            .collect();
        let lagrange = constraints
            .iter()
            .map(|c| std::array::from_fn(|v| next(c.multipliers().is_pinned(v))))
            .collect();
        Self {
            nodal,
            lagrange,
            ndof,
        }
    }

    /// Number of unknowns
    pub fn ndof(&self) -> usize {
        self.ndof
    }

    pub fn eqn(&self, dof: LocalDof) -> Option<usize> {
        match dof {
            LocalDof::Nodal { node, value } => self.nodal.get(node).and_then(|n| n[value]),
            LocalDof::Lagrange { constraint, value } => {
                self.lagrange.get(constraint).and_then(|c| c[value])
            }
        }
    }
}

/// A Föppl-von Kármán plate problem on a domain with curved boundaries
#[derive(Debug, Clone)]
pub struct FvkProblem {
    mesh: Mesh,
    constraints: Vec<DuplicateNodeConstraintElement>,
    params: ProblemParameters,
    numbering: Option<EquationNumbering>,
}

impl FvkProblem {
    /// Wrap a triangulated mesh whose boundary registries are filled in
    pub fn new(mesh: Mesh, params: ProblemParameters) -> FvkResult<Self> {
        params.validate()?;
        Ok(Self {
            mesh,
            constraints: Vec::new(),
            params,
            numbering: None,
        })
    }

    /// Meshed circular sector with `condition` applied on all three edges
    pub fn circular_sector(
        params: ProblemParameters,
        sector: CircularSector,
        condition: &EdgeCondition,
    ) -> FvkResult<Self> {
        let mesh = sector.build(params.element_area)?;
        let mut problem = Self::new(mesh, params)?;
        problem.setup_boundaries()?;
        for b in 0..problem.mesh.nboundary() {
            problem.apply_edge_condition(b, condition, &homogeneous)?;
        }
        Ok(problem)
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Mutable mesh access; invalidates the equation numbering
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        self.numbering = None;
        &mut self.mesh
    }

    pub fn constraints(&self) -> &[DuplicateNodeConstraintElement] {
        &self.constraints
    }

    pub fn params(&self) -> &ProblemParameters {
        &self.params
    }

    pub fn numbering(&self) -> Option<&EquationNumbering> {
        self.numbering.as_ref()
    }

    // ========================
    // Setup
    // ========================

    /// Post-process the mesh: split multi-boundary elements, duplicate the
    /// corners, attach the curves and rotate the boundary data. Then set
    /// the material and forcing on every element.
    pub fn setup_boundaries(&mut self) -> FvkResult<()> {
        self.mesh.split_elements_with_multiple_boundary_edges()?;
        let first = self.constraints.len();
        let corners = boundary::duplicate_corner_nodes(&mut self.mesh, first)?;
        self.constraints.extend(corners);
        boundary::upgrade_all_boundaries(&mut self.mesh, self.params.boundary_order)?;
        boundary::rotate_boundary_nodes(&mut self.mesh)?;
        self.complete_problem_setup();
        self.numbering = None;
        Ok(())
    }

    /// Hand material constants and forcing to every plate element
    pub fn complete_problem_setup(&mut self) {
        let material = PlateMaterial {
            nu: self.params.nu,
            eta: self.params.eta,
        };
        let pressure = self.params.pressure;
        let traction = self.params.in_plane_traction;
        let pressure_fct: Option<Arc<dyn ScalarField>> = (pressure != 0.0)
            .then(|| Arc::new(move |_x: &Vector2<f64>| pressure) as Arc<dyn ScalarField>);
        let forcing_fct: Option<Arc<dyn VectorField>> = (traction != 0.0).then(|| {
            Arc::new(move |_x: &Vector2<f64>| Vector2::new(traction, 0.0)) as Arc<dyn VectorField>
        });

        for element in self.mesh.elements_mut() {
            element.set_material(material);
            if let Some(f) = &pressure_fct {
                element.set_pressure_fct(Arc::clone(f));
            }
            if let Some(f) = &forcing_fct {
                element.set_in_plane_forcing_fct(Arc::clone(f));
            }
        }
    }

    /// Pin the values named by `condition` on boundary `b`, taking the
    /// prescribed values from `fct`
    pub fn apply_edge_condition(
        &mut self,
        b: usize,
        condition: &EdgeCondition,
        fct: &dyn BoundaryFunction,
    ) -> FvkResult<()> {
        let elements = self.mesh.boundary_elements(b)?.to_vec();
        for &e in &elements {
            for &dof in &condition.in_plane {
                self.mesh.fix_in_plane_displacement_dof(e, dof, b, fct)?;
            }
            for &dof in &condition.out_of_plane {
                self.mesh.fix_out_of_plane_displacement_dof(e, dof, b, fct)?;
            }
        }
        if self.params.linear_bending {
            self.mesh.pin_all_in_plane_displacements();
        }
        log::debug!(
            "boundary {}: pinned in-plane {:?}, out-of-plane {:?} on {} elements",
            b,
            condition.in_plane,
            condition.out_of_plane,
            elements.len()
        );
        self.numbering = None;
        Ok(())
    }

    /// Release every boundary condition
    pub fn reset_conditions(&mut self) {
        self.mesh.unpin_all();
        if self.params.linear_bending {
            self.mesh.pin_all_in_plane_displacements();
        }
        self.numbering = None;
    }

    /// Re-run the redundancy check of every corner constraint
    pub fn validate_constraints(&mut self) -> FvkResult<()> {
        let tolerance = self.params.constraint_tolerance;
        for constraint in self.constraints.iter_mut() {
            constraint.validate_redundancy(&self.mesh, tolerance)?;
        }
        let active: usize = self.constraints.iter().map(|c| c.n_active()).sum();
        let redundant: usize = self.constraints.iter().map(|c| c.n_redundant()).sum();
        log::info!(
            "{} corner constraints: {} active, {} redundant multipliers",
            self.constraints.len(),
            active,
            redundant
        );
        self.numbering = None;
        Ok(())
    }

    /// Number all free values. Returns the number of unknowns.
    pub fn assign_eqn_numbers(&mut self) -> usize {
        let numbering = EquationNumbering::new(&self.mesh, &self.constraints);
        let ndof = numbering.ndof();
        log::info!("assigned {} equation numbers", ndof);
        self.numbering = Some(numbering);
        ndof
    }

    // ========================
    // Assembly
    // ========================

    fn value(&self, dof: LocalDof) -> FvkResult<f64> {
        match dof {
            LocalDof::Nodal { node, value } => Ok(self.mesh.node(node)?.data().value(value)),
            LocalDof::Lagrange { constraint, value } => self
                .constraints
                .get(constraint)
                .map(|c| c.multipliers().value(value))
                .ok_or_else(|| {
                    FvkError::InvalidInput(format!("constraint {} does not exist", constraint))
                }),
        }
    }

    fn add_element(
        &self,
        element: &dyn Element,
        numbering: &EquationNumbering,
        residuals: &mut DVector<f64>,
        jacobian: Option<&mut SparseMatrixBuilder>,
    ) -> FvkResult<()> {
        let dofs = element.local_dofs();
        let n = dofs.len();
        let mut values = DVector::zeros(n);
        for (i, &dof) in dofs.iter().enumerate() {
            values[i] = self.value(dof)?;
        }
        let eqns: Vec<Option<usize>> = dofs.iter().map(|&dof| numbering.eqn(dof)).collect();

        let mut local_r = DVector::zeros(n);
        match jacobian {
            Some(builder) => {
                let mut local_j = DMatrix::zeros(n, n);
                element.fill_in_contribution_to_jacobian(
                    &self.mesh,
                    &values,
                    &mut local_r,
                    &mut local_j,
                )?;
                builder.add_element_matrix(&eqns, &local_j);
            }
            None => element.fill_in_contribution_to_residuals(&self.mesh, &values, &mut local_r)?,
        }
        for (i, eqn) in eqns.iter().enumerate() {
            if let Some(row) = *eqn {
                residuals[row] += local_r[i];
            }
        }
        Ok(())
    }

    fn assemble(
        &self,
        mut jacobian: Option<&mut SparseMatrixBuilder>,
    ) -> FvkResult<DVector<f64>> {
        let numbering = self.numbering.as_ref().ok_or(FvkError::NotNumbered)?;
        let mut residuals = DVector::zeros(numbering.ndof());
        for element in self.mesh.elements() {
            self.add_element(element, numbering, &mut residuals, jacobian.as_deref_mut())?;
        }
        for constraint in &self.constraints {
            self.add_element(constraint, numbering, &mut residuals, jacobian.as_deref_mut())?;
        }
        Ok(residuals)
    }

    /// Global residual vector
    pub fn residuals(&self) -> FvkResult<DVector<f64>> {
        self.assemble(None)
    }

    /// Global residuals and Jacobian
    pub fn residuals_and_jacobian(&self) -> FvkResult<(DVector<f64>, SparseMatrixBuilder)> {
        let ndof = self.numbering.as_ref().ok_or(FvkError::NotNumbered)?.ndof();
        let mut builder = SparseMatrixBuilder::new(ndof);
        let residuals = self.assemble(Some(&mut builder))?;
        Ok((residuals, builder))
    }

    /// Global Jacobian in CSR form
    pub fn jacobian_csr(&self) -> FvkResult<CsrMatrix<f64>> {
        Ok(self.residuals_and_jacobian()?.1.to_csr())
    }

    /// Add `dx` to every free value
    fn update_values(&mut self, dx: &DVector<f64>) -> FvkResult<()> {
        let numbering = self.numbering.take().ok_or(FvkError::NotNumbered)?;
        for n in 0..self.mesh.nnode() {
            let data = self.mesh.node_mut(n)?.data_mut();
            for v in 0..N_VALUE {
                if let Some(eqn) = numbering.eqn(LocalDof::Nodal { node: n, value: v }) {
                    data.set_value(v, data.value(v) + dx[eqn]);
                }
            }
        }
        for (c, constraint) in self.constraints.iter_mut().enumerate() {
            let multipliers = constraint.multipliers_mut();
            for v in 0..N_VALUE {
                if let Some(eqn) = numbering.eqn(LocalDof::Lagrange {
                    constraint: c,
                    value: v,
                }) {
                    multipliers.set_value(v, multipliers.value(v) + dx[eqn]);
                }
            }
        }
        self.numbering = Some(numbering);
        Ok(())
    }

    // ========================
    // Solve
    // ========================

    /// Validate the corner constraints, number the equations and run
    /// Newton's method on the assembled system
    pub fn newton_solve(&mut self, options: &SolverOptions) -> FvkResult<SolutionSummary> {
        self.validate_constraints()?;
        let ndof = self.assign_eqn_numbers();
        if ndof == 0 {
            return Ok(self.summary(0, 0.0));
        }

        for iteration in 0..=options.max_iterations {
            let (residuals, builder) = self.residuals_and_jacobian()?;
            let max_residual = residuals.amax();
            if options.log {
                log::info!("Newton iteration {}: max residual {:e}", iteration, max_residual);
            } else {
                log::debug!("Newton iteration {}: max residual {:e}", iteration, max_residual);
            }

            if max_residual < options.tolerance {
                return Ok(self.summary(iteration, max_residual));
            }
            if max_residual > options.max_residual {
                return Err(FvkError::Diverged {
                    residual: max_residual,
                    max_residual: options.max_residual,
                });
            }
            if iteration == options.max_iterations {
                break;
            }

            let dx = solve_linear_system(&builder.to_dense(), &(-residuals))
                .ok_or(FvkError::SingularMatrix)?;
            self.update_values(&dx)?;
        }
        Err(FvkError::ConvergenceFailed(options.max_iterations))
    }

    // ========================
    // Results
    // ========================

    fn summary(&self, iterations: usize, residual: f64) -> SolutionSummary {
        SolutionSummary {
            newton_iterations: iterations,
            residual_norm: residual,
            max_abs_w: self.max_abs_w(),
            n_dof: self.numbering.as_ref().map_or(0, EquationNumbering::ndof),
            n_nodes: self.mesh.nnode(),
            n_elements: self.mesh.nelement(),
            n_active_multipliers: self.constraints.iter().map(|c| c.n_active()).sum(),
            n_redundant_multipliers: self.constraints.iter().map(|c| c.n_redundant()).sum(),
        }
    }

    /// Largest transverse displacement over all nodes
    pub fn max_abs_w(&self) -> f64 {
        self.mesh
            .nodes()
            .iter()
            .map(|node| node.data().value(W).abs())
            .fold(0.0, f64::max)
    }

    /// Per-node solution in Cartesian components
    pub fn node_solutions(&self) -> Vec<NodeSolution> {
        self.mesh
            .nodes()
            .iter()
            .enumerate()
            .map(|(id, node)| NodeSolution::from_node(id, node))
            .collect()
    }

    /// Node solutions as pretty-printed JSON
    pub fn solution_json(&self) -> FvkResult<String> {
        Ok(serde_json::to_string_pretty(&self.node_solutions())?)
    }

    /// Write the node solutions to a JSON file
    pub fn write_solution<P: AsRef<Path>>(&self, path: P) -> FvkResult<()> {
        fs::write(path, self.solution_json()?)?;
        Ok(())
    }
}
