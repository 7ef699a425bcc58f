use std::f64::consts::PI;

use approx::assert_relative_eq;
use fvk_solver::prelude::*;

fn env_f64(name: &str, default_val: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|&v| v > 0.0)
        .unwrap_or(default_val)
}

fn sector_problem(params: ProblemParameters, condition: EdgeCondition) -> FvkProblem {
    FvkProblem::circular_sector(params, CircularSector::eighth_disc(), &condition).unwrap()
}

#[test]
fn fully_fixed_sector_has_zero_solution() {
    let area = env_f64("FVK_ELEMENT_AREA", 0.09);
    let params = ProblemParameters::default().with_element_area(area);
    let mut problem = sector_problem(params, EdgeCondition::fully_fixed());

    let summary = problem.newton_solve(&SolverOptions::default()).unwrap();
    println!("{summary:?}");

    assert!(summary.residual_norm < 1e-8);
    assert!(summary.max_abs_w < 1e-12);
    assert_eq!(summary.n_active_multipliers, 0);
    assert_eq!(summary.n_redundant_multipliers, 24);
    for node in problem.node_solutions() {
        assert!(node.w().abs() < 1e-12);
        assert!(node.in_plane_magnitude() < 1e-12);
    }
}

#[test]
fn clamped_sector_under_pressure_converges() {
    let params = ProblemParameters::default().with_pressure(5.0);
    let mut problem = sector_problem(params, EdgeCondition::clamped().with_in_plane_pinned());

    let summary = problem
        .newton_solve(&SolverOptions::default().with_max_iter(20))
        .unwrap();
    println!("{summary:?}");

    assert!(summary.newton_iterations >= 1);
    assert!(summary.residual_norm < 1e-8);
    assert!(summary.max_abs_w > 0.0);
    assert_eq!(summary.n_active_multipliers, 6);

    // The residual at the converged state stays converged
    let r = problem.residuals().unwrap();
    assert!(r.amax() < 1e-8);
}

#[test]
fn small_loads_respond_linearly() {
    let solve = |pressure: f64| {
        let params = ProblemParameters::default().with_pressure(pressure);
        let mut problem = sector_problem(params, EdgeCondition::clamped().with_in_plane_pinned());
        problem.newton_solve(&SolverOptions::default()).unwrap().max_abs_w
    };
    let w1 = solve(1e-3);
    let w2 = solve(2e-3);
    assert!(w1 > 0.0);
    assert_relative_eq!(w2 / w1, 2.0, max_relative = 1e-4);
}

#[test]
fn linear_bending_takes_one_newton_step() {
    let params = ProblemParameters::default()
        .with_eta(0.0)
        .with_linear_bending()
        .with_pressure(1.0);
    let mut problem = sector_problem(params, EdgeCondition::clamped());

    let summary = problem.newton_solve(&SolverOptions::default()).unwrap();
    assert_eq!(summary.newton_iterations, 1);
    for node in problem.node_solutions() {
        assert_eq!(node.u, [0.0, 0.0]);
    }
}

#[test]
fn curved_elements_recover_sector_area() {
    for order in [BoundaryOrder::Cubic, BoundaryOrder::Quintic] {
        let params = ProblemParameters::default().with_boundary_order(order);
        let problem = sector_problem(params, EdgeCondition::clamped());
        let mesh = problem.mesh();
        let area: f64 = mesh
            .elements()
            .iter()
            .map(|e| e.geometry(mesh).unwrap().area())
            .sum();
        assert_relative_eq!(area, PI / 8.0, epsilon = 1e-4);
    }
}

#[test]
fn boundary_nodes_are_rotated_into_their_own_frames() {
    let problem = sector_problem(ProblemParameters::default(), EdgeCondition::clamped());
    let mesh = problem.mesh();
    for b in 0..mesh.nboundary() {
        for &n in mesh.boundary_nodes(b).unwrap() {
            let node = mesh.node(n).unwrap();
            let rotation = node.rotation().expect("boundary node without frame");
            if node.boundaries().count() == 1 {
                assert_eq!(rotation.boundary, b);
            }
        }
    }
    for c in problem.constraints() {
        let left = mesh.node(c.left_node()).unwrap().rotation().unwrap();
        let right = mesh.node(c.right_node()).unwrap().rotation().unwrap();
        assert_eq!(left.boundary, c.left().boundary);
        assert_eq!(right.boundary, c.right().boundary);
    }
}

#[test]
fn solution_serialises_to_json() {
    let mut problem = sector_problem(
        ProblemParameters::default().with_pressure(1.0),
        EdgeCondition::clamped().with_in_plane_pinned(),
    );
    problem.newton_solve(&SolverOptions::default()).unwrap();
    let json = problem.solution_json().unwrap();
    let nodes: Vec<NodeSolution> = serde_json::from_str(&json).unwrap();
    assert_eq!(nodes.len(), problem.mesh().nnode());
}
