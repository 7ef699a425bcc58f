use std::sync::Arc;

use approx::assert_relative_eq;
use fvk_solver::boundary::upgrade_boundary;
use fvk_solver::prelude::*;
use nalgebra::Vector2;

fn count_states(problem: &FvkProblem) -> (usize, usize) {
    let active = problem.constraints().iter().map(|c| c.n_active()).sum();
    let redundant = problem.constraints().iter().map(|c| c.n_redundant()).sum();
    (active, redundant)
}

fn apply_everywhere(problem: &mut FvkProblem, condition: &EdgeCondition) {
    problem.reset_conditions();
    for b in 0..problem.mesh().nboundary() {
        problem.apply_edge_condition(b, condition, &homogeneous).unwrap();
    }
}

#[test]
fn clamped_corners_keep_only_unconstrained_curvatures() {
    let mut problem = FvkProblem::circular_sector(
        ProblemParameters::default(),
        CircularSector::eighth_disc(),
        &EdgeCondition::clamped().with_in_plane_pinned(),
    )
    .unwrap();
    problem.validate_constraints().unwrap();

    // Two right-angled corners and the apex, each keeping two curvature rows
    assert_eq!(count_states(&problem), (6, 18));
    for c in problem.constraints() {
        assert_eq!(c.n_active(), 2);
        for row in 0..5 {
            assert_eq!(c.state(row), ConstraintState::Redundant);
        }
        assert_eq!(c.state(5), ConstraintState::Active);
    }
}

#[test]
fn changing_conditions_and_revalidating_updates_states() {
    let mut problem = FvkProblem::circular_sector(
        ProblemParameters::default(),
        CircularSector::eighth_disc(),
        &EdgeCondition::fully_fixed(),
    )
    .unwrap();
    problem.validate_constraints().unwrap();
    assert_eq!(count_states(&problem), (0, 24));

    problem.reset_conditions();
    problem.validate_constraints().unwrap();
    assert_eq!(count_states(&problem), (24, 0));
    for c in problem.constraints() {
        assert!((0..8).all(|row| c.claimed(row).map(|d| d.side) == Some(Side::Right)));
    }

    apply_everywhere(&mut problem, &EdgeCondition::clamped().with_in_plane_pinned());
    problem.validate_constraints().unwrap();
    let first = count_states(&problem);
    problem.validate_constraints().unwrap();
    assert_eq!(count_states(&problem), first);
    assert_eq!(first, (6, 18));
}

#[test]
fn inconsistent_corner_data_is_unsatisfiable() {
    let mut problem = FvkProblem::circular_sector(
        ProblemParameters::default(),
        CircularSector::eighth_disc(),
        &EdgeCondition::free(),
    )
    .unwrap();
    let condition = EdgeCondition::fully_fixed();
    problem
        .apply_edge_condition(0, &condition, &|_x: &Vector2<f64>| 1.0)
        .unwrap();
    problem.apply_edge_condition(1, &condition, &homogeneous).unwrap();
    problem.apply_edge_condition(2, &condition, &homogeneous).unwrap();

    match problem.newton_solve(&SolverOptions::default()) {
        Err(FvkError::UnsatisfiableConstraint { index, residual, .. }) => {
            assert_eq!(index, 0);
            assert_relative_eq!(residual.abs(), 1.0, epsilon = 1e-12);
        }
        other => panic!("expected an unsatisfiable constraint, got {other:?}"),
    }
}

#[test]
fn clockwise_curve_parametrisation_is_rejected() {
    let build = |clockwise: bool| {
        let arc: Arc<dyn ParametricCurve> = Arc::new(EllipticalArc::new(1.0, 1.0, clockwise));
        let mut mesh = Mesh::new(vec![arc]);
        let c = mesh.add_node(0.0, 0.0);
        let a = mesh.add_node(0.2_f64.cos(), 0.2_f64.sin());
        let b = mesh.add_node(0.8_f64.cos(), 0.8_f64.sin());
        mesh.add_element([c, a, b]).unwrap();
        mesh.add_boundary_node(0, a).unwrap();
        mesh.add_boundary_node(0, b).unwrap();
        mesh.setup_boundary_element_info();
        mesh
    };

    let mut anticlockwise = build(false);
    assert_eq!(upgrade_boundary(&mut anticlockwise, 0, BoundaryOrder::Quintic).unwrap(), 1);
    let area = anticlockwise.element(0).unwrap().geometry(&anticlockwise).unwrap().area();
    assert_relative_eq!(area, 0.3, epsilon = 1e-5);

    let mut clockwise = build(true);
    assert!(matches!(
        upgrade_boundary(&mut clockwise, 0, BoundaryOrder::Quintic),
        Err(FvkError::DecreasingParametricCoordinate { element: 0, boundary: 0, .. })
    ));
}

#[test]
fn corner_copies_are_glued_at_the_same_point() {
    let problem = FvkProblem::circular_sector(
        ProblemParameters::default(),
        CircularSector::eighth_disc(),
        &EdgeCondition::clamped(),
    )
    .unwrap();
    let mesh = problem.mesh();
    assert_eq!(problem.constraints().len(), 3);
    for (i, c) in problem.constraints().iter().enumerate() {
        assert_eq!(c.index(), i);
        let left = mesh.node(c.left_node()).unwrap();
        let right = mesh.node(c.right_node()).unwrap();
        assert_ne!(c.left_node(), c.right_node());
        assert_relative_eq!(left.position(), right.position(), epsilon = 1e-14);
        assert!(left.is_on_boundary(c.left().boundary));
        assert!(right.is_on_boundary(c.right().boundary));
        assert!(!right.is_on_boundary(c.left().boundary));
    }
}
