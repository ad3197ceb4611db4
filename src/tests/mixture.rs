use float_cmp::assert_approx_eq;
use nalgebra::DVector;

use super::problems::{HessianKind, IdealMixture, ALL_KINDS};
use crate::{FnProblem, Hessian, OptimumOptions, OptimumSolverIpnewton, OptimumState};

fn options() -> OptimumOptions {
    OptimumOptions {
        tolerance: 1e-8,
        ..Default::default()
    }
}

#[test]
fn simplex_mixture_matches_closed_form() {
    for kind in ALL_KINDS {
        let problem = IdealMixture::simplex(kind);
        let mut state = OptimumState::with_x(DVector::from_element(3, 1.0));

        let result = OptimumSolverIpnewton::new()
            .solve_with(&problem, &mut state, &options())
            .unwrap();

        assert!(result.succeeded);
        for (x, expected) in state.x.iter().zip([4.0 / 7.0, 2.0 / 7.0, 1.0 / 7.0]) {
            assert_approx_eq!(f64, *x, expected, epsilon = 1e-7);
        }
    }
}

#[test]
fn uniform_step_reaches_same_solution() {
    let problem = IdealMixture::simplex(HessianKind::Diagonal);
    let mut state = OptimumState::with_x(DVector::from_element(3, 1.0));
    let mut opt = options();
    opt.ipnewton.uniform_newton_step = true;

    let result = OptimumSolverIpnewton::new()
        .solve_with(&problem, &mut state, &opt)
        .unwrap();

    assert!(result.succeeded);
    assert_approx_eq!(f64, state.x[0], 4.0 / 7.0, epsilon = 1e-7);
    assert_approx_eq!(f64, state.x[2], 1.0 / 7.0, epsilon = 1e-7);
}

#[test]
fn water_mixture_satisfies_element_balance() {
    let mut solutions = Vec::new();
    for kind in ALL_KINDS {
        let problem = IdealMixture::water(kind);
        let mut state = OptimumState::with_x(DVector::from_element(3, 1.0));
        let opt = OptimumOptions {
            tolerance: 1e-10,
            ..Default::default()
        };

        let result = OptimumSolverIpnewton::new()
            .solve_with(&problem, &mut state, &opt)
            .unwrap();

        assert!(result.succeeded);
        let balance = &problem.a_mat * &state.x;
        assert_approx_eq!(f64, balance[0], 2.0, epsilon = 1e-9);
        assert_approx_eq!(f64, balance[1], 1.0, epsilon = 1e-9);
        // water dominates
        assert!(state.x[2] > 0.9);
        solutions.push(state.x);
    }
    for x in &solutions[1..] {
        assert!((x - &solutions[0]).amax() < 1e-8);
    }
}

#[test]
fn warm_start_needs_fewer_iterations() {
    let problem = IdealMixture::simplex(HessianKind::Diagonal);
    let mut solver = OptimumSolverIpnewton::new();

    let mut cold = OptimumState::with_x(DVector::from_element(3, 1.0));
    let cold_result = solver.solve_with(&problem, &mut cold, &options()).unwrap();
    assert!(cold_result.succeeded);

    let mut warm = OptimumState::warm(cold.x.clone(), cold.y.clone(), cold.z.clone());
    let warm_result = solver.solve_with(&problem, &mut warm, &options()).unwrap();

    assert!(warm_result.succeeded);
    assert!(warm_result.iterations < cold_result.iterations);
}

#[test]
fn closure_problem_with_linear_constraint() {
    let c = DVector::from_vec(vec![0.0, 2f64.ln(), 4f64.ln()]);
    let (c1, c2) = (c.clone(), c.clone());
    let problem = FnProblem::new(3, 1)
        .with_objective(move |x| x.iter().zip(c.iter()).map(|(x, c)| x * (c + x.ln())).sum())
        .with_objective_grad(move |x| x.zip_map(&c1, |x, c| c + x.ln() + 1.0))
        .with_objective_hessian(|x, _| Hessian::Diagonal(x.map(|x| 1.0 / x)))
        .with_linear_constraint(
            nalgebra::DMatrix::from_element(1, 3, 1.0),
            DVector::from_element(1, 1.0),
        );
    let mut state = OptimumState::with_x(DVector::from_element(3, 1.0));

    let result = OptimumSolverIpnewton::new()
        .solve_with(&problem, &mut state, &options())
        .unwrap();

    assert!(result.succeeded);
    let expected = c2.map(|c| (-c).exp()) / (1.0 + 0.5 + 0.25);
    assert!((&state.x - expected).amax() < 1e-7);
}
