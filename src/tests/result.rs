use std::time::Duration;

use crate::OptimumResult;

fn result(k: u64, succeeded: bool) -> OptimumResult {
    OptimumResult {
        succeeded,
        iterations: k as usize,
        num_objective_evals: 2 * k as usize + 1,
        num_constraint_evals: 3 * k as usize,
        convergence_rate: 0.1 * k as f64,
        error: 1e-3 / k as f64,
        time: Duration::from_micros(100 * k),
        time_objective_evals: Duration::from_micros(10 * k + 3),
        time_constraint_evals: Duration::from_micros(7 * k),
        time_linear_systems: Duration::from_nanos(999 * k),
    }
}

#[test]
fn merge_takes_outcome_of_the_later_result() {
    let mut a = result(1, false);
    a += result(2, true);

    assert!(a.succeeded);
    assert_eq!(a.iterations, 3);
    assert_eq!(a.num_objective_evals, 3 + 5);
    assert_eq!(a.error, 1e-3 / 2.0);
    assert_eq!(a.convergence_rate, 0.2);
    assert_eq!(a.time, Duration::from_micros(300));
}

#[test]
fn merge_is_associative_on_sums() {
    let (a, b, c) = (result(3, true), result(5, false), result(11, true));

    let mut left = a.clone();
    left += &b;
    left += &c;

    let mut bc = b.clone();
    bc += &c;
    let mut right = a.clone();
    right += &bc;

    assert_eq!(left, right);
    assert_eq!(left, a + b + c);
}

#[test]
fn merge_with_default_keeps_sums() {
    let a = result(4, true);
    let merged = OptimumResult::default() + a.clone();
    assert_eq!(merged, a);
}
