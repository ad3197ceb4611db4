use nalgebra::{DMatrix, DVector};

use super::problems::{HessianKind, ALL_KINDS};
use crate::{Hessian, KktMethod, KktOptions, KktSolver, OptimumError, OptimumState};

const METHODS: [KktMethod; 3] = [
    KktMethod::PartialPivLu,
    KktMethod::FullPivLu,
    KktMethod::Rangespace,
];

fn dense_hessian() -> DMatrix<f64> {
    DMatrix::from_row_slice(
        4,
        4,
        &[
            4.0, 1.0, 0.0, 0.5, //
            1.0, 3.0, 0.2, 0.0, //
            0.0, 0.2, 5.0, 1.0, //
            0.5, 0.0, 1.0, 2.0,
        ],
    )
}

fn state(kind: HessianKind) -> OptimumState {
    let h = dense_hessian();
    let hessian = match kind {
        HessianKind::Dense => Hessian::Dense(h),
        HessianKind::Diagonal => Hessian::Diagonal(h.diagonal()),
        HessianKind::Inverse => Hessian::Inverse(h.try_inverse().unwrap()),
    };
    OptimumState {
        x: DVector::from_vec(vec![1.0, 0.5, 2.0, 0.1]),
        z: DVector::from_vec(vec![0.1, 0.2, 1e-3, 3.0]),
        hessian,
        a_mat: DMatrix::from_row_slice(2, 4, &[1.0, 1.0, 1.0, 1.0, 2.0, 0.0, 1.0, -1.0]),
        ..Default::default()
    }
}

/// Largest residual of both block rows of the KKT equations.
fn residual(
    state: &OptimumState,
    a: &DVector<f64>,
    b: &DVector<f64>,
    dx: &DVector<f64>,
    dy: &DVector<f64>,
) -> f64 {
    let hdx = state.hessian.mul_vec(dx).unwrap();
    let e = state.z.component_div(&state.x);
    let r1 = hdx + e.component_mul(dx) - state.a_mat.tr_mul(dy) - a;
    let r2 = &state.a_mat * dx - b;
    r1.amax().max(r2.amax())
}

#[test]
fn solves_every_representation_with_every_method() {
    let a = DVector::from_vec(vec![1.0, -2.0, 0.5, 3.0]);
    let b = DVector::from_vec(vec![0.3, -1.0]);

    for kind in ALL_KINDS {
        for method in METHODS {
            let state = state(kind);
            let mut kkt = KktSolver::new(KktOptions { method });
            let (mut dx, mut dy) = (DVector::zeros(0), DVector::zeros(0));

            kkt.decompose(&state).unwrap();
            kkt.solve(&a, &b, &mut dx, &mut dy).unwrap();

            assert_eq!(dx.len(), 4);
            assert_eq!(dy.len(), 2);
            assert!(
                residual(&state, &a, &b, &dx, &dy) < 1e-10,
                "{:?} {:?}",
                kind,
                method
            );
        }
    }
}

#[test]
fn one_decomposition_serves_many_right_hand_sides() {
    let state = state(HessianKind::Dense);
    let mut kkt = KktSolver::default();
    kkt.decompose(&state).unwrap();

    for k in 0..3 {
        let a = DVector::from_fn(4, |i, _| (i + k) as f64);
        let b = DVector::from_fn(2, |i, _| 1.0 - (i * k) as f64);
        let (mut dx, mut dy) = (DVector::zeros(0), DVector::zeros(0));
        kkt.solve(&a, &b, &mut dx, &mut dy).unwrap();
        assert!(residual(&state, &a, &b, &dx, &dy) < 1e-10);
    }
}

#[test]
fn without_constraints_dy_is_empty() {
    let mut state = state(HessianKind::Diagonal);
    state.a_mat = DMatrix::zeros(0, 4);
    let a = DVector::from_element(4, 1.0);
    let b = DVector::zeros(0);

    for method in METHODS {
        let mut kkt = KktSolver::new(KktOptions { method });
        let (mut dx, mut dy) = (DVector::zeros(0), DVector::zeros(0));
        kkt.decompose(&state).unwrap();
        kkt.solve(&a, &b, &mut dx, &mut dy).unwrap();

        assert!(dy.is_empty());
        assert!(residual(&state, &a, &b, &dx, &dy) < 1e-12);
    }
}

#[test]
fn solve_requires_decompose() {
    let mut kkt = KktSolver::default();
    let (mut dx, mut dy) = (DVector::zeros(0), DVector::zeros(0));
    let err = kkt
        .solve(&DVector::zeros(0), &DVector::zeros(0), &mut dx, &mut dy)
        .unwrap_err();
    assert_eq!(err, OptimumError::KktNotDecomposed);
}

#[test]
fn singular_full_matrix_is_reported() {
    let state = OptimumState {
        x: DVector::from_element(1, 1.0),
        z: DVector::from_element(1, 0.0),
        hessian: Hessian::Dense(DMatrix::zeros(1, 1)),
        a_mat: DMatrix::zeros(1, 1),
        ..Default::default()
    };
    for method in METHODS {
        let mut kkt = KktSolver::new(KktOptions { method });
        let err = kkt.decompose(&state).unwrap_err();
        assert!(matches!(err, OptimumError::SingularKkt { .. }), "{:?}", method);
    }
}

#[test]
fn dependent_constraints_make_schur_complement_singular() {
    let mut state = state(HessianKind::Diagonal);
    state.a_mat = DMatrix::from_row_slice(2, 4, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);

    let err = KktSolver::default().decompose(&state).unwrap_err();
    assert!(matches!(err, OptimumError::SingularKkt { .. }));
}

#[test]
fn mismatched_right_hand_side_is_rejected() {
    let state = state(HessianKind::Dense);
    let mut kkt = KktSolver::default();
    kkt.decompose(&state).unwrap();
    let (mut dx, mut dy) = (DVector::zeros(0), DVector::zeros(0));

    let err = kkt
        .solve(&DVector::zeros(3), &DVector::zeros(2), &mut dx, &mut dy)
        .unwrap_err();
    assert!(matches!(err, OptimumError::DimensionMismatch { .. }));
}

#[test]
fn hessian_products_agree() {
    let h = dense_hessian();
    let v = DVector::from_vec(vec![1.0, 2.0, -1.0, 0.5]);
    let dense = Hessian::Dense(h.clone()).mul_vec(&v).unwrap();
    let inverse = Hessian::Inverse(h.clone().try_inverse().unwrap()).mul_vec(&v).unwrap();
    assert!((dense - inverse).amax() < 1e-12);

    let diagonal = Hessian::Diagonal(h.diagonal()).mul_vec(&v).unwrap();
    assert_eq!(diagonal, h.diagonal().component_mul(&v));
    assert_eq!(Hessian::Diagonal(h.diagonal()).dim(), 4);
}
