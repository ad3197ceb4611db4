use crate::problem::Hessian;
use nalgebra::{DMatrix, DVector};

/// The iterate of an interior-point Newton solve.
///
/// A default (empty) state is a cold start. Seeding `x`, `y` and `z` from a
/// previous solution warm-starts the solver.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimumState {
    /// Primal variables, kept strictly positive.
    pub x: DVector<f64>,
    /// Multipliers of the equality constraints.
    pub y: DVector<f64>,
    /// Multipliers of the bounds `x >= 0`, kept strictly positive.
    pub z: DVector<f64>,

    /// Objective value at `x`.
    pub f: f64,
    /// Objective gradient at `x`.
    pub g: DVector<f64>,
    /// Objective Hessian at `x`.
    pub hessian: Hessian,
    /// Constraint residual at `x`.
    pub h: DVector<f64>,
    /// Constraint Jacobian at `x`.
    pub a_mat: DMatrix<f64>,
}

impl Default for OptimumState {
    fn default() -> Self {
        Self {
            x: DVector::zeros(0),
            y: DVector::zeros(0),
            z: DVector::zeros(0),
            f: 0.0,
            g: DVector::zeros(0),
            hessian: Hessian::default(),
            h: DVector::zeros(0),
            a_mat: DMatrix::zeros(0, 0),
        }
    }
}

impl OptimumState {
    /// A state seeded with an initial guess for the primal variables.
    pub fn with_x(x: DVector<f64>) -> Self {
        Self {
            x,
            ..Default::default()
        }
    }

    /// A state seeded with the primal and dual variables of another solve.
    pub fn warm(x: DVector<f64>, y: DVector<f64>, z: DVector<f64>) -> Self {
        Self {
            x,
            y,
            z,
            ..Default::default()
        }
    }
}
