use crate::error::OptimumError;
use anyhow::Result;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Hessian of an objective function, in one of the representations the
/// KKT solver knows how to exploit.
#[derive(Clone, Debug, PartialEq)]
pub enum Hessian {
    /// The full matrix.
    Dense(DMatrix<f64>),
    /// The diagonal entries of a diagonal matrix.
    Diagonal(DVector<f64>),
    /// The inverse of the Hessian matrix.
    Inverse(DMatrix<f64>),
}

impl Default for Hessian {
    fn default() -> Self {
        Hessian::Dense(DMatrix::zeros(0, 0))
    }
}

impl Hessian {
    /// Number of rows (and columns) of the represented matrix.
    pub fn dim(&self) -> usize {
        match self {
            Hessian::Dense(h) | Hessian::Inverse(h) => h.nrows(),
            Hessian::Diagonal(d) => d.len(),
        }
    }

    pub(crate) fn is_square(&self) -> bool {
        match self {
            Hessian::Dense(h) | Hessian::Inverse(h) => h.is_square(),
            Hessian::Diagonal(_) => true,
        }
    }

    /// Computes `H * v`.
    ///
    /// For [`Hessian::Inverse`] this solves `H⁻¹ w = v` and fails if the
    /// stored inverse is singular.
    pub fn mul_vec(&self, v: &DVector<f64>) -> Result<DVector<f64>, OptimumError> {
        if v.len() != self.dim() {
            return Err(OptimumError::vector_len("Hessian product", self.dim(), v.len()));
        }
        match self {
            Hessian::Dense(h) => Ok(h * v),
            Hessian::Diagonal(d) => Ok(d.component_mul(v)),
            Hessian::Inverse(hinv) => hinv
                .clone()
                .lu()
                .solve(v)
                .ok_or_else(|| OptimumError::singular("inverse Hessian is not invertible")),
        }
    }
}

/// A nonlinear program with equality constraints and non-negative variables:
///
/// ```txt
///       min f(x)
///        x
///
/// subject to
///
///       h(x) = 0
///       x >= 0
/// ```
///
/// Implementations must be deterministic functions of `x`.
pub trait OptimumProblem {
    /// Number of variables, `n`.
    fn num_variables(&self) -> usize;

    /// Number of equality constraints, `m`.
    fn num_constraints(&self) -> usize;

    fn objective(&self, x: &DVector<f64>) -> Result<f64>;

    fn objective_grad(&self, x: &DVector<f64>) -> Result<DVector<f64>>;

    /// Hessian of the objective at `x`; `g` is the gradient already
    /// evaluated at the same point.
    fn objective_hessian(&self, x: &DVector<f64>, g: &DVector<f64>) -> Result<Hessian>;

    /// Residual `h(x)` of the equality constraints, length `m`.
    fn constraint(&self, x: &DVector<f64>) -> Result<DVector<f64>>;

    /// Jacobian of `h(x)`, an `m x n` matrix.
    fn constraint_grad(&self, x: &DVector<f64>) -> Result<DMatrix<f64>>;
}

type ScalarFn = Arc<dyn Fn(&DVector<f64>) -> f64 + Send + Sync>;
type VectorFn = Arc<dyn Fn(&DVector<f64>) -> DVector<f64> + Send + Sync>;
type MatrixFn = Arc<dyn Fn(&DVector<f64>) -> DMatrix<f64> + Send + Sync>;
type HessianFn = Arc<dyn Fn(&DVector<f64>, &DVector<f64>) -> Hessian + Send + Sync>;

/// An [`OptimumProblem`] assembled from closures.
///
/// ```ignore
/// let problem = FnProblem::new(2, 1)
///     .with_objective(|x| x.norm_squared())
///     .with_objective_grad(|x| 2.0 * x)
///     .with_objective_hessian(|_, _| Hessian::Diagonal(DVector::from_element(2, 2.0)))
///     .with_linear_constraint(
///         DMatrix::from_row_slice(1, 2, &[1.0, 1.0]),
///         DVector::from_element(1, 1.0),
///     );
/// ```
#[derive(Clone)]
pub struct FnProblem {
    n: usize,
    m: usize,
    objective: Option<ScalarFn>,
    objective_grad: Option<VectorFn>,
    objective_hessian: Option<HessianFn>,
    constraint: Option<VectorFn>,
    constraint_grad: Option<MatrixFn>,
}

impl FnProblem {
    pub fn new(num_variables: usize, num_constraints: usize) -> Self {
        Self {
            n: num_variables,
            m: num_constraints,
            objective: None,
            objective_grad: None,
            objective_hessian: None,
            constraint: None,
            constraint_grad: None,
        }
    }

    pub fn with_objective<F>(mut self, f: F) -> Self
    where
        F: Fn(&DVector<f64>) -> f64 + Send + Sync + 'static,
    {
        self.objective = Some(Arc::new(f));
        self
    }

    pub fn with_objective_grad<F>(mut self, f: F) -> Self
    where
        F: Fn(&DVector<f64>) -> DVector<f64> + Send + Sync + 'static,
    {
        self.objective_grad = Some(Arc::new(f));
        self
    }

    pub fn with_objective_hessian<F>(mut self, f: F) -> Self
    where
        F: Fn(&DVector<f64>, &DVector<f64>) -> Hessian + Send + Sync + 'static,
    {
        self.objective_hessian = Some(Arc::new(f));
        self
    }

    pub fn with_constraint<F>(mut self, f: F) -> Self
    where
        F: Fn(&DVector<f64>) -> DVector<f64> + Send + Sync + 'static,
    {
        self.constraint = Some(Arc::new(f));
        self
    }

    pub fn with_constraint_grad<F>(mut self, f: F) -> Self
    where
        F: Fn(&DVector<f64>) -> DMatrix<f64> + Send + Sync + 'static,
    {
        self.constraint_grad = Some(Arc::new(f));
        self
    }

    /// Sets the constraints to `h(x) = A*x - b` with constant Jacobian `A`.
    pub fn with_linear_constraint(self, a_mat: DMatrix<f64>, b: DVector<f64>) -> Self {
        let a_mat = Arc::new(a_mat);
        let jac = a_mat.clone();
        self.with_constraint(move |x| &*a_mat * x - &b)
            .with_constraint_grad(move |_| (*jac).clone())
    }
}

impl OptimumProblem for FnProblem {
    fn num_variables(&self) -> usize {
        self.n
    }

    fn num_constraints(&self) -> usize {
        self.m
    }

    fn objective(&self, x: &DVector<f64>) -> Result<f64> {
        let f = self
            .objective
            .as_ref()
            .ok_or(OptimumError::MissingCallback("objective"))?;
        Ok(f(x))
    }

    fn objective_grad(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let f = self
            .objective_grad
            .as_ref()
            .ok_or(OptimumError::MissingCallback("objective gradient"))?;
        Ok(f(x))
    }

    fn objective_hessian(&self, x: &DVector<f64>, g: &DVector<f64>) -> Result<Hessian> {
        let f = self
            .objective_hessian
            .as_ref()
            .ok_or(OptimumError::MissingCallback("objective Hessian"))?;
        Ok(f(x, g))
    }

    fn constraint(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        match self.constraint.as_ref() {
            Some(f) => Ok(f(x)),
            // an unconstrained problem needs no constraint callbacks
            None if self.m == 0 => Ok(DVector::zeros(0)),
            None => Err(OptimumError::MissingCallback("constraint").into()),
        }
    }

    fn constraint_grad(&self, x: &DVector<f64>) -> Result<DMatrix<f64>> {
        match self.constraint_grad.as_ref() {
            Some(f) => Ok(f(x)),
            None if self.m == 0 => Ok(DMatrix::zeros(0, self.n)),
            None => Err(OptimumError::MissingCallback("constraint gradient").into()),
        }
    }
}
