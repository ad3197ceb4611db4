use crate::error::OptimumError;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Parameters of the interior-point Newton method.
#[derive(Clone, Debug, PartialEq)]
pub struct IpnewtonOptions {
    /// Barrier parameter, the target of every complementarity product `x_i * z_i`.
    pub mu: f64,
    /// Initial `x` is clamped to at least `mux * mu`.
    pub mux: f64,
    /// Fraction-to-the-boundary factor in (0, 1).
    pub tau: f64,
    /// Set to apply one step length to `x`, `y` and `z`. Otherwise `y`
    /// takes the full Newton step and `z` its own boundary step length.
    pub uniform_newton_step: bool,
}

impl Default for IpnewtonOptions {
    fn default() -> Self {
        Self {
            mu: 1e-20,
            mux: 1e-5,
            tau: 0.99,
            uniform_newton_step: false,
        }
    }
}

/// Factorization used for a dense Hessian.
///
/// Diagonal and inverse Hessians always use the range-space method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KktMethod {
    /// LU with partial pivoting of the full KKT matrix.
    #[default]
    PartialPivLu,
    /// LU with full pivoting of the full KKT matrix.
    FullPivLu,
    /// Schur complement `A * D⁻¹ * A'` of the Hessian block.
    Rangespace,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KktOptions {
    pub method: KktMethod,
}

/// Formatting of the progress table.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputOptions {
    /// Set to emit a progress row per iteration.
    pub active: bool,
    /// Column width in characters.
    pub width: usize,
    /// Digits after the decimal point.
    pub precision: usize,
    /// Scientific instead of fixed notation.
    pub scientific: bool,
    /// Column separator.
    pub separator: String,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            active: false,
            width: 15,
            precision: 6,
            scientific: true,
            separator: "|".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OptimumOptions {
    /// Termination tolerance on the maximum of the optimality, feasibility
    /// and centrality errors.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,

    pub ipnewton: IpnewtonOptions,
    pub kkt: KktOptions,
    pub output: OutputOptions,
}

impl Default for OptimumOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 200,
            ipnewton: IpnewtonOptions::default(),
            kkt: KktOptions::default(),
            output: OutputOptions::default(),
        }
    }
}

impl OptimumOptions {
    pub fn validate(&self) -> Result<(), OptimumError> {
        let invalid = |what: String| Err(OptimumError::InvalidOption { what });
        let ip = &self.ipnewton;
        if !(ip.tau > 0.0 && ip.tau < 1.0) {
            return invalid(format!("tau ({}) must be between 0 and 1", ip.tau));
        }
        if !(ip.mu > 0.0) {
            return invalid(format!("mu ({}) must be positive", ip.mu));
        }
        if !(ip.mux > 0.0) {
            return invalid(format!("mux ({}) must be positive", ip.mux));
        }
        if !(self.tolerance >= 0.0) {
            return invalid(format!("tolerance ({}) must be non-negative", self.tolerance));
        }
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Outcome of a solve.
///
/// Results of chained solves are merged with `+=`: counts and times add up
/// while `succeeded`, `error` and `convergence_rate` come from the later solve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptimumResult {
    /// True if the tolerance was met before the iteration cap.
    pub succeeded: bool,
    pub iterations: usize,
    pub num_objective_evals: usize,
    pub num_constraint_evals: usize,
    /// Ratio of the last two total errors.
    pub convergence_rate: f64,
    /// Final total error.
    pub error: f64,

    /// Wall-clock time of the whole solve.
    pub time: Duration,
    pub time_objective_evals: Duration,
    pub time_constraint_evals: Duration,
    /// Time spent decomposing and solving KKT systems.
    pub time_linear_systems: Duration,
}

impl AddAssign<&OptimumResult> for OptimumResult {
    fn add_assign(&mut self, other: &OptimumResult) {
        self.succeeded = other.succeeded;
        self.iterations += other.iterations;
        self.num_objective_evals += other.num_objective_evals;
        self.num_constraint_evals += other.num_constraint_evals;
        self.convergence_rate = other.convergence_rate;
        self.error = other.error;
        self.time += other.time;
        self.time_objective_evals += other.time_objective_evals;
        self.time_constraint_evals += other.time_constraint_evals;
        self.time_linear_systems += other.time_linear_systems;
    }
}

impl AddAssign for OptimumResult {
    fn add_assign(&mut self, other: OptimumResult) {
        *self += &other;
    }
}

impl Add for OptimumResult {
    type Output = OptimumResult;

    fn add(mut self, other: OptimumResult) -> OptimumResult {
        self += &other;
        self
    }
}
