//! Interior-point Newton solver for nonlinear programs with equality
//! constraints and non-negative variables, the form every chemical
//! equilibrium (Gibbs energy minimization) problem reduces to.

mod common;
mod error;
mod ipnewton;
mod kkt;
mod math;
mod output;
mod problem;
mod state;
#[cfg(test)]
mod tests;

pub use common::*;
pub use error::OptimumError;
pub use ipnewton::OptimumSolverIpnewton;
pub use kkt::{KktInfo, KktSolver};
pub use math::{all_positive, fraction_to_the_boundary, norm_inf};
pub use output::{format_header, format_row, LogMonitor, ProgressMonitor};
pub use problem::{FnProblem, Hessian, OptimumProblem};
pub use state::OptimumState;
