use crate::common::{OptimumOptions, OptimumResult};
use crate::error::OptimumError;
use crate::kkt::KktSolver;
use crate::math::{clamp_below, fraction_to_the_boundary, norm_inf};
use crate::output::{LogMonitor, Outputter, ProgressMonitor};
use crate::problem::OptimumProblem;
use crate::state::OptimumState;
use anyhow::Result;
use nalgebra::DVector;
use std::sync::Arc;
use std::time::Instant;

/// Primal-dual interior-point Newton method for NLP (nonlinear programming).
/// Minimize a function f(x) subject to nonlinear equality constraints and
/// non-negative variables:
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
/// The bounds are handled by a logarithmic barrier with a fixed parameter
/// `mu`, so every iteration solves the perturbed optimality conditions
///
/// ```txt
///       g(x) - A'y - z = 0
///       h(x) = 0
///       x .* z = mu
/// ```
///
/// with `x` and `z` kept strictly positive by fraction-to-the-boundary
/// step lengths.
#[derive(Clone)]
pub struct OptimumSolverIpnewton {
    workspace: Workspace,
    kkt: KktSolver,
    outputter: Outputter,
    monitor: Arc<dyn ProgressMonitor>,
}

/// Newton directions and KKT right-hand sides, reused across solves.
#[derive(Clone, Debug)]
struct Workspace {
    dx: DVector<f64>,
    dy: DVector<f64>,
    dz: DVector<f64>,
    a: DVector<f64>,
    b: DVector<f64>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            dx: DVector::zeros(0),
            dy: DVector::zeros(0),
            dz: DVector::zeros(0),
            a: DVector::zeros(0),
            b: DVector::zeros(0),
        }
    }
}

impl Default for OptimumSolverIpnewton {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimumSolverIpnewton {
    /// A solver that writes its progress table, when active, to the log.
    pub fn new() -> Self {
        Self {
            workspace: Workspace::default(),
            kkt: KktSolver::default(),
            outputter: Outputter::default(),
            monitor: Arc::new(LogMonitor),
        }
    }

    /// Replaces the sink of the progress table.
    pub fn with_monitor(mut self, monitor: Arc<dyn ProgressMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Solves `problem` from `state` with default options.
    pub fn solve<P>(&mut self, problem: &P, state: &mut OptimumState) -> Result<OptimumResult>
    where
        P: OptimumProblem + ?Sized,
    {
        self.solve_with(problem, state, &OptimumOptions::default())
    }

    /// Solves `problem` from `state`, which is updated in place with the
    /// last accepted iterate.
    ///
    /// Running out of iterations is not an error; it is reported by
    /// [`OptimumResult::succeeded`]. Errors are returned for invalid options,
    /// callback outputs of the wrong size and singular KKT systems.
    pub fn solve_with<P>(
        &mut self,
        problem: &P,
        state: &mut OptimumState,
        options: &OptimumOptions,
    ) -> Result<OptimumResult>
    where
        P: OptimumProblem + ?Sized,
    {
        let begin = Instant::now();
        options.validate()?;
        self.kkt.set_options(options.kkt.clone());

        let (n, m) = (problem.num_variables(), problem.num_constraints());
        log::debug!(
            "ipnewton: {} variables, {} constraints, tolerance {:e}, mu {:e}",
            n,
            m,
            options.tolerance,
            options.ipnewton.mu
        );

        let mut ip = Ipnewton {
            problem,
            state,
            options,
            n,
            m,
            ws: &mut self.workspace,
            kkt: &mut self.kkt,
            outputter: &mut self.outputter,
            monitor: &*self.monitor,
            result: OptimumResult::default(),
            alpha: 0.0,
            alphax: 0.0,
            alphaz: 0.0,
            errorf: 0.0,
            errorh: 0.0,
            errorc: 0.0,
            error: 0.0,
        };

        ip.initialize();
        ip.evaluate_state()?;
        ip.update_errors();
        ip.output_header();

        loop {
            ip.result.iterations += 1;
            ip.compute_step()?;
            ip.apply_step();
            ip.evaluate_state()?;
            ip.update_errors();
            ip.report_progress();

            // a NaN error never counts as converged
            let converged = ip.error <= options.tolerance;
            if converged || ip.result.iterations >= options.max_iterations {
                break;
            }
        }

        ip.output_footer();

        let mut result = ip.result;
        result.succeeded = result.iterations < options.max_iterations;
        result.time = begin.elapsed();

        if result.succeeded {
            log::debug!(
                "ipnewton: converged in {} iterations, error {:e}",
                result.iterations,
                result.error
            );
        } else {
            log::warn!(
                "ipnewton: did not converge in {} iterations, error {:e}",
                result.iterations,
                result.error
            );
        }
        Ok(result)
    }
}

fn all_finite(a: &[f64]) -> bool {
    a.iter().all(|v| v.is_finite())
}

/// Working state of a single solve.
struct Ipnewton<'a, P: ?Sized> {
    problem: &'a P,
    state: &'a mut OptimumState,
    options: &'a OptimumOptions,
    n: usize,
    m: usize,

    ws: &'a mut Workspace,
    kkt: &'a mut KktSolver,
    outputter: &'a mut Outputter,
    monitor: &'a dyn ProgressMonitor,

    result: OptimumResult,

    // step lengths restricting the iterates to the feasible domain
    alpha: f64,
    alphax: f64,
    alphaz: f64,

    // optimality, feasibility, centrality and total errors
    errorf: f64,
    errorh: f64,
    errorc: f64,
    error: f64,
}

impl<'a, P: OptimumProblem + ?Sized> Ipnewton<'a, P> {
    /// Sizes the iterate and moves it strictly inside the feasible domain.
    fn initialize(&mut self) {
        let (n, m) = (self.n, self.m);
        let mu = self.options.ipnewton.mu;
        let mux = self.options.ipnewton.mux;
        let st = &mut *self.state;

        if st.x.len() != n {
            st.x = DVector::zeros(n);
        }
        if st.y.len() != m {
            st.y = DVector::zeros(m);
        }
        if st.z.len() != n {
            st.z = DVector::zeros(n);
        }

        clamp_below(st.x.as_mut_slice(), mux * mu);

        // keep positive (warm-start) multipliers, complementary ones otherwise
        for (zi, &xi) in st.z.iter_mut().zip(st.x.iter()) {
            if !(*zi > 0.0) {
                *zi = mu / xi;
            }
        }
    }

    /// Evaluates the objective, constraints and their first derivatives at `x`,
    /// rejecting outputs of the wrong size or with non-finite values.
    fn evaluate_state(&mut self) -> Result<()> {
        let (n, m) = (self.n, self.m);
        let st = &mut *self.state;

        let begin = Instant::now();
        st.f = self.problem.objective(&st.x)?;
        st.g = self.problem.objective_grad(&st.x)?;
        self.result.time_objective_evals += begin.elapsed();
        self.result.num_objective_evals += 1;

        let begin = Instant::now();
        st.h = self.problem.constraint(&st.x)?;
        st.a_mat = self.problem.constraint_grad(&st.x)?;
        self.result.time_constraint_evals += begin.elapsed();
        self.result.num_constraint_evals += 1;

        if st.g.len() != n {
            return Err(OptimumError::vector_len("objective gradient", n, st.g.len()).into());
        }
        if st.h.len() != m {
            return Err(OptimumError::vector_len("constraint residual", m, st.h.len()).into());
        }
        if st.a_mat.shape() != (m, n) {
            return Err(
                OptimumError::matrix_shape("constraint Jacobian", (m, n), st.a_mat.shape()).into(),
            );
        }

        if !st.f.is_finite() {
            return Err(OptimumError::NonFinite("objective").into());
        }
        if !all_finite(st.g.as_slice()) {
            return Err(OptimumError::NonFinite("objective gradient").into());
        }
        if !all_finite(st.h.as_slice()) {
            return Err(OptimumError::NonFinite("constraint residual").into());
        }
        if !all_finite(st.a_mat.as_slice()) {
            return Err(OptimumError::NonFinite("constraint Jacobian").into());
        }
        Ok(())
    }

    /// Computes `dx`, `dy` and `dz` from the KKT equations at the current iterate.
    fn compute_step(&mut self) -> Result<()> {
        let n = self.n;
        let mu = self.options.ipnewton.mu;

        let begin = Instant::now();
        let hessian = self.problem.objective_hessian(&self.state.x, &self.state.g)?;
        self.result.time_objective_evals += begin.elapsed();
        if !hessian.is_square() || hessian.dim() != n {
            return Err(OptimumError::vector_len("objective Hessian", n, hessian.dim()).into());
        }
        self.state.hessian = hessian;

        self.kkt.decompose(&*self.state)?;

        let st = &*self.state;
        let ws = &mut *self.ws;

        // a = -(g - A'y - mu/x), b = -h
        ws.a = st.a_mat.tr_mul(&st.y) - &st.g;
        for (ai, &xi) in ws.a.iter_mut().zip(st.x.iter()) {
            *ai += mu / xi;
        }
        ws.b = -&st.h;

        self.kkt.solve(&ws.a, &ws.b, &mut ws.dx, &mut ws.dy)?;

        // dz = (mu - z.*dx)./x - z
        ws.dz = DVector::from_fn(n, |i, _| (mu - st.z[i] * ws.dx[i]) / st.x[i] - st.z[i]);

        let info = self.kkt.info();
        self.result.time_linear_systems += info.time_decompose + info.time_solve;
        Ok(())
    }

    /// Moves along the Newton directions without leaving the feasible domain.
    fn apply_step(&mut self) {
        let tau = self.options.ipnewton.tau;
        let st = &mut *self.state;
        let ws = &*self.ws;

        self.alphax = fraction_to_the_boundary(st.x.as_slice(), ws.dx.as_slice(), tau);
        self.alphaz = fraction_to_the_boundary(st.z.as_slice(), ws.dz.as_slice(), tau);
        self.alpha = f64::min(self.alphax, self.alphaz);

        if self.options.ipnewton.uniform_newton_step {
            st.x.axpy(self.alpha, &ws.dx, 1.0);
            st.y.axpy(self.alpha, &ws.dy, 1.0);
            st.z.axpy(self.alpha, &ws.dz, 1.0);
        } else {
            // y has no sign restriction and takes the full step
            st.x.axpy(self.alpha, &ws.dx, 1.0);
            st.y += &ws.dy;
            st.z.axpy(self.alphaz, &ws.dz, 1.0);
        }
    }

    fn update_errors(&mut self) {
        let mu = self.options.ipnewton.mu;
        let st = &*self.state;

        let optimality = &st.g - st.a_mat.tr_mul(&st.y) - &st.z;
        let centrality = st.x.component_mul(&st.z).add_scalar(-mu);

        self.errorf = norm_inf(optimality.as_slice());
        self.errorh = norm_inf(st.h.as_slice());
        self.errorc = norm_inf(centrality.as_slice());

        let previous = self.error;
        self.error = norm_inf(&[self.errorf, self.errorh, self.errorc]);

        if self.result.iterations > 0 && previous > 0.0 {
            self.result.convergence_rate = self.error / previous;
        }
        self.result.error = self.error;
    }

    fn output_header(&mut self) {
        if !self.options.output.active {
            return;
        }
        let out = &mut *self.outputter;
        out.clear();
        out.add_entry("iter");
        out.add_entries("x", self.n);
        out.add_entries("y", self.m);
        out.add_entries("z", self.n);
        out.add_entry("f(x)");
        out.add_entry("h(x)");
        out.add_entry("errorf");
        out.add_entry("errorh");
        out.add_entry("errorc");
        out.add_entry("error");
        out.add_entry("alpha");
        out.add_entry("alphax");
        out.add_entry("alphaz");
        out.output_header(self.monitor, &self.options.output);
    }

    fn report_progress(&mut self) {
        log::trace!(
            "ipnewton: iteration {}: error {:e} (f {:e}, h {:e}, c {:e}), alpha {:e}",
            self.result.iterations,
            self.error,
            self.errorf,
            self.errorh,
            self.errorc,
            self.alpha
        );
        if !self.options.output.active {
            return;
        }
        let st = &*self.state;
        let out = &mut *self.outputter;
        out.add_values(st.x.as_slice());
        out.add_values(st.y.as_slice());
        out.add_values(st.z.as_slice());
        out.add_value(st.f);
        out.add_value(norm_inf(st.h.as_slice()));
        out.add_value(self.errorf);
        out.add_value(self.errorh);
        out.add_value(self.errorc);
        out.add_value(self.error);
        out.add_value(self.alpha);
        out.add_value(self.alphax);
        out.add_value(self.alphaz);
        out.output_state(self.monitor, &self.options.output, self.result.iterations);
    }

    fn output_footer(&self) {
        if self.options.output.active {
            self.outputter.output_footer(self.monitor, &self.options.output);
        }
    }
}
