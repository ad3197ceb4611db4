use crate::common::{KktMethod, KktOptions};
use crate::error::OptimumError;
use crate::problem::Hessian;
use crate::state::OptimumState;
use nalgebra::linalg::{FullPivLU, LU};
use nalgebra::{DMatrix, DVector, Dyn};
use std::time::{Duration, Instant};

/// Timings of the last `decompose` and `solve` calls.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KktInfo {
    pub time_decompose: Duration,
    pub time_solve: Duration,
}

/// How the inverse of the Hessian block `D = H + inv(X)*Z` is applied.
#[derive(Clone, Debug)]
enum BlockInverse {
    Diagonal(DVector<f64>),
    Lu(LU<f64, Dyn, Dyn>),
    Explicit(DMatrix<f64>),
}

impl BlockInverse {
    fn apply(&self, v: &DVector<f64>) -> Result<DVector<f64>, OptimumError> {
        match self {
            BlockInverse::Diagonal(dinv) => Ok(dinv.component_mul(v)),
            BlockInverse::Lu(lu) => lu
                .solve(v)
                .ok_or_else(|| OptimumError::singular("Hessian block solve failed")),
            BlockInverse::Explicit(dinv) => Ok(dinv * v),
        }
    }

    fn apply_mat(&self, v: &DMatrix<f64>) -> Result<DMatrix<f64>, OptimumError> {
        match self {
            BlockInverse::Diagonal(dinv) => {
                let mut w = v.clone();
                for j in 0..w.ncols() {
                    for i in 0..w.nrows() {
                        w[(i, j)] *= dinv[i];
                    }
                }
                Ok(w)
            }
            BlockInverse::Lu(lu) => lu
                .solve(v)
                .ok_or_else(|| OptimumError::singular("Hessian block solve failed")),
            BlockInverse::Explicit(dinv) => Ok(dinv * v),
        }
    }
}

#[derive(Clone, Debug)]
enum Decomposition {
    /// Factorization of the whole `(n+m) x (n+m)` matrix.
    Full(LU<f64, Dyn, Dyn>),
    FullPiv(FullPivLU<f64, Dyn, Dyn>),
    /// Schur complement `S = A * inv(D) * A'`.
    Rangespace {
        dinv: BlockInverse,
        a_mat: DMatrix<f64>,
        /// `inv(D) * A'`
        w: DMatrix<f64>,
        schur: Option<LU<f64, Dyn, Dyn>>,
    },
}

/// Solver of the KKT equations of the interior-point Newton step:
///
/// ```txt
///       [ H + inv(X)*Z   -A' ] [ dx ]   [ a ]
///       [ A               0  ] [ dy ] = [ b ]
/// ```
///
/// `decompose` factorizes the matrix for the current iterate and may be
/// followed by any number of `solve` calls for different right-hand sides.
#[derive(Clone, Debug, Default)]
pub struct KktSolver {
    options: KktOptions,
    decomposition: Option<Decomposition>,
    n: usize,
    m: usize,
    info: KktInfo,
}

impl KktSolver {
    pub fn new(options: KktOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn set_options(&mut self, options: KktOptions) {
        self.options = options;
    }

    pub fn info(&self) -> KktInfo {
        self.info
    }

    /// Factorizes the KKT matrix built from the Hessian, Jacobian, `x` and `z`
    /// of `state`.
    pub fn decompose(&mut self, state: &OptimumState) -> Result<(), OptimumError> {
        let begin = Instant::now();
        self.decomposition = None;

        let (x, z, a_mat) = (&state.x, &state.z, &state.a_mat);
        let n = x.len();
        let m = a_mat.nrows();
        if z.len() != n {
            return Err(OptimumError::vector_len("KKT bound multipliers", n, z.len()));
        }
        if a_mat.ncols() != n {
            return Err(OptimumError::matrix_shape(
                "KKT constraint Jacobian",
                (m, n),
                a_mat.shape(),
            ));
        }
        if !state.hessian.is_square() || state.hessian.dim() != n {
            return Err(OptimumError::vector_len("KKT Hessian", n, state.hessian.dim()));
        }

        // inv(X)*Z
        let e = z.component_div(x);

        let decomposition = match &state.hessian {
            Hessian::Dense(h) => {
                let d = h + DMatrix::from_diagonal(&e);
                match self.options.method {
                    KktMethod::PartialPivLu => {
                        let lu = assemble(&d, a_mat).lu();
                        if !lu.is_invertible() {
                            return Err(OptimumError::singular("partial pivot LU"));
                        }
                        Decomposition::Full(lu)
                    }
                    KktMethod::FullPivLu => {
                        let lu = assemble(&d, a_mat).full_piv_lu();
                        if !lu.is_invertible() {
                            return Err(OptimumError::singular("full pivot LU"));
                        }
                        Decomposition::FullPiv(lu)
                    }
                    KktMethod::Rangespace => {
                        let lu = d.lu();
                        if !lu.is_invertible() {
                            return Err(OptimumError::singular("Hessian block"));
                        }
                        rangespace(BlockInverse::Lu(lu), a_mat)?
                    }
                }
            }
            Hessian::Diagonal(hd) => {
                let mut dinv = hd + &e;
                for di in dinv.iter_mut() {
                    if *di == 0.0 || !di.is_finite() {
                        return Err(OptimumError::singular("diagonal Hessian block"));
                    }
                    *di = di.recip();
                }
                rangespace(BlockInverse::Diagonal(dinv), a_mat)?
            }
            Hessian::Inverse(hinv) => {
                // inv(H + E) = inv(I + inv(H)*E) * inv(H)
                let mut m_mat = hinv.clone();
                for j in 0..n {
                    for i in 0..n {
                        m_mat[(i, j)] *= e[j];
                    }
                    m_mat[(j, j)] += 1.0;
                }
                let dinv = m_mat
                    .lu()
                    .solve(hinv)
                    .ok_or_else(|| OptimumError::singular("inverse Hessian update"))?;
                rangespace(BlockInverse::Explicit(dinv), a_mat)?
            }
        };

        self.decomposition = Some(decomposition);
        self.n = n;
        self.m = m;
        self.info.time_decompose = begin.elapsed();
        Ok(())
    }

    /// Solves for `dx` and `dy` with the last decomposition.
    pub fn solve(
        &mut self,
        a: &DVector<f64>,
        b: &DVector<f64>,
        dx: &mut DVector<f64>,
        dy: &mut DVector<f64>,
    ) -> Result<(), OptimumError> {
        let begin = Instant::now();
        let (n, m) = (self.n, self.m);
        let decomposition = self
            .decomposition
            .as_ref()
            .ok_or(OptimumError::KktNotDecomposed)?;
        if a.len() != n {
            return Err(OptimumError::vector_len("KKT right-hand side a", n, a.len()));
        }
        if b.len() != m {
            return Err(OptimumError::vector_len("KKT right-hand side b", m, b.len()));
        }

        match decomposition {
            Decomposition::Full(lu) => {
                let sol = lu
                    .solve(&stack(a, b))
                    .ok_or_else(|| OptimumError::singular("partial pivot LU solve"))?;
                *dx = sol.rows(0, n).into_owned();
                *dy = sol.rows(n, m).into_owned();
            }
            Decomposition::FullPiv(lu) => {
                let sol = lu
                    .solve(&stack(a, b))
                    .ok_or_else(|| OptimumError::singular("full pivot LU solve"))?;
                *dx = sol.rows(0, n).into_owned();
                *dy = sol.rows(n, m).into_owned();
            }
            Decomposition::Rangespace {
                dinv,
                a_mat,
                w,
                schur,
            } => {
                // dx = inv(D)*(a + A'*dy) and A*dx = b
                let t = dinv.apply(a)?;
                match schur {
                    Some(schur) => {
                        let rhs = b - a_mat * &t;
                        *dy = schur
                            .solve(&rhs)
                            .ok_or_else(|| OptimumError::singular("Schur complement solve"))?;
                        *dx = t + w * &*dy;
                    }
                    None => {
                        *dy = DVector::zeros(0);
                        *dx = t;
                    }
                }
            }
        }

        if !dx.iter().chain(dy.iter()).all(|v| v.is_finite()) {
            return Err(OptimumError::singular("non-finite Newton step"));
        }
        self.info.time_solve = begin.elapsed();
        Ok(())
    }
}

fn assemble(d: &DMatrix<f64>, a_mat: &DMatrix<f64>) -> DMatrix<f64> {
    let n = d.nrows();
    let m = a_mat.nrows();
    let mut kkt = DMatrix::zeros(n + m, n + m);
    kkt.view_mut((0, 0), (n, n)).copy_from(d);
    kkt.view_mut((0, n), (n, m)).copy_from(&(-a_mat.transpose()));
    kkt.view_mut((n, 0), (m, n)).copy_from(a_mat);
    kkt
}

fn stack(a: &DVector<f64>, b: &DVector<f64>) -> DVector<f64> {
    let mut rhs = DVector::zeros(a.len() + b.len());
    rhs.rows_mut(0, a.len()).copy_from(a);
    rhs.rows_mut(a.len(), b.len()).copy_from(b);
    rhs
}

fn rangespace(dinv: BlockInverse, a_mat: &DMatrix<f64>) -> Result<Decomposition, OptimumError> {
    let w = dinv.apply_mat(&a_mat.transpose())?;
    let schur = if a_mat.nrows() > 0 {
        let lu = (a_mat * &w).lu();
        if !lu.is_invertible() {
            return Err(OptimumError::singular("Schur complement"));
        }
        Some(lu)
    } else {
        None
    };
    Ok(Decomposition::Rangespace {
        dinv,
        a_mat: a_mat.clone(),
        w,
        schur,
    })
}
