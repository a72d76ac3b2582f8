//! Conjugate-Gradient solution of the regularized normal equations
//! (AᴴA + λI)x = b.
//!
//! The solver only ever applies the `normal` operation of the supplied
//! operator — never `forward` or `adjoint` individually — plus the
//! doubled-real scalar products and axpy updates of [`crate::vecview`].
//! Each iteration strictly depends on the previous residual and search
//! direction, so the loop is sequential; parallelism lives inside the
//! operator applications.
//!
//! [`CgSolver`] is an iterator which performs one CG iteration per `next()`
//! call, so callers can watch the residual shrink; [`conjgrad`] drives it to
//! completion.

use crate::array::ComplexArray;
use crate::error::{check_dims, Error};
use crate::linop::{LinOp, Regularized};
use crate::vecview::{axpy, dot_re, norm, xpby};

#[derive(Clone, Copy, Debug)]
pub struct CgConf {
    /// Maximum number of iterations; must be positive
    pub max_iter: usize,
    /// l2 regularization weight λ; must be non-negative
    pub l2lambda: f32,
    /// Relative residual at which to stop early; 0 runs the full budget
    pub tolerance: f32,
}

impl Default for CgConf {
    fn default() -> Self {
        Self { max_iter: 30, l2lambda: 0.0, tolerance: 0.0 }
    }
}

/// Why the solve stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Residual reached the configured tolerance (or vanished exactly)
    Converged,
    /// The iteration budget was exhausted
    IterationLimit,
    /// `p·Mp` became zero or non-finite; the estimate at that point is the
    /// best available
    Breakdown { iteration: usize },
}

/// Progress report for one completed CG iteration
#[derive(Clone, Copy, Debug)]
pub struct CgStep {
    pub iteration: usize,
    /// Residual norm relative to ‖b‖
    pub residual: f32,
}

pub struct CgSolution {
    pub image: ComplexArray,
    pub iterations: usize,
    pub residual: f32,
    pub stop: StopReason,
}

impl CgSolution {
    /// The reconstructed image, or `NumericalBreakdown` if the solve was cut
    /// short — for callers that cannot use a best-effort estimate.
    pub fn converged_image(self) -> Result<ComplexArray, Error> {
        match self.stop {
            StopReason::Breakdown { iteration } => Err(Error::NumericalBreakdown { iteration }),
            _ => Ok(self.image),
        }
    }
}

pub struct CgSolver<M: LinOp> {
    op: Regularized<M>,
    x: ComplexArray,
    r: ComplexArray,
    p: ComplexArray,
    rsold: f32,
    bnorm: f32,
    iteration: usize,
    residual: f32,
    max_iter: usize,
    tolerance: f32,
    stop: Option<StopReason>,
}

impl<M: LinOp> CgSolver<M> {

    /// Set up a solve of (AᴴA + λI)x = b.
    ///
    /// `x0` is the starting estimate; `None` seeds the solve with `b`
    /// itself, i.e. the adjoint reconstruction, which is the reference
    /// behaviour. Configuration and shapes are validated here; nothing can
    /// fail later except numerically.
    pub fn new(conf: &CgConf, op: M, b: &ComplexArray, x0: Option<&ComplexArray>) -> Result<Self, Error> {
        if conf.max_iter == 0 {
            return Err(Error::InvalidConfiguration("max_iter must be positive".into()));
        }
        if conf.l2lambda < 0.0 {
            return Err(Error::InvalidConfiguration(format!("negative l2 weight {}", conf.l2lambda)));
        }
        if conf.tolerance < 0.0 {
            return Err(Error::InvalidConfiguration(format!("negative tolerance {}", conf.tolerance)));
        }
        check_dims("cg right-hand side", &op.domain(), &b.dims())?;
        if let Some(x0) = x0 {
            check_dims("cg initial estimate", &op.domain(), &x0.dims())?;
        }

        let op = Regularized::new(op, conf.l2lambda);
        let x = x0.unwrap_or(b).clone();

        // r = b - M x0
        let mut r = b.clone();
        axpy(-1.0, &op.normal(&x)?, &mut r);
        let p = r.clone();
        let rsold = dot_re(&r, &r);
        let bnorm = norm(b);

        let stop = if rsold == 0.0 { Some(StopReason::Converged) } else { None };

        Ok(Self {
            op, x, r, p, rsold, bnorm,
            iteration: 0,
            residual: if bnorm > 0.0 { rsold.sqrt() / bnorm } else { rsold.sqrt() },
            max_iter: conf.max_iter,
            tolerance: conf.tolerance,
            stop,
        })
    }

    pub fn into_solution(self) -> CgSolution {
        CgSolution {
            image: self.x,
            iterations: self.iteration,
            residual: self.residual,
            stop: self.stop.unwrap_or(StopReason::IterationLimit),
        }
    }
}

impl<M: LinOp> Iterator for CgSolver<M> {
    type Item = Result<CgStep, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() || self.iteration >= self.max_iter {
            return None;
        }

        let q = match self.op.normal(&self.p) {
            Ok(q) => q,
            Err(e) => return Some(Err(e)),
        };

        let pq = dot_re(&self.p, &q);
        if !pq.is_finite() || pq <= 0.0 {
            // the step size is undefined; keep the current estimate
            self.stop = Some(StopReason::Breakdown { iteration: self.iteration });
            return None;
        }

        let alpha = self.rsold / pq;
        axpy( alpha, &self.p, &mut self.x);
        axpy(-alpha, &q,      &mut self.r);

        let rsnew = dot_re(&self.r, &self.r);
        self.iteration += 1;
        self.residual = if self.bnorm > 0.0 { rsnew.sqrt() / self.bnorm } else { rsnew.sqrt() };

        if rsnew == 0.0 || (self.tolerance > 0.0 && self.residual <= self.tolerance) {
            self.stop = Some(StopReason::Converged);
        } else {
            let beta = rsnew / self.rsold;
            xpby(&self.r, beta, &mut self.p);
        }
        self.rsold = rsnew;

        Some(Ok(CgStep { iteration: self.iteration, residual: self.residual }))
    }
}

/// Run CG to completion and return the final estimate.
pub fn conjgrad<M: LinOp>(
    conf: &CgConf,
    op: M,
    b: &ComplexArray,
    x0: Option<&ComplexArray>,
) -> Result<CgSolution, Error> {
    let mut solver = CgSolver::new(conf, op, b, x0)?;
    for step in &mut solver {
        step?;
    }
    Ok(solver.into_solution())
}
