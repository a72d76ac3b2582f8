//! Failure modes of the reconstruction core.
//!
//! Shape and configuration problems are detected eagerly, at operator/solver
//! construction, and are fatal. A numerical breakdown inside the CG loop is
//! reported through `cg::StopReason` instead, so that the partial estimate
//! survives; `CgSolution::converged_image` converts it into the
//! `NumericalBreakdown` variant for callers that insist on a clean solve.

use crate::dims::Dims;

#[derive(thiserror::Error, Debug)]
pub enum Error {

    /// Two dimension vectors that were required to match, didn't.
    #[error("shape mismatch in {context}: {left:?} vs {right:?}")]
    ShapeMismatch {
        context: &'static str,
        left: Dims,
        right: Dims,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// `p·Mp` became zero or non-finite during a CG step.
    #[error("numerical breakdown in CG at iteration {iteration}")]
    NumericalBreakdown { iteration: usize },

    #[error("malformed header: {0}")]
    BadHeader(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shorthand used by the operator implementations to enforce their
/// domain/codomain contracts.
pub fn check_dims(context: &'static str, expected: &Dims, got: &Dims) -> Result<(), Error> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { context, left: *expected, right: *got })
    }
}
