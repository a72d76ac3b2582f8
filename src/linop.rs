//! Linear operators and their composition.
//!
//! Every operator declares a domain and codomain dimension vector and
//! exposes three applications: `forward` (Ax), `adjoint` (Aᴴy) and `normal`
//! (AᴴAx). `forward` and `adjoint` must be exact Hermitian transposes of one
//! another, and `normal` must agree with `adjoint ∘ forward` to floating
//! point tolerance; it exists as a separate entry point only so that
//! combined operators can fuse the two passes.
//!
//! [`chain`] composes two operators into one, deriving the composite
//! forward, adjoint and normal automatically, so new encoding models never
//! hand-derive an adjoint.

use crate::array::ComplexArray;
use crate::dims::Dims;
use crate::error::{check_dims, Error};
use crate::vecview;
use crate::Complexf32;

pub trait LinOp {
    fn domain(&self) -> Dims;
    fn codomain(&self) -> Dims;

    /// Apply the operator: domain → codomain
    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error>;

    /// Apply the Hermitian transpose: codomain → domain
    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error>;

    /// Apply AᴴA: domain → domain. Override only to fuse passes.
    fn normal(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        let y = self.forward(x)?;
        self.adjoint(&y)
    }
}

// Operators compose by reference
impl<T: LinOp + ?Sized> LinOp for &T {
    fn domain(&self) -> Dims { (**self).domain() }
    fn codomain(&self) -> Dims { (**self).codomain() }
    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> { (**self).forward(x) }
    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> { (**self).adjoint(y) }
    fn normal(&self, x: &ComplexArray) -> Result<ComplexArray, Error> { (**self).normal(x) }
}

// --------------------------------------------------------------------------------
//                  Composition

/// The composite operator A₂ ∘ A₁, built by [`chain`]
pub struct Chain<A, B> {
    inner: A,
    outer: B,
}

/// Compose `inner` followed by `outer`.
///
/// Fails with `ShapeMismatch` unless the inner codomain equals the outer
/// domain. Composition is associative: chaining three operators pairwise
/// gives the same forward/adjoint behaviour regardless of association order.
pub fn chain<A: LinOp, B: LinOp>(inner: A, outer: B) -> Result<Chain<A, B>, Error> {
    check_dims("operator chain", &inner.codomain(), &outer.domain())?;
    Ok(Chain { inner, outer })
}

impl<A: LinOp, B: LinOp> LinOp for Chain<A, B> {
    fn domain(&self) -> Dims { self.inner.domain() }
    fn codomain(&self) -> Dims { self.outer.codomain() }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        self.outer.forward(&self.inner.forward(x)?)
    }

    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> {
        self.inner.adjoint(&self.outer.adjoint(y)?)
    }

    // A₁ᴴ (A₂ᴴA₂) A₁, so a fused outer normal is exploited
    fn normal(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        let mid = self.outer.normal(&self.inner.forward(x)?)?;
        self.inner.adjoint(&mid)
    }
}

// --------------------------------------------------------------------------------
//                  Leaf operators

pub struct Identity {
    dims: Dims,
}

impl Identity {
    pub fn new(dims: Dims) -> Self { Self { dims } }
}

impl LinOp for Identity {
    fn domain(&self) -> Dims { self.dims }
    fn codomain(&self) -> Dims { self.dims }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("identity forward", &self.dims, &x.dims())?;
        Ok(x.clone())
    }

    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("identity adjoint", &self.dims, &y.dims())?;
        Ok(y.clone())
    }
}

/// Pointwise scaling by a fixed complex weight per element
pub struct Diagonal {
    weights: ComplexArray,
}

impl Diagonal {
    pub fn new(weights: ComplexArray) -> Self { Self { weights } }
}

impl LinOp for Diagonal {
    fn domain(&self) -> Dims { self.weights.dims() }
    fn codomain(&self) -> Dims { self.weights.dims() }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("diagonal forward", &self.weights.dims(), &x.dims())?;
        let mut out = x.clone();
        ndarray::azip!((o in &mut out.data, &w in &self.weights.data) *o = *o * w);
        Ok(out)
    }

    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("diagonal adjoint", &self.weights.dims(), &y.dims())?;
        let mut out = y.clone();
        ndarray::azip!((o in &mut out.data, &w in &self.weights.data) *o = *o * w.conj());
        Ok(out)
    }
}

// --------------------------------------------------------------------------------
//                  l2 regularization

/// Wraps an operator so that `normal` computes AᴴAx + λx.
///
/// This is how the l2 penalty reaches the CG solver: no separate operator,
/// the λx term is added on every normal application. It is the one deliberate
/// departure from `normal == adjoint ∘ forward`; `forward` and `adjoint`
/// still delegate to the wrapped operator unchanged.
pub struct Regularized<M> {
    op: M,
    lambda: f32,
}

impl<M: LinOp> Regularized<M> {
    pub fn new(op: M, lambda: f32) -> Self { Self { op, lambda } }
}

impl<M: LinOp> LinOp for Regularized<M> {
    fn domain(&self) -> Dims { self.op.domain() }
    fn codomain(&self) -> Dims { self.op.codomain() }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> { self.op.forward(x) }
    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> { self.op.adjoint(y) }

    fn normal(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        let mut out = self.op.normal(x)?;
        if self.lambda != 0.0 {
            vecview::axpy(self.lambda, x, &mut out);
        }
        Ok(out)
    }
}
