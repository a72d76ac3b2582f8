//! Real-vector arithmetic over complex storage.
//!
//! The CG solver runs the textbook real algorithm on a vector of twice the
//! length: each complex element contributes its real and imaginary part as
//! two independent real scalars. A complex-linear operator is automatically
//! real-linear on that doubled representation, and for a Hermitian
//! positive semi-definite system the real part of the complex inner product
//! is all the algorithm ever needs, so these two primitives — the doubled
//! real scalar product and axpy — are the whole interface between the solver
//! and the data representation.

use ndarray::azip;

use crate::array::ComplexArray;

/// Real scalar product of the doubled-real views: Σ (aᵣbᵣ + aᵢbᵢ).
///
/// Equals Re⟨a, b⟩ of the complex inner product.
pub fn dot_re(a: &ComplexArray, b: &ComplexArray) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    ndarray::Zip::from(&a.data)
        .and(&b.data)
        .fold(0.0, |acc, x, y| acc + x.re * y.re + x.im * y.im)
}

/// Euclidean norm of the doubled-real view
pub fn norm(a: &ComplexArray) -> f32 {
    dot_re(a, a).sqrt()
}

/// y ← y + αx, with a real step size α
pub fn axpy(alpha: f32, x: &ComplexArray, y: &mut ComplexArray) {
    debug_assert_eq!(x.len(), y.len());
    azip!((y in &mut y.data, &x in &x.data) *y += x * alpha);
}

/// y ← x + βy, the CG search-direction update
pub fn xpby(x: &ComplexArray, beta: f32, y: &mut ComplexArray) {
    debug_assert_eq!(x.len(), y.len());
    azip!((y in &mut y.data, &x in &x.data) *y = x + *y * beta);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dims::dims_from;
    use crate::Complexf32;
    use float_eq::assert_float_eq;

    fn array(values: &[(f32, f32)]) -> ComplexArray {
        let data = values.iter().map(|&(re, im)| Complexf32::new(re, im)).collect();
        ComplexArray::from_vec(dims_from([values.len()]), data).unwrap()
    }

    #[test]
    fn dot_matches_interleaved_real_dot() {
        let a = array(&[(1.0, 2.0), (-0.5, 0.25), (3.0, -1.0)]);
        let b = array(&[(0.5, -1.0), (2.0, 2.0), (1.0, 4.0)]);

        // flatten to [re, im, re, im, ...] and take the plain real dot product
        let flat = |v: &ComplexArray| -> Vec<f32> {
            v.as_slice().iter().flat_map(|z| [z.re, z.im]).collect()
        };
        let expected: f32 = flat(&a).iter().zip(flat(&b)).map(|(x, y)| x * y).sum();

        assert_float_eq!(dot_re(&a, &b), expected, ulps <= 4);
    }

    #[test]
    fn axpy_updates_both_parts() {
        let x = array(&[(1.0, -2.0), (0.0, 4.0)]);
        let mut y = array(&[(10.0, 10.0), (1.0, -1.0)]);
        axpy(0.5, &x, &mut y);
        assert_float_eq!(y.as_slice()[0].re, 10.5, abs <= 1e-6);
        assert_float_eq!(y.as_slice()[0].im,  9.0, abs <= 1e-6);
        assert_float_eq!(y.as_slice()[1].re,  1.0, abs <= 1e-6);
        assert_float_eq!(y.as_slice()[1].im,  1.0, abs <= 1e-6);
    }

    #[test]
    fn xpby_is_the_search_direction_update() {
        let r = array(&[(1.0, 1.0), (2.0, -2.0)]);
        let mut p = array(&[(4.0, 0.0), (0.0, 4.0)]);
        xpby(&r, 0.25, &mut p);
        assert_float_eq!(p.as_slice()[0].re, 2.0, abs <= 1e-6);
        assert_float_eq!(p.as_slice()[0].im, 1.0, abs <= 1e-6);
        assert_float_eq!(p.as_slice()[1].re, 2.0, abs <= 1e-6);
        assert_float_eq!(p.as_slice()[1].im, -1.0, abs <= 1e-6);
    }
}
