//! Dense, shape-tagged complex arrays.

use ndarray::Array1;

use crate::dims::{total, Dims};
use crate::error::Error;
use crate::Complexf32;

/// A dense buffer of complex samples together with its logical dimensions.
///
/// The element count always equals the product of the dimension extents, and
/// elements are stored column-major (axis 0 fastest). Every operator
/// application allocates a fresh `ComplexArray` for its result; input buffers
/// are never aliased as output.
#[derive(Clone, Debug)]
pub struct ComplexArray {
    dims: Dims,
    pub data: Array1<Complexf32>,
}

impl ComplexArray {

    pub fn zeros(dims: Dims) -> Self {
        let data = Array1::from_elem(total(&dims), Complexf32::new(0.0, 0.0));
        Self { dims, data }
    }

    pub fn from_vec(dims: Dims, data: Vec<Complexf32>) -> Result<Self, Error> {
        if data.len() != total(&dims) {
            let mut flat = [1; crate::dims::DIMS];
            flat[0] = data.len();
            return Err(Error::ShapeMismatch { context: "array construction", left: dims, right: flat });
        }
        Ok(Self { dims, data: Array1::from_vec(data) })
    }

    pub fn dims(&self) -> Dims { self.dims }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    pub fn as_slice(&self) -> &[Complexf32] {
        // Array1 built from a Vec is always contiguous
        self.data.as_slice().expect("contiguous storage")
    }

    pub fn as_slice_mut(&mut self) -> &mut [Complexf32] {
        self.data.as_slice_mut().expect("contiguous storage")
    }
}
