pub use crate::dims::{Dims, DIMS, COIL_DIM, MAPS_DIM, FFT_FLAGS, COIL_FLAG, MAPS_FLAG, select_dims};
pub use crate::array::ComplexArray;
pub use crate::error::Error;
pub use crate::linop::LinOp;

pub type Complexf32 = num_complex::Complex<f32>;
