//! Fixed-arity dimension vectors describing every array in the
//! reconstruction.
//!
//! All arrays carry `DIMS` logical axes. By convention the axes are
//! `[X, Y, Z, C, M, ...]`: axes 0-2 are the spatial matrix, axis 3 counts
//! coils, axis 4 counts sensitivity maps, and the remaining axes are free for
//! phases, echoes, etc. Unused axes have extent 1, which also makes them
//! broadcastable (see [`offset`]).

pub const DIMS: usize = 16;

pub type Dims = [usize; DIMS];

pub const COIL_DIM: usize = 3;
pub const MAPS_DIM: usize = 4;

/// Bitmask selecting the three spatial axes
pub const FFT_FLAGS: u32 = 0b111;
pub const COIL_FLAG: u32 = 1 << COIL_DIM;
pub const MAPS_FLAG: u32 = 1 << MAPS_DIM;

/// Keep the extents of the axes selected by `flags`, collapse all others to 1.
///
/// E.g. the image dimensions are the sensitivity-map dimensions with the coil
/// axis deselected: `select_dims(!COIL_FLAG, &sens_dims)`.
pub fn select_dims(flags: u32, dims: &Dims) -> Dims {
    let mut out = [1; DIMS];
    for d in 0..DIMS {
        if flags & (1 << d) != 0 {
            out[d] = dims[d];
        }
    }
    out
}

/// Total number of elements in an array with these dimensions
pub fn total(dims: &Dims) -> usize {
    dims.iter().product()
}

/// Column-major strides: axis 0 varies fastest, matching the on-disk `.cfl`
/// layout.
pub fn strides(dims: &Dims) -> Dims {
    let mut s = [1; DIMS];
    for d in 1..DIMS {
        s[d] = s[d - 1] * dims[d - 1];
    }
    s
}

/// Per-axis coordinates of the element with flat index `i`
pub fn unravel(mut i: usize, dims: &Dims) -> Dims {
    let mut coords = [0; DIMS];
    for d in 0..DIMS {
        coords[d] = i % dims[d];
        i /= dims[d];
    }
    coords
}

/// Flat index of `coords` in an array with dimensions `dims`, broadcasting
/// over axes of extent 1: such an axis contributes nothing to the offset, no
/// matter the coordinate. This lets one coordinate vector address arrays
/// whose shapes differ only in collapsed axes.
pub fn offset(coords: &Dims, dims: &Dims) -> usize {
    let strides = strides(dims);
    let mut i = 0;
    for d in 0..DIMS {
        if dims[d] != 1 {
            i += coords[d] * strides[d];
        }
    }
    i
}

/// `[a, b, c, ...]` padded with trailing 1s up to `DIMS` axes
pub fn dims_from<const N: usize>(extents: [usize; N]) -> Dims {
    let mut dims = [1; DIMS];
    dims[..N].copy_from_slice(&extents);
    dims
}
