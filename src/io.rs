//! Reading and writing reconstruction arrays.
//!
//! The core itself performs no file-format logic; everything on-disk goes
//! through this module.

pub mod cfl;
