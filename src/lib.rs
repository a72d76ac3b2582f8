mod exports;
pub use exports::*;

pub mod dims;
pub mod array;
pub mod error;
pub mod linop;
pub mod vecview;
pub mod nufft;
pub mod sense;
pub mod cg;
pub mod io;
pub mod config;
