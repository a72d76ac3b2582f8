//! Coil-sensitivity encoding and the SENSE forward model.
//!
//! `SensOp` turns one combined image (one value per voxel per sensitivity
//! map) into per-coil images by pointwise multiplication with the coil
//! sensitivity profiles, summing over the maps axis; its adjoint
//! conjugate-weights the coil images and sums over the coil axis. Pure
//! pointwise/reduction arithmetic — no state, no side effects.
//!
//! [`sense_model`] chains it with the Fourier-encoding operator into the
//! complete forward model A = F·S.

use crate::array::ComplexArray;
use crate::dims::{offset, select_dims, unravel, Dims, COIL_FLAG, MAPS_FLAG};
use crate::error::{check_dims, Error};
use crate::linop::{chain, Chain, LinOp};
use crate::nufft::{NufftConf, NufftOp};

pub struct SensOp {
    sens: ComplexArray,
    img_dims: Dims,
    cimg_dims: Dims,
}

impl SensOp {

    /// Sensitivity maps have shape `(X, Y, Z, coils, maps, ...)`; the domain
    /// (combined image) collapses the coil axis, the codomain (coil images)
    /// collapses the maps axis.
    pub fn new(sens: ComplexArray) -> Self {
        let img_dims  = select_dims(!COIL_FLAG, &sens.dims());
        let cimg_dims = select_dims(!MAPS_FLAG, &sens.dims());
        Self { sens, img_dims, cimg_dims }
    }
}

impl LinOp for SensOp {
    fn domain(&self) -> Dims { self.img_dims }
    fn codomain(&self) -> Dims { self.cimg_dims }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("sensitivity forward", &self.img_dims, &x.dims())?;
        let mut out = ComplexArray::zeros(self.cimg_dims);
        let sdims = self.sens.dims();
        let (img, out_data) = (x.as_slice(), out.as_slice_mut());
        // one multiply-accumulate per sensitivity element; collapsed axes
        // broadcast, the maps axis reduces into the coil image
        for (i, s) in self.sens.as_slice().iter().enumerate() {
            let coords = unravel(i, &sdims);
            out_data[offset(&coords, &self.cimg_dims)] += s * img[offset(&coords, &self.img_dims)];
        }
        Ok(out)
    }

    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("sensitivity adjoint", &self.cimg_dims, &y.dims())?;
        let mut out = ComplexArray::zeros(self.img_dims);
        let sdims = self.sens.dims();
        let (cimg, out_data) = (y.as_slice(), out.as_slice_mut());
        // conjugate weighting, coil axis reduces into the combined image
        for (i, s) in self.sens.as_slice().iter().enumerate() {
            let coords = unravel(i, &sdims);
            out_data[offset(&coords, &self.img_dims)] += s.conj() * cimg[offset(&coords, &self.cimg_dims)];
        }
        Ok(out)
    }
}

/// Build the non-Cartesian SENSE forward model A = F·S from the sensitivity
/// maps, the k-space sample dimensions and the trajectory.
///
/// All shape consistency (trajectory layout, coil counts) is checked here,
/// before anything is allocated for the solve. The resulting operator's
/// domain is the combined-image shape, its codomain the k-space sample
/// shape.
pub fn sense_model(
    sens: ComplexArray,
    ksp_dims: Dims,
    traj: &ComplexArray,
    conf: NufftConf,
) -> Result<Chain<SensOp, NufftOp>, Error> {
    // the coil-image dimensions are the sens dimensions minus the maps axis
    let cimg_dims = select_dims(!MAPS_FLAG, &sens.dims());
    let fft_op = NufftOp::new(conf, ksp_dims, cimg_dims, traj)?;
    let maps_op = SensOp::new(sens);
    chain(maps_op, fft_op)
}
