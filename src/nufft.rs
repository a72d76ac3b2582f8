//! Fourier encoding along an arbitrary (non-Cartesian) sampling trajectory.
//!
//! `NufftOp` maps a Cartesian-gridded coil image to frequency samples at the
//! trajectory positions and back. Evaluation is the direct sum over voxels —
//! exact, with no gridding or interpolation — which keeps the operator an
//! exact adjoint pair by construction. Trajectory k-coordinates are in units
//! of grid samples, and voxel positions are centred at `n − N/2`, following
//! the usual FFT-index convention, so a trajectory that happens to lie on
//! integer grid positions degenerates to the centred DFT.

use std::f32::consts::TAU;

use num_traits::Zero;

#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::array::ComplexArray;
use crate::dims::{dims_from, total, Dims, COIL_DIM, COIL_FLAG, FFT_FLAGS};
use crate::error::{check_dims, Error};
use crate::linop::LinOp;
use crate::Complexf32;

#[derive(Clone, Copy, Debug, Default)]
pub struct NufftConf {
    /// Evaluate the normal operator in one streaming pass per sample,
    /// without materializing the k-space intermediate
    pub lowmem: bool,
}

pub struct NufftOp {
    conf: NufftConf,
    ksp_dims: Dims,
    cimg_dims: Dims,
    /// k-space coordinates of each sample, in grid units
    samples: Vec<[f32; 3]>,
    /// centred, grid-normalized position of each voxel
    voxels: Vec<[f32; 3]>,
}

impl NufftOp {

    /// Build the encoding operator for `cimg_dims` coil images sampled at
    /// the `traj` positions.
    ///
    /// The trajectory must have shape `[3, s1, s2, 1, ...]`, its sample axes
    /// matching the k-space sample axes; imaginary parts of the trajectory
    /// are ignored. The k-space and coil-image coil counts must agree, and
    /// every coil-image axis beyond the spatial matrix and the coil axis
    /// must be collapsed.
    pub fn new(conf: NufftConf, ksp_dims: Dims, cimg_dims: Dims, traj: &ComplexArray) -> Result<Self, Error> {
        let traj_expected = dims_from([3, ksp_dims[1], ksp_dims[2]]);
        check_dims("trajectory dims", &traj_expected, &traj.dims())?;

        let mut ksp_expected = dims_from([1, ksp_dims[1], ksp_dims[2]]);
        ksp_expected[COIL_DIM] = cimg_dims[COIL_DIM];
        check_dims("k-space dims", &ksp_expected, &ksp_dims)?;

        // the per-coil slicing below relies on every axis beyond the spatial
        // matrix and the coil axis being collapsed
        let cimg_expected = crate::dims::select_dims(FFT_FLAGS | COIL_FLAG, &cimg_dims);
        check_dims("coil-image dims", &cimg_expected, &cimg_dims)?;

        let nsamples = ksp_dims[1] * ksp_dims[2];
        let samples = (0..nsamples)
            .map(|s| {
                let t = &traj.as_slice()[3 * s..3 * s + 3];
                [t[0].re, t[1].re, t[2].re]
            })
            .collect();

        let spatial = crate::dims::select_dims(FFT_FLAGS, &cimg_dims);
        let centred = |n: usize, len: usize| (n as isize - (len / 2) as isize) as f32 / len as f32;
        let voxels = (0..total(&spatial))
            .map(|v| {
                let n = crate::dims::unravel(v, &spatial);
                [centred(n[0], spatial[0]), centred(n[1], spatial[1]), centred(n[2], spatial[2])]
            })
            .collect();

        Ok(Self { conf, ksp_dims, cimg_dims, samples, voxels })
    }

    fn nvoxels(&self) -> usize { self.voxels.len() }
    fn nsamples(&self) -> usize { self.samples.len() }
    fn ncoils(&self) -> usize { self.cimg_dims[COIL_DIM] }
}

#[inline]
fn phase(k: &[f32; 3], r: &[f32; 3]) -> f32 {
    -TAU * (k[0] * r[0] + k[1] * r[1] + k[2] * r[2])
}

/// Contribution of a single k-space sample to the normal operator: project
/// the image onto the sample's encoding vector, then spread the projection
/// back with conjugate phases.
fn accumulate_sample(k: &[f32; 3], img: &[Complexf32], voxels: &[[f32; 3]], acc: &mut [Complexf32]) {
    let mut sample = Complexf32::zero();
    for (r, &x) in voxels.iter().zip(img) {
        sample += x * Complexf32::cis(phase(k, r));
    }
    for (r, a) in voxels.iter().zip(acc.iter_mut()) {
        *a += sample * Complexf32::cis(-phase(k, r));
    }
}

impl LinOp for NufftOp {
    fn domain(&self) -> Dims { self.cimg_dims }
    fn codomain(&self) -> Dims { self.ksp_dims }

    fn forward(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("nufft forward", &self.cimg_dims, &x.dims())?;
        let (nvox, nsamp) = (self.nvoxels(), self.nsamples());
        let mut out = ComplexArray::zeros(self.ksp_dims);

        for c in 0..self.ncoils() {
            let img = &x.as_slice()[c * nvox..(c + 1) * nvox];

            #[cfg(not(feature = "serial"))] let it = self.samples.par_iter();
            #[cfg    (feature = "serial") ] let it = self.samples.iter();

            let coil_ksp: Vec<Complexf32> = it
                .map(|k| {
                    let mut acc = Complexf32::zero();
                    for (r, &xv) in self.voxels.iter().zip(img) {
                        acc += xv * Complexf32::cis(phase(k, r));
                    }
                    acc
                })
                .collect();
            out.as_slice_mut()[c * nsamp..(c + 1) * nsamp].copy_from_slice(&coil_ksp);
        }
        Ok(out)
    }

    fn adjoint(&self, y: &ComplexArray) -> Result<ComplexArray, Error> {
        check_dims("nufft adjoint", &self.ksp_dims, &y.dims())?;
        let (nvox, nsamp) = (self.nvoxels(), self.nsamples());
        let mut out = ComplexArray::zeros(self.cimg_dims);

        for c in 0..self.ncoils() {
            let coil_ksp = &y.as_slice()[c * nsamp..(c + 1) * nsamp];

            #[cfg(not(feature = "serial"))] let it = self.voxels.par_iter();
            #[cfg    (feature = "serial") ] let it = self.voxels.iter();

            let img: Vec<Complexf32> = it
                .map(|r| {
                    let mut acc = Complexf32::zero();
                    for (k, &yv) in self.samples.iter().zip(coil_ksp) {
                        acc += yv * Complexf32::cis(-phase(k, r));
                    }
                    acc
                })
                .collect();
            out.as_slice_mut()[c * nvox..(c + 1) * nvox].copy_from_slice(&img);
        }
        Ok(out)
    }

    fn normal(&self, x: &ComplexArray) -> Result<ComplexArray, Error> {
        if !self.conf.lowmem {
            return self.adjoint(&self.forward(x)?);
        }
        check_dims("nufft normal", &self.cimg_dims, &x.dims())?;
        let nvox = self.nvoxels();
        let mut out = ComplexArray::zeros(self.cimg_dims);

        for c in 0..self.ncoils() {
            let img = &x.as_slice()[c * nvox..(c + 1) * nvox];

            // One streaming pass per sample, accumulated per thread and
            // summed across threads, so no k-space intermediate is ever
            // allocated.
            #[cfg(not(feature = "serial"))]
            let acc: Vec<Complexf32> = self.samples.par_iter()
                .fold(|| vec![Complexf32::zero(); nvox],
                      |mut acc, k| { accumulate_sample(k, img, &self.voxels, &mut acc); acc })
                .reduce(|| vec![Complexf32::zero(); nvox],
                        |mut l, r| { for (a, b) in l.iter_mut().zip(r) { *a += b; } l });

            #[cfg(feature = "serial")]
            let acc: Vec<Complexf32> = self.samples.iter()
                .fold(vec![Complexf32::zero(); nvox],
                      |mut acc, k| { accumulate_sample(k, img, &self.voxels, &mut acc); acc });

            out.as_slice_mut()[c * nvox..(c + 1) * nvox].copy_from_slice(&acc);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // Full Cartesian 1D grid of N=4: integer k from -N/2 to N/2-1
    fn cartesian_1d() -> (Dims, Dims, ComplexArray) {
        let ksp_dims = dims_from([1, 4, 1]);
        let cimg_dims = dims_from([4, 1, 1, 1]);
        let traj = traj_from(&[[-2.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        (ksp_dims, cimg_dims, traj)
    }

    fn traj_from(points: &[[f32; 3]]) -> ComplexArray {
        let data = points.iter()
            .flat_map(|p| p.iter().map(|&x| Complexf32::new(x, 0.0)))
            .collect();
        ComplexArray::from_vec(dims_from([3, points.len(), 1]), data).unwrap()
    }

    fn random_array(dims: Dims, rng: &mut StdRng) -> ComplexArray {
        let data = (0..total(&dims))
            .map(|_| Complexf32::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        ComplexArray::from_vec(dims, data).unwrap()
    }

    fn cdot(a: &ComplexArray, b: &ComplexArray) -> Complexf32 {
        a.as_slice().iter().zip(b.as_slice())
            .map(|(x, y)| x.conj() * y)
            .sum()
    }

    #[test]
    fn centred_delta_encodes_to_flat_spectrum() {
        let (ksp_dims, cimg_dims, traj) = cartesian_1d();
        let op = NufftOp::new(NufftConf::default(), ksp_dims, cimg_dims, &traj).unwrap();

        // delta at the centre voxel (n = N/2) has zero phase at every sample
        let mut x = ComplexArray::zeros(cimg_dims);
        x.as_slice_mut()[2] = Complexf32::new(1.0, 0.0);
        let y = op.forward(&x).unwrap();
        for v in y.as_slice() {
            assert_float_eq!(v.re, 1.0, abs <= 1e-5);
            assert_float_eq!(v.im, 0.0, abs <= 1e-5);
        }
    }

    #[test]
    fn adjoint_is_conjugate_transpose_of_forward() {
        let mut rng = StdRng::seed_from_u64(7);
        let ksp_dims = {
            let mut d = dims_from([1, 11, 1]);
            d[COIL_DIM] = 2;
            d
        };
        let mut cimg_dims = dims_from([4, 3, 1]);
        cimg_dims[COIL_DIM] = 2;
        // deliberately off-grid positions
        let points: Vec<[f32; 3]> = (0..11)
            .map(|_| [rng.gen_range(-2.0..2.0), rng.gen_range(-1.5..1.5), 0.0])
            .collect();
        let traj = traj_from(&points);
        let op = NufftOp::new(NufftConf::default(), ksp_dims, cimg_dims, &traj).unwrap();

        let x = random_array(cimg_dims, &mut rng);
        let y = random_array(ksp_dims, &mut rng);
        let lhs = cdot(&op.forward(&x).unwrap(), &y);
        let rhs = cdot(&x, &op.adjoint(&y).unwrap());
        assert_float_eq!(lhs.re, rhs.re, rmax <= 1e-5);
        assert_float_eq!(lhs.im, rhs.im, rmax <= 1e-5);
    }

    #[test]
    fn lowmem_normal_matches_two_pass_normal() {
        let mut rng = StdRng::seed_from_u64(21);
        let ksp_dims = dims_from([1, 9, 1]);
        let cimg_dims = dims_from([3, 3, 1, 1]);
        let points: Vec<[f32; 3]> = (0..9)
            .map(|_| [rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), 0.0])
            .collect();
        let traj = traj_from(&points);

        let direct = NufftOp::new(NufftConf { lowmem: false }, ksp_dims, cimg_dims, &traj).unwrap();
        let fused  = NufftOp::new(NufftConf { lowmem: true  }, ksp_dims, cimg_dims, &traj).unwrap();

        let x = random_array(cimg_dims, &mut rng);
        let a = direct.normal(&x).unwrap();
        let b = fused.normal(&x).unwrap();
        for (u, v) in a.as_slice().iter().zip(b.as_slice()) {
            assert_float_eq!(u.re, v.re, rmax <= 1e-4, abs <= 1e-5);
            assert_float_eq!(u.im, v.im, rmax <= 1e-4, abs <= 1e-5);
        }
    }

    #[test]
    fn trajectory_must_carry_three_coordinates() {
        let ksp_dims = dims_from([1, 4, 1]);
        let cimg_dims = dims_from([4, 1, 1]);
        let bad_traj = ComplexArray::zeros(dims_from([2, 4, 1]));
        assert!(matches!(NufftOp::new(NufftConf::default(), ksp_dims, cimg_dims, &bad_traj),
                         Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn uncollapsed_extension_axes_are_rejected() {
        // the per-coil slicing addresses a single batch, so accepting this
        // shape would drop everything beyond batch 0
        let (ksp_dims, _, traj) = cartesian_1d();
        let mut cimg_dims = dims_from([4, 1, 1, 1]);
        cimg_dims[5] = 2;
        assert!(matches!(NufftOp::new(NufftConf::default(), ksp_dims, cimg_dims, &traj),
                         Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn coil_counts_must_agree() {
        let (ksp_dims, _, traj) = cartesian_1d();
        let mut cimg_dims = dims_from([4, 1, 1]);
        cimg_dims[COIL_DIM] = 8; // k-space says 1 coil
        assert!(matches!(NufftOp::new(NufftConf::default(), ksp_dims, cimg_dims, &traj),
                         Err(Error::ShapeMismatch { .. })));
    }
}
