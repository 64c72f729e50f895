//! Entry points over plain caller-owned slices.
//!
//! These mirror a flat calling convention: inputs are borrowed slices plus
//! their shape parameters, outputs are caller-allocated slices that must
//! already have the exact length. Every check runs before anything is
//! written, so on error the output slice is left as it was.

use num_complex::Complex;

use crate::alm::{Alm, num_alm};
use crate::error::{HarmonicError, Result};
use crate::healpix::{self, PixelOrdering};
use crate::map::SphereMap;
use crate::query;
use crate::real::Real;
use crate::sht;

pub use crate::query::query_disc;

fn check_output(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(HarmonicError::allocation(what, expected, actual));
    }
    Ok(())
}

/// Analyse the map in `pixels` into `alm_out` (m-major packing).
#[allow(clippy::too_many_arguments)]
pub fn map2alm_buffer<T: Real>(
    pixels: &[T],
    nside: u64,
    ordering: PixelOrdering,
    lmax: usize,
    mmax: usize,
    iterations: usize,
    alm_out: &mut [Complex<T>],
) -> Result<()> {
    let map = SphereMap::from_slice(pixels, nside, ordering)?;
    if mmax > lmax {
        return Err(HarmonicError::domain(
            "map2alm",
            format!("mmax = {mmax} exceeds lmax = {lmax}"),
        ));
    }
    check_output("alm output", num_alm(lmax, mmax), alm_out.len())?;

    let alm = sht::map2alm(&map, lmax, mmax, iterations)?;
    alm_out.copy_from_slice(alm.coefficients());
    Ok(())
}

/// Synthesize the RING-ordered map of `alm` into `pixels_out`.
pub fn alm2map_buffer<T: Real>(
    alm: &[Complex<T>],
    lmax: usize,
    mmax: usize,
    nside: u64,
    pixels_out: &mut [T],
) -> Result<()> {
    let alm = Alm::from_slice(alm, lmax, mmax)?;
    healpix::validate_nside(nside, PixelOrdering::Ring)?;
    check_output("map output", healpix::npix(nside) as usize, pixels_out.len())?;

    let map = sht::alm2map(&alm, nside)?;
    pixels_out.copy_from_slice(map.values());
    Ok(())
}

/// Interpolate the map in `pixels` at each `(theta[i], phi[i])` into `out[i]`.
pub fn interpolate_buffer<T: Real>(
    pixels: &[T],
    nside: u64,
    ordering: PixelOrdering,
    theta: &[f64],
    phi: &[f64],
    out: &mut [T],
) -> Result<()> {
    let map = SphereMap::from_slice(pixels, nside, ordering)?;
    check_output("longitudes", theta.len(), phi.len())?;
    check_output("interpolation output", theta.len(), out.len())?;

    let values = theta
        .iter()
        .zip(phi)
        .map(|(&t, &p)| query::interpolate(&map, t, p))
        .collect::<Result<Vec<T>>>()?;
    out.copy_from_slice(&values);
    Ok(())
}
