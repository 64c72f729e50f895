//! Spatial queries against the pixelization: bilinear interpolation and
//! disc searches.
//!
//! Both work on RING geometry; NESTED inputs and outputs are converted at the
//! edges.

use std::f64::consts::{PI, TAU};

use crate::error::{HarmonicError, Result};
use crate::healpix::{self, PixelOrdering, ring};
use crate::map::{SphereMap, UNSEEN, is_unseen};
use crate::real::Real;

/// The four pixels surrounding a position and their bilinear weights.
///
/// Pixels 0 and 1 lie on the ring north of the position, 2 and 3 on the ring
/// south of it. Near the poles, where only one ring brackets the position,
/// the missing pair is taken from the opposite side of the pole. Weights are
/// non-negative and sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationWeights {
    pub pixels: [u64; 4],
    pub weights: [f64; 4],
}

/// Neighbouring pixels on `ring` either side of `phi`, and the weight of the
/// eastern one.
fn ring_pair(nside: u64, ring_number: u64, phi: f64) -> ([u64; 2], f64, f64) {
    let info = ring::ring_info(nside, ring_number);
    let nr = info.len as i64;
    let dphi = TAU / nr as f64;
    let shift = if info.shifted { 0.5 } else { 0.0 };

    let i1 = (phi / dphi - shift).floor() as i64;
    let w1 = (phi - (i1 as f64 + shift) * dphi) / dphi;
    let i2 = if i1 + 1 >= nr { i1 + 1 - nr } else { i1 + 1 };
    let i1 = if i1 < 0 { i1 + nr } else { i1 };

    (
        [info.start + i1 as u64, info.start + i2 as u64],
        w1,
        info.theta,
    )
}

/// Pixels and weights for bilinear interpolation at `(theta, phi)`.
pub fn interpolation_weights(
    nside: u64,
    ordering: PixelOrdering,
    theta: f64,
    phi: f64,
) -> Result<InterpolationWeights> {
    healpix::validate_nside(nside, ordering)?;
    healpix::validate_angles("interpolate", theta, phi)?;

    let npix = healpix::npix(nside);
    let last_ring = 4 * nside;
    let ir1 = ring::ring_above(nside, theta.cos());
    let ir2 = ir1 + 1;

    let mut pixels = [0u64; 4];
    let mut weights = [0.0f64; 4];
    let mut theta1 = 0.0;
    let mut theta2 = PI;

    if ir1 > 0 {
        let ([p0, p1], w1, t) = ring_pair(nside, ir1, phi);
        pixels[0] = p0;
        pixels[1] = p1;
        weights[0] = 1.0 - w1;
        weights[1] = w1;
        theta1 = t;
    }
    if ir2 < last_ring {
        let ([p2, p3], w1, t) = ring_pair(nside, ir2, phi);
        pixels[2] = p2;
        pixels[3] = p3;
        weights[2] = 1.0 - w1;
        weights[3] = w1;
        theta2 = t;
    }

    if ir1 == 0 {
        // North of the first ring: borrow the first ring's pixels across the pole.
        let wtheta = theta / theta2;
        weights[2] *= wtheta;
        weights[3] *= wtheta;
        let fac = (1.0 - wtheta) * 0.25;
        weights = [fac, fac, weights[2] + fac, weights[3] + fac];
        pixels[0] = (pixels[2] + 2) & 3;
        pixels[1] = (pixels[3] + 2) & 3;
    } else if ir2 == last_ring {
        let wtheta = (theta - theta1) / (PI - theta1);
        weights[0] *= 1.0 - wtheta;
        weights[1] *= 1.0 - wtheta;
        let fac = wtheta * 0.25;
        weights[0] += fac;
        weights[1] += fac;
        weights[2] = fac;
        weights[3] = fac;
        pixels[2] = ((pixels[0] + 2) & 3) + npix - 4;
        pixels[3] = ((pixels[1] + 2) & 3) + npix - 4;
    } else {
        let wtheta = (theta - theta1) / (theta2 - theta1);
        weights[0] *= 1.0 - wtheta;
        weights[1] *= 1.0 - wtheta;
        weights[2] *= wtheta;
        weights[3] *= wtheta;
    }

    if ordering == PixelOrdering::Nested {
        for p in &mut pixels {
            *p = healpix::convert_unchecked(nside, PixelOrdering::Ring, PixelOrdering::Nested, *p);
        }
    }

    Ok(InterpolationWeights { pixels, weights })
}

/// Bilinear interpolation of `map` at `(theta, phi)`.
///
/// Pixels holding [`UNSEEN`] are left out and the remaining weights
/// renormalised. If all four are unseen the result is [`UNSEEN`].
pub fn interpolate<T: Real>(map: &SphereMap<T>, theta: f64, phi: f64) -> Result<T> {
    let iw = interpolation_weights(map.nside(), map.ordering(), theta, phi)?;
    let values = map.values();

    let mut sum = 0.0;
    let mut total = 0.0;
    for (&pix, &w) in iw.pixels.iter().zip(&iw.weights) {
        let v = values[pix as usize].widen();
        if is_unseen(v) {
            continue;
        }
        sum += w * v;
        total += w;
    }

    if total > 0.0 {
        Ok(T::narrow(sum / total))
    } else {
        Ok(T::narrow(UNSEEN))
    }
}

/// Pixels whose centres lie within `radius` of `(theta, phi)`, ascending.
///
/// With `inclusive`, the radius is enlarged by [`healpix::max_pixrad`], which
/// returns every pixel overlapping the disc and possibly a few more. A zero
/// radius (non-inclusive) yields the single pixel containing the centre; a
/// radius of `pi` or more yields every pixel.
pub fn query_disc(
    nside: u64,
    ordering: PixelOrdering,
    theta: f64,
    phi: f64,
    radius: f64,
    inclusive: bool,
) -> Result<Vec<u64>> {
    healpix::validate_nside(nside, ordering)?;
    healpix::validate_angles("query_disc", theta, phi)?;
    if radius.is_nan() || radius < 0.0 {
        return Err(HarmonicError::domain(
            "query_disc",
            format!("radius = {radius} must be non-negative"),
        ));
    }

    let npix = healpix::npix(nside);
    let radius = if inclusive {
        radius + healpix::max_pixrad(nside)
    } else {
        radius
    };
    if radius >= PI {
        return Ok((0..npix).collect());
    }
    if radius == 0.0 {
        return Ok(vec![healpix::ang2pix(nside, ordering, theta, phi)?]);
    }

    let mut pixels = disc_ring_pixels(nside, theta, phi, radius);
    if ordering == PixelOrdering::Nested {
        for p in &mut pixels {
            *p = healpix::convert_unchecked(nside, PixelOrdering::Ring, PixelOrdering::Nested, *p);
        }
    }
    pixels.sort_unstable();
    pixels.dedup();
    Ok(pixels)
}

/// RING pixels with centres inside the disc, scanning the rings it spans.
fn disc_ring_pixels(nside: u64, theta: f64, phi: f64, radius: f64) -> Vec<u64> {
    let npix = healpix::npix(nside);
    let mut out = Vec::new();

    let cosrad = radius.cos();
    let z0 = theta.cos();
    let xa = if z0.abs() < 1.0 {
        1.0 / ((1.0 - z0) * (1.0 + z0)).sqrt()
    } else {
        f64::INFINITY
    };

    // Disc covers the north pole: take every ring above the first partial one.
    let rlat1 = theta - radius;
    let irmin = ring::ring_above(nside, rlat1.cos()) + 1;
    if rlat1 <= 0.0 && irmin > 1 {
        let (start, len, _) = ring::ring_layout(nside, irmin - 1);
        out.extend(0..start + len);
    }

    let rlat2 = theta + radius;
    let irmax = ring::ring_above(nside, rlat2.cos());

    if xa.is_finite() {
        for iz in irmin..=irmax {
            let z = ring::ring_z(nside, iz);
            let x = (cosrad - z * z0) * xa;
            let ysq = 1.0 - z * z - x * x;
            if ysq <= 0.0 {
                continue;
            }
            let dphi = f64::atan2(ysq.sqrt(), x);

            let (start, len, shifted) = ring::ring_layout(nside, iz);
            let nr = len as i64;
            let shift = if shifted { 0.5 } else { 0.0 };
            let scale = nr as f64 / TAU;
            let mut lo = (scale * (phi - dphi) - shift).floor() as i64 + 1;
            let mut hi = (scale * (phi + dphi) - shift).floor() as i64;
            if lo > hi {
                continue;
            }
            if hi >= nr {
                lo -= nr;
                hi -= nr;
            }
            if lo < 0 {
                out.extend(start..start + (hi + 1) as u64);
                out.extend(start + (lo + nr) as u64..start + len);
            } else {
                out.extend(start + lo as u64..start + (hi + 1) as u64);
            }
        }
    }

    // Disc covers the south pole.
    if rlat2 >= PI && irmax + 1 < 4 * nside {
        let (start, _, _) = ring::ring_layout(nside, irmax + 1);
        out.extend(start..npix);
    }

    out
}
