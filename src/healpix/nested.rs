//! NESTED scheme: 12 base faces, each subdivided as a quad-tree.
//!
//! The 12 base faces are laid out as:
//! - 0–3: north polar cap
//! - 4–7: equatorial belt
//! - 8–11: south polar cap
//!
//! Within a face, `ix` increases northeast and `iy` increases northwest.
//! The in-face index interleaves their bits: `ix` provides the even bits and
//! `iy` the odd bits, so nside must be a power of two.

use std::f64::consts::{FRAC_PI_2, PI};

use super::ring::{JPLL, JRLL, TWO_THIRDS};

/// Compose a nested index from `(ix, iy, face)`.
pub(crate) fn xyf_to_nest(nside: u64, ix: u64, iy: u64, face: usize) -> u64 {
    face as u64 * nside * nside + xy_to_sub(ix, iy)
}

/// Decompose a nested index into `(ix, iy, face)`.
pub(crate) fn nest_to_xyf(nside: u64, pix: u64) -> (u64, u64, usize) {
    let face_pixels = nside * nside;
    let face = (pix / face_pixels) as usize;
    let (ix, iy) = sub_to_xy(pix % face_pixels);
    (ix, iy, face)
}

/// Bit-interleave (x, y) → in-face index. x provides even bits, y provides odd bits.
fn xy_to_sub(x: u64, y: u64) -> u64 {
    let mut result = 0u64;
    let mut xx = x;
    let mut yy = y;
    let mut bit = 0;
    while xx > 0 || yy > 0 {
        result |= (xx & 1) << bit;
        bit += 1;
        result |= (yy & 1) << bit;
        bit += 1;
        xx >>= 1;
        yy >>= 1;
    }
    result
}

/// De-interleave in-face index → (x, y).
fn sub_to_xy(sub: u64) -> (u64, u64) {
    let mut x = 0u64;
    let mut y = 0u64;
    let mut s = sub;
    let mut bit = 0;
    while s > 0 {
        x |= (s & 1) << bit;
        s >>= 1;
        y |= (s & 1) << bit;
        s >>= 1;
        bit += 1;
    }
    (x, y)
}

/// NESTED index of the pixel containing `(z, phi)`; `phi` may be any real.
pub(crate) fn zphi_to_nest(nside: u64, z: f64, phi: f64) -> u64 {
    let ns = nside as f64;
    let za = z.abs();
    let tt = (phi / FRAC_PI_2).rem_euclid(4.0);

    if za <= TWO_THIRDS {
        let temp1 = ns * (0.5 + tt);
        let temp2 = ns * (z * 0.75);
        let jp = (temp1 - temp2) as u64;
        let jm = (temp1 + temp2) as u64;
        let ifp = jp / nside;
        let ifm = jm / nside;
        let face = if ifp == ifm {
            ifp | 4
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        let ix = jm % nside;
        let iy = nside - (jp % nside) - 1;
        xyf_to_nest(nside, ix, iy, face as usize)
    } else {
        let ntt = (tt as u64).min(3);
        let tp = tt - ntt as f64;
        let tmp = ns * (3.0 * (1.0 - za)).sqrt();
        let jp = ((tp * tmp) as u64).min(nside - 1);
        let jm = (((1.0 - tp) * tmp) as u64).min(nside - 1);
        if z >= 0.0 {
            xyf_to_nest(nside, nside - jm - 1, nside - jp - 1, ntt as usize)
        } else {
            xyf_to_nest(nside, jp, jm, ntt as usize + 8)
        }
    }
}

/// Colatitude and longitude of the centre of NESTED pixel `pix`.
pub(crate) fn nest_to_ang(nside: u64, pix: u64) -> (f64, f64) {
    let (ix, iy, face) = nest_to_xyf(nside, pix);
    let ns = nside as i64;
    let nsf = nside as f64;
    let jr = JRLL[face] * ns - ix as i64 - iy as i64 - 1;

    let (nr, theta) = if jr < ns {
        let tmp = (jr * jr) as f64 / (3.0 * nsf * nsf);
        (jr, f64::atan2((tmp * (2.0 - tmp)).sqrt(), 1.0 - tmp))
    } else if jr > 3 * ns {
        let nr = 4 * ns - jr;
        let tmp = (nr * nr) as f64 / (3.0 * nsf * nsf);
        (nr, f64::atan2((tmp * (2.0 - tmp)).sqrt(), tmp - 1.0))
    } else {
        let z = (2 * ns - jr) as f64 * 2.0 / (3.0 * nsf);
        (ns, z.clamp(-1.0, 1.0).acos())
    };

    let mut tmp = JPLL[face] * nr + ix as i64 - iy as i64;
    if tmp < 0 {
        tmp += 8 * nr;
    }
    let phi = if nr == ns {
        PI * tmp as f64 / (4.0 * nsf)
    } else {
        0.5 * FRAC_PI_2 * tmp as f64 / nr as f64
    };
    (theta, phi)
}
