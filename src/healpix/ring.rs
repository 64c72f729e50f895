//! RING scheme: iso-latitude rings numbered 1..4·nside−1 from the north pole.
//!
//! Ring `i` holds `4i` pixels in the north polar cap (`i < nside`), `4·nside`
//! pixels in the equatorial belt and mirrors the north cap in the south.
//! Within a ring, pixel centres are equally spaced in longitude, starting at
//! `phi = 0` or half a pixel east of it ("shifted" rings).
//!
//! The functions here take a validated nside and an in-range pixel index;
//! the checked entry points live in the parent module.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

pub(crate) const TWO_THIRDS: f64 = 2.0 / 3.0;

/// Ring number of each base face's northernmost corner, in units of nside.
pub(crate) const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];
/// Longitude of each base face's centre, in units of pi/4.
pub(crate) const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// Geometry of one iso-latitude ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingInfo {
    /// Ring number, 1-based from the north pole.
    pub ring: u64,
    /// RING index of the first pixel in the ring.
    pub start: u64,
    /// Number of pixels in the ring.
    pub len: u64,
    /// Colatitude of the pixel centres.
    pub theta: f64,
    pub cos_theta: f64,
    pub sin_theta: f64,
    /// Pixel centres sit half a pixel east of `phi = 0`.
    pub shifted: bool,
}

impl RingInfo {
    /// Longitude of the first pixel centre.
    pub fn phi0(&self) -> f64 {
        if self.shifted {
            PI / self.len as f64
        } else {
            0.0
        }
    }

    /// Longitude of the `j`-th pixel centre in this ring.
    pub fn phi(&self, j: u64) -> f64 {
        let offset = if self.shifted { 0.5 } else { 0.0 };
        (j as f64 + offset) * TAU / self.len as f64
    }
}

/// Number of pixels in both polar caps combined, halved: pixels above ring `nside`.
pub(crate) fn ncap(nside: u64) -> u64 {
    2 * nside * (nside - 1)
}

fn total(nside: u64) -> u64 {
    12 * nside * nside
}

/// (first pixel, pixel count, shifted) of a ring.
pub(crate) fn ring_layout(nside: u64, ring: u64) -> (u64, u64, bool) {
    if ring < nside {
        (2 * ring * (ring - 1), 4 * ring, true)
    } else if ring < 3 * nside {
        let shifted = ((ring - nside) & 1) == 0;
        (ncap(nside) + (ring - nside) * 4 * nside, 4 * nside, shifted)
    } else {
        let nr = 4 * nside - ring;
        (total(nside) - 2 * nr * (nr + 1), 4 * nr, true)
    }
}

/// Full geometry of a ring.
pub fn ring_info(nside: u64, ring: u64) -> RingInfo {
    let ns = nside as f64;
    let north = if ring > 2 * nside { 4 * nside - ring } else { ring };

    let (cos_theta, sin_theta) = if north < nside {
        let tmp = (north * north) as f64 / (3.0 * ns * ns);
        (1.0 - tmp, (tmp * (2.0 - tmp)).sqrt())
    } else {
        let z = (2 * nside - north) as f64 * 2.0 / (3.0 * ns);
        (z, ((1.0 - z) * (1.0 + z)).sqrt())
    };
    let theta = f64::atan2(sin_theta, cos_theta);
    let (start, len, shifted) = ring_layout(nside, ring);

    if north == ring {
        RingInfo {
            ring,
            start,
            len,
            theta,
            cos_theta,
            sin_theta,
            shifted,
        }
    } else {
        RingInfo {
            ring,
            start,
            len,
            theta: PI - theta,
            cos_theta: -cos_theta,
            sin_theta,
            shifted,
        }
    }
}

/// Cosine of the colatitude of a ring.
pub(crate) fn ring_z(nside: u64, ring: u64) -> f64 {
    let ns = nside as f64;
    let north = if ring > 2 * nside { 4 * nside - ring } else { ring };
    let z = if north < nside {
        1.0 - (north * north) as f64 / (3.0 * ns * ns)
    } else {
        (2 * nside - north) as f64 * 2.0 / (3.0 * ns)
    };
    if north == ring { z } else { -z }
}

/// Number of the ring directly north of (or at) `z`. Returns 0 north of the
/// first ring and `4·nside − 1` south of the last.
pub(crate) fn ring_above(nside: u64, z: f64) -> u64 {
    let ns = nside as f64;
    let az = z.abs();
    if az <= TWO_THIRDS {
        return (ns * (2.0 - 1.5 * z)) as u64;
    }
    let iring = (ns * (3.0 * (1.0 - az)).sqrt()) as u64;
    if z > 0.0 { iring } else { 4 * nside - iring - 1 }
}

/// RING index of the pixel containing `(z, phi)`; `phi` may be any real.
pub(crate) fn zphi_to_ring(nside: u64, z: f64, phi: f64) -> u64 {
    let ns = nside as i64;
    let nsf = nside as f64;
    let za = z.abs();
    let tt = (phi / FRAC_PI_2).rem_euclid(4.0);

    if za <= TWO_THIRDS {
        let nl4 = 4 * ns;
        let temp1 = nsf * (0.5 + tt);
        let temp2 = nsf * z * 0.75;
        // Ascending and descending edge lines.
        let jp = (temp1 - temp2) as i64;
        let jm = (temp1 + temp2) as i64;
        // Ring number counted from z = 2/3, in 1..=2·nside+1.
        let ir = ns + 1 + jp - jm;
        let kshift = 1 - (ir & 1);
        let t1 = jp + jm - ns + kshift + 1 + nl4 + nl4;
        let ip = (t1 >> 1) % nl4;
        (ncap(nside) as i64 + (ir - 1) * nl4 + ip) as u64
    } else {
        let tp = tt - tt.floor();
        let tmp = nsf * (3.0 * (1.0 - za)).sqrt();
        let jp = (tp * tmp) as i64;
        let jm = ((1.0 - tp) * tmp) as i64;
        // Ring number counted from the closest pole.
        let ir = jp + jm + 1;
        let ip = ((tt * ir as f64) as i64).min(4 * ir - 1);
        if z > 0.0 {
            (2 * ir * (ir - 1) + ip) as u64
        } else {
            (total(nside) as i64 - 2 * ir * (ir + 1) + ip) as u64
        }
    }
}

/// Colatitude and longitude of the centre of RING pixel `pix`.
pub(crate) fn ring_to_ang(nside: u64, pix: u64) -> (f64, f64) {
    let ns = nside as f64;
    let npix = total(nside);
    let ncap = ncap(nside);

    if pix < ncap {
        let iring = (1 + (1 + 2 * pix).isqrt()) >> 1;
        let iphi = pix + 1 - 2 * iring * (iring - 1);
        let tmp = (iring * iring) as f64 / (3.0 * ns * ns);
        let theta = f64::atan2((tmp * (2.0 - tmp)).sqrt(), 1.0 - tmp);
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (theta, phi)
    } else if pix < npix - ncap {
        let ip = pix - ncap;
        let tmp = ip / (4 * nside);
        let iring = tmp + nside;
        let iphi = ip - tmp * 4 * nside + 1;
        let fodd = if ((iring + nside) & 1) == 1 { 1.0 } else { 0.5 };
        let z = (2 * nside as i64 - iring as i64) as f64 * 2.0 / (3.0 * ns);
        let phi = (iphi as f64 - fodd) * PI * 0.5 / ns;
        (z.clamp(-1.0, 1.0).acos(), phi)
    } else {
        let ip = npix - pix;
        let iring = (1 + (2 * ip - 1).isqrt()) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        let tmp = (iring * iring) as f64 / (3.0 * ns * ns);
        let theta = f64::atan2((tmp * (2.0 - tmp)).sqrt(), tmp - 1.0);
        let phi = (iphi as f64 - 0.5) * FRAC_PI_2 / iring as f64;
        (theta, phi)
    }
}

/// Base face and in-face coordinates `(ix, iy, face)` of RING pixel `pix`.
pub(crate) fn ring_to_xyf(nside: u64, pix: u64) -> (u64, u64, usize) {
    let ns = nside as i64;
    let npix = total(nside) as i64;
    let ncap = ncap(nside) as i64;
    let nl2 = 2 * ns;
    let p = pix as i64;

    let (iring, iphi, kshift, nr, face) = if p < ncap {
        let iring = (1 + (1 + 2 * pix).isqrt() as i64) >> 1;
        let iphi = p + 1 - 2 * iring * (iring - 1);
        (iring, iphi, 0, iring, (iphi - 1) / iring)
    } else if p < npix - ncap {
        let ip = p - ncap;
        let tmp = ip / (4 * ns);
        let iring = tmp + ns;
        let iphi = ip - tmp * 4 * ns + 1;
        let kshift = (iring + ns) & 1;
        let ire = tmp + 1;
        let irm = nl2 + 1 - tmp;
        let ifm = (iphi - (ire >> 1) + ns - 1) / ns;
        let ifp = (iphi - (irm >> 1) + ns - 1) / ns;
        let face = if ifp == ifm {
            ifp | 4
        } else if ifp < ifm {
            ifp
        } else {
            ifm + 8
        };
        (iring, iphi, kshift, ns, face)
    } else {
        let ip = npix - p;
        let iring = (1 + (2 * ip - 1).isqrt()) >> 1;
        let iphi = 4 * iring + 1 - (ip - 2 * iring * (iring - 1));
        (2 * nl2 - iring, iphi, 0, iring, 8 + (iphi - 1) / iring)
    };

    let f = face as usize;
    let irt = iring - (2 + (face >> 2)) * ns + 1;
    let mut ipt = 2 * iphi - JPLL[f] * nr - kshift - 1;
    if ipt >= nl2 {
        ipt -= 8 * ns;
    }
    let ix = (ipt - irt) >> 1;
    let iy = (-ipt - irt) >> 1;
    (ix as u64, iy as u64, f)
}

/// RING index of the pixel at in-face coordinates `(ix, iy)` of `face`.
pub(crate) fn xyf_to_ring(nside: u64, ix: u64, iy: u64, face: usize) -> u64 {
    let nl4 = 4 * nside as i64;
    let jr = JRLL[face] as u64 * nside - ix - iy - 1;
    let (n_before, len, shifted) = ring_layout(nside, jr);
    let nr = (len >> 2) as i64;
    let kshift = if shifted { 0 } else { 1 };
    let mut jp = (JPLL[face] * nr + ix as i64 - iy as i64 + 1 + kshift) / 2;
    if jp < 1 {
        jp += nl4;
    }
    n_before + jp as u64 - 1
}
