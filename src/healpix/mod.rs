//! HEALPix (Hierarchical Equal Area isoLatitude Pixelisation).
//!
//! The sphere is divided into `12·nside²` equal-area pixels arranged on
//! `4·nside − 1` iso-latitude rings. Two orderings index the same pixels:
//!
//! - [`PixelOrdering::Ring`] walks the rings from north to south, which lets
//!   the transform engine apply one Fourier transform per ring. Any positive
//!   nside is accepted.
//! - [`PixelOrdering::Nested`] walks each of the 12 base faces as a
//!   quad-tree, which keeps neighbouring pixels close in memory. nside must
//!   be a power of two.
//!
//! Angles follow the physics convention: `theta` is the colatitude in
//! `[0, pi]`, `phi` the longitude in `[0, 2*pi)`. Pixel indices are 0-based.

pub mod nested;
pub mod ring;

use std::f64::consts::{PI, TAU};

use crate::error::{HarmonicError, Result};
use crate::geom::sphere::{ang2vec, normalize, vec2ang};

pub use ring::RingInfo;

/// Largest supported resolution parameter.
pub const NSIDE_MAX: u64 = 1 << 29;

/// Pixel indexing scheme of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelOrdering {
    #[default]
    Ring,
    Nested,
}

impl PixelOrdering {
    pub fn name(self) -> &'static str {
        match self {
            PixelOrdering::Ring => "RING",
            PixelOrdering::Nested => "NESTED",
        }
    }
}

impl std::fmt::Display for PixelOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Total number of pixels for a given nside: 12 * nside^2.
pub fn npix(nside: u64) -> u64 {
    12 * nside * nside
}

/// Number of iso-latitude rings for a given nside: 4 * nside - 1.
pub fn nring(nside: u64) -> Result<u64> {
    validate_nside(nside, PixelOrdering::Ring)?;
    Ok(4 * nside - 1)
}

/// Solid angle (steradians) of a single pixel.
pub fn pixel_area(nside: u64) -> f64 {
    4.0 * PI / npix(nside) as f64
}

/// Recover nside from a pixel count.
///
/// Fails with a domain error unless `npix == 12 * nside^2` for some valid nside.
pub fn npix_to_nside(npix: u64) -> Result<u64> {
    if npix == 0 || npix % 12 != 0 {
        return Err(HarmonicError::domain(
            "npix_to_nside",
            format!("{npix} is not a valid HEALPix pixel count"),
        ));
    }
    let nside = (npix / 12).isqrt();
    if 12 * nside * nside != npix || nside > NSIDE_MAX {
        return Err(HarmonicError::domain(
            "npix_to_nside",
            format!("{npix} is not a valid HEALPix pixel count"),
        ));
    }
    Ok(nside)
}

/// Maximum angular distance (radians) between any pixel centre and its corners.
///
/// Attained by the equatorial-belt pixels bordering the polar caps.
pub fn max_pixrad(nside: u64) -> f64 {
    let ns = nside as f64;
    let va = ang2vec((2.0f64 / 3.0).acos(), PI / (4.0 * ns));
    let t1 = 1.0 - 1.0 / ns;
    let zb = 1.0 - t1 * t1 / 3.0;
    let vb = ang2vec(zb.clamp(-1.0, 1.0).acos(), 0.0);
    crate::geom::sphere::angular_distance(va, vb)
}

/// Check that `nside` is usable with `ordering`.
pub fn validate_nside(nside: u64, ordering: PixelOrdering) -> Result<()> {
    if nside == 0 || nside > NSIDE_MAX {
        return Err(HarmonicError::domain(
            "nside",
            format!("nside = {nside} must lie in [1, {NSIDE_MAX}]"),
        ));
    }
    if ordering == PixelOrdering::Nested && !nside.is_power_of_two() {
        return Err(HarmonicError::domain(
            "nside",
            format!("nside = {nside} must be a power of two for NESTED ordering"),
        ));
    }
    Ok(())
}

/// Check that `(theta, phi)` lies in `[0, pi] x [0, 2*pi)`.
pub fn validate_angles(operation: &'static str, theta: f64, phi: f64) -> Result<()> {
    if !(0.0..=PI).contains(&theta) {
        return Err(HarmonicError::domain(
            operation,
            format!("theta = {theta} outside [0, pi]"),
        ));
    }
    if !(0.0..TAU).contains(&phi) {
        return Err(HarmonicError::domain(
            operation,
            format!("phi = {phi} outside [0, 2*pi)"),
        ));
    }
    Ok(())
}

fn validate_pixel(operation: &'static str, nside: u64, pix: u64) -> Result<()> {
    if pix >= npix(nside) {
        return Err(HarmonicError::domain(
            operation,
            format!("pixel {pix} outside [0, {}) for nside {nside}", npix(nside)),
        ));
    }
    Ok(())
}

/// Pixel index containing the point `(theta, phi)`.
pub fn ang2pix(nside: u64, ordering: PixelOrdering, theta: f64, phi: f64) -> Result<u64> {
    validate_nside(nside, ordering)?;
    validate_angles("ang2pix", theta, phi)?;
    Ok(zphi_to_pix(nside, ordering, theta.cos(), phi))
}

/// Colatitude and longitude of the centre of `pix`.
pub fn pix2ang(nside: u64, ordering: PixelOrdering, pix: u64) -> Result<(f64, f64)> {
    validate_nside(nside, ordering)?;
    validate_pixel("pix2ang", nside, pix)?;
    Ok(match ordering {
        PixelOrdering::Ring => ring::ring_to_ang(nside, pix),
        PixelOrdering::Nested => nested::nest_to_ang(nside, pix),
    })
}

/// Pixel index containing the direction `v` (need not be normalized).
pub fn vec2pix(nside: u64, ordering: PixelOrdering, v: [f64; 3]) -> Result<u64> {
    validate_nside(nside, ordering)?;
    let unit = normalize(v).ok_or_else(|| {
        HarmonicError::domain("vec2pix", format!("{v:?} has no direction"))
    })?;
    let (_, phi) = vec2ang(unit);
    Ok(zphi_to_pix(nside, ordering, unit[2], phi))
}

/// Unit vector towards the centre of `pix`.
pub fn pix2vec(nside: u64, ordering: PixelOrdering, pix: u64) -> Result<[f64; 3]> {
    let (theta, phi) = pix2ang(nside, ordering, pix)?;
    Ok(ang2vec(theta, phi))
}

/// Remap a pixel index from one ordering to another.
pub fn convert(nside: u64, from: PixelOrdering, to: PixelOrdering, pix: u64) -> Result<u64> {
    validate_nside(nside, from)?;
    validate_nside(nside, to)?;
    validate_pixel("convert", nside, pix)?;
    Ok(convert_unchecked(nside, from, to, pix))
}

/// Convert a NESTED index to RING.
pub fn nest2ring(nside: u64, pix: u64) -> Result<u64> {
    convert(nside, PixelOrdering::Nested, PixelOrdering::Ring, pix)
}

/// Convert a RING index to NESTED.
pub fn ring2nest(nside: u64, pix: u64) -> Result<u64> {
    convert(nside, PixelOrdering::Ring, PixelOrdering::Nested, pix)
}

/// Geometry of every ring, north to south.
pub fn rings(nside: u64) -> Result<impl Iterator<Item = RingInfo>> {
    validate_nside(nside, PixelOrdering::Ring)?;
    Ok(ring_infos(nside))
}

pub(crate) fn ring_infos(nside: u64) -> impl Iterator<Item = RingInfo> {
    (1..4 * nside).map(move |r| ring::ring_info(nside, r))
}

pub(crate) fn zphi_to_pix(nside: u64, ordering: PixelOrdering, z: f64, phi: f64) -> u64 {
    match ordering {
        PixelOrdering::Ring => ring::zphi_to_ring(nside, z, phi),
        PixelOrdering::Nested => nested::zphi_to_nest(nside, z, phi),
    }
}

pub(crate) fn convert_unchecked(
    nside: u64,
    from: PixelOrdering,
    to: PixelOrdering,
    pix: u64,
) -> u64 {
    match (from, to) {
        (PixelOrdering::Ring, PixelOrdering::Nested) => {
            let (ix, iy, face) = ring::ring_to_xyf(nside, pix);
            nested::xyf_to_nest(nside, ix, iy, face)
        }
        (PixelOrdering::Nested, PixelOrdering::Ring) => {
            let (ix, iy, face) = nested::nest_to_xyf(nside, pix);
            ring::xyf_to_ring(nside, ix, iy, face)
        }
        _ => pix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    const EPS: f64 = 1e-12;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() < tol,
            "expected {a} ~= {b} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn nside_and_npix() {
        for nside in [1u64, 2, 4, 8, 16, 32, 256] {
            assert_eq!(npix(nside), 12 * nside * nside);
            assert_eq!(npix_to_nside(npix(nside)).unwrap(), nside);
        }
        assert_eq!(npix(4), 192);
        assert_eq!(npix(256), 786432);
        assert_eq!(nring(4).unwrap(), 15);
        assert_eq!(nring(256).unwrap(), 1023);
        // Non-power-of-two resolutions are valid pixel counts too.
        assert_eq!(npix_to_nside(12 * 9).unwrap(), 3);
    }

    #[test]
    fn npix_to_nside_rejects_bad_counts() {
        for bad in [0u64, 11, 13, 24, 191, 193] {
            assert!(npix_to_nside(bad).unwrap_err().is_domain(), "npix {bad}");
        }
    }

    #[test]
    fn pixel_area_sum() {
        for nside in [1u64, 2, 4, 8, 16] {
            let total = pixel_area(nside) * npix(nside) as f64;
            assert_close(total, 4.0 * PI, 1e-10);
        }
    }

    #[test]
    fn nside_validation() {
        assert!(validate_nside(0, PixelOrdering::Ring).unwrap_err().is_domain());
        assert!(validate_nside(3, PixelOrdering::Ring).is_ok());
        assert!(validate_nside(3, PixelOrdering::Nested).unwrap_err().is_domain());
        assert!(validate_nside(NSIDE_MAX * 2, PixelOrdering::Ring).is_err());
        assert!(ang2pix(6, PixelOrdering::Nested, 1.0, 1.0).is_err());
    }

    #[test]
    fn angle_validation() {
        for (theta, phi) in [
            (-0.1, 0.0),
            (PI + 1e-9, 0.0),
            (1.0, -1e-9),
            (1.0, TAU),
            (f64::NAN, 0.0),
            (1.0, f64::NAN),
        ] {
            let err = ang2pix(4, PixelOrdering::Ring, theta, phi).unwrap_err();
            assert!(err.is_domain(), "({theta}, {phi})");
        }
        assert!(ang2pix(4, PixelOrdering::Ring, 0.0, 0.0).is_ok());
        assert!(ang2pix(4, PixelOrdering::Ring, PI, 0.0).is_ok());
    }

    #[test]
    fn pixel_validation() {
        assert!(pix2ang(4, PixelOrdering::Ring, 192).unwrap_err().is_domain());
        assert!(nest2ring(4, 192).is_err());
        assert!(pix2ang(4, PixelOrdering::Nested, 191).is_ok());
    }

    #[test]
    fn known_pixel_indices() {
        let nside = 256;
        assert_eq!(ang2pix(nside, PixelOrdering::Ring, 0.0, 0.0).unwrap(), 0);
        assert_eq!(ang2pix(nside, PixelOrdering::Nested, 0.0, 0.0).unwrap(), 65535);
        assert_eq!(
            ang2pix(nside, PixelOrdering::Ring, FRAC_PI_2, FRAC_PI_2).unwrap(),
            392960
        );
        assert_eq!(
            ang2pix(nside, PixelOrdering::Nested, FRAC_PI_2, FRAC_PI_2).unwrap(),
            354986
        );
        assert_eq!(nest2ring(nside, 0).unwrap(), 391808);
        assert_eq!(nest2ring(nside, 1).unwrap(), 390784);
        assert_eq!(ring2nest(nside, 0).unwrap(), 65535);
        assert_eq!(ring2nest(nside, 1).unwrap(), 131071);
        assert_eq!(vec2pix(nside, PixelOrdering::Nested, [1.0, 0.0, 0.0]).unwrap(), 289450);
        assert_eq!(vec2pix(nside, PixelOrdering::Ring, [1.0, 0.0, 0.0]).unwrap(), 392704);
        assert_eq!(vec2pix(nside, PixelOrdering::Ring, [0.0, 1.0, 0.0]).unwrap(), 392960);
        assert_eq!(vec2pix(nside, PixelOrdering::Ring, [0.0, 0.0, 1.0]).unwrap(), 0);
    }

    #[test]
    fn known_pixel_centres() {
        let nside = 256;
        let (theta, phi) = pix2ang(nside, PixelOrdering::Ring, 0).unwrap();
        assert_close(theta, 0.0031894411211228764, EPS);
        assert_close(phi, FRAC_PI_4, EPS);

        let (theta, phi) = pix2ang(nside, PixelOrdering::Ring, 1).unwrap();
        assert_close(theta, 0.0031894411211228764, EPS);
        assert_close(phi, 2.356194490192345, EPS);

        let (theta, phi) = pix2ang(nside, PixelOrdering::Nested, 0).unwrap();
        assert_close(theta, 1.5681921571847817, EPS);
        assert_close(phi, FRAC_PI_4, EPS);

        let (theta, phi) = pix2ang(nside, PixelOrdering::Nested, 1).unwrap();
        assert_close(theta, 1.5655879699137618, EPS);
        assert_close(phi, 0.7884661249732196, EPS);

        let v = pix2vec(nside, PixelOrdering::Nested, 0).unwrap();
        assert_close(v[2], 0.00260417, 1e-8);
    }

    #[test]
    fn ordering_roundtrip() {
        for nside in [1u64, 2, 4, 8, 16] {
            let np = npix(nside);
            let mut seen = vec![false; np as usize];
            for pix in 0..np {
                let nest = ring2nest(nside, pix).unwrap();
                assert!(nest < np);
                assert!(!seen[nest as usize], "nside {nside}: {nest} hit twice");
                seen[nest as usize] = true;
                assert_eq!(nest2ring(nside, nest).unwrap(), pix);
            }
        }
    }

    #[test]
    fn convert_same_ordering_is_identity() {
        for pix in 0..192 {
            assert_eq!(convert(4, PixelOrdering::Ring, PixelOrdering::Ring, pix).unwrap(), pix);
            assert_eq!(
                convert(4, PixelOrdering::Nested, PixelOrdering::Nested, pix).unwrap(),
                pix
            );
        }
    }

    #[test]
    fn orderings_agree_on_centres() {
        let nside = 8;
        for pix in 0..npix(nside) {
            let (theta, phi) = pix2ang(nside, PixelOrdering::Nested, pix).unwrap();
            let ring = ang2pix(nside, PixelOrdering::Ring, theta, phi).unwrap();
            assert_eq!(ring, nest2ring(nside, pix).unwrap());
        }
    }

    #[test]
    fn all_pixels_covered() {
        for nside in [1u64, 2, 3, 4] {
            for ordering in [PixelOrdering::Ring, PixelOrdering::Nested] {
                if validate_nside(nside, ordering).is_err() {
                    continue;
                }
                let mut seen = vec![false; npix(nside) as usize];
                let n = 300;
                for i in 0..n {
                    let phi = TAU * i as f64 / n as f64;
                    for j in 0..n {
                        let theta = PI * j as f64 / (n - 1) as f64;
                        let pix = ang2pix(nside, ordering, theta, phi).unwrap();
                        seen[pix as usize] = true;
                    }
                }
                let covered = seen.iter().filter(|&&v| v).count();
                assert_eq!(
                    covered,
                    npix(nside) as usize,
                    "nside {nside} {ordering}: only {covered}/{} pixels covered",
                    npix(nside)
                );
            }
        }
    }

    #[test]
    fn north_and_south_pole() {
        for nside in [1u64, 2, 8, 64] {
            let north = ang2pix(nside, PixelOrdering::Ring, 0.0, 0.0).unwrap();
            assert!(north < 4);
            let south = ang2pix(nside, PixelOrdering::Ring, PI, 0.0).unwrap();
            assert!(south >= npix(nside) - 4);
        }
    }

    #[test]
    fn max_pixrad_bounds_centre_to_point_distance() {
        for nside in [1u64, 2, 4, 8] {
            let rad = max_pixrad(nside);
            assert!(rad > 0.0 && rad < PI);
            let n = 120;
            for i in 0..n {
                for j in 0..n {
                    let theta = PI * (j as f64 + 0.5) / n as f64;
                    let phi = TAU * i as f64 / n as f64;
                    let pix = ang2pix(nside, PixelOrdering::Ring, theta, phi).unwrap();
                    let centre = pix2vec(nside, PixelOrdering::Ring, pix).unwrap();
                    let d = crate::geom::sphere::angular_distance(centre, ang2vec(theta, phi));
                    assert!(d <= rad + 1e-12, "nside {nside}: {d} > {rad}");
                }
            }
        }
    }

    #[test]
    fn rings_cover_every_pixel_once() {
        let nside = 5;
        let total: u64 = rings(nside).unwrap().map(|r| r.len).sum();
        assert_eq!(total, npix(nside));
        assert_eq!(rings(nside).unwrap().count() as u64, nring(nside).unwrap());
    }

    #[test]
    fn ring_counts_reject_zero_nside() {
        assert!(nring(0).unwrap_err().is_domain());
        assert!(rings(0).is_err());
        assert!(nring(NSIDE_MAX + 1).unwrap_err().is_domain());
        // Non-power-of-two resolutions have rings in RING ordering.
        assert_eq!(nring(3).unwrap(), 11);
    }
}
