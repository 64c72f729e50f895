//! Pixel-domain representation of a scalar field on the sphere.

use tracing::trace;

use crate::error::{HarmonicError, Result};
use crate::healpix::{self, PixelOrdering};
use crate::real::Real;

/// Sentinel marking a pixel without data.
pub const UNSEEN: f64 = -1.6375e30;

/// True if `value` is (within relative tolerance 1e-5) the [`UNSEEN`] sentinel.
pub fn is_unseen(value: f64) -> bool {
    (value - UNSEEN).abs() <= 1e-5 * UNSEEN.abs()
}

/// A HEALPix map: one value per pixel, tagged with its resolution and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMap<T> {
    nside: u64,
    ordering: PixelOrdering,
    values: Vec<T>,
}

impl<T: Real> SphereMap<T> {
    /// Take ownership of `values` as a map of the given resolution and ordering.
    pub fn new(values: Vec<T>, nside: u64, ordering: PixelOrdering) -> Result<Self> {
        healpix::validate_nside(nside, ordering)?;
        let expected = healpix::npix(nside) as usize;
        if values.len() != expected {
            return Err(HarmonicError::allocation("map values", expected, values.len()));
        }
        Ok(Self {
            nside,
            ordering,
            values,
        })
    }

    /// Copy a caller-owned buffer into a new map.
    pub fn from_slice(values: &[T], nside: u64, ordering: PixelOrdering) -> Result<Self> {
        healpix::validate_nside(nside, ordering)?;
        let expected = healpix::npix(nside) as usize;
        if values.len() != expected {
            return Err(HarmonicError::allocation("map values", expected, values.len()));
        }
        Ok(Self {
            nside,
            ordering,
            values: values.to_vec(),
        })
    }

    /// Build a map whose nside is inferred from the number of values.
    pub fn from_values(values: Vec<T>, ordering: PixelOrdering) -> Result<Self> {
        let nside = healpix::npix_to_nside(values.len() as u64)?;
        Self::new(values, nside, ordering)
    }

    /// A map with every pixel set to zero.
    pub fn zeros(nside: u64, ordering: PixelOrdering) -> Result<Self> {
        Self::filled(nside, ordering, T::zero())
    }

    /// A map with every pixel set to `value`.
    pub fn filled(nside: u64, ordering: PixelOrdering, value: T) -> Result<Self> {
        healpix::validate_nside(nside, ordering)?;
        Ok(Self {
            nside,
            ordering,
            values: vec![value; healpix::npix(nside) as usize],
        })
    }

    /// A map whose value at each pixel is `f(theta, phi)` of the pixel centre.
    pub fn from_fn(
        nside: u64,
        ordering: PixelOrdering,
        mut f: impl FnMut(f64, f64) -> T,
    ) -> Result<Self> {
        healpix::validate_nside(nside, ordering)?;
        let values = (0..healpix::npix(nside))
            .map(|pix| {
                let (theta, phi) = match ordering {
                    PixelOrdering::Ring => healpix::ring::ring_to_ang(nside, pix),
                    PixelOrdering::Nested => healpix::nested::nest_to_ang(nside, pix),
                };
                f(theta, phi)
            })
            .collect();
        Ok(Self {
            nside,
            ordering,
            values,
        })
    }

    pub fn nside(&self) -> u64 {
        self.nside
    }

    pub fn ordering(&self) -> PixelOrdering {
        self.ordering
    }

    pub fn npix(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Release the pixel buffer to the caller.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    /// Value of pixel `pix`, or `None` if out of range.
    pub fn get(&self, pix: u64) -> Option<T> {
        self.values.get(pix as usize).copied()
    }

    /// Pixel containing `(theta, phi)` in this map's ordering.
    pub fn ang2pix(&self, theta: f64, phi: f64) -> Result<u64> {
        healpix::ang2pix(self.nside, self.ordering, theta, phi)
    }

    /// Centre of pixel `pix` in this map's ordering.
    pub fn pix2ang(&self, pix: u64) -> Result<(f64, f64)> {
        healpix::pix2ang(self.nside, self.ordering, pix)
    }

    /// Value at the pixel containing `(theta, phi)`.
    pub fn value_at(&self, theta: f64, phi: f64) -> Result<T> {
        let pix = self.ang2pix(theta, phi)?;
        Ok(self.values[pix as usize])
    }

    /// Bilinear interpolation from the four nearest pixel centres.
    pub fn interpolate(&self, theta: f64, phi: f64) -> Result<T> {
        crate::query::interpolate(self, theta, phi)
    }

    /// Copy of this map with its values permuted into `ordering`.
    pub fn to_ordering(&self, ordering: PixelOrdering) -> Result<Self> {
        if ordering == self.ordering {
            return Ok(self.clone());
        }
        healpix::validate_nside(self.nside, ordering)?;
        Ok(self.permuted(ordering))
    }

    /// Copy of this map in RING ordering.
    pub fn to_ring(&self) -> Self {
        match self.ordering {
            PixelOrdering::Ring => self.clone(),
            // NESTED maps always have a power-of-two nside, which RING accepts.
            PixelOrdering::Nested => self.permuted(PixelOrdering::Ring),
        }
    }

    /// Copy of this map in NESTED ordering; fails unless nside is a power of two.
    pub fn to_nested(&self) -> Result<Self> {
        self.to_ordering(PixelOrdering::Nested)
    }

    fn permuted(&self, ordering: PixelOrdering) -> Self {
        trace!(nside = self.nside, from = %self.ordering, to = %ordering, "reordering map");
        let mut values = vec![T::zero(); self.values.len()];
        for (pix, &v) in self.values.iter().enumerate() {
            let target = healpix::convert_unchecked(self.nside, self.ordering, ordering, pix as u64);
            values[target as usize] = v;
        }
        Self {
            nside: self.nside,
            ordering,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_checks_length() {
        let err = SphereMap::new(vec![0.0f64; 191], 4, PixelOrdering::Ring).unwrap_err();
        assert_eq!(err, HarmonicError::allocation("map values", 192, 191));

        let err = SphereMap::from_slice(&[0.0f32; 10], 1, PixelOrdering::Nested).unwrap_err();
        assert!(err.is_allocation());

        let map = SphereMap::new(vec![1.5f64; 192], 4, PixelOrdering::Ring).unwrap();
        assert_eq!(map.nside(), 4);
        assert_eq!(map.npix(), 192);
        assert_eq!(map.get(191), Some(1.5));
        assert_eq!(map.get(192), None);
    }

    #[test]
    fn construction_checks_nside() {
        assert!(SphereMap::<f64>::zeros(0, PixelOrdering::Ring).unwrap_err().is_domain());
        assert!(SphereMap::<f64>::zeros(3, PixelOrdering::Nested).unwrap_err().is_domain());
        assert!(SphereMap::<f64>::zeros(3, PixelOrdering::Ring).is_ok());
    }

    #[test]
    fn infers_nside_from_length() {
        let map = SphereMap::from_values(vec![0.0f64; 768], PixelOrdering::Ring).unwrap();
        assert_eq!(map.nside(), 8);
        assert!(SphereMap::from_values(vec![0.0f64; 100], PixelOrdering::Ring).is_err());
    }

    #[test]
    fn from_slice_copies() {
        let mut buffer = vec![2.0f64; 12];
        let map = SphereMap::from_slice(&buffer, 1, PixelOrdering::Ring).unwrap();
        buffer[0] = -1.0;
        assert_eq!(map.values()[0], 2.0);
    }

    #[test]
    fn reordering_moves_values() {
        let nside = 4;
        let ring = SphereMap::new(
            (0..192).map(|i| i as f64).collect(),
            nside,
            PixelOrdering::Ring,
        )
        .unwrap();
        let nested = ring.to_nested().unwrap();
        assert_eq!(nested.ordering(), PixelOrdering::Nested);
        for pix in 0..192u64 {
            let n = healpix::ring2nest(nside, pix).unwrap();
            assert_eq!(nested.values()[n as usize], pix as f64);
        }
        assert_eq!(nested.to_ring(), ring);
    }

    #[test]
    fn reordering_non_power_of_two_fails() {
        let map = SphereMap::<f64>::zeros(6, PixelOrdering::Ring).unwrap();
        assert!(map.to_nested().unwrap_err().is_domain());
    }

    #[test]
    fn value_lookup_by_angle_agrees_across_orderings() {
        let ring = SphereMap::from_fn(8, PixelOrdering::Ring, |theta, phi| theta + 10.0 * phi)
            .unwrap();
        let nested = ring.to_nested().unwrap();
        for &(theta, phi) in &[(0.1, 0.2), (1.5, 3.0), (2.9, 6.0)] {
            assert_eq!(
                ring.value_at(theta, phi).unwrap(),
                nested.value_at(theta, phi).unwrap()
            );
        }
    }

    #[test]
    fn unseen_detection() {
        assert!(is_unseen(UNSEEN));
        assert!(is_unseen(UNSEEN as f32 as f64));
        assert!(!is_unseen(0.0));
        assert!(!is_unseen(-1.6e30));
    }
}
