//! Spherical harmonic coefficients in triangular packing.
//!
//! Coefficients `a_lm` for `0 <= m <= mmax`, `m <= l <= lmax` are stored
//! m-major: all `l` for `m = 0`, then all `l` for `m = 1`, and so on. The
//! packed offset of `(l, m)` is
//!
//! ```text
//! index(l, m) = m * (2 * lmax + 3 - m) / 2 + (l - m)
//! ```
//!
//! Only `m >= 0` is stored; for a real field `a_{l,-m} = (-1)^m conj(a_lm)`.

use num_complex::Complex;

use crate::error::{HarmonicError, Result};
use crate::real::Real;

/// Number of coefficients for a band limit: sum over m of (lmax - m + 1).
pub fn num_alm(lmax: usize, mmax: usize) -> usize {
    let mmax = mmax.min(lmax);
    ((mmax + 1) * (2 * lmax + 2 - mmax)) / 2
}

/// Packed offset of the first coefficient with order `m`.
#[inline]
pub(crate) fn order_offset(lmax: usize, m: usize) -> usize {
    (m * (2 * lmax + 3 - m)) / 2
}

fn validate_band_limit(operation: &'static str, lmax: usize, mmax: usize) -> Result<()> {
    if mmax > lmax {
        return Err(HarmonicError::domain(
            operation,
            format!("mmax = {mmax} exceeds lmax = {lmax}"),
        ));
    }
    Ok(())
}

/// Harmonic coefficients `a_lm` of a scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct Alm<T> {
    lmax: usize,
    mmax: usize,
    coefficients: Vec<Complex<T>>,
}

impl<T: Real> Alm<T> {
    /// Take ownership of packed `coefficients` for the given band limit.
    pub fn new(coefficients: Vec<Complex<T>>, lmax: usize, mmax: usize) -> Result<Self> {
        validate_band_limit("alm", lmax, mmax)?;
        let expected = num_alm(lmax, mmax);
        if coefficients.len() != expected {
            return Err(HarmonicError::allocation(
                "alm coefficients",
                expected,
                coefficients.len(),
            ));
        }
        Ok(Self {
            lmax,
            mmax,
            coefficients,
        })
    }

    /// Copy a caller-owned packed buffer.
    pub fn from_slice(coefficients: &[Complex<T>], lmax: usize, mmax: usize) -> Result<Self> {
        validate_band_limit("alm", lmax, mmax)?;
        let expected = num_alm(lmax, mmax);
        if coefficients.len() != expected {
            return Err(HarmonicError::allocation(
                "alm coefficients",
                expected,
                coefficients.len(),
            ));
        }
        Ok(Self {
            lmax,
            mmax,
            coefficients: coefficients.to_vec(),
        })
    }

    /// All coefficients zero.
    pub fn zeros(lmax: usize, mmax: usize) -> Result<Self> {
        validate_band_limit("alm", lmax, mmax)?;
        Ok(Self {
            lmax,
            mmax,
            coefficients: vec![Complex::new(T::zero(), T::zero()); num_alm(lmax, mmax)],
        })
    }

    /// Coefficients given by `f(l, m)`, evaluated in packing order.
    pub fn from_fn(
        lmax: usize,
        mmax: usize,
        mut f: impl FnMut(usize, usize) -> Complex<T>,
    ) -> Result<Self> {
        validate_band_limit("alm", lmax, mmax)?;
        let coefficients = lm_pairs(lmax, mmax).map(|(l, m)| f(l, m)).collect();
        Ok(Self {
            lmax,
            mmax,
            coefficients,
        })
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    pub fn mmax(&self) -> usize {
        self.mmax
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Packed coefficients.
    pub fn coefficients(&self) -> &[Complex<T>] {
        &self.coefficients
    }

    pub fn coefficients_mut(&mut self) -> &mut [Complex<T>] {
        &mut self.coefficients
    }

    /// Release the packed buffer to the caller.
    pub fn into_coefficients(self) -> Vec<Complex<T>> {
        self.coefficients
    }

    /// Packed offset of `(l, m)`, or `None` outside the band limit.
    pub fn index(&self, l: usize, m: usize) -> Option<usize> {
        if m > self.mmax || m > l || l > self.lmax {
            return None;
        }
        Some(order_offset(self.lmax, m) + (l - m))
    }

    pub fn get(&self, l: usize, m: usize) -> Option<Complex<T>> {
        self.index(l, m).map(|i| self.coefficients[i])
    }

    pub fn get_mut(&mut self, l: usize, m: usize) -> Option<&mut Complex<T>> {
        self.index(l, m).map(move |i| &mut self.coefficients[i])
    }

    /// Set `a_lm`; fails with a domain error outside the band limit.
    pub fn set(&mut self, l: usize, m: usize, value: Complex<T>) -> Result<()> {
        let i = self.index(l, m).ok_or_else(|| {
            HarmonicError::domain(
                "alm",
                format!(
                    "(l, m) = ({l}, {m}) outside lmax = {}, mmax = {}",
                    self.lmax, self.mmax
                ),
            )
        })?;
        self.coefficients[i] = value;
        Ok(())
    }

    /// All coefficients of order `m` (l = m..=lmax), contiguous in the packing.
    pub fn order(&self, m: usize) -> Option<&[Complex<T>]> {
        if m > self.mmax {
            return None;
        }
        let start = order_offset(self.lmax, m);
        Some(&self.coefficients[start..start + self.lmax - m + 1])
    }

    /// All coefficients of degree `l` (m = 0..=min(l, mmax)).
    pub fn degree(&self, l: usize) -> Vec<Complex<T>> {
        if l > self.lmax {
            return Vec::new();
        }
        (0..=l.min(self.mmax))
            .map(|m| self.coefficients[order_offset(self.lmax, m) + (l - m)])
            .collect()
    }

    /// `(l, m)` pairs in packing order.
    pub fn lm(&self) -> impl Iterator<Item = (usize, usize)> + use<T> {
        lm_pairs(self.lmax, self.mmax)
    }
}

/// `(l, m)` pairs for a band limit, in packing order (m-major, l ascending).
pub fn lm_pairs(lmax: usize, mmax: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..=mmax.min(lmax)).flat_map(move |m| (m..=lmax).map(move |l| (l, m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    type C64 = Complex<f64>;

    #[test]
    fn num_alm_matches_sum() {
        for lmax in 0..20 {
            for mmax in 0..=lmax {
                let expected: usize = (0..=mmax).map(|m| lmax - m + 1).sum();
                assert_eq!(num_alm(lmax, mmax), expected, "lmax {lmax}, mmax {mmax}");
            }
        }
        assert_eq!(num_alm(3, 3), 10);
        assert_eq!(num_alm(10, 0), 11);
    }

    #[test]
    fn packing_is_m_major() {
        let alm = Alm::<f64>::zeros(4, 2).unwrap();
        let mut expected = 0;
        for m in 0..=2 {
            for l in m..=4 {
                assert_eq!(alm.index(l, m), Some(expected), "(l, m) = ({l}, {m})");
                expected += 1;
            }
        }
        assert_eq!(expected, alm.len());
        assert_eq!(alm.index(4, 3), None);
        assert_eq!(alm.index(1, 2), None);
        assert_eq!(alm.index(5, 0), None);
    }

    #[test]
    fn single_unit_coefficient_lands_at_documented_offset() {
        let (lmax, mmax) = (6, 4);
        for (l, m) in lm_pairs(lmax, mmax) {
            let mut alm = Alm::<f64>::zeros(lmax, mmax).unwrap();
            alm.set(l, m, C64::new(1.0, 0.0)).unwrap();
            let offset = m * (2 * lmax + 3 - m) / 2 + (l - m);
            for (i, c) in alm.coefficients().iter().enumerate() {
                let want = if i == offset { 1.0 } else { 0.0 };
                assert_eq!(c.re, want, "(l, m) = ({l}, {m}), slot {i}");
            }
        }
    }

    #[test]
    fn lm_iteration_order() {
        let pairs: Vec<_> = lm_pairs(2, 1).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 0), (2, 0), (1, 1), (2, 1)]);
    }

    #[test]
    fn slices_by_order_and_degree() {
        let alm = Alm::from_fn(2, 1, |l, m| C64::new((l + m) as f64, 0.0)).unwrap();
        assert_eq!(alm.get(1, 1).unwrap().re, 2.0);
        let degree: Vec<f64> = alm.degree(1).iter().map(|c| c.re).collect();
        assert_eq!(degree, vec![1.0, 2.0]);
        let order: Vec<f64> = alm.order(1).unwrap().iter().map(|c| c.re).collect();
        assert_eq!(order, vec![2.0, 3.0]);
        assert!(alm.order(2).is_none());
        assert!(alm.degree(3).is_empty());
    }

    #[test]
    fn construction_errors() {
        let err = Alm::new(vec![C64::default(); 9], 3, 3).unwrap_err();
        assert_eq!(err, HarmonicError::allocation("alm coefficients", 10, 9));
        assert!(Alm::<f64>::zeros(2, 3).unwrap_err().is_domain());
        assert!(Alm::<f32>::zeros(0, 0).is_ok());

        let mut alm = Alm::<f64>::zeros(3, 1).unwrap();
        assert!(alm.set(3, 2, C64::new(1.0, 0.0)).unwrap_err().is_domain());
    }

    #[test]
    fn get_mut_writes_through() {
        let mut alm = Alm::<f32>::zeros(3, 3).unwrap();
        *alm.get_mut(2, 1).unwrap() = Complex::new(1.0, -1.0);
        assert_eq!(alm.coefficients()[alm.index(2, 1).unwrap()], Complex::new(1.0, -1.0));
    }
}
