//! Per-ring Fourier analysis and synthesis.
//!
//! Rings have between 4 and `4·nside` pixels, so the phase sums are done as
//! direct DFTs against a twiddle table of the ring's length. Orders `m` at or
//! above the ring length alias onto lower frequencies, which the table index
//! `(m·j) mod len` handles without special cases.

use std::f64::consts::TAU;

use ndarray::{ArrayView1, ArrayViewMut1};
use num_complex::Complex64;

use crate::healpix::RingInfo;

/// A ring's geometry plus `e^{-2 pi i k / len}` for `k < len`.
#[derive(Debug, Clone)]
pub(crate) struct RingFourier {
    pub(crate) info: RingInfo,
    twiddle: Vec<Complex64>,
}

impl RingFourier {
    pub(crate) fn new(info: RingInfo) -> Self {
        let n = info.len as f64;
        let twiddle = (0..info.len)
            .map(|k| Complex64::from_polar(1.0, -TAU * k as f64 / n))
            .collect();
        Self { info, twiddle }
    }

    /// Pixel range of this ring in a RING-ordered buffer.
    pub(crate) fn span(&self) -> std::ops::Range<usize> {
        let start = self.info.start as usize;
        start..start + self.info.len as usize
    }

    /// `out[m] = sum_j values[j] e^{-i m phi_j}` for every `m` in `out`.
    pub(crate) fn analyse(&self, values: &[f64], mut out: ArrayViewMut1<'_, Complex64>) {
        debug_assert_eq!(values.len(), self.twiddle.len());
        let n = self.twiddle.len();
        let phi0 = self.info.phi0();

        for (m, slot) in out.iter_mut().enumerate() {
            let step = m % n;
            let mut k = 0;
            let mut acc = Complex64::new(0.0, 0.0);
            for &v in values {
                acc += self.twiddle[k] * v;
                k += step;
                if k >= n {
                    k -= n;
                }
            }
            *slot = acc * Complex64::from_polar(1.0, -(m as f64) * phi0);
        }
    }

    /// Real field on the ring from its phases:
    /// `f_j = Re G_0 + 2 Re sum_{m>=1} G_m e^{i m phi_j}`.
    pub(crate) fn synthesise(&self, phases: ArrayView1<'_, Complex64>) -> Vec<f64> {
        let n = self.twiddle.len();
        let phi0 = self.info.phi0();
        let mut out = vec![0.0; n];

        for (m, &g) in phases.iter().enumerate() {
            let c = g * Complex64::from_polar(1.0, m as f64 * phi0);
            let c = if m == 0 {
                Complex64::new(c.re, 0.0)
            } else {
                c * 2.0
            };
            if c.re == 0.0 && c.im == 0.0 {
                continue;
            }

            let step = m % n;
            let mut k = 0;
            for slot in out.iter_mut() {
                // Re(c * conj(twiddle[k]))
                let t = self.twiddle[k];
                *slot += c.re * t.re + c.im * t.im;
                k += step;
                if k >= n {
                    k -= n;
                }
            }
        }
        out
    }
}
