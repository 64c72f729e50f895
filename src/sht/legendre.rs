//! Normalized associated Legendre functions.
//!
//! `lambda_lm(x) = sqrt((2l+1)/(4 pi) (l-m)!/(l+m)!) P_lm(x)`, including the
//! Condon–Shortley phase `(-1)^m`, so that `Y_lm = lambda_lm(cos theta) e^{i m phi}`
//! is orthonormal on the sphere.
//!
//! Values for fixed `m` are generated by the upward recurrence in `l`
//!
//! ```text
//! lambda_mm     = (-1)^m sqrt((2m+1)/(4 pi) prod_{k=1..m} (2k-1)/(2k)) sin^m theta
//! lambda_{l,m}  = a_lm (x lambda_{l-1,m} - b_lm lambda_{l-2,m})
//! a_lm          = sqrt((4l^2 - 1)/(l^2 - m^2))
//! b_lm          = sqrt(((l-1)^2 - m^2)/(4(l-1)^2 - 1))
//! ```
//!
//! For large `m` near the poles `lambda_mm` underflows long before the
//! recurrence grows back into range. The start value is therefore carried
//! with an exponent counter in steps of `e^SCALE_LOG`; while the counter is
//! positive the true value is below `e^-SCALE_LOG` and is reported as zero.

use std::f64::consts::PI;

const SCALE_LOG: f64 = 600.0;

/// Recurrence coefficients for a single order `m` up to `lmax`.
#[derive(Debug, Clone)]
pub(crate) struct LegendreRecurrence {
    m: usize,
    lmax: usize,
    /// `a_lm` and `b_lm` for `l = m+1..=lmax`, indexed by `l - m - 1`.
    a: Vec<f64>,
    b: Vec<f64>,
    /// `ln` of the `sin`-independent factor of `lambda_mm`.
    log_norm_mm: f64,
}

impl LegendreRecurrence {
    pub(crate) fn new(lmax: usize, m: usize) -> Self {
        debug_assert!(m <= lmax);
        let mf = m as f64;
        let mut a = Vec::with_capacity(lmax - m);
        let mut b = Vec::with_capacity(lmax - m);
        for l in m + 1..=lmax {
            let lf = l as f64;
            let l1 = lf - 1.0;
            a.push(((4.0 * lf * lf - 1.0) / ((lf - mf) * (lf + mf))).sqrt());
            b.push((((l1 - mf) * (l1 + mf)) / (4.0 * l1 * l1 - 1.0)).max(0.0).sqrt());
        }

        let mut log_norm_mm = 0.5 * ((2.0 * mf + 1.0) / (4.0 * PI)).ln();
        for k in 1..=m {
            let kf = k as f64;
            log_norm_mm += 0.5 * ((2.0 * kf - 1.0) / (2.0 * kf)).ln();
        }

        Self {
            m,
            lmax,
            a,
            b,
            log_norm_mm,
        }
    }

    pub(crate) fn m(&self) -> usize {
        self.m
    }

    /// Write `lambda_lm(cos theta)` for `l = m..=lmax` into `out[l - m]`.
    pub(crate) fn evaluate(&self, cos_theta: f64, sin_theta: f64, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.lmax - self.m + 1);

        if self.m > 0 && sin_theta <= 0.0 {
            out.fill(0.0);
            return;
        }

        let sign = if self.m % 2 == 1 { -1.0 } else { 1.0 };
        let mut log_start = self.log_norm_mm;
        if self.m > 0 {
            log_start += self.m as f64 * sin_theta.ln();
        }

        let mut scale = 0u32;
        while log_start < -SCALE_LOG {
            log_start += SCALE_LOG;
            scale += 1;
        }
        let shrink = (-SCALE_LOG).exp();

        let mut prev = 0.0;
        let mut cur = sign * log_start.exp();
        out[0] = if scale == 0 { cur } else { 0.0 };

        for (k, slot) in out.iter_mut().enumerate().skip(1) {
            let next = self.a[k - 1] * (cos_theta * cur - self.b[k - 1] * prev);
            prev = cur;
            cur = next;
            if scale > 0 && cur.abs() > 1.0 {
                cur *= shrink;
                prev *= shrink;
                scale -= 1;
            }
            *slot = if scale == 0 { cur } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() < tol,
            "expected {a} ~= {b} (diff = {})",
            (a - b).abs()
        );
    }

    fn lambdas(lmax: usize, m: usize, theta: f64) -> Vec<f64> {
        let rec = LegendreRecurrence::new(lmax, m);
        let mut out = vec![0.0; lmax - m + 1];
        rec.evaluate(theta.cos(), theta.sin(), &mut out);
        out
    }

    #[test]
    fn low_order_closed_forms() {
        let four_pi = 4.0 * PI;
        for &theta in &[0.0, 0.3, 1.0, 1.5707963267948966, 2.5, PI] {
            let (x, s) = (f64::cos(theta), f64::sin(theta));

            let m0 = lambdas(3, 0, theta);
            assert_close(m0[0], (1.0 / four_pi).sqrt(), 1e-14);
            assert_close(m0[1], (3.0 / four_pi).sqrt() * x, 1e-14);
            assert_close(m0[2], (5.0 / four_pi).sqrt() * 0.5 * (3.0 * x * x - 1.0), 1e-14);
            assert_close(
                m0[3],
                (7.0 / four_pi).sqrt() * 0.5 * (5.0 * x * x * x - 3.0 * x),
                1e-14,
            );

            let m1 = lambdas(2, 1, theta);
            assert_close(m1[0], -(3.0 / (2.0 * four_pi)).sqrt() * s, 1e-14);
            assert_close(m1[1], -(15.0 / (2.0 * four_pi)).sqrt() * s * x, 1e-14);

            let m2 = lambdas(2, 2, theta);
            assert_close(m2[0], (15.0 / (8.0 * four_pi)).sqrt() * s * s, 1e-14);
        }
    }

    #[test]
    fn pole_values_vanish_for_nonzero_m() {
        let out = lambdas(10, 3, 0.0);
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalization_by_quadrature() {
        // Gauss-like check: integrate lambda_lm^2 over x with a fine midpoint rule;
        // 2 pi * int lambda^2 dx = 1.
        let n = 20000;
        for &(lmax, m) in &[(6usize, 0usize), (6, 2), (9, 5)] {
            let rec = LegendreRecurrence::new(lmax, m);
            let mut sums = vec![0.0; lmax - m + 1];
            let mut buf = vec![0.0; lmax - m + 1];
            for i in 0..n {
                let x = -1.0 + (i as f64 + 0.5) * 2.0 / n as f64;
                rec.evaluate(x, (1.0 - x * x).sqrt(), &mut buf);
                for (s, v) in sums.iter_mut().zip(&buf) {
                    *s += v * v * 2.0 / n as f64;
                }
            }
            for s in sums {
                assert_close(2.0 * PI * s, 1.0, 1e-5);
            }
        }
    }

    #[test]
    fn large_order_stays_finite() {
        let lmax = 4000;
        let m = 3500;
        let out = lambdas(lmax, m, 0.05);
        assert!(out.iter().all(|v| v.is_finite()));
        // Deep in the evanescent region the values are far below any scale.
        assert_eq!(out[0], 0.0);

        // Near the equator the same order is oscillatory and O(1).
        let out = lambdas(lmax, m, 1.5);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(out.iter().any(|v| v.abs() > 1e-3));
    }
}
