//! Floating-point precision selection.
//!
//! Maps and coefficient sets are generic over [`Real`], implemented for `f32`
//! and `f64`. Precision is chosen per call by the element type of the
//! buffers; the transform kernels always accumulate in `f64` and narrow the
//! result back to the caller's precision.

use std::fmt::Debug;

use num_traits::Float;

/// Scalar type accepted by maps and coefficient containers.
pub trait Real: Float + Debug + Default + Send + Sync + 'static {
    /// Widen to `f64`.
    fn widen(self) -> f64;
    /// Narrow from `f64` (rounds to nearest for `f32`).
    fn narrow(v: f64) -> Self;
}

impl Real for f32 {
    #[inline]
    fn widen(self) -> f64 {
        self as f64
    }

    #[inline]
    fn narrow(v: f64) -> Self {
        v as f32
    }
}

impl Real for f64 {
    #[inline]
    fn widen(self) -> f64 {
        self
    }

    #[inline]
    fn narrow(v: f64) -> Self {
        v
    }
}
