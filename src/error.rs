//! Error types for pixelization, transforms and queries.
//!
//! Two failure classes exist. [`HarmonicError::Domain`] covers parameters
//! outside their mathematical domain (nside, lmax/mmax, angles, radii, pixel
//! indices). [`HarmonicError::Allocation`] covers buffers whose length does
//! not match the size implied by the resolution or band limit.
//!
//! Numerical inaccuracy (too few refinement iterations, aliasing from an
//! lmax that is large for the resolution) is never reported as an error.

use thiserror::Error;

/// Unified error type for the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarmonicError {
    /// A parameter lies outside its valid domain.
    #[error("domain error in {operation}: {message}")]
    Domain {
        operation: &'static str,
        message: String,
    },

    /// A buffer length disagrees with the length implied by its parameters.
    #[error("buffer size mismatch for {what}: expected {expected} elements, got {actual}")]
    Allocation {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarmonicError>;

impl HarmonicError {
    /// Create a domain error for `operation`.
    pub fn domain(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Domain {
            operation,
            message: message.into(),
        }
    }

    /// Create a buffer size mismatch error.
    pub fn allocation(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::Allocation {
            what,
            expected,
            actual,
        }
    }

    /// True for [`HarmonicError::Domain`].
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    /// True for [`HarmonicError::Allocation`].
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::Allocation { .. })
    }
}
