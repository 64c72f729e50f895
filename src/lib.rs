//! HEALPix pixelization and scalar spherical harmonic transforms.
//!
//! Skyharmonics converts between a pixel-domain representation of a scalar
//! field on the sphere ([`SphereMap`]) and its harmonic coefficients
//! ([`Alm`]), and answers pixel queries against the HEALPix grid
//! (bilinear interpolation and disc searches).

pub mod alm;
pub mod buffer;
pub mod error;
pub mod geom;
pub mod healpix;
pub mod map;
pub mod query;
pub mod real;
pub mod sht;

pub use alm::{Alm, num_alm};
pub use error::{HarmonicError, Result};
pub use healpix::PixelOrdering;
pub use map::{SphereMap, UNSEEN};
pub use query::{interpolate, interpolation_weights, query_disc};
pub use real::Real;
pub use sht::{RingWeights, TransformConfig, alm2map, map2alm, map2alm_with};
