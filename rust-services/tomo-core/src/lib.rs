//! Simulated CT acquisition and reconstruction.
//!
//! A 2-D intensity image is zero-padded so that a circle around it fits
//! inside the buffer. For each of `floor(360 / step)` rotations a fan of
//! rays is cast between opposite points of that circle; the mean intensity
//! along each ray forms one sinogram entry. Each value is immediately
//! backprojected (scattered back along its ray) into an unfiltered
//! reconstruction, and each sinogram row, once ramp-filtered, into a second,
//! filtered reconstruction. Up to ten evenly spaced snapshots of both
//! reconstructions are kept to show how quality improves with angular
//! coverage.
//!
//! The reconstructions are plain sums, never normalised. Use
//! [`io::rescale_to_unit`] (or your own scaling) before display.

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod io;
pub mod projector;
pub mod raster;
pub mod snapshot;
pub mod tomograph;

pub use crate::config::{ScanConfig, MAX_SNAPSHOTS};
pub use crate::error::{Result, TomoError};
pub use crate::filter::RampKernel;
pub use crate::geometry::PaddedImage;
pub use crate::projector::{Pixel, RayBuffer, ScanGeometry};
pub use crate::tomograph::{Reconstruction, Tomograph};
