//! Fan-beam ray geometry, forward projection and backprojection.
//!
//! For view `v` the gantry sits at rotation `π + (v + 1)·step`. Detector `d`
//! fires a ray from an emitter on one side of the bounding circle to a
//! detector on the opposite side; the `detectors` rays of one view are spread
//! evenly over `bandwidth`.

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};

use crate::config::ScanConfig;
use crate::raster::{circle_point, line_nd_into};

/// `[row, col]` of a pixel in the padded buffer.
pub type Pixel = [usize; 2];

/// Reusable storage for the pixels of one ray. Rays are recomputed for every
/// use, so the buffer is cleared and refilled rather than reallocated.
#[derive(Clone, Debug, Default)]
pub struct RayBuffer {
    cells: Vec<[i64; 2]>,
}

impl RayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.cells.iter().map(|&[row, col]| {
            debug_assert!(row >= 0 && col >= 0, "ray left the padded buffer");
            [row as usize, col as usize]
        })
    }
}

/// Angles and ray endpoints derived from a validated [`ScanConfig`] and the
/// radius of the padded image.
#[derive(Clone, Copy, Debug)]
pub struct ScanGeometry {
    radius: usize,
    views: usize,
    detectors: usize,
    step_rad: f64,
    bandwidth_rad: f64,
}

impl ScanGeometry {
    pub fn new(config: &ScanConfig, radius: usize) -> Self {
        Self {
            radius,
            views: config.views(),
            detectors: config.detectors,
            step_rad: config.step_rad(),
            bandwidth_rad: config.bandwidth_rad(),
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }
    pub fn views(&self) -> usize {
        self.views
    }
    pub fn detectors(&self) -> usize {
        self.detectors
    }

    /// Gantry rotation of view `view`, in radians.
    pub fn rotation(&self, view: usize) -> f64 {
        PI + (view + 1) as f64 * self.step_rad
    }

    fn detector_spacing(&self) -> f64 {
        self.bandwidth_rad / (self.detectors - 1) as f64
    }

    pub fn emitter_angle(&self, view: usize, detector: usize) -> f64 {
        self.rotation(view) - self.bandwidth_rad / 2.0 + detector as f64 * self.detector_spacing()
    }

    pub fn detector_angle(&self, view: usize, detector: usize) -> f64 {
        self.rotation(view) + PI + self.bandwidth_rad / 2.0
            - detector as f64 * self.detector_spacing()
    }

    /// Rasterize the ray of (`view`, `detector`) into `ray`.
    pub fn ray_into(&self, view: usize, detector: usize, ray: &mut RayBuffer) {
        let emitter = circle_point(self.radius, self.emitter_angle(view, detector));
        let sensor = circle_point(self.radius, self.detector_angle(view, detector));
        line_nd_into(&mut ray.cells, emitter, sensor);
    }

    /// Convenience wrapper around [`ray_into`](Self::ray_into).
    pub fn ray(&self, view: usize, detector: usize) -> Vec<Pixel> {
        let mut ray = RayBuffer::new();
        self.ray_into(view, detector, &mut ray);
        ray.pixels().collect()
    }
}

/// Mean of `image` over the pixels of `ray`.
///
/// Rays always hold at least one pixel (coincident endpoints give a single
/// cell), so the mean is always defined.
pub fn sample_mean(image: &ArrayView2<f64>, ray: &RayBuffer) -> f64 {
    debug_assert!(!ray.is_empty());
    let sum: f64 = ray.pixels().map(|p| image[p]).sum();
    sum / ray.len() as f64
}

/// Add `value` to every pixel of `ray`. Pixels visited by several rays keep
/// accumulating; nothing here normalizes by hit count.
pub fn scatter_add(accumulator: &mut Array2<f64>, ray: &RayBuffer, value: f64) {
    for p in ray.pixels() {
        accumulator[p] += value;
    }
}
