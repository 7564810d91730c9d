//! Spatial-domain ramp filter applied to each sinogram row before it is
//! backprojected.

use std::f64::consts::PI;

use ndarray::{Array1, ArrayView1};

/// Number of taps on each side of the centre.
pub const HALF_WIDTH: usize = 10;

/// Discrete ramp (Ram-Lak) kernel, `2 * HALF_WIDTH + 1` taps:
/// `h(0) = 1`, `h(k) = 0` for even `k`, `h(k) = -4 / (π² k²)` for odd `k`.
#[derive(Clone, Debug, PartialEq)]
pub struct RampKernel {
    taps: [f64; 2 * HALF_WIDTH + 1],
}

impl Default for RampKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl RampKernel {
    pub fn new() -> Self {
        let mut taps = [0.0; 2 * HALF_WIDTH + 1];
        taps[HALF_WIDTH] = 1.0;
        for k in (1..=HALF_WIDTH).step_by(2) {
            let h = -4.0 / (PI * PI * (k * k) as f64);
            taps[HALF_WIDTH + k] = h;
            taps[HALF_WIDTH - k] = h;
        }
        Self { taps }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Coefficient at signed `offset` from the centre; zero outside the support.
    pub fn at(&self, offset: isize) -> f64 {
        if offset.unsigned_abs() > HALF_WIDTH {
            return 0.0;
        }
        self.taps[(HALF_WIDTH as isize + offset) as usize]
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Centred convolution returning a row of the same length as `row`.
    /// Samples beyond either end of `row` count as zero.
    pub fn convolve_same(&self, row: &ArrayView1<f64>) -> Array1<f64> {
        let n = row.len() as isize;
        let half = HALF_WIDTH as isize;
        Array1::from_shape_fn(row.len(), |i| {
            let i = i as isize;
            let lo = (i - half).max(0);
            let hi = (i + half).min(n - 1);
            (lo..=hi).map(|j| self.at(i - j) * row[j as usize]).sum()
        })
    }
}
