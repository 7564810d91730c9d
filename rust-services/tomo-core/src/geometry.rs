//! Bounding circle and zero padding.
//!
//! Every ray endpoint lies on a circle of radius `r` centred on the image.
//! The image is embedded in a zero buffer big enough that the circle (and
//! hence every rasterized ray) stays inside it.

use ndarray::{s, Array2, ArrayView2};

use crate::error::{Result, TomoError};

/// Smallest integer radius that encloses the whole image:
/// `ceil(sqrt((h/2)² + (w/2)²))`.
pub fn radius(image: &ArrayView2<f64>) -> usize {
    let (h, w) = image.dim();
    let (h, w) = (h as f64, w as f64);
    (h * h / 4.0 + w * w / 4.0).sqrt().ceil() as usize
}

/// Low and high padding for one axis of length `dim`.
///
/// Integer division makes odd and even lengths pad asymmetrically: the
/// high side always gets one more row/column than the low side.
pub fn axis_padding(dim: usize, radius: usize) -> (usize, usize) {
    let low = radius - dim / 2;
    (low, low + 1)
}

/// Copy `image` into a zero buffer padded for `radius`.
pub fn pad(image: &ArrayView2<f64>, radius: usize) -> Array2<f64> {
    let (h, w) = image.dim();
    let (top, bottom) = axis_padding(h, radius);
    let (left, right) = axis_padding(w, radius);
    let mut padded = Array2::zeros((top + h + bottom, left + w + right));
    padded
        .slice_mut(s![top..top + h, left..left + w])
        .assign(image);
    padded
}

/// An owned, padded copy of the input image together with the data needed
/// to map back to the original region.
#[derive(Clone, Debug)]
pub struct PaddedImage {
    data: Array2<f64>,
    radius: usize,
    offset: [usize; 2],
    original_dim: [usize; 2],
}

impl PaddedImage {
    /// Validate and pad `image`. The caller's buffer is only read.
    pub fn new(image: &ArrayView2<f64>) -> Result<Self> {
        let (h, w) = image.dim();
        if h == 0 || w == 0 {
            return Err(TomoError::input(format!("image has zero extent ({h}x{w})")));
        }
        if let Some(((row, col), value)) = image.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(TomoError::input(format!(
                "non-finite sample {value} at ({row}, {col})"
            )));
        }
        let radius = radius(image);
        Ok(Self {
            data: pad(image, radius),
            radius,
            offset: [axis_padding(h, radius).0, axis_padding(w, radius).0],
            original_dim: [h, w],
        })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// `[row, col]` of the original image's top-left pixel in the buffer.
    pub fn offset(&self) -> [usize; 2] {
        self.offset
    }

    pub fn original_dim(&self) -> [usize; 2] {
        self.original_dim
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// View of the original-image region of any grid shaped like this one
    /// (the padded image itself, an accumulator, a snapshot).
    pub fn crop<'a>(&self, grid: &'a Array2<f64>) -> ArrayView2<'a, f64> {
        let [top, left] = self.offset;
        let [h, w] = self.original_dim;
        grid.slice(s![top..top + h, left..left + w])
    }
}
