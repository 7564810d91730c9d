//! File glue around the engine: decoding input images, rescaling the
//! unbounded accumulators for display, and persisting results.
//!
//! - `load_grayscale`: PNG/JPEG/… (or `.npy`) into a `[0, 1]` grid.
//! - `rescale_to_unit`: min–max normalisation.
//! - `save_grayscale_png`: rescale and write an 8-bit PNG.
//! - `write_reconstruction_npz`: every output array in one archive.
//! - `RunReport`: JSON summary of a run.

use std::fs::{self, File};
use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2};
use ndarray_npy::{read_npy, NpzWriter};
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::{Result, TomoError};
use crate::tomograph::{Reconstruction, Tomograph};

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> TomoError + '_ {
    move |source| TomoError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn npy_err(path: &Path, e: impl std::fmt::Display) -> TomoError {
    TomoError::Npy {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn image_err(path: &Path, e: image::ImageError) -> TomoError {
    TomoError::Image {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Read an intensity grid.
///
/// `.npy` files are loaded as-is (2-D `f64`). Anything else is decoded as a
/// picture, converted to 16-bit luma and scaled into `[0, 1]`.
pub fn load_grayscale(path: &Path) -> Result<Array2<f64>> {
    let is_npy = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("npy"));
    if is_npy {
        return read_npy(path).map_err(|e| npy_err(path, e));
    }
    let luma = image::open(path).map_err(|e| image_err(path, e))?.into_luma16();
    let (w, h) = luma.dimensions();
    Ok(Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        luma.get_pixel(col as u32, row as u32)[0] as f64 / u16::MAX as f64
    }))
}

/// Min–max rescale into `[0, 1]`. A constant grid maps to all zeros.
pub fn rescale_to_unit(grid: &ArrayView2<f64>) -> Array2<f64> {
    let (lo, hi) = grid
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 {
        return Array2::zeros(grid.raw_dim());
    }
    grid.mapv(|v| (v - lo) / span)
}

/// Rescale `grid` and write it as an 8-bit grayscale PNG, creating parent
/// directories as needed.
pub fn save_grayscale_png(grid: &ArrayView2<f64>, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let unit = rescale_to_unit(grid);
    let (h, w) = unit.dim();
    let out = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([(unit[[y as usize, x as usize]] * 255.0).round().clamp(0.0, 255.0) as u8])
    });
    out.save(path).map_err(|e| image_err(path, e))
}

/// Store all outputs of a sweep. Snapshots are named `storage_<i>` and
/// `filtered_storage_<i>`.
pub fn write_reconstruction_npz(reconstruction: &Reconstruction, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(io_err(path))?;
    let mut npz = NpzWriter::new(file);
    let named = [
        ("sinogram", &reconstruction.sinogram),
        ("filtered_sinogram", &reconstruction.filtered_sinogram),
        ("result", &reconstruction.result),
        ("filtered_result", &reconstruction.filtered_result),
    ];
    for (name, array) in named {
        npz.add_array(name, array).map_err(|e| npy_err(path, e))?;
    }
    for (i, snapshot) in reconstruction.storage.iter().enumerate() {
        npz.add_array(format!("storage_{i}"), snapshot).map_err(|e| npy_err(path, e))?;
    }
    for (i, snapshot) in reconstruction.filtered_storage.iter().enumerate() {
        npz.add_array(format!("filtered_storage_{i}"), snapshot)
            .map_err(|e| npy_err(path, e))?;
    }
    npz.finish().map_err(|e| npy_err(path, e))?;
    Ok(())
}

/// Free-text study attributes attached to a run's report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_date: Option<String>,
}

impl StudyMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// JSON summary written next to the arrays of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub config: ScanConfig,
    pub views: usize,
    pub snapshots: usize,
    pub radius: usize,
    pub original_shape: [usize; 2],
    pub padded_shape: [usize; 2],
    /// `[row, col]` of the original image inside the padded grid.
    pub offset: [usize; 2],
    pub elapsed_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study: Option<StudyMetadata>,
}

impl RunReport {
    pub fn new(tomograph: &Tomograph, elapsed_ms: f64, study: StudyMetadata) -> Self {
        let padded = tomograph.padded_image();
        let (h, w) = padded.dim();
        Self {
            config: *tomograph.config(),
            views: tomograph.geometry().views(),
            snapshots: tomograph.config().snapshot_count(),
            radius: padded.radius(),
            original_shape: padded.original_dim(),
            padded_shape: [h, w],
            offset: padded.offset(),
            elapsed_ms,
            study: (!study.is_empty()).then_some(study),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json_file(path, self)
    }
}

/// Pretty-print a serializable value to disk.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value).map_err(|source| TomoError::Json {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, json).map_err(io_err(path))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(io_err(parent))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::{write_npy, NpzReader};

    #[test]
    fn rescale_maps_extremes_to_unit_interval() {
        let grid = array![[-2.0, 0.0], [2.0, 6.0]];
        assert_eq!(rescale_to_unit(&grid.view()), array![[0.0, 0.25], [0.5, 1.0]]);
    }

    #[test]
    fn rescale_of_constant_grid_is_zero() {
        let grid = Array2::from_elem((3, 2), 7.5);
        assert_eq!(rescale_to_unit(&grid.view()), Array2::<f64>::zeros((3, 2)));
    }

    #[test]
    fn png_round_trip_preserves_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ramp.png");
        let grid = array![[0.0, 10.0, 20.0], [30.0, 40.0, 50.0]];
        save_grayscale_png(&grid.view(), &path).unwrap();
        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.dim(), (2, 3));
        assert_eq!(loaded[[0, 0]], 0.0);
        assert_eq!(loaded[[1, 2]], 1.0);
        let flat: Vec<f64> = loaded.iter().copied().collect();
        assert!(flat.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn npy_input_is_loaded_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.npy");
        let grid = array![[0.5, 1.5], [2.5, -3.0]];
        write_npy(&path, &grid).unwrap();
        assert_eq!(load_grayscale(&path).unwrap(), grid);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_grayscale(&dir.path().join("absent.png")).is_err());
    }

    #[test]
    fn npz_holds_every_output() {
        let image = Array2::from_elem((4, 4), 1.0);
        let mut tomograph = Tomograph::new(&image.view(), ScanConfig::new(90.0, 5, 60.0)).unwrap();
        let reconstruction = tomograph.process().clone();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.npz");
        write_reconstruction_npz(&reconstruction, &path).unwrap();

        let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(npz.len(), 4 + 2 * 4);
        let sinogram: Array2<f64> = npz.by_name("sinogram").unwrap();
        assert_eq!(sinogram, reconstruction.sinogram);
        let last: Array2<f64> = npz.by_name("filtered_storage_3").unwrap();
        assert_eq!(last, reconstruction.filtered_result);
    }

    #[test]
    fn report_omits_empty_study() {
        let image = Array2::from_elem((3, 5), 1.0);
        let tomograph = Tomograph::new(&image.view(), ScanConfig::default()).unwrap();
        let report = RunReport::new(&tomograph, 1.0, StudyMetadata::default());
        assert_eq!(report.views, 45);
        assert_eq!(report.original_shape, [3, 5]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("study").is_none());

        let study = StudyMetadata {
            patient_id: Some("123456".into()),
            ..Default::default()
        };
        let report = RunReport::new(&tomograph, 1.0, study.clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.write(&path).unwrap();
        let back: RunReport = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.study, Some(study));
    }
}
