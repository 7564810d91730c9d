use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TomoError};

/// Upper bound on the number of progress snapshots kept per sweep.
pub const MAX_SNAPSHOTS: usize = 10;

/// Scanner parameters, fixed for the lifetime of a [`crate::Tomograph`].
///
/// Angles are in degrees. `step` is the rotation between consecutive
/// views, `bandwidth` the fan spread between the first and last detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub step: f64,
    #[serde(alias = "no_of_detectors")]
    pub detectors: usize,
    pub bandwidth: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step: 8.0,
            detectors: 100,
            bandwidth: 90.0,
        }
    }
}

impl ScanConfig {
    pub fn new(step: f64, detectors: usize, bandwidth: f64) -> Self {
        Self {
            step,
            detectors,
            bandwidth,
        }
    }

    /// Read a JSON config file. Missing fields fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| TomoError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| TomoError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Number of rotation views in a full 360° sweep.
    ///
    /// Only meaningful once [`validate`](Self::validate) has accepted `step`.
    pub fn views(&self) -> usize {
        (360.0 / self.step).floor() as usize
    }

    pub fn snapshot_count(&self) -> usize {
        self.views().min(MAX_SNAPSHOTS)
    }

    pub fn step_rad(&self) -> f64 {
        self.step.to_radians()
    }

    pub fn bandwidth_rad(&self) -> f64 {
        self.bandwidth.to_radians()
    }

    /// Reject parameters that would divide by zero in the detector spacing
    /// or the snapshot checkpoint arithmetic.
    pub fn validate(&self) -> Result<()> {
        if !self.step.is_finite() || self.step <= 0.0 || self.step > 360.0 {
            return Err(TomoError::config(format!(
                "step must be in (0, 360] degrees, got {}",
                self.step
            )));
        }
        if self.detectors < 2 {
            return Err(TomoError::config(format!(
                "at least 2 detectors are required, got {}",
                self.detectors
            )));
        }
        let views_exact = (360.0 / self.step).floor();
        if views_exact >= usize::MAX as f64 {
            return Err(TomoError::config(format!(
                "step {} yields more views than can be addressed",
                self.step
            )));
        }
        let views = self.views();
        if views < 2 {
            return Err(TomoError::config(format!(
                "step {} yields {} view(s); at least 2 are required",
                self.step, views
            )));
        }
        match views.checked_mul(self.detectors) {
            Some(cells) if cells <= isize::MAX as usize => {}
            _ => {
                return Err(TomoError::config(format!(
                    "a {views} x {} sinogram does not fit in memory",
                    self.detectors
                )))
            }
        }
        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            return Err(TomoError::config(format!(
                "bandwidth must be a positive angle, got {}",
                self.bandwidth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ step, views, snapshots,
             case(  8.0,   45, 10),
             case(180.0,    2,  2),
             case( 90.0,    4,  4),
             case( 36.0,   10, 10),
             case(  7.0,   51, 10),
             case(  0.5,  720, 10),
    )]
    fn views_and_snapshots(step: f64, views: usize, snapshots: usize) {
        let config = ScanConfig { step, ..Default::default() };
        assert!(config.validate().is_ok());
        assert_eq!(config.views(), views);
        assert_eq!(config.snapshot_count(), snapshots);
    }

    #[rstest(/**/ step, detectors, bandwidth,
             case(200.0, 10,  90.0), // a single view
             case(360.0, 10,  90.0),
             case(  0.0, 10,  90.0),
             case( -5.0, 10,  90.0),
             case(f64::NAN, 10, 90.0),
             case(  8.0,  1,  90.0),
             case(  8.0,  0,  90.0),
             case(  8.0, 10,   0.0),
             case(  8.0, 10, -10.0),
             case(  8.0, 10, f64::INFINITY),
             case(1e-300, 10,  90.0), // view count overflows usize
             case(  1e-9, usize::MAX, 90.0), // sinogram size overflows
    )]
    fn rejects_degenerate_configuration(step: f64, detectors: usize, bandwidth: f64) {
        let err = ScanConfig::new(step, detectors, bandwidth).validate().unwrap_err();
        assert!(matches!(err, TomoError::InvalidConfiguration { .. }), "{err}");
    }

    #[test]
    fn oversized_sweep_is_rejected_before_processing() {
        let image = ndarray::Array2::from_elem((2, 2), 1.0);
        let config = ScanConfig::new(1e-300, 2, 90.0);
        let err = crate::Tomograph::new(&image.view(), config).unwrap_err();
        assert!(matches!(err, TomoError::InvalidConfiguration { .. }), "{err}");
    }

    #[test]
    fn deserialize_accepts_original_field_name() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"step": 2.0, "no_of_detectors": 180}"#).unwrap();
        assert_eq!(config, ScanConfig::new(2.0, 180, 90.0));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{"step": 4.5, "detectors": 64, "bandwidth": 120}"#).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap(), ScanConfig::new(4.5, 64, 120.0));
    }

    #[test]
    fn load_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, "{ step: ").unwrap();
        assert!(matches!(ScanConfig::load(&path), Err(TomoError::Json { .. })));
    }
}
