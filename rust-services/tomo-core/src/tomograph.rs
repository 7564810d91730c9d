use std::time::Instant;

use log::{debug, info};
use ndarray::{Array2, ArrayView2};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::filter::RampKernel;
use crate::geometry::PaddedImage;
use crate::projector::{sample_mean, scatter_add, RayBuffer, ScanGeometry};
use crate::snapshot::SnapshotStore;

/// Everything produced by one sweep.
///
/// `result` and `filtered_result` are raw backprojection sums: every ray adds
/// its value to each pixel it crosses, so magnitudes grow with the number of
/// views and detectors. Rescale before display or quantisation
/// (see [`crate::io::rescale_to_unit`]).
#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    /// `views × detectors` mean intensity along each ray.
    pub sinogram: Array2<f64>,
    /// `sinogram` with each row convolved with the ramp kernel.
    pub filtered_sinogram: Array2<f64>,
    /// Unfiltered backprojection, shaped like the padded image.
    pub result: Array2<f64>,
    /// Filtered backprojection, shaped like the padded image.
    pub filtered_result: Array2<f64>,
    /// Progress snapshots of `result`; the last one equals `result`.
    pub storage: Vec<Array2<f64>>,
    /// Progress snapshots of `filtered_result`.
    pub filtered_storage: Vec<Array2<f64>>,
}

impl Reconstruction {
    fn zeroed(views: usize, detectors: usize, image_dim: (usize, usize)) -> Self {
        Self {
            sinogram: Array2::zeros((views, detectors)),
            filtered_sinogram: Array2::zeros((views, detectors)),
            result: Array2::zeros(image_dim),
            filtered_result: Array2::zeros(image_dim),
            storage: vec![],
            filtered_storage: vec![],
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.storage.len()
    }

    /// Snapshot `index` (`0..snapshot_count()`) of either reconstruction.
    pub fn progress(&self, index: usize, filtered: bool) -> Option<&Array2<f64>> {
        if filtered {
            self.filtered_storage.get(index)
        } else {
            self.storage.get(index)
        }
    }

    pub fn sinogram_for(&self, filtered: bool) -> &Array2<f64> {
        if filtered {
            &self.filtered_sinogram
        } else {
            &self.sinogram
        }
    }

    pub fn result_for(&self, filtered: bool) -> &Array2<f64> {
        if filtered {
            &self.filtered_result
        } else {
            &self.result
        }
    }
}

/// Simulated scanner bound to one image and one configuration.
///
/// ```
/// use ndarray::Array2;
/// use tomo_core::{ScanConfig, Tomograph};
///
/// let image = Array2::from_elem((8, 8), 1.0);
/// let mut tomograph = Tomograph::new(&image.view(), ScanConfig::new(45.0, 16, 90.0)).unwrap();
/// let reconstruction = tomograph.process();
/// assert_eq!(reconstruction.sinogram.dim(), (8, 16));
/// assert_eq!(reconstruction.storage.len(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct Tomograph {
    config: ScanConfig,
    image: PaddedImage,
    geometry: ScanGeometry,
    kernel: RampKernel,
    // `None` until the first sweep.
    reconstruction: Option<Reconstruction>,
}

impl Tomograph {
    /// Validate `config` and `image` and take an owned, padded copy of the
    /// image. Nothing is computed until [`process`](Self::process).
    pub fn new(image: &ArrayView2<f64>, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let image = PaddedImage::new(image)?;
        let geometry = ScanGeometry::new(&config, image.radius());
        Ok(Self {
            config,
            image,
            geometry,
            kernel: RampKernel::new(),
            reconstruction: None,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn padded_image(&self) -> &PaddedImage {
        &self.image
    }

    pub fn geometry(&self) -> &ScanGeometry {
        &self.geometry
    }

    pub fn kernel(&self) -> &RampKernel {
        &self.kernel
    }

    pub fn is_processed(&self) -> bool {
        self.reconstruction.is_some()
    }

    /// Outputs of the last [`process`](Self::process) call, if any.
    pub fn reconstruction(&self) -> Option<&Reconstruction> {
        self.reconstruction.as_ref()
    }

    /// Run the full sweep. Always starts from zeroed buffers, so repeated
    /// calls give bit-identical results.
    pub fn process(&mut self) -> &Reconstruction {
        self.process_with_progress(|_, _| {})
    }

    /// As [`process`](Self::process), calling `on_view(done, total)` after
    /// each view.
    pub fn process_with_progress(
        &mut self,
        on_view: impl FnMut(usize, usize),
    ) -> &Reconstruction {
        let start = Instant::now();
        let reconstruction = self.sweep(on_view);
        info!(
            "swept {} views x {} detectors in {:.1} ms",
            self.geometry.views(),
            self.geometry.detectors(),
            start.elapsed().as_secs_f64() * 1e3
        );
        self.reconstruction.insert(reconstruction)
    }

    fn sweep(&self, mut on_view: impl FnMut(usize, usize)) -> Reconstruction {
        let g = &self.geometry;
        let (views, detectors) = (g.views(), g.detectors());
        let image = self.image.data().view();
        debug!(
            "sweep: image {:?} padded to {:?} (radius {}), {} views, {} detectors, {} snapshots",
            self.image.original_dim(),
            self.image.dim(),
            g.radius(),
            views,
            detectors,
            self.config.snapshot_count()
        );

        let mut out = Reconstruction::zeroed(views, detectors, self.image.dim());
        let mut snapshots = SnapshotStore::new(views, self.config.snapshot_count());
        let mut ray = RayBuffer::new();

        for view in 0..views {
            for detector in 0..detectors {
                g.ray_into(view, detector, &mut ray);
                let value = sample_mean(&image, &ray);
                out.sinogram[[view, detector]] = value;
                scatter_add(&mut out.result, &ray, value);
            }

            let filtered = self.kernel.convolve_same(&out.sinogram.row(view));
            out.filtered_sinogram.row_mut(view).assign(&filtered);

            for detector in 0..detectors {
                g.ray_into(view, detector, &mut ray);
                scatter_add(&mut out.filtered_result, &ray, filtered[detector]);
            }

            snapshots.observe(view, &out.result, &out.filtered_result);
            on_view(view + 1, views);
        }

        let (storage, filtered_storage) = snapshots.into_parts();
        out.storage = storage;
        out.filtered_storage = filtered_storage;
        out
    }
}
