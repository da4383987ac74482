//! Thermal Perturb
//!
//! Synthetic weather degradation for thermal camera frames, plus the glue
//! needed to measure how an object detector copes with it. Python bindings
//! via PyO3 and WASM bindings for JavaScript are available behind the
//! `python` and `wasm` features.
//!
//! ## Image Format
//! Frames are `u8` arrays laid out as (height, width, channels):
//! - **Grayscale**: (height, width) or (height, width, 1) - promoted to 3 channels on input
//! - **RGB / BGR**: (height, width, 3) - order tracked by [`ChannelOrder`]
//!
//! Noise fields and masks are `f32` arrays of shape (height, width).
//!
//! ## Layout
//! - [`effects`] - noise field synthesis, snow and fog/smoke
//! - [`pipeline`] - kind + intensity dispatch, random perturbation
//! - [`detection`] - pre/postprocessing around an external detector,
//!   model registry and robustness reports
//! - [`filters`] - blur, resize and drawing primitives shared by the above
//!
//! ## Randomness
//! Every random draw goes through a caller-supplied `RngCore`. Seed a
//! `StdRng` for reproducible output.

pub mod config;
pub mod detection;
pub mod effects;
pub mod error;
pub mod filters;
pub mod image;
pub mod pipeline;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{EngineConfig, IntensityPolicy};
pub use error::{PerturbError, Result};
pub use image::{ChannelOrder, Field, ThermalImage};
pub use pipeline::{PerturbationKind, PerturbationPipeline};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::Array2;
    use numpy::{
        IntoPyArray, PyArray1, PyArray2, PyArray3, PyReadonlyArray1, PyReadonlyArray2,
        PyReadonlyArrayDyn,
    };
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::detection::{BoundingBox, DetectionPostprocessor, ImageSize, RawDetections};
    use crate::error::PerturbError;
    use crate::image::{ChannelOrder, ThermalImage};
    use crate::pipeline::{PerturbationKind, PerturbationPipeline};

    impl From<PerturbError> for PyErr {
        fn from(err: PerturbError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    fn make_rng(seed: Option<u64>) -> StdRng {
        match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn perturb<'py>(
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        kind: PerturbationKind,
        intensity: f32,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let image = ThermalImage::from_dyn(image.as_array(), ChannelOrder::Bgr)?;
        let mut rng = make_rng(seed);
        let result = PerturbationPipeline::default().apply(&image, kind, intensity, &mut rng);
        Ok(result.into_array().into_pyarray(py))
    }

    // ========================================================================
    // Perturbations
    // ========================================================================

    /// Overlay multi-scale snow on a (H, W) or (H, W, 1|3) u8 image.
    ///
    /// Output is always 3-channel.
    #[pyfunction]
    #[pyo3(signature = (image, intensity=0.7, seed=None))]
    pub fn apply_snow<'py>(
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        intensity: f32,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        perturb(py, image, PerturbationKind::Snow, intensity, seed)
    }

    /// Blend a low-frequency fog/smoke layer over a (H, W) or (H, W, 1|3) u8 image.
    #[pyfunction]
    #[pyo3(signature = (image, intensity=0.75, seed=None))]
    pub fn apply_smoke<'py>(
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        intensity: f32,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        perturb(py, image, PerturbationKind::Fog, intensity, seed)
    }

    /// Apply a perturbation by name: "none", "snow" or "fog".
    #[pyfunction]
    #[pyo3(signature = (image, kind, intensity=0.6, seed=None))]
    pub fn apply_perturbation<'py>(
        py: Python<'py>,
        image: PyReadonlyArrayDyn<'py, u8>,
        kind: &str,
        intensity: f32,
        seed: Option<u64>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let kind: PerturbationKind = kind.parse()?;
        perturb(py, image, kind, intensity, seed)
    }

    // ========================================================================
    // Detection postprocessing
    // ========================================================================

    /// Filter detections by confidence and rescale boxes to the source image.
    ///
    /// # Arguments
    /// * `boxes` - (N, 4) x1, y1, x2, y2 in inference pixels
    /// * `inference_size` - (height, width) the detector ran at
    /// * `original_size` - (height, width) of the source image
    ///
    /// # Returns
    /// Tuple of (boxes (M, 4), scores (M,), labels (M,))
    #[pyfunction]
    #[pyo3(signature = (boxes, scores, labels, inference_size, original_size, threshold=0.5))]
    #[allow(clippy::type_complexity)]
    pub fn postprocess_detections<'py>(
        py: Python<'py>,
        boxes: PyReadonlyArray2<'py, f32>,
        scores: PyReadonlyArray1<'py, f32>,
        labels: PyReadonlyArray1<'py, i64>,
        inference_size: (usize, usize),
        original_size: (usize, usize),
        threshold: f32,
    ) -> PyResult<(
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray1<f32>>,
        Bound<'py, PyArray1<i64>>,
    )> {
        let boxes = boxes.as_array();
        if boxes.ncols() != 4 {
            return Err(PyValueError::new_err(format!(
                "boxes must have shape (N, 4), got (N, {})",
                boxes.ncols()
            )));
        }
        let boxes: Vec<BoundingBox> = boxes
            .rows()
            .into_iter()
            .map(|r| [r[0], r[1], r[2], r[3]])
            .collect();

        let raw = RawDetections::new(
            boxes,
            scores.as_array().to_vec(),
            labels.as_array().to_vec(),
        )?;
        let result = DetectionPostprocessor::new(threshold).process(
            &raw,
            ImageSize::new(inference_size.0, inference_size.1),
            ImageSize::new(original_size.0, original_size.1),
        )?;

        Ok((
            Array2::from(result.boxes).into_pyarray(py),
            result.scores.into_pyarray(py),
            result.labels.into_pyarray(py),
        ))
    }

    /// Thermal perturbation extension module
    #[pymodule]
    pub fn thermal_perturb(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(apply_snow, m)?)?;
        m.add_function(wrap_pyfunction!(apply_smoke, m)?)?;
        m.add_function(wrap_pyfunction!(apply_perturbation, m)?)?;
        m.add_function(wrap_pyfunction!(postprocess_detections, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::thermal_perturb;
