//! WebAssembly exports for thermal perturbations.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images cross
//! the boundary as flat RGB bytes in row-major order.

use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use crate::detection::{DetectionPostprocessor, ImageSize, RawDetections};
use crate::image::{ChannelOrder, ThermalImage};
use crate::pipeline::{PerturbationKind, PerturbationPipeline};

fn js_error(err: impl fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Apply a named perturbation to an RGB image.
///
/// # Arguments
/// * `data` - Flat array of RGB bytes (length = width * height * 3)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `kind` - "none", "snow" or "fog"
/// * `intensity` - Effect strength, nominally 0.0-1.0
/// * `seed` - Seed for the noise generator
///
/// # Returns
/// Flat array of RGB bytes with the same dimensions
#[wasm_bindgen]
pub fn apply_perturbation_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    kind: &str,
    intensity: f32,
    seed: u64,
) -> Result<Vec<u8>, JsValue> {
    let kind: PerturbationKind = kind.parse().map_err(js_error)?;
    let image = ThermalImage::from_raw(data.to_vec(), width, height, 3, ChannelOrder::Rgb)
        .map_err(js_error)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let result = PerturbationPipeline::default().apply(&image, kind, intensity, &mut rng);
    Ok(result.into_array().into_raw_vec_and_offset().0)
}

/// Filter detections by confidence and rescale boxes to the source image.
///
/// # Arguments
/// * `boxes` - Flat x1, y1, x2, y2 quadruples in inference pixels
/// * `scores` - One score per box
/// * `labels` - One class label per box
///
/// # Returns
/// Kept detections as flat `x1, y1, x2, y2, score, label` sextuples in
/// source pixels, in detector order. The count is `length / 6`.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn postprocess_detections_wasm(
    boxes: &[f32],
    scores: &[f32],
    labels: &[i64],
    inference_height: usize,
    inference_width: usize,
    original_height: usize,
    original_width: usize,
    threshold: f32,
) -> Result<Vec<f32>, JsValue> {
    let raw = RawDetections::from_flat(boxes, scores, labels).map_err(js_error)?;
    let inference = ImageSize::new(inference_height, inference_width);
    let original = ImageSize::new(original_height, original_width);

    let result = DetectionPostprocessor::new(threshold)
        .process(&raw, inference, original)
        .map_err(js_error)?;
    Ok(result.to_flat())
}
