//! Detector input construction.
//!
//! The detector expects a fixed-size, channel-first RGB tensor with values
//! in `[0, 1]`.

use ndarray::Array3;

use super::ImageSize;
use crate::error::{PerturbError, Result};
use crate::filters::resize::resize_bilinear_u8;
use crate::image::{ChannelOrder, ThermalImage};

/// Resize `image` to `size`, convert to RGB and lay it out as
/// `(3, height, width)` f32 in `[0, 1]`.
///
/// # Errors
/// `InvalidInferenceSize` if `size` has a zero dimension.
pub fn to_inference_tensor(image: &ThermalImage, size: ImageSize) -> Result<Array3<f32>> {
    if size.is_empty() {
        return Err(PerturbError::InvalidInferenceSize {
            height: size.height,
            width: size.width,
        });
    }

    let rgb = image.to_order(ChannelOrder::Rgb);
    let resized = resize_bilinear_u8(rgb.view(), size.height, size.width);

    Ok(Array3::from_shape_fn((3, size.height, size.width), |(c, y, x)| {
        resized[[y, x, c]] as f32 / 255.0
    }))
}
