//! Resampling filters.
//!
//! - **Cubic** upsampling of float fields, used to turn a coarse random grid
//!   into a smooth full-resolution noise field
//! - **Bilinear** resizing of 8-bit images, used to build detector input
//!
//! Both use half-pixel centers (`src = (dst + 0.5) * scale - 0.5`) and clamp
//! sample taps to the image edge.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use rayon::prelude::*;

use super::core::cubic_weights;

const CUBIC_A: f32 = -0.75;

/// Source taps and weights for one output coordinate.
struct Taps<const N: usize> {
    index: [usize; N],
    weight: [f32; N],
}

fn cubic_taps(out_len: usize, in_len: usize) -> Vec<Taps<4>> {
    let scale = in_len as f32 / out_len as f32;
    let last = in_len as isize - 1;
    (0..out_len)
        .map(|d| {
            let f = (d as f32 + 0.5) * scale - 0.5;
            let s = f.floor();
            let weight = cubic_weights(f - s, CUBIC_A);
            let s = s as isize;
            let mut index = [0usize; 4];
            for (k, slot) in index.iter_mut().enumerate() {
                *slot = (s + k as isize - 1).clamp(0, last) as usize;
            }
            Taps { index, weight }
        })
        .collect()
}

fn linear_taps(out_len: usize, in_len: usize) -> Vec<Taps<2>> {
    let scale = in_len as f32 / out_len as f32;
    let last = in_len as isize - 1;
    (0..out_len)
        .map(|d| {
            let f = ((d as f32 + 0.5) * scale - 0.5).max(0.0);
            let s = f.floor();
            let t = f - s;
            let s = s as isize;
            Taps {
                index: [s.clamp(0, last) as usize, (s + 1).clamp(0, last) as usize],
                weight: [1.0 - t, t],
            }
        })
        .collect()
}

/// Resize a float field with bicubic interpolation.
///
/// # Arguments
/// * `field` - Source field (height, width), both non-zero
/// * `out_height` - Target height
/// * `out_width` - Target width
///
/// # Returns
/// Field of shape (out_height, out_width). Cubic overshoot is not clamped.
pub fn resize_cubic_field(field: ArrayView2<f32>, out_height: usize, out_width: usize) -> Array2<f32> {
    let (in_height, in_width) = field.dim();
    let x_taps = cubic_taps(out_width, in_width);
    let y_taps = cubic_taps(out_height, in_height);

    // Horizontal pass: (in_height, out_width)
    let mut temp = Array2::<f32>::zeros((in_height, out_width));
    for y in 0..in_height {
        for (x, taps) in x_taps.iter().enumerate() {
            let mut sum = 0.0f32;
            for k in 0..4 {
                sum += field[[y, taps.index[k]]] * taps.weight[k];
            }
            temp[[y, x]] = sum;
        }
    }

    // Vertical pass
    let mut result = Array2::<f32>::zeros((out_height, out_width));
    for (y, taps) in y_taps.iter().enumerate() {
        for x in 0..out_width {
            let mut sum = 0.0f32;
            for k in 0..4 {
                sum += temp[[taps.index[k], x]] * taps.weight[k];
            }
            result[[y, x]] = sum;
        }
    }

    result
}

/// Resize an 8-bit image with bilinear interpolation.
///
/// # Arguments
/// * `image` - Source image (height, width, channels), non-zero dimensions
/// * `out_height` - Target height
/// * `out_width` - Target width
///
/// # Returns
/// Resized image, values rounded to nearest
pub fn resize_bilinear_u8(image: ArrayView3<u8>, out_height: usize, out_width: usize) -> Array3<u8> {
    let (in_height, in_width, channels) = image.dim();
    if (in_height, in_width) == (out_height, out_width) {
        return image.to_owned();
    }

    let x_taps = linear_taps(out_width, in_width);
    let y_taps = linear_taps(out_height, in_height);
    let row_len = out_width * channels;

    let mut out = vec![0u8; out_height * row_len];
    out.par_chunks_mut(row_len)
        .zip(y_taps.par_iter())
        .for_each(|(row, ty)| {
            for (x, tx) in x_taps.iter().enumerate() {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for (&sy, &wy) in ty.index.iter().zip(&ty.weight) {
                        for (&sx, &wx) in tx.index.iter().zip(&tx.weight) {
                            sum += image[[sy, sx, c]] as f32 * wy * wx;
                        }
                    }
                    row[x * channels + c] = sum.round().clamp(0.0, 255.0) as u8;
                }
            }
        });

    Array3::from_shape_fn((out_height, out_width, channels), |(y, x, c)| {
        out[y * row_len + x * channels + c]
    })
}
