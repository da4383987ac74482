//! Gaussian blur for noise fields and 3-channel images.
//!
//! Uses separable 2-pass convolution with reflect-101 borders. Both passes
//! run row-parallel with rayon; the result does not depend on thread count.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use rayon::prelude::*;

use super::core::{gaussian_kernel_1d, reflect_101};

/// Blur a single-channel float field.
///
/// # Arguments
/// * `field` - 2D array (height, width)
/// * `ksize` - Odd kernel size; sigma is derived from it. `<= 1` copies.
///
/// # Returns
/// Blurred field with same dimensions
pub fn gaussian_blur_field(field: ArrayView2<f32>, ksize: usize) -> Array2<f32> {
    let (height, width) = field.dim();
    if ksize <= 1 {
        return field.to_owned();
    }

    let kernel = gaussian_kernel_1d(ksize, 0.0);
    let src: Vec<f32> = field.iter().copied().collect();
    let out = separable_blur(&src, height, width, 1, &kernel);

    Array2::from_shape_fn((height, width), |(y, x)| out[y * width + x])
}

/// Blur an 8-bit image with any channel count.
///
/// Works in f32 and rounds back to u8, so a constant image is returned
/// unchanged.
///
/// # Arguments
/// * `image` - Image (height, width, channels) as u8
/// * `ksize` - Odd kernel size; sigma is derived from it. `<= 1` copies.
///
/// # Returns
/// Blurred image with same dimensions
pub fn gaussian_blur_u8(image: ArrayView3<u8>, ksize: usize) -> Array3<u8> {
    let (height, width, channels) = image.dim();
    if ksize <= 1 {
        return image.to_owned();
    }

    let kernel = gaussian_kernel_1d(ksize, 0.0);
    let src: Vec<f32> = image.iter().map(|&v| v as f32).collect();
    let out = separable_blur(&src, height, width, channels, &kernel);

    Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
        out[(y * width + x) * channels + c].round().clamp(0.0, 255.0) as u8
    })
}

/// Horizontal then vertical pass over an interleaved row-major buffer.
fn separable_blur(
    src: &[f32],
    height: usize,
    width: usize,
    channels: usize,
    kernel: &[f32],
) -> Vec<f32> {
    let row_len = width * channels;
    let half = (kernel.len() / 2) as isize;

    // Horizontal pass
    let mut temp = vec![0.0f32; src.len()];
    temp.par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = &src[y * row_len..(y + 1) * row_len];
            for x in 0..width {
                for c in 0..channels {
                    let mut sum = 0.0f32;
                    for (ki, &kv) in kernel.iter().enumerate() {
                        let sx = reflect_101(x as isize + ki as isize - half, width);
                        sum += src_row[sx * channels + c] * kv;
                    }
                    row[x * channels + c] = sum;
                }
            }
        });

    // Vertical pass
    let mut result = vec![0.0f32; src.len()];
    result
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| {
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + ki as isize - half, height);
                let src_row = &temp[sy * row_len..(sy + 1) * row_len];
                for (out, &v) in row.iter_mut().zip(src_row) {
                    *out += v * kv;
                }
            }
        });

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_field_unchanged() {
        let field = Array2::<f32>::from_elem((9, 7), 0.25);
        let result = gaussian_blur_field(field.view(), 5);
        assert!(result.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_impulse_spreads_and_conserves_mass() {
        let mut field = Array2::<f32>::zeros((21, 21));
        field[[10, 10]] = 1.0;

        let result = gaussian_blur_field(field.view(), 5);

        let total: f32 = result.sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(result[[10, 10]] < 1.0);
        assert!(result[[10, 11]] > 0.0);
        assert!((result[[9, 10]] - result[[11, 10]]).abs() < 1e-7);
        assert_eq!(result[[0, 0]], 0.0);
    }

    #[test]
    fn test_kernel_one_is_identity() {
        let field = Array2::from_shape_fn((3, 4), |(y, x)| (y * 4 + x) as f32);
        assert_eq!(gaussian_blur_field(field.view(), 1), field);
    }

    #[test]
    fn test_u8_constant_image_unchanged() {
        let img = Array3::<u8>::from_elem((6, 5, 3), 131);
        let result = gaussian_blur_u8(img.view(), 7);
        assert_eq!(result, img);
    }

    #[test]
    fn test_u8_channels_blurred_independently() {
        let mut img = Array3::<u8>::zeros((5, 5, 3));
        for y in 0..5 {
            for x in 0..5 {
                img[[y, x, 0]] = 200;
            }
        }

        let result = gaussian_blur_u8(img.view(), 3);

        assert!(result.iter().enumerate().all(|(i, &v)| {
            if i % 3 == 0 {
                v == 200
            } else {
                v == 0
            }
        }));
    }

    #[test]
    fn test_single_pixel_image() {
        let img = Array3::<u8>::from_elem((1, 1, 3), 42);
        assert_eq!(gaussian_blur_u8(img.view(), 7), img);
    }
}
