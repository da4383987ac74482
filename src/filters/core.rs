//! Core utilities shared by the blur and resize filters.
//!
//! This module provides:
//! - Gaussian kernel generation from an odd kernel size
//! - Reflect-101 border index mapping
//! - Cubic convolution weights

/// Standard deviation implied by a kernel size when no sigma is given.
///
/// Uses `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8`, so a 3-tap kernel gets
/// sigma 0.8 and a 51-tap kernel gets sigma 8.0.
pub fn sigma_for_kernel_size(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Generate a normalized 1D Gaussian kernel with exactly `ksize` taps.
///
/// # Arguments
/// * `ksize` - Number of taps; even sizes are bumped to the next odd size
/// * `sigma` - Standard deviation; `<= 0` derives it from `ksize`
///
/// # Returns
/// Kernel weights summing to 1.0
pub fn gaussian_kernel_1d(ksize: usize, sigma: f32) -> Vec<f32> {
    let ksize = ksize.max(1) | 1;
    if ksize == 1 {
        return vec![1.0];
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        sigma_for_kernel_size(ksize)
    };
    let half = (ksize / 2) as f32;

    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let x = i as f32 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

/// Map a possibly out-of-range index into `0..len` by mirroring around the
/// edge pixels without repeating them (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let period = 2 * last;
    let mut i = index.rem_euclid(period);
    if i > last {
        i = period - i;
    }
    i as usize
}

/// Keys cubic convolution weights for the four taps around a sample point.
///
/// # Arguments
/// * `t` - Fractional offset of the sample from the second tap, in `[0, 1)`
/// * `a` - Sharpness parameter (`-0.75` matches common image libraries)
#[inline]
pub fn cubic_weights(t: f32, a: f32) -> [f32; 4] {
    let w0 = ((a * (t + 1.0) - 5.0 * a) * (t + 1.0) + 8.0 * a) * (t + 1.0) - 4.0 * a;
    let w1 = ((a + 2.0) * t - (a + 3.0)) * t * t + 1.0;
    let u = 1.0 - t;
    let w2 = ((a + 2.0) * u - (a + 3.0)) * u * u + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}
