//! Procedural noise fields.
//!
//! A noise field is white Gaussian noise sampled on a coarse grid, upsampled
//! to full resolution with cubic interpolation and smoothed with a Gaussian
//! blur. The downsample factor and blur kernel together set the feature size:
//! large values give broad patches, small values give fine grain.
//!
//! Fields are combined into masks by weighting several scales and
//! min-max normalizing the sum to `[0, 1]`.

use log::{debug, trace};
use ndarray::{Array2, ArrayView2};
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{PerturbError, Result};
use crate::filters::blur::gaussian_blur_field;
use crate::filters::resize::resize_cubic_field;
use crate::image::{Field, ThermalImage};

/// Added to the min-max denominator so constant fields normalize to zero.
pub const NORMALIZE_EPSILON: f32 = 1e-8;

/// Feature scale of a noise field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseScale {
    /// Grid is `height / downsample` by `width / downsample`, at least 1x1.
    pub downsample: usize,
    /// Odd Gaussian kernel size applied after upsampling.
    pub blur_ksize: usize,
}

impl NoiseScale {
    pub const fn new(downsample: usize, blur_ksize: usize) -> Self {
        Self {
            downsample,
            blur_ksize,
        }
    }

    /// Coarse grid dimensions for a `height x width` target.
    pub fn grid_dim(&self, height: usize, width: usize) -> (usize, usize) {
        let k = self.downsample.max(1);
        ((height / k).max(1), (width / k).max(1))
    }
}

/// Generates smoothed random fields of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct NoiseFieldSynthesizer {
    height: usize,
    width: usize,
}

impl NoiseFieldSynthesizer {
    /// # Errors
    /// `InvalidDimension` if either dimension is zero.
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(PerturbError::InvalidDimension { height, width });
        }
        Ok(Self { height, width })
    }

    /// Synthesizer matching an image; its dimensions are already validated.
    pub fn for_image(image: &ThermalImage) -> Self {
        Self {
            height: image.height(),
            width: image.width(),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Sample one un-normalized field at the given scale.
    pub fn field(&self, scale: NoiseScale, rng: &mut dyn RngCore) -> Field {
        let (grid_h, grid_w) = scale.grid_dim(self.height, self.width);
        let grid = Array2::from_shape_fn((grid_h, grid_w), |_| {
            let v: f32 = StandardNormal.sample(&mut *rng);
            v
        });

        let upsampled = if (grid_h, grid_w) == (self.height, self.width) {
            grid
        } else {
            resize_cubic_field(grid.view(), self.height, self.width)
        };

        gaussian_blur_field(upsampled.view(), scale.blur_ksize)
    }

    /// Weighted sum of independently sampled fields, normalized to `[0, 1]`.
    ///
    /// Layers are sampled in order, so a seeded generator reproduces the
    /// same result.
    pub fn blend(&self, layers: &[(NoiseScale, f32)], rng: &mut dyn RngCore) -> Field {
        let mut combined = Array2::<f32>::zeros((self.height, self.width));
        for &(scale, weight) in layers {
            let field = self.field(scale, rng);
            combined.zip_mut_with(&field, |acc, &v| *acc += weight * v);
        }
        normalize(combined.view())
    }
}

/// Min-max normalize a field to `[0, 1]`.
///
/// The denominator carries [`NORMALIZE_EPSILON`], so a constant field maps
/// to all zeros instead of NaN.
pub fn normalize(field: ArrayView2<f32>) -> Field {
    let (min, max) = field
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if max - min <= 0.0 {
        debug!("normalizing constant noise field ({min})");
    }
    trace!("noise field range [{min}, {max}]");

    let denom = max - min + NORMALIZE_EPSILON;
    field.mapv(|v| ((v - min) / denom).clamp(0.0, 1.0))
}
