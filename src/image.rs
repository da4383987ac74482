//! Three-channel 8-bit image container used throughout the engine.
//!
//! Pixels are stored as `(height, width, 3)` in an [`Array3<u8>`], the same
//! layout the filters use. The channel order travels with the pixels so that
//! callers never have to guess whether a buffer is RGB or BGR. Every effect is
//! channel-symmetric and keeps the order tag untouched.
//!
//! Grayscale input, `(height, width, 1)` or `(height, width)`, is promoted to
//! three identical channels on construction.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3};
use serde::{Deserialize, Serialize};

use crate::error::{PerturbError, Result};

/// Order of the three color channels along the last axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A validated three-channel u8 image with non-zero dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalImage {
    pixels: Array3<u8>,
    order: ChannelOrder,
}

impl ThermalImage {
    /// Build an image from a `(height, width, channels)` array.
    ///
    /// # Arguments
    /// * `pixels` - Array with 1 or 3 channels
    /// * `order` - Channel order of the 3-channel data (ignored for grayscale)
    ///
    /// # Errors
    /// `InvalidDimension` for a zero height or width, `UnsupportedChannels`
    /// for anything other than 1 or 3 channels.
    pub fn from_array(pixels: Array3<u8>, order: ChannelOrder) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        check_dimensions(height, width)?;

        match channels {
            3 => Ok(Self { pixels, order }),
            1 => Ok(Self {
                pixels: promote_gray(pixels.index_axis(Axis(2), 0)),
                order,
            }),
            other => Err(PerturbError::UnsupportedChannels(other)),
        }
    }

    /// Build an image from an array of unknown rank: `(height, width)`
    /// grayscale or `(height, width, 1 | 3)`.
    ///
    /// # Errors
    /// `UnsupportedRank` for any other rank, plus the errors of
    /// [`from_gray`](Self::from_gray) and [`from_array`](Self::from_array).
    pub fn from_dyn(pixels: ArrayViewD<u8>, order: ChannelOrder) -> Result<Self> {
        let rank = pixels.ndim();
        match rank {
            2 => {
                let gray = pixels
                    .into_dimensionality::<Ix2>()
                    .map_err(|_| PerturbError::UnsupportedRank(rank))?;
                let mut img = Self::from_gray(gray)?;
                img.order = order;
                Ok(img)
            }
            3 => {
                let px = pixels
                    .into_dimensionality::<Ix3>()
                    .map_err(|_| PerturbError::UnsupportedRank(rank))?;
                Self::from_array(px.to_owned(), order)
            }
            other => Err(PerturbError::UnsupportedRank(other)),
        }
    }

    /// Build an image from a single-channel `(height, width)` array.
    pub fn from_gray(gray: ArrayView2<u8>) -> Result<Self> {
        let (height, width) = gray.dim();
        check_dimensions(height, width)?;
        Ok(Self {
            pixels: promote_gray(gray),
            order: ChannelOrder::default(),
        })
    }

    /// Build an image from an interleaved row-major buffer.
    ///
    /// # Arguments
    /// * `data` - `height * width * channels` bytes
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - 1 or 3
    /// * `order` - Channel order of 3-channel data
    pub fn from_raw(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
        order: ChannelOrder,
    ) -> Result<Self> {
        check_dimensions(height, width)?;
        let actual = data.len();
        let pixels = Array3::from_shape_vec((height, width, channels), data).map_err(|_| {
            PerturbError::BufferLength {
                actual,
                height,
                width,
                channels,
            }
        })?;
        Self::from_array(pixels, order)
    }

    /// Image filled with a single value on every channel.
    pub fn filled(height: usize, width: usize, value: u8) -> Result<Self> {
        check_dimensions(height, width)?;
        Ok(Self {
            pixels: Array3::from_elem((height, width, 3), value),
            order: ChannelOrder::default(),
        })
    }

    /// Wrap an array produced by an effect. Callers guarantee the shape.
    pub(crate) fn from_parts(pixels: Array3<u8>, order: ChannelOrder) -> Self {
        debug_assert_eq!(pixels.dim().2, 3);
        Self { pixels, order }
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    /// `(height, width, 3)`
    pub fn dim(&self) -> (usize, usize, usize) {
        self.pixels.dim()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn into_array(self) -> Array3<u8> {
        self.pixels
    }

    /// Mean over every pixel and channel.
    pub fn mean(&self) -> f64 {
        let sum: u64 = self.pixels.iter().map(|&v| v as u64).sum();
        sum as f64 / self.pixels.len() as f64
    }

    /// Return a copy in the requested channel order, swapping the first and
    /// last channel when the orders differ.
    pub fn to_order(&self, order: ChannelOrder) -> ThermalImage {
        if order == self.order {
            return self.clone();
        }
        let mut pixels = self.pixels.clone();
        for mut px in pixels.lanes_mut(Axis(2)) {
            px.swap(0, 2);
        }
        ThermalImage { pixels, order }
    }
}

fn check_dimensions(height: usize, width: usize) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(PerturbError::InvalidDimension { height, width });
    }
    Ok(())
}

fn promote_gray(gray: ArrayView2<u8>) -> Array3<u8> {
    let (height, width) = gray.dim();
    Array3::from_shape_fn((height, width, 3), |(y, x, _)| gray[[y, x]])
}

/// Single-channel float plane, used for noise fields and masks.
pub type Field = Array2<f32>;
