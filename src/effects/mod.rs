//! Environmental degradation effects for thermal imagery.
//!
//! ## Effects
//! - **Snow** - patchy ground snow plus sparse falling flakes (`snow.rs`)
//! - **Smoke/Fog** - patchy gray-white overlay with atmospheric blur (`fog.rs`)
//!
//! Both effects are built from procedural noise fields (`noise_field.rs`),
//! take an intensity scalar and an explicit random generator, and return a
//! new image with the same dimensions and channel order as the input.

use log::warn;
use rand::RngCore;

use crate::image::ThermalImage;

pub mod noise_field;
pub mod snow;
pub mod fog;

pub use fog::{FogParams, SmokeFogEffect};
pub use noise_field::{normalize, NoiseFieldSynthesizer, NoiseScale};
pub use snow::{SnowEffect, SnowParams};

/// An intensity-controlled image degradation.
pub trait Effect: Send + Sync {
    /// Short lowercase name used in logs.
    fn name(&self) -> &'static str;

    /// Apply the effect to a copy of `image`.
    ///
    /// `intensity` is nominally in `[0, 1]` but is not clamped.
    fn apply(&self, image: &ThermalImage, intensity: f32, rng: &mut dyn RngCore) -> ThermalImage;
}

pub(crate) fn warn_if_out_of_range(effect: &str, intensity: f32) {
    if !(0.0..=1.0).contains(&intensity) {
        warn!("{effect}: intensity {intensity} outside [0, 1], applying unclamped");
    }
}
