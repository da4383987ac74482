//! Low-level raster filters used by the degradation effects.
//!
//! ## Formats
//!
//! | Data | Shape | Type |
//! |------|-------|------|
//! | Noise field / mask | (H, W) | f32 |
//! | Image | (H, W, C) | u8 |
//! | Compositing canvas | (H, W, 3) | f32, 0-255 scale |
//!
//! ## Filter Categories
//!
//! - **Kernels**: Gaussian kernel from kernel size, border mapping (`core`)
//! - **Blur**: separable Gaussian blur for fields and images (`blur`)
//! - **Resize**: cubic field upsampling, bilinear image resizing (`resize`)
//! - **Draw**: filled circles (`draw`)

pub mod core;
pub mod blur;
pub mod resize;
pub mod draw;
