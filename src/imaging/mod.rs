//! Raster processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG) |
//! | **Fit** | `resize` (Catmull-Rom) + centre crop or letterbox |
//! | **Mask** | grayscale / red channel, bilinear resample, alpha multiply |
//! | **Export** | Lanczos3 density rescale + JPEG (JFIF) or PNG (`pHYs`) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and density math (unit testable)
//! - **Parameters**: Data structures describing raster operations
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Mask**: Layer-mask decoding and alpha application
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod mask;
pub mod operations;
pub(crate) mod params;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend};
pub use calculations::{BASE_DPI, Placement, calculate_placement, effective_dpi};
pub use mask::MaskBuffer;
pub use operations::{ExportParams, ExportedImage, LETTERBOX_FILL, export, fit_design};
pub use params::{EncodeParams, ExportFormat, FitMode, Kernel, Quality};
pub use rust_backend::RustBackend;
