//! High-level raster operations.
//!
//! These functions combine calculations with backend execution: fitting a
//! design into its frame, and exporting the finished composite.

use super::backend::{BackendError, RasterBackend};
use super::calculations::{
    calculate_contain_dimensions, calculate_dpi_scale, calculate_fill_dimensions,
    calculate_scaled_dimensions, center_offset, effective_dpi,
};
use super::params::{EncodeParams, ExportFormat, FitMode, Kernel, Quality};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Letterbox colour for `contain`. Off-white and opaque, so formats without
/// alpha don't render the padding as black.
pub const LETTERBOX_FILL: Rgba<u8> = Rgba([252, 252, 252, 255]);

/// Fit a design into a `target` frame, preserving aspect ratio.
///
/// - `Cover`: scale to cover the frame, then centre-crop the overflow.
/// - `Contain`: scale to fit inside, then centre on a [`LETTERBOX_FILL`] canvas.
///
/// The result is always exactly `target` in size and carries alpha.
pub fn fit_design(
    backend: &impl RasterBackend,
    design: &RgbaImage,
    target: (u32, u32),
    mode: FitMode,
) -> Result<RgbaImage> {
    let source = design.dimensions();
    if source.0 == 0 || source.1 == 0 || target.0 == 0 || target.1 == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "cannot fit {}x{} design into {}x{} frame",
            source.0, source.1, target.0, target.1
        )));
    }
    if source == target {
        return Ok(design.clone());
    }

    let fitted = match mode {
        FitMode::Cover => {
            let (fill_w, fill_h) = calculate_fill_dimensions(source, target);
            let filled = backend.resize(design, fill_w, fill_h, Kernel::Cubic);
            let x = (fill_w - target.0) / 2;
            let y = (fill_h - target.1) / 2;
            backend.crop(&filled, x, y, target.0, target.1)
        }
        FitMode::Contain => {
            let (w, h) = calculate_contain_dimensions(source, target);
            let scaled = backend.resize(design, w, h, Kernel::Cubic);
            let mut canvas = RgbaImage::from_pixel(target.0, target.1, LETTERBOX_FILL);
            backend.overlay(
                &mut canvas,
                &scaled,
                center_offset(target.0, w),
                center_offset(target.1, h),
            );
            canvas
        }
    };

    debug!(
        ?source,
        ?target,
        mode = %mode,
        "fitted design"
    );
    Ok(fitted)
}

/// Export settings for a finished composite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportParams {
    pub format: ExportFormat,
    pub quality: Quality,
    /// Requested density. Missing or non-positive means 72.
    pub dpi: Option<f64>,
    /// Density the composite was authored at, if known. Missing means 72.
    pub source_dpi: Option<f64>,
}

/// An encoded raster and what it ended up as.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub dpi: f64,
}

/// Rescale for the target density, then encode.
///
/// A scale other than 1 resamples both axes by the same factor. The
/// density written into the file is the target density either way.
pub fn export(
    backend: &impl RasterBackend,
    raster: &RgbaImage,
    params: &ExportParams,
) -> Result<ExportedImage> {
    let dpi = effective_dpi(params.dpi);
    let scale = calculate_dpi_scale(dpi, params.source_dpi);

    let scaled;
    let output = if (scale - 1.0).abs() > f64::EPSILON {
        let (width, height) = calculate_scaled_dimensions(raster.dimensions(), scale);
        debug!(
            dpi,
            scale,
            from = ?raster.dimensions(),
            to = ?(width, height),
            "rescaling for export density"
        );
        scaled = backend.resize(raster, width, height, Kernel::Lanczos);
        &scaled
    } else {
        raster
    };

    let bytes = backend.encode(
        output,
        &EncodeParams {
            format: params.format,
            quality: params.quality,
            dpi,
        },
    )?;

    Ok(ExportedImage {
        bytes,
        mime_type: params.format.mime_type(),
        width: output.width(),
        height: output.height(),
        dpi,
    })
}
