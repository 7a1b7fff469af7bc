//! Parameter types for raster operations.
//!
//! These describe *what* to do. The [`backend`](super::backend) does the
//! pixel work and [`operations`](super::operations) decides which work to do.
//!
//! - [`Quality`] — lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`FitMode`] — how a design fills its frame: `cover` crops, `contain` letterboxes.
//! - [`ExportFormat`] — JPEG or PNG. Unknown names fall back to PNG.
//! - [`Kernel`] — resampling filter, mapped onto the backend's filters.
//! - [`EncodeParams`] — format + quality + density for one encode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// How a design image is fitted into its placeholder frame.
///
/// Both modes preserve aspect ratio and produce exactly the frame size.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the frame, centre-cropping whatever overflows.
    #[default]
    Cover,
    /// Fit inside the frame, padding the rest with an off-white fill.
    Contain,
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMode::Cover => f.write_str("cover"),
            FitMode::Contain => f.write_str("contain"),
        }
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
}

impl ExportFormat {
    /// Parse a format name. `jpg`/`jpeg` select JPEG; anything else is PNG.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ExportFormat::Jpeg,
            _ => ExportFormat::Png,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
        }
    }
}

/// Resampling kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Bilinear,
    Cubic,
    Lanczos,
}

/// Everything an encode needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub format: ExportFormat,
    pub quality: Quality,
    /// Density written into the file, in pixels per inch.
    pub dpi: f64,
}
