//! Pure Rust raster backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with format sniffing |
//! | Resize | `image::imageops::resize` (`Triangle` / `CatmullRom` / `Lanczos3`) |
//! | Crop | `image::imageops::crop_imm` |
//! | Grayscale | `image::imageops::grayscale` (Rec. 709 luma) |
//! | Overlay | `image::imageops::overlay` (source-over blending, clipped) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with JFIF density |
//! | Encode → PNG | `png::Encoder` with a `pHYs` chunk |

use super::backend::{BackendError, RasterBackend};
use super::params::{EncodeParams, ExportFormat, Kernel};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, GrayImage, ImageEncoder, ImageReader, RgbImage, RgbaImage};
use std::io::Cursor;

const METERS_PER_INCH: f64 = 0.0254;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn filter_for(kernel: Kernel) -> FilterType {
    match kernel {
        Kernel::Bilinear => FilterType::Triangle,
        Kernel::Cubic => FilterType::CatmullRom,
        Kernel::Lanczos => FilterType::Lanczos3,
    }
}

/// Encode as baseline JPEG. Alpha is dropped, not flattened.
fn encode_jpeg(image: &RgbaImage, quality: u8, dpi: f64) -> Result<Vec<u8>, BackendError> {
    let rgb: RgbImage = image.convert();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    let density = dpi.round().clamp(1.0, f64::from(u16::MAX)) as u16;
    encoder.set_pixel_density(PixelDensity::dpi(density));
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
    Ok(out)
}

/// Encode as 8-bit RGBA PNG with the density in a `pHYs` chunk.
fn encode_png(image: &RgbaImage, dpi: f64) -> Result<Vec<u8>, BackendError> {
    let png_err = |e: png::EncodingError| BackendError::Encode(format!("PNG: {e}"));
    let pixels_per_meter = (dpi / METERS_PER_INCH).round() as u32;

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: pixels_per_meter,
        yppu: pixels_per_meter,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header().map_err(png_err)?;
    writer.write_image_data(image.as_raw()).map_err(png_err)?;
    writer.finish().map_err(png_err)?;
    Ok(out)
}

impl RasterBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(BackendError::Io)?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(decoded.to_rgba8())
    }

    fn resize(&self, image: &RgbaImage, width: u32, height: u32, kernel: Kernel) -> RgbaImage {
        if image.dimensions() == (width, height) {
            return image.clone();
        }
        imageops::resize(image, width, height, filter_for(kernel))
    }

    fn resize_mask(&self, mask: &GrayImage, width: u32, height: u32) -> GrayImage {
        imageops::resize(mask, width, height, FilterType::Triangle)
    }

    fn crop(&self, image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
        imageops::crop_imm(image, x, y, width, height).to_image()
    }

    fn grayscale(&self, image: &RgbaImage) -> GrayImage {
        imageops::grayscale(image)
    }

    fn overlay(&self, base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(base, top, x, y);
    }

    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            ExportFormat::Jpeg => encode_jpeg(image, params.quality.value() as u8, params.dpi),
            ExportFormat::Png => encode_png(image, params.dpi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{Luma, Rgba};

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })
    }

    fn params(format: ExportFormat, dpi: f64) -> EncodeParams {
        EncodeParams {
            format,
            quality: Quality::new(85),
            dpi,
        }
    }

    /// Units byte and X density from the JFIF APP0 segment.
    fn jfif_density(bytes: &[u8]) -> Option<(u8, u16)> {
        let at = bytes.windows(5).position(|w| w == b"JFIF\0")?;
        let units = bytes[at + 7];
        let x = u16::from_be_bytes([bytes[at + 8], bytes[at + 9]]);
        Some((units, x))
    }

    #[test]
    fn decode_png_forces_alpha() {
        let rgb = RgbImage::from_pixel(5, 3, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(rgb.as_raw(), 5, 3, ExtendedColorType::Rgb8)
            .unwrap();

        let decoded = RustBackend::new().decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn decode_garbage_errors() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(result.is_err());
    }

    #[test]
    fn resize_exact_dimensions() {
        let out = RustBackend::new().resize(&gradient(40, 30), 17, 90, Kernel::Cubic);
        assert_eq!(out.dimensions(), (17, 90));
    }

    #[test]
    fn resize_mask_fills_target() {
        let mask = GrayImage::from_pixel(10, 10, Luma([200]));
        let out = RustBackend::new().resize_mask(&mask, 25, 4);
        assert_eq!(out.dimensions(), (25, 4));
        assert_eq!(out.get_pixel(12, 2), &Luma([200]));
    }

    #[test]
    fn overlay_clips_outside_base() {
        let mut base = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        let top = RgbaImage::from_pixel(6, 6, Rgba([255, 255, 255, 255]));
        RustBackend::new().overlay(&mut base, &top, 7, -3);
        assert_eq!(base.get_pixel(9, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(base.get_pixel(9, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(base.get_pixel(6, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn overlay_respects_transparency() {
        let mut base = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let top = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 0]));
        RustBackend::new().overlay(&mut base, &top, 0, 0);
        assert_eq!(base.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn grayscale_of_white_is_white() {
        let white = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let gray = RustBackend::new().grayscale(&white);
        assert_eq!(gray.get_pixel(1, 1), &Luma([255]));
    }

    #[test]
    fn encode_jpeg_writes_density() {
        let bytes = RustBackend::new()
            .encode(&gradient(32, 16), &params(ExportFormat::Jpeg, 300.0))
            .unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(jfif_density(&bytes), Some((1, 300)));
    }

    #[test]
    fn encode_png_writes_physical_dimensions() {
        let bytes = RustBackend::new()
            .encode(&gradient(8, 8), &params(ExportFormat::Png, 72.0))
            .unwrap();

        let reader = png::Decoder::new(Cursor::new(&bytes)).read_info().unwrap();
        let dims = reader.info().pixel_dims.unwrap();
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(dims.xppu, 2835);
        assert_eq!(dims.yppu, 2835);
    }

    #[test]
    fn encode_png_round_trips_pixels() {
        let backend = RustBackend::new();
        let source = gradient(9, 7);
        let bytes = backend
            .encode(&source, &params(ExportFormat::Png, 72.0))
            .unwrap();
        assert_eq!(backend.decode(&bytes).unwrap(), source);
    }
}
