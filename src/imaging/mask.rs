//! Layer-mask extraction and application.
//!
//! A mask arrives either as a full-colour canvas (reduced to luminance) or
//! as raw RGBA data (red channel taken as intensity). Either way it becomes
//! a [`MaskBuffer`]: one byte per pixel, 0 hidden, 255 visible.
//!
//! Applying a mask multiplies it into the design's alpha. The mask is
//! stretched to the design's exact size first, since it has to cover the
//! whole frame. An exact-size mask is used as is.

use super::backend::{BackendError, RasterBackend};
use crate::document::{Mask, MaskRaster};
use image::{GrayImage, RgbaImage};
use tracing::debug;

/// Single-channel mask intensities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBuffer {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl MaskBuffer {
    fn to_gray(&self) -> Result<GrayImage, BackendError> {
        if self.width == 0 || self.height == 0 {
            return Err(BackendError::ProcessingFailed("mask buffer is empty".into()));
        }
        GrayImage::from_raw(self.width, self.height, self.buffer.clone()).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "mask buffer holds {} bytes, {}x{} needs {}",
                self.buffer.len(),
                self.width,
                self.height,
                self.width as usize * self.height as usize
            ))
        })
    }
}

fn edge_extent(near: Option<f64>, far: Option<f64>) -> i64 {
    (far.unwrap_or(0.0) - near.unwrap_or(0.0)).round() as i64
}

/// Decode a mask into intensities.
///
/// `None` when there is no mask, it is disabled, its edges describe an
/// empty area, or it carries no raster.
pub fn extract(mask: Option<&Mask>, backend: &impl RasterBackend) -> Option<MaskBuffer> {
    let mask = mask.filter(|m| !m.disabled)?;
    let width = edge_extent(mask.left, mask.right);
    let height = edge_extent(mask.top, mask.bottom);
    if width <= 0 || height <= 0 {
        debug!(width, height, "mask has an empty area; ignored");
        return None;
    }

    match mask.raster.as_ref()? {
        MaskRaster::Canvas(canvas) => {
            let gray = backend.grayscale(canvas);
            let (width, height) = gray.dimensions();
            Some(MaskBuffer {
                buffer: gray.into_raw(),
                width,
                height,
            })
        }
        MaskRaster::ImageData(data) => {
            // Sized by the mask's own edges; missing pixels read as hidden.
            let (width, height) = (width as u32, height as u32);
            let len = width as usize * height as usize;
            let buffer = (0..len)
                .map(|i| data.data.get(i * 4).copied().unwrap_or(0))
                .collect();
            Some(MaskBuffer {
                buffer,
                width,
                height,
            })
        }
    }
}

/// Multiply `mask` into the design's alpha channel.
///
/// Output has the design's dimensions; only alpha changes, as
/// `round(alpha * mask / 255)`.
pub fn apply(
    design: &RgbaImage,
    mask: &MaskBuffer,
    backend: &impl RasterBackend,
) -> Result<RgbaImage, BackendError> {
    let (width, height) = design.dimensions();
    let gray = mask.to_gray()?;
    let gray = if gray.dimensions() == (width, height) {
        gray
    } else {
        backend.resize_mask(&gray, width, height)
    };

    let mut out = design.clone();
    for (pixel, intensity) in out.pixels_mut().zip(gray.pixels()) {
        let alpha = u32::from(pixel[3]) * u32::from(intensity[0]);
        pixel[3] = ((alpha + 127) / 255) as u8;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ImageData;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{RecordedOp, RecordingBackend};
    use image::Rgba;

    fn mask_with(raster: MaskRaster, width: f64, height: f64) -> Mask {
        Mask {
            left: Some(0.0),
            top: Some(0.0),
            right: Some(width),
            bottom: Some(height),
            disabled: false,
            raster: Some(raster),
        }
    }

    fn left_half_mask(width: u32, height: u32) -> MaskBuffer {
        let buffer = (0..width * height)
            .map(|i| if i % width < width / 2 { 255 } else { 0 })
            .collect();
        MaskBuffer {
            buffer,
            width,
            height,
        }
    }

    #[test]
    fn extract_none_when_absent_or_disabled() {
        let backend = RustBackend::new();
        assert!(extract(None, &backend).is_none());

        let mut mask = mask_with(MaskRaster::Canvas(RgbaImage::new(4, 4)), 4.0, 4.0);
        mask.disabled = true;
        assert!(extract(Some(&mask), &backend).is_none());
    }

    #[test]
    fn extract_none_for_empty_edges() {
        let mask = mask_with(MaskRaster::Canvas(RgbaImage::new(4, 4)), 0.0, 4.0);
        assert!(extract(Some(&mask), &RustBackend::new()).is_none());
    }

    #[test]
    fn extract_none_without_raster() {
        let mask = Mask {
            right: Some(10.0),
            bottom: Some(10.0),
            ..Mask::default()
        };
        assert!(extract(Some(&mask), &RustBackend::new()).is_none());
    }

    #[test]
    fn extract_canvas_reduces_to_luminance() {
        let canvas = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let mask = mask_with(MaskRaster::Canvas(canvas), 2.0, 1.0);
        let buffer = extract(Some(&mask), &RustBackend::new()).unwrap();
        assert_eq!(buffer.buffer, vec![255, 0]);
        assert_eq!((buffer.width, buffer.height), (2, 1));
    }

    #[test]
    fn extract_image_data_takes_red_channel() {
        let data = ImageData {
            width: 3,
            height: 1,
            data: vec![10, 99, 99, 255, 20, 99, 99, 255],
        };
        let mask = mask_with(MaskRaster::ImageData(data), 3.0, 1.0);
        let buffer = extract(Some(&mask), &RustBackend::new()).unwrap();
        // Third pixel is missing from the data and reads as hidden.
        assert_eq!(buffer.buffer, vec![10, 20, 0]);
    }

    #[test]
    fn apply_exact_size_skips_resampling() {
        let backend = RecordingBackend::new();
        let design = RgbaImage::from_pixel(8, 4, Rgba([50, 60, 70, 255]));
        let out = apply(&design, &left_half_mask(8, 4), &backend).unwrap();

        assert_eq!(out.dimensions(), design.dimensions());
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::ResizeMask { .. }))
        );
        assert_eq!(out.get_pixel(1, 1), &Rgba([50, 60, 70, 255]));
        assert_eq!(out.get_pixel(6, 1), &Rgba([50, 60, 70, 0]));
    }

    #[test]
    fn apply_resamples_mismatched_mask_to_design() {
        let backend = RecordingBackend::new();
        let design = RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255]));
        let out = apply(&design, &left_half_mask(4, 2), &backend).unwrap();

        assert_eq!(out.dimensions(), (40, 20));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::ResizeMask {
                width: 40,
                height: 20
            }]
        );
        assert_eq!(out.get_pixel(2, 10)[3], 255);
        assert_eq!(out.get_pixel(37, 10)[3], 0);
    }

    #[test]
    fn apply_rounds_partial_alpha() {
        let design = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 200]));
        let mask = MaskBuffer {
            buffer: vec![128],
            width: 1,
            height: 1,
        };
        let out = apply(&design, &mask, &RustBackend::new()).unwrap();
        // 200 * 128 / 255 = 100.39
        assert_eq!(out.get_pixel(0, 0)[3], 100);
    }

    #[test]
    fn apply_rejects_empty_mask() {
        let design = RgbaImage::new(2, 2);
        let mask = MaskBuffer {
            buffer: Vec::new(),
            width: 0,
            height: 0,
        };
        assert!(apply(&design, &mask, &RustBackend::new()).is_err());
    }

    #[test]
    fn apply_rejects_malformed_buffer() {
        let design = RgbaImage::new(2, 2);
        let mask = MaskBuffer {
            buffer: vec![255; 3],
            width: 2,
            height: 2,
        };
        assert!(apply(&design, &mask, &RustBackend::new()).is_err());
    }
}
