//! Raster codec trait and shared types.
//!
//! The [`RasterBackend`] trait is the compositor's only route to pixels:
//! decode, resample, crop, grayscale, alpha-overlay and encode. Anything
//! that needs one-time native setup (a GPU context, a canvas library)
//! belongs behind an implementation of this trait, constructed by the host
//! before the first composite call, and passed in explicitly.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate and statically linked.

use super::params::{EncodeParams, Kernel};
use image::{GrayImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for raster codecs.
///
/// Must be `Sync`: layer rasters are prepared on rayon workers and batch
/// renders share one backend.
pub trait RasterBackend: Sync {
    /// Decode arbitrary image bytes to RGBA. Opaque inputs get alpha 255.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;

    /// Resample to exactly `width` x `height`, ignoring aspect ratio.
    fn resize(&self, image: &RgbaImage, width: u32, height: u32, kernel: Kernel) -> RgbaImage;

    /// Resample a single-channel mask to exactly `width` x `height`.
    fn resize_mask(&self, mask: &GrayImage, width: u32, height: u32) -> GrayImage;

    /// Cut a `width` x `height` window starting at (`x`, `y`).
    fn crop(&self, image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage;

    /// Luminance reduction of a colour raster.
    fn grayscale(&self, image: &RgbaImage) -> GrayImage;

    /// Alpha-blend `top` over `base` with its origin at (`x`, `y`).
    /// Parts of `top` falling outside `base` are clipped.
    fn overlay(&self, base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64);

    /// Encode with the given format, quality and density.
    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::params::{ExportFormat, Quality};
    use image::{Luma, Rgba};
    use std::sync::Mutex;

    /// Backend that delegates to [`RustBackend`] and records every call.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct RecordingBackend {
        inner: RustBackend,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode,
        Resize {
            width: u32,
            height: u32,
            kernel: Kernel,
        },
        ResizeMask {
            width: u32,
            height: u32,
        },
        Crop {
            x: u32,
            y: u32,
            width: u32,
            height: u32,
        },
        Grayscale,
        Overlay {
            x: i64,
            y: i64,
            width: u32,
            height: u32,
        },
        Encode {
            format: ExportFormat,
            quality: u32,
            dpi: f64,
        },
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl RasterBackend for RecordingBackend {
        fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
            self.record(RecordedOp::Decode);
            self.inner.decode(bytes)
        }

        fn resize(&self, image: &RgbaImage, width: u32, height: u32, kernel: Kernel) -> RgbaImage {
            self.record(RecordedOp::Resize {
                width,
                height,
                kernel,
            });
            self.inner.resize(image, width, height, kernel)
        }

        fn resize_mask(&self, mask: &GrayImage, width: u32, height: u32) -> GrayImage {
            self.record(RecordedOp::ResizeMask { width, height });
            self.inner.resize_mask(mask, width, height)
        }

        fn crop(&self, image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
            self.record(RecordedOp::Crop {
                x,
                y,
                width,
                height,
            });
            self.inner.crop(image, x, y, width, height)
        }

        fn grayscale(&self, image: &RgbaImage) -> GrayImage {
            self.record(RecordedOp::Grayscale);
            self.inner.grayscale(image)
        }

        fn overlay(&self, base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
            self.record(RecordedOp::Overlay {
                x,
                y,
                width: top.width(),
                height: top.height(),
            });
            self.inner.overlay(base, top, x, y)
        }

        fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
            self.record(RecordedOp::Encode {
                format: params.format,
                quality: params.quality.value(),
                dpi: params.dpi,
            });
            self.inner.encode(image, params)
        }
    }

    #[test]
    fn recording_backend_records_in_call_order() {
        let backend = RecordingBackend::new();
        let image = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        let mask = GrayImage::from_pixel(2, 2, Luma([255]));

        let resized = backend.resize(&image, 8, 2, Kernel::Cubic);
        let _ = backend.resize_mask(&mask, 4, 4);
        let mut base = RgbaImage::new(10, 10);
        backend.overlay(&mut base, &resized, 1, 2);

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Resize {
                    width: 8,
                    height: 2,
                    kernel: Kernel::Cubic
                },
                RecordedOp::ResizeMask {
                    width: 4,
                    height: 4
                },
                RecordedOp::Overlay {
                    x: 1,
                    y: 2,
                    width: 8,
                    height: 2
                },
            ]
        );
    }

    #[test]
    fn recording_backend_records_encode_params() {
        let backend = RecordingBackend::new();
        let image = RgbaImage::from_pixel(3, 3, Rgba([0, 0, 0, 255]));
        backend
            .encode(
                &image,
                &EncodeParams {
                    format: ExportFormat::Png,
                    quality: Quality::new(80),
                    dpi: 300.0,
                },
            )
            .unwrap();
        assert!(matches!(
            backend.get_operations()[0],
            RecordedOp::Encode {
                format: ExportFormat::Png,
                quality: 80,
                ..
            }
        ));
    }
}
