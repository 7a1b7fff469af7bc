//! Shared test utilities for the mockup-press test suite.
//!
//! Builders for the document model (rasters, layers, masks, documents) and
//! small codec helpers, so each module's tests can describe a layer stack in
//! a few lines.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let doc = document(2000, 2000, vec![
//!     raster_layer("background", 0, 0, 2000, 2000, WHITE),
//!     placeholder("YOUR DESIGN HERE", 200, 300, 1800, 1700),
//! ]);
//! let design = encode_png(&solid(800, 600, RED));
//! ```

use crate::document::{Document, Layer, Mask, MaskRaster};
use image::{ImageEncoder, Rgba, RgbaImage};
use std::path::Path;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const RED: [u8; 4] = [220, 20, 20, 255];
pub const BLUE: [u8; 4] = [20, 20, 220, 255];
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

// =========================================================================
// Rasters
// =========================================================================

pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

/// Lossless PNG bytes for a raster.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

pub fn write_png(path: &Path, image: &RgbaImage) {
    std::fs::write(path, encode_png(image)).unwrap();
}

// =========================================================================
// Layers and documents
// =========================================================================

/// A layer with its own solid raster at the given offset.
pub fn raster_layer(
    name: &str,
    left: i64,
    top: i64,
    width: u32,
    height: u32,
    color: [u8; 4],
) -> Layer {
    Layer::named(name)
        .with_edges(
            left as f64,
            top as f64,
            (left + i64::from(width)) as f64,
            (top + i64::from(height)) as f64,
        )
        .with_canvas(solid(width, height, color))
}

/// A raster-less placeholder with edge bounds.
pub fn placeholder(name: &str, left: i64, top: i64, right: i64, bottom: i64) -> Layer {
    Layer::named(name).with_edges(left as f64, top as f64, right as f64, bottom as f64)
}

pub fn document(width: u32, height: u32, children: Vec<Layer>) -> Document {
    Document {
        width,
        height,
        children,
        ..Document::default()
    }
}

/// Canvas mask over `width` x `height`: white on the left half, black on the right.
pub fn left_half_mask(width: u32, height: u32) -> Mask {
    let canvas = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba(WHITE)
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    Mask {
        left: Some(0.0),
        top: Some(0.0),
        right: Some(width as f64),
        bottom: Some(height as f64),
        disabled: false,
        raster: Some(MaskRaster::Canvas(canvas)),
    }
}

pub fn candidates(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
