//! Decoded layered-document model.
//!
//! This is the shape a document decoder hands to the compositor: a canvas
//! size, an optional pre-flattened composite, and a tree of layers. Layer
//! geometry is deliberately loose. Decoders populate whichever positional
//! fields the source format exposes:
//!
//! | Representation | Fields |
//! |---|---|
//! | Bounds record | `bounds.{left,top,right,bottom}` or `bounds.{x,y,width,height}` |
//! | Edges | `left`, `top`, `right`, `bottom` |
//! | Origin + size | `left`/`x`, `top`/`y`, `width`, `height` |
//!
//! Turning that into one rectangle is the job of [`crate::bounds`]; nothing
//! else in the crate reads these fields directly.
//!
//! Decoding itself (PSD parsing or otherwise) is out of scope for this crate.
//! [`DocumentDecoder`] is the seam: [`crate::manifest::ManifestDecoder`] is
//! the implementation shipped here, other hosts plug in their own.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Canvas edge assumed when a document reports no size and has no composite.
pub const DEFAULT_CANVAS_EDGE: u32 = 2000;

#[derive(Error, Debug)]
pub enum DocumentDecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("Failed to decode raster {path}: {message}")]
    Raster { path: String, message: String },
}

/// Turns raw document bytes into a [`Document`].
///
/// Implementations must be `Sync` so batch rendering can share one decoder
/// across rayon workers.
pub trait DocumentDecoder: Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Document, DocumentDecodeError>;
}

/// A decoded layered document. Read-only input for one composite call.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Canvas width in pixels (0 when the decoder could not tell).
    pub width: u32,
    /// Canvas height in pixels (0 when the decoder could not tell).
    pub height: u32,
    /// Pixels per inch recorded in the document, if any.
    pub resolution: Option<f64>,
    /// Root layers, top-to-bottom as authored.
    pub children: Vec<Layer>,
    /// Pre-flattened preview of the whole document.
    pub composite: Option<RgbaImage>,
}

impl Document {
    /// Canvas size, falling back to the composite raster and then to
    /// [`DEFAULT_CANVAS_EDGE`] per axis when the document reports zero.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (cw, ch) = self
            .composite
            .as_ref()
            .map(|c| c.dimensions())
            .unwrap_or((0, 0));
        let pick = |own: u32, composite: u32| match (own, composite) {
            (0, 0) => DEFAULT_CANVAS_EDGE,
            (0, c) => c,
            (o, _) => o,
        };
        (pick(self.width, cw), pick(self.height, ch))
    }
}

/// Nested bounds object as some decoders emit it.
///
/// Either edge form (`left/top/right/bottom`) or origin form
/// (`x/y/width/height`) may be populated, or a mix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundsRecord {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Raw interleaved RGBA pixel data without a canvas wrapper.
///
/// `data` is not guaranteed to hold `width * height * 4` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("raster holds {actual} bytes but {width}x{height} RGBA needs {expected}")]
pub struct InvalidRaster {
    pub width: u32,
    pub height: u32,
    pub expected: usize,
    pub actual: usize,
}

impl ImageData {
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Copy into an [`RgbaImage`]; fails if the buffer is the wrong size.
    pub fn to_rgba(&self) -> Result<RgbaImage, InvalidRaster> {
        let invalid = || InvalidRaster {
            width: self.width,
            height: self.height,
            expected: self.expected_len(),
            actual: self.data.len(),
        };
        if self.data.len() != self.expected_len() {
            return Err(invalid());
        }
        RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(invalid)
    }
}

/// The two forms a mask raster arrives in.
#[derive(Debug, Clone)]
pub enum MaskRaster {
    /// Full-colour raster; reduced to luminance on extraction.
    Canvas(RgbaImage),
    /// Raw RGBA data; the red channel is the intensity.
    ImageData(ImageData),
}

/// A layer mask: its own edges, raster, and an enabled flag.
#[derive(Debug, Clone, Default)]
pub struct Mask {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub disabled: bool,
    pub raster: Option<MaskRaster>,
}

/// One node of the layer tree. Groups carry `children`.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub name: Option<String>,
    pub hidden: bool,
    /// Structural smart-object marker. Informational only: placeholder
    /// matching goes by name.
    pub placed: bool,
    pub bounds: Option<BoundsRecord>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// This layer's own decoded pixels.
    pub canvas: Option<RgbaImage>,
    /// Raw pixel data, used when no canvas was decoded.
    pub image_data: Option<ImageData>,
    pub mask: Option<Mask>,
    /// Vector/"real" mask, consulted when `mask` is absent.
    pub real_mask: Option<Mask>,
    pub children: Vec<Layer>,
}

impl Layer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_edges(mut self, left: f64, top: f64, right: f64, bottom: f64) -> Self {
        self.left = Some(left);
        self.top = Some(top);
        self.right = Some(right);
        self.bottom = Some(bottom);
        self
    }

    pub fn with_canvas(mut self, canvas: RgbaImage) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_children(mut self, children: Vec<Layer>) -> Self {
        self.children = children;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Name for logs and error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    /// The mask that applies to this layer: `mask`, else `real_mask`.
    pub fn effective_mask(&self) -> Option<&Mask> {
        self.mask.as_ref().or(self.real_mask.as_ref())
    }

    /// Pixel size of the layer's own raster, if it has a non-empty one.
    pub fn intrinsic_size(&self) -> Option<(u32, u32)> {
        let canvas = self.canvas.as_ref().map(|c| c.dimensions());
        let data = self.image_data.as_ref().map(|d| (d.width, d.height));
        canvas
            .into_iter()
            .chain(data)
            .find(|&(w, h)| w > 0 && h > 0)
    }

    /// The layer's pixels: the canvas if decoded, else the raw image data.
    ///
    /// `Ok(None)` means the layer simply has no raster (groups, adjustment
    /// layers); `Err` means raster data exists but is unusable.
    pub fn raster(&self) -> Result<Option<Cow<'_, RgbaImage>>, InvalidRaster> {
        if let Some(canvas) = &self.canvas {
            return Ok(Some(Cow::Borrowed(canvas)));
        }
        match &self.image_data {
            Some(data) => data.to_rgba().map(|img| Some(Cow::Owned(img))),
            None => Ok(None),
        }
    }

    pub fn has_raster(&self) -> bool {
        self.canvas.is_some() || self.image_data.is_some()
    }
}
