//! # Mockup Press
//!
//! Composites flat artwork into layered mockup documents. A mockup is a
//! layered image (a t-shirt photo, a framed poster, a phone screen) with one
//! placeholder layer marking where artwork goes. Given a design image and
//! such a document, this crate finds the placeholder, fits the design to it,
//! clips it with the placeholder's mask, and paints it between the layers
//! below and above.
//!
//! # Architecture: One Pipeline, Two Strategies
//!
//! ```text
//! 1. Decode     bytes      →  Document        (layer tree, rasters, preview)
//! 2. Locate     Document   →  placeholder     (name priority, visible only)
//! 3. Fit        design     →  frame-sized     (cover crops, contain letterboxes)
//! 4. Mask       frame      →  clipped frame   (layer or vector mask)
//! 5. Composite  layers     →  canvas          (layer stack, else flat preview)
//! 6. Export     canvas     →  JPEG/PNG bytes  (density scaling)
//! ```
//!
//! Every stage takes what the previous one produced and nothing else, so the
//! stages can be tested in isolation. Pixel work goes through the
//! [`imaging::RasterBackend`] trait; tests swap in a recording backend and
//! assert on the operations issued rather than on pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`document`] | Decoded document model (`Document`, `Layer`, `Mask`) and the `DocumentDecoder` seam |
//! | [`manifest`] | JSON layer-manifest decoder, the built-in `DocumentDecoder` |
//! | [`tree`] | Paint-order flattening, placeholder lookup, name listing |
//! | [`bounds`] | Resolving a layer's frame from its several positional representations |
//! | [`imaging`] | Fit, mask, overlay, resample and encode behind a backend trait |
//! | [`composite`] | Layer-stack and flat-preview rendering strategies |
//! | [`mockup`] | The end-to-end pipeline, diagnostics, and batch rendering |
//! | [`config`] | `mockup.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Layer Stack First, Flat Preview as Fallback
//!
//! When the document carries per-layer rasters, the design is painted at its
//! true depth: overlays such as glare, folds and shadows land on top of it.
//! Documents exported without layer pixels still render, by pasting the design
//! onto the flattened preview. Callers can tell which one ran from
//! [`mockup::Diagnostics::strategy`].
//!
//! ## Structural Errors Fail, Cosmetic Ones Don't
//!
//! No placeholder, unusable bounds, or nothing to paint on ends the render.
//! A mask that won't apply or a layer with a broken raster is logged with
//! `tracing` and left out; the skipped layers are reported in the
//! diagnostics.
//!
//! ## Deterministic Output
//!
//! The same inputs always produce the same bytes. Layer preparation runs on
//! rayon, but painting is sequential in paint order and every resampling
//! kernel is fixed per operation.

pub mod bounds;
pub mod composite;
pub mod config;
pub mod document;
pub mod imaging;
pub mod manifest;
pub mod mockup;
pub mod output;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
