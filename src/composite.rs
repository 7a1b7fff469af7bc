//! Layer compositor: re-renders the document stack around the fitted design.
//!
//! Two strategies implement [`StackRenderer`]:
//!
//! | Strategy | Used when | Output |
//! |---|---|---|
//! | [`LayerStackRenderer`] | some visible layer besides the placeholder has its own raster | before-layers, design, after-layers |
//! | [`FlatPreviewRenderer`] | no per-layer rasters | the document's flattened preview with the design on top |
//!
//! [`composite`] picks one with [`select_strategy`]. The flat preview path
//! loses anything that should sit above the design, so it always logs a
//! warning.
//!
//! ## Layer stack
//!
//! The flattened list is split at the placeholder index. Layers before it
//! paint first, in list order; layers after it paint over the design. Hidden
//! layers (including children of hidden groups) are left out. Group entries
//! paint nothing themselves since their children follow them in the list.
//!
//! The base raster is transparent and covers the document canvas plus
//! whatever the before-layers overflow to the right or bottom. Raster
//! preparation runs on rayon; painting is strictly sequential.
//!
//! ## Placement
//!
//! The design is placed at the clamped bounds origin
//! ([`calculate_placement`]). When the frame overflows the canvas the design
//! is refitted, with the request's fit mode, to the visible remainder.

use crate::bounds::{self, Rect};
use crate::document::{Document, Layer};
use crate::imaging::{
    BackendError, FitMode, Placement, RasterBackend, calculate_placement, fit_design,
};
use crate::tree::FlatLayer;
use image::RgbaImage;
use rayon::prelude::*;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("No renderable surface: no layer rasters and no flattened preview")]
    NoRenderableSurface,
    #[error("Imaging error: {0}")]
    Imaging(#[from] BackendError),
}

/// Which renderer produced a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    LayerStack,
    FlatPreview,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LayerStack => f.write_str("layer stack"),
            Strategy::FlatPreview => f.write_str("flat preview"),
        }
    }
}

/// Everything a renderer needs for one composite.
pub struct StackInput<'a> {
    pub document: &'a Document,
    /// Flattened layers in paint order.
    pub layers: &'a [FlatLayer<'a>],
    /// Index of the placeholder in `layers`.
    pub placeholder_index: Option<usize>,
    /// Design already fitted (and masked) to the size of `bounds`.
    pub design: &'a RgbaImage,
    pub bounds: Rect,
    pub fit: FitMode,
}

#[derive(Debug)]
pub struct RenderedStack {
    pub raster: RgbaImage,
    /// Where the design was painted.
    pub placement: Placement,
    pub strategy: Strategy,
    /// Layers dropped because their raster was missing or unusable.
    pub skipped_layers: Vec<String>,
}

pub trait StackRenderer {
    fn strategy(&self) -> Strategy;

    fn render<B: RasterBackend>(
        &self,
        backend: &B,
        input: &StackInput<'_>,
    ) -> Result<RenderedStack, CompositeError>;
}

fn has_usable_raster(layer: &Layer) -> bool {
    matches!(layer.raster(), Ok(Some(r)) if r.width() > 0 && r.height() > 0)
}

/// `LayerStack` when any visible layer other than the placeholder carries
/// a usable raster, else `FlatPreview`. Image data of the wrong length
/// doesn't count.
pub fn select_strategy(input: &StackInput<'_>) -> Strategy {
    let has_layer_rasters = input.placeholder_index.is_some()
        && input.layers.iter().enumerate().any(|(i, flat)| {
            Some(i) != input.placeholder_index && flat.visible && has_usable_raster(flat.layer)
        });
    if has_layer_rasters {
        Strategy::LayerStack
    } else {
        Strategy::FlatPreview
    }
}

/// Render with whichever strategy the document supports.
pub fn composite(
    backend: &impl RasterBackend,
    input: &StackInput<'_>,
) -> Result<RenderedStack, CompositeError> {
    match select_strategy(input) {
        Strategy::LayerStack => LayerStackRenderer.render(backend, input),
        Strategy::FlatPreview => FlatPreviewRenderer.render(backend, input),
    }
}

/// Clamp the frame onto `surface` and refit the design if it no longer fits.
fn place_design<'d>(
    backend: &impl RasterBackend,
    input: &StackInput<'d>,
    surface: (u32, u32),
) -> Result<(Cow<'d, RgbaImage>, Placement), BackendError> {
    let placement = calculate_placement(&input.bounds, surface);
    let visible = (placement.width, placement.height);
    if visible == input.design.dimensions() {
        return Ok((Cow::Borrowed(input.design), placement));
    }
    debug!(
        frame = ?input.bounds,
        ?visible,
        "frame overflows the canvas; refitting design to the visible area"
    );
    let refitted = fit_design(backend, input.design, visible, input.fit)?;
    Ok((Cow::Owned(refitted), placement))
}

// ============================================================================
// Layer stack
// ============================================================================

/// Paints before-layers, the design, then after-layers.
pub struct LayerStackRenderer;

enum LayerPaint<'a> {
    Hidden,
    Empty,
    Skipped(String),
    Raster {
        origin: (i64, i64),
        raster: Cow<'a, RgbaImage>,
    },
}

fn prepare<'a>(flat: &FlatLayer<'a>) -> LayerPaint<'a> {
    if !flat.visible {
        return LayerPaint::Hidden;
    }
    let layer = flat.layer;
    match layer.raster() {
        Ok(Some(raster)) if raster.width() > 0 && raster.height() > 0 => LayerPaint::Raster {
            origin: bounds::paint_origin(layer),
            raster,
        },
        Ok(Some(_)) => LayerPaint::Empty,
        Ok(None) if layer.is_group() => LayerPaint::Empty,
        Ok(None) => {
            warn!(
                layer = layer.display_name(),
                "layer has no raster; skipped"
            );
            LayerPaint::Skipped(layer.display_name().to_string())
        }
        Err(err) => {
            warn!(
                layer = layer.display_name(),
                error = %err,
                "layer raster unusable; skipped"
            );
            LayerPaint::Skipped(layer.display_name().to_string())
        }
    }
}

fn prepare_all<'a>(layers: &[FlatLayer<'a>]) -> Vec<LayerPaint<'a>> {
    layers.par_iter().map(prepare).collect()
}

fn paint_all(backend: &impl RasterBackend, base: &mut RgbaImage, paints: &[LayerPaint<'_>]) {
    for paint in paints {
        if let LayerPaint::Raster { origin, raster } = paint {
            backend.overlay(base, raster, origin.0, origin.1);
        }
    }
}

fn skipped_names<'a>(paints: &'a [LayerPaint<'a>]) -> impl Iterator<Item = String> + 'a {
    paints.iter().filter_map(|p| match p {
        LayerPaint::Skipped(name) => Some(name.clone()),
        _ => None,
    })
}

/// Document canvas extended to the far edges of every before-layer raster.
fn base_size(canvas: (u32, u32), before: &[LayerPaint<'_>]) -> (u32, u32) {
    let (mut right, mut bottom) = (i64::from(canvas.0), i64::from(canvas.1));
    for paint in before {
        if let LayerPaint::Raster { origin, raster } = paint {
            right = right.max(origin.0 + i64::from(raster.width()));
            bottom = bottom.max(origin.1 + i64::from(raster.height()));
        }
    }
    let to_u32 = |v: i64| u32::try_from(v).unwrap_or(u32::MAX);
    (to_u32(right), to_u32(bottom))
}

impl StackRenderer for LayerStackRenderer {
    fn strategy(&self) -> Strategy {
        Strategy::LayerStack
    }

    fn render<B: RasterBackend>(
        &self,
        backend: &B,
        input: &StackInput<'_>,
    ) -> Result<RenderedStack, CompositeError> {
        let (before, after) = match input.placeholder_index {
            Some(index) => (
                &input.layers[..index.min(input.layers.len())],
                input.layers.get(index + 1..).unwrap_or(&[]),
            ),
            None => (input.layers, &[][..]),
        };

        let before = prepare_all(before);
        let after = prepare_all(after);

        let canvas = input.document.canvas_size();
        let (width, height) = base_size(canvas, &before);
        debug!(
            before = before.len(),
            after = after.len(),
            width,
            height,
            "compositing layer by layer"
        );

        let mut raster = RgbaImage::new(width, height);
        paint_all(backend, &mut raster, &before);

        let (design, placement) = place_design(backend, input, canvas)?;
        backend.overlay(
            &mut raster,
            &design,
            i64::from(placement.left),
            i64::from(placement.top),
        );

        paint_all(backend, &mut raster, &after);

        let skipped_layers = skipped_names(&before).chain(skipped_names(&after)).collect();
        Ok(RenderedStack {
            raster,
            placement,
            strategy: self.strategy(),
            skipped_layers,
        })
    }
}

// ============================================================================
// Flat preview
// ============================================================================

/// Paints the design over the document's pre-flattened composite.
pub struct FlatPreviewRenderer;

impl StackRenderer for FlatPreviewRenderer {
    fn strategy(&self) -> Strategy {
        Strategy::FlatPreview
    }

    fn render<B: RasterBackend>(
        &self,
        backend: &B,
        input: &StackInput<'_>,
    ) -> Result<RenderedStack, CompositeError> {
        let preview = input
            .document
            .composite
            .as_ref()
            .ok_or(CompositeError::NoRenderableSurface)?;
        warn!(
            layers = input.layers.len(),
            "no per-layer rasters; painting the design over the flattened preview, \
             layers above the placeholder will be missing"
        );

        let mut raster = preview.clone();
        let (design, placement) = place_design(backend, input, preview.dimensions())?;
        backend.overlay(
            &mut raster,
            &design,
            i64::from(placement.left),
            i64::from(placement.top),
        );

        Ok(RenderedStack {
            raster,
            placement,
            strategy: self.strategy(),
            skipped_layers: Vec::new(),
        })
    }
}
