//! The mockup pipeline: one design, one layered document, one encoded image.
//!
//! ```text
//! decode document → locate placeholder → resolve bounds → decode design
//!     → fit → mask → composite stack → export
//! ```
//!
//! [`render_mockup`] is the entry point for hosts holding raw bytes.
//! [`render_document`] starts from an already-decoded [`Document`], and
//! [`render_batch`] renders one design into many documents on rayon.
//!
//! Errors are split the same way at every stage: structural problems with
//! the inputs (undecodable bytes, no placeholder, unusable bounds, nothing to
//! paint on) end the call with a [`MockupError`]. Cosmetic problems (a mask
//! that won't apply, a layer whose raster is missing) are logged and the
//! composite carries on without them.

use crate::bounds::{self, InvalidBounds, Rect};
use crate::composite::{self, CompositeError, StackInput, Strategy};
use crate::config::MockupConfig;
use crate::document::{Document, DocumentDecodeError, DocumentDecoder};
use crate::imaging::{
    BackendError, ExportFormat, ExportParams, FitMode, Quality, RasterBackend, RustBackend,
    export, fit_design, mask,
};
use crate::tree::{self, AVAILABLE_NAMES_LIMIT};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Placeholder names tried when the caller supplies none.
pub const DEFAULT_PLACEHOLDER_NAMES: [&str; 3] = ["YOUR DESIGN HERE", "Design Here", "Design"];

#[derive(Error, Debug)]
pub enum MockupError {
    #[error("Document decode failed: {0}")]
    DocumentDecode(#[from] DocumentDecodeError),
    #[error("Design image decode failed: {0}")]
    DesignDecode(#[source] BackendError),
    #[error(
        "No visible layer named any of {tried:?}. Available layers: {}",
        .available.join(", ")
    )]
    PlaceholderNotFound {
        tried: Vec<String>,
        /// First [`AVAILABLE_NAMES_LIMIT`] layer names in the document.
        available: Vec<String>,
    },
    #[error(transparent)]
    InvalidBounds(#[from] InvalidBounds),
    #[error("No renderable surface: no layer rasters and no flattened preview")]
    NoRenderableSurface,
    #[error("Imaging error: {0}")]
    Imaging(#[from] BackendError),
}

impl From<CompositeError> for MockupError {
    fn from(err: CompositeError) -> Self {
        match err {
            CompositeError::NoRenderableSurface => MockupError::NoRenderableSurface,
            CompositeError::Imaging(e) => MockupError::Imaging(e),
        }
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub quality: Quality,
    /// Target density. `None` or non-positive means 72.
    pub dpi: Option<f64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: Quality::default(),
            dpi: None,
        }
    }
}

/// Per-call settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MockupOptions {
    /// Candidate placeholder names, in priority order.
    pub placeholder_names: Vec<String>,
    pub fit: FitMode,
    pub export: ExportOptions,
}

impl Default for MockupOptions {
    fn default() -> Self {
        Self {
            placeholder_names: DEFAULT_PLACEHOLDER_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fit: FitMode::default(),
            export: ExportOptions::default(),
        }
    }
}

impl MockupOptions {
    pub fn from_config(config: &MockupConfig) -> Self {
        Self {
            placeholder_names: config.placeholder.names.clone(),
            fit: config.fit.mode,
            export: ExportOptions {
                format: ExportFormat::from_name(&config.export.format),
                quality: Quality::new(config.export.quality),
                dpi: Some(config.export.dpi),
            },
        }
    }
}

/// Raw inputs for one mockup.
#[derive(Debug, Clone)]
pub struct MockupRequest<'a> {
    pub design: &'a [u8],
    pub document: &'a [u8],
    pub options: MockupOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub left: u32,
    pub top: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// What happened during a render, for logging and debugging placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Name of the layer the design replaced.
    pub placeholder: String,
    /// The placeholder's bounds, before clamping to the canvas.
    pub resolved_bounds: Rect,
    /// Where the design was painted.
    pub composite_position: Position,
    /// Painted design size (after clamping to the canvas).
    pub design_size: Size,
    /// Document canvas size.
    pub document_dimensions: Size,
    pub strategy: Strategy,
    pub mask_applied: bool,
    /// Layers left out for missing or unusable rasters.
    pub skipped_layers: Vec<String>,
    /// Encoded image size, after density scaling.
    pub output_size: Size,
    pub dpi: f64,
}

#[derive(Debug, Clone)]
pub struct MockupOutput {
    pub image: Vec<u8>,
    pub mime_type: &'static str,
    pub diagnostics: Diagnostics,
}

/// Render a mockup from raw bytes with the built-in [`RustBackend`].
pub fn render_mockup(
    decoder: &impl DocumentDecoder,
    request: &MockupRequest<'_>,
) -> Result<MockupOutput, MockupError> {
    render_mockup_with_backend(&RustBackend::new(), decoder, request)
}

/// Render a mockup using a specific backend (allows testing with mock).
pub fn render_mockup_with_backend(
    backend: &impl RasterBackend,
    decoder: &impl DocumentDecoder,
    request: &MockupRequest<'_>,
) -> Result<MockupOutput, MockupError> {
    let document = decoder.decode(request.document)?;
    render_document(backend, &document, request.design, &request.options)
}

/// Fit, mask and composite `design` into an already-decoded document.
pub fn render_document(
    backend: &impl RasterBackend,
    document: &Document,
    design: &[u8],
    options: &MockupOptions,
) -> Result<MockupOutput, MockupError> {
    let target = tree::locate(&document.children, &options.placeholder_names).ok_or_else(|| {
        MockupError::PlaceholderNotFound {
            tried: options.placeholder_names.clone(),
            available: tree::layer_names(&document.children, AVAILABLE_NAMES_LIMIT),
        }
    })?;
    let frame = bounds::resolve(target)?;

    let design = backend.decode(design).map_err(MockupError::DesignDecode)?;
    let mut fitted = fit_design(backend, &design, frame.size(), options.fit)?;

    let mut mask_applied = false;
    if let Some(buffer) = mask::extract(target.effective_mask(), backend) {
        match mask::apply(&fitted, &buffer, backend) {
            Ok(masked) => {
                fitted = masked;
                mask_applied = true;
            }
            Err(err) => warn!(
                layer = target.display_name(),
                error = %err,
                "could not apply layer mask; using unmasked design"
            ),
        }
    } else if target.effective_mask().is_some() {
        debug!(layer = target.display_name(), "layer mask is empty or disabled");
    }

    let flat = tree::flatten(&document.children);
    let rendered = composite::composite(
        backend,
        &StackInput {
            document,
            layers: &flat,
            placeholder_index: tree::position_of(&flat, target),
            design: &fitted,
            bounds: frame,
            fit: options.fit,
        },
    )?;

    let exported = export(
        backend,
        &rendered.raster,
        &ExportParams {
            format: options.export.format,
            quality: options.export.quality,
            dpi: options.export.dpi,
            source_dpi: document.resolution,
        },
    )?;

    let placement = rendered.placement;
    let diagnostics = Diagnostics {
        placeholder: target.display_name().to_string(),
        resolved_bounds: frame,
        composite_position: Position {
            left: placement.left,
            top: placement.top,
        },
        design_size: Size {
            width: placement.width,
            height: placement.height,
        },
        document_dimensions: document.canvas_size().into(),
        strategy: rendered.strategy,
        mask_applied,
        skipped_layers: rendered.skipped_layers,
        output_size: Size {
            width: exported.width,
            height: exported.height,
        },
        dpi: exported.dpi,
    };
    info!(
        placeholder = %diagnostics.placeholder,
        strategy = %diagnostics.strategy,
        width = exported.width,
        height = exported.height,
        "mockup rendered"
    );

    Ok(MockupOutput {
        image: exported.bytes,
        mime_type: exported.mime_type,
        diagnostics,
    })
}

// ============================================================================
// Batch rendering
// ============================================================================

/// One document in a batch.
pub struct BatchJob<D> {
    /// Label used in events and results, typically the manifest's file stem.
    pub name: String,
    pub decoder: D,
    pub document: Vec<u8>,
}

/// Outcome for one batch job, in input order.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub result: Result<MockupOutput, MockupError>,
}

/// Progress events emitted during batch rendering.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Rendered {
        index: usize,
        name: String,
        strategy: Strategy,
        output_size: Size,
        skipped_layers: usize,
    },
    Failed {
        index: usize,
        name: String,
        error: String,
    },
}

/// Render `design` into every job's document in parallel.
///
/// The design bytes are decoded once per job (the fit depends on each
/// document's frame). A failing job never stops the others. Results come
/// back in job order; events arrive in completion order.
pub fn render_batch<D: DocumentDecoder>(
    backend: &impl RasterBackend,
    design: &[u8],
    jobs: &[BatchJob<D>],
    options: &MockupOptions,
    events: Option<Sender<BatchEvent>>,
) -> Vec<BatchItem> {
    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only means nobody is listening.
            tx.send(event).ok();
        }
    };
    emit(BatchEvent::Started { total: jobs.len() });

    jobs.par_iter()
        .enumerate()
        .map(|(index, job)| {
            let result = job
                .decoder
                .decode(&job.document)
                .map_err(MockupError::from)
                .and_then(|document| render_document(backend, &document, design, options));

            match &result {
                Ok(output) => emit(BatchEvent::Rendered {
                    index,
                    name: job.name.clone(),
                    strategy: output.diagnostics.strategy,
                    output_size: output.diagnostics.output_size,
                    skipped_layers: output.diagnostics.skipped_layers.len(),
                }),
                Err(err) => {
                    warn!(document = %job.name, error = %err, "batch render failed");
                    emit(BatchEvent::Failed {
                        index,
                        name: job.name.clone(),
                        error: err.to_string(),
                    });
                }
            }

            BatchItem {
                name: job.name.clone(),
                result,
            }
        })
        .collect()
}
