//! CLI output formatting for every command.
//!
//! Output leads with what happened (which layer took the design, where it
//! landed, which strategy ran) and shows file paths as context. Every
//! entity follows the same two-level pattern: a header line, then indented
//! `Key: value` context lines.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! mockup.jpg (2000x2000, 72 dpi)
//!     Placeholder: YOUR DESIGN HERE
//!     Bounds: 200,300 → 1800,1700 (1600x1400)
//!     Placed: 200,300 (1600x1400)
//!     Strategy: layer stack
//!     Mask: applied
//! ```
//!
//! ## Batch
//!
//! ```text
//! Rendering 3 documents
//! 001 tshirt → layer stack (2000x2000)
//! 002 poster → failed: No visible layer named any of ["Design"]. ...
//! 003 mug → flat preview (1500x1000), 2 layers skipped
//! Rendered 2 of 3 documents
//! ```
//!
//! ## Layers
//!
//! ```text
//! Canvas 2000x2000
//!     Preview: present
//! 001 Background [raster] 0,0 → 2000,2000
//! 002 Frame (group)
//!     003 Design [smart object] 200,300 → 1800,1700
//! 004 Glare (hidden) [raster] 0,0 → 2000,2000
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::bounds::{self, Rect};
use crate::document::Document;
use crate::mockup::{BatchEvent, BatchItem, Diagnostics};
use crate::tree;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `left,top → right,bottom`
fn format_rect(rect: &Rect) -> String {
    format!(
        "{},{} → {},{}",
        rect.left, rect.top, rect.right, rect.bottom
    )
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

// ============================================================================
// Render
// ============================================================================

/// Format the result of a single render.
pub fn format_render_output(output_path: &Path, diagnostics: &Diagnostics) -> Vec<String> {
    let d = diagnostics;
    let mut lines = vec![format!(
        "{} ({}x{}, {} dpi)",
        output_path.display(),
        d.output_size.width,
        d.output_size.height,
        d.dpi
    )];
    lines.push(format!("    Placeholder: {}", d.placeholder));
    lines.push(format!(
        "    Bounds: {} ({}x{})",
        format_rect(&d.resolved_bounds),
        d.resolved_bounds.width(),
        d.resolved_bounds.height()
    ));
    lines.push(format!(
        "    Placed: {},{} ({}x{})",
        d.composite_position.left,
        d.composite_position.top,
        d.design_size.width,
        d.design_size.height
    ));
    lines.push(format!("    Strategy: {}", d.strategy));
    if d.mask_applied {
        lines.push("    Mask: applied".to_string());
    }
    if !d.skipped_layers.is_empty() {
        lines.push(format!("    Skipped: {}", d.skipped_layers.join(", ")));
    }
    lines
}

pub fn print_render_output(output_path: &Path, diagnostics: &Diagnostics) {
    for line in format_render_output(output_path, diagnostics) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Format one batch progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            vec![format!("Rendering {}", plural(*total, "document"))]
        }
        BatchEvent::Rendered {
            index,
            name,
            strategy,
            output_size,
            skipped_layers,
        } => {
            let mut line = format!(
                "{} {} → {} ({}x{})",
                format_index(index + 1),
                name,
                strategy,
                output_size.width,
                output_size.height
            );
            if *skipped_layers > 0 {
                line.push_str(&format!(", {} skipped", plural(*skipped_layers, "layer")));
            }
            vec![line]
        }
        BatchEvent::Failed { index, name, error } => {
            vec![format!(
                "{} {} → failed: {}",
                format_index(index + 1),
                name,
                error
            )]
        }
    }
}

/// Format the closing line of a batch run.
pub fn format_batch_summary(items: &[BatchItem]) -> Vec<String> {
    let rendered = items.iter().filter(|i| i.result.is_ok()).count();
    vec![format!(
        "Rendered {} of {}",
        rendered,
        plural(items.len(), "document")
    )]
}

pub fn print_batch_summary(items: &[BatchItem]) {
    for line in format_batch_summary(items) {
        println!("{}", line);
    }
}

// ============================================================================
// Layers
// ============================================================================

/// Format the document's layer tree in paint order.
///
/// Each line carries the layer's flattened index (the one the compositor
/// splits on), its flags, and its resolved bounds when they resolve.
pub fn format_layer_tree(document: &Document) -> Vec<String> {
    let (width, height) = document.canvas_size();
    let mut lines = vec![format!("Canvas {}x{}", width, height)];
    if document.composite.is_some() {
        lines.push("    Preview: present".to_string());
    }

    for (pos, flat) in tree::flatten(&document.children).iter().enumerate() {
        let layer = flat.layer;
        let mut line = format!(
            "{}{} {}",
            indent(flat.depth),
            format_index(pos + 1),
            layer.display_name()
        );
        if layer.is_group() {
            line.push_str(" (group)");
        }
        if layer.hidden {
            line.push_str(" (hidden)");
        }
        if layer.placed {
            line.push_str(" [smart object]");
        }
        if layer.has_raster() {
            line.push_str(" [raster]");
        }
        if layer.effective_mask().is_some() {
            line.push_str(" [mask]");
        }
        if !layer.is_group() {
            match bounds::resolve(layer) {
                Ok(rect) => line.push_str(&format!(" {}", format_rect(&rect))),
                Err(_) => line.push_str(" (no bounds)"),
            }
        }
        lines.push(line);
    }
    lines
}

pub fn print_layer_tree(document: &Document) {
    for line in format_layer_tree(document) {
        println!("{}", line);
    }
}
