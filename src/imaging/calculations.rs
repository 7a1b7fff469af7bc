//! Pure calculation functions for fitting, placement and density.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::bounds::Rect;
use serde::Serialize;

/// Density assumed when neither the request nor the document carries one.
pub const BASE_DPI: f64 = 72.0;

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Calculate dimensions that fit entirely inside a target area.
///
/// The inverse of [`calculate_fill_dimensions`]: one dimension matches, the
/// other is at most the target's. Never returns a zero dimension.
pub fn calculate_contain_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let scale = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, tgt_w.max(1));
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, tgt_h.max(1));
    (w, h)
}

/// Offset that centres `inner` within `outer` along one axis.
///
/// Rounds half up, so odd leftovers put the extra pixel after the content.
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    ((i64::from(outer) - i64::from(inner)) as f64 / 2.0).round() as i64
}

/// Where the design lands on the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamp a frame onto a surface.
///
/// The origin is pulled inside the surface (at most one pixel from the far
/// edge) and the size is cut to what remains visible, so the result never
/// paints outside the surface and is never empty.
pub fn calculate_placement(frame: &Rect, surface: (u32, u32)) -> Placement {
    let (surf_w, surf_h) = (i64::from(surface.0.max(1)), i64::from(surface.1.max(1)));
    let left = frame.left.clamp(0, surf_w - 1);
    let top = frame.top.clamp(0, surf_h - 1);
    let width = frame.width().clamp(1, surf_w - left);
    let height = frame.height().clamp(1, surf_h - top);
    Placement {
        left: left as u32,
        top: top as u32,
        width: width as u32,
        height: height as u32,
    }
}

/// Requested density, with non-positive or missing values meaning [`BASE_DPI`].
pub fn effective_dpi(requested: Option<f64>) -> f64 {
    requested
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(BASE_DPI)
}

/// Uniform scale factor taking a raster from `source_dpi` to `target_dpi`.
pub fn calculate_dpi_scale(target_dpi: f64, source_dpi: Option<f64>) -> f64 {
    target_dpi / effective_dpi(source_dpi)
}

/// Scale both dimensions by the same factor, rounding, never below 1.
pub fn calculate_scaled_dimensions(size: (u32, u32), scale: f64) -> (u32, u32) {
    let scale_one = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (scale_one(size.0), scale_one(size.1))
}
