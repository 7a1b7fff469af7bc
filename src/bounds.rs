//! Bounds resolution: one integer rectangle from a layer's loose geometry.
//!
//! A layer may describe its position in several overlapping ways (see
//! [`crate::document`]). [`resolve`] tries them as an ordered chain:
//!
//! 1. the nested bounds record
//! 2. direct `left/top/right/bottom` edges
//! 3. origin (`left`/`x`, `top`/`y`) plus `width`/`height`
//! 4. the layer's own raster size, anchored at the origin found so far
//!
//! The first non-degenerate rectangle wins. If all four fail the layer's
//! bounds are invalid and the caller gets [`InvalidBounds`].
//!
//! ## Rounding
//!
//! Only the origin is rounded independently. The far edges are
//! `round(left) + round(width)`, so a 10.4px-wide rectangle is always 10px
//! wide no matter where its edges fall relative to pixel centres.

use crate::document::Layer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Integer pixel rectangle. `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rect {
    pub fn from_origin_size(left: i64, top: i64, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            right: left + i64::from(width),
            bottom: top + i64::from(height),
        }
    }

    pub fn width(&self) -> i64 {
        self.right - self.left
    }

    pub fn height(&self) -> i64 {
        self.bottom - self.top
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Width and height as unsigned pixel counts. Only meaningful for a
    /// non-degenerate rectangle; degenerate axes come back as 0.
    pub fn size(&self) -> (u32, u32) {
        let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        (clamp(self.width()), clamp(self.height()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Layer \"{layer}\" has invalid bounds (width {width}, height {height})")]
pub struct InvalidBounds {
    pub layer: String,
    pub width: i64,
    pub height: i64,
}

/// One positional representation read off a layer, before rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// From the nested bounds record.
    Record {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
    /// From the layer's own edge fields.
    Edges {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
    /// From an origin plus a size.
    OriginSize {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
}

impl Geometry {
    pub fn origin(&self) -> (f64, f64) {
        match *self {
            Geometry::Record { left, top, .. }
            | Geometry::Edges { left, top, .. }
            | Geometry::OriginSize { left, top, .. } => (left, top),
        }
    }

    /// Unrounded width and height.
    pub fn extent(&self) -> (f64, f64) {
        match *self {
            Geometry::Record {
                left,
                top,
                right,
                bottom,
            }
            | Geometry::Edges {
                left,
                top,
                right,
                bottom,
            } => (right - left, bottom - top),
            Geometry::OriginSize { width, height, .. } => (width, height),
        }
    }

    pub fn to_rect(&self) -> Rect {
        let (left, top) = self.origin();
        let (width, height) = self.extent();
        normalize(left, top, width, height)
    }
}

/// Round origin and size separately; derive far edges from them.
pub fn normalize(left: f64, top: f64, width: f64, height: f64) -> Rect {
    let left = left.round() as i64;
    let top = top.round() as i64;
    Rect {
        left,
        top,
        right: left + width.round() as i64,
        bottom: top + height.round() as i64,
    }
}

fn from_record(layer: &Layer) -> Option<Geometry> {
    let b = layer.bounds.as_ref()?;
    let left = b.left.or(b.x).unwrap_or(0.0);
    let top = b.top.or(b.y).unwrap_or(0.0);
    Some(Geometry::Record {
        left,
        top,
        right: b.right.unwrap_or(left + b.width.unwrap_or(0.0)),
        bottom: b.bottom.unwrap_or(top + b.height.unwrap_or(0.0)),
    })
}

fn from_edges(layer: &Layer) -> Option<Geometry> {
    let (right, bottom) = (layer.right?, layer.bottom?);
    Some(Geometry::Edges {
        left: layer.left.unwrap_or(0.0),
        top: layer.top.unwrap_or(0.0),
        right,
        bottom,
    })
}

fn from_origin_size(layer: &Layer) -> Option<Geometry> {
    let nested = layer.bounds.as_ref();
    let width = layer.width.or_else(|| nested.and_then(|b| b.width));
    let height = layer.height.or_else(|| nested.and_then(|b| b.height));
    if width.is_none() && height.is_none() {
        return None;
    }
    Some(Geometry::OriginSize {
        left: layer.left.or(layer.x).unwrap_or(0.0),
        top: layer.top.or(layer.y).unwrap_or(0.0),
        width: width.unwrap_or(0.0),
        height: height.unwrap_or(0.0),
    })
}

/// Every representation present on the layer, in resolution order.
pub fn geometries(layer: &Layer) -> Vec<Geometry> {
    [from_record(layer), from_edges(layer), from_origin_size(layer)]
        .into_iter()
        .flatten()
        .collect()
}

/// Resolve the layer's placement rectangle. See the [module docs](self).
pub fn resolve(layer: &Layer) -> Result<Rect, InvalidBounds> {
    let mut first_attempt: Option<Rect> = None;

    for geometry in geometries(layer) {
        let rect = geometry.to_rect();
        if !rect.is_degenerate() {
            debug!(layer = layer.display_name(), ?rect, ?geometry, "resolved bounds");
            return Ok(rect);
        }
        first_attempt.get_or_insert(rect);
    }

    let attempted = first_attempt.unwrap_or_default();
    if let Some((width, height)) = layer.intrinsic_size() {
        let rect = Rect::from_origin_size(attempted.left, attempted.top, width, height);
        info!(
            layer = layer.display_name(),
            width, height, "bounds degenerate; using the layer raster size"
        );
        return Ok(rect);
    }

    Err(InvalidBounds {
        layer: layer.display_name().to_string(),
        width: attempted.width(),
        height: attempted.height(),
    })
}

/// Where an ordinary layer's raster is painted: the rounded origin of the
/// first geometry that [`resolve`] would accept, else of the first geometry,
/// else (0, 0). Never fails; degenerate sizes don't matter because the
/// raster carries its own size.
pub fn paint_origin(layer: &Layer) -> (i64, i64) {
    let geometries = geometries(layer);
    geometries
        .iter()
        .map(Geometry::to_rect)
        .find(|rect| !rect.is_degenerate())
        .or_else(|| geometries.first().map(Geometry::to_rect))
        .map(|rect| (rect.left, rect.top))
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BoundsRecord, ImageData};
    use image::RgbaImage;

    #[test]
    fn resolves_bounds_record() {
        let mut layer = Layer::named("Design");
        layer.bounds = Some(BoundsRecord {
            left: Some(200.0),
            top: Some(300.0),
            right: Some(1800.0),
            bottom: Some(1700.0),
            ..BoundsRecord::default()
        });
        let rect = resolve(&layer).unwrap();
        assert_eq!(
            rect,
            Rect {
                left: 200,
                top: 300,
                right: 1800,
                bottom: 1700
            }
        );
        assert_eq!(rect.size(), (1600, 1400));
    }

    #[test]
    fn record_accepts_xy_aliases_and_synthesizes_edges() {
        let mut layer = Layer::named("Design");
        layer.bounds = Some(BoundsRecord {
            x: Some(10.0),
            y: Some(20.0),
            width: Some(100.0),
            height: Some(50.0),
            ..BoundsRecord::default()
        });
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(10, 20, 100, 50));
    }

    #[test]
    fn resolves_direct_edges() {
        let layer = Layer::named("Design").with_edges(5.0, 6.0, 105.0, 56.0);
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(5, 6, 100, 50));
    }

    #[test]
    fn resolves_origin_and_size() {
        let mut layer = Layer::named("Design");
        layer.x = Some(7.0);
        layer.y = Some(8.0);
        layer.width = Some(30.0);
        layer.height = Some(40.0);
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(7, 8, 30, 40));
    }

    #[test]
    fn empty_record_falls_through_to_edges() {
        let mut layer = Layer::named("Design").with_edges(0.0, 0.0, 64.0, 32.0);
        layer.bounds = Some(BoundsRecord::default());
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(0, 0, 64, 32));
    }

    #[test]
    fn width_survives_rounding_of_fractional_edges() {
        // Independent rounding would give 21 - 10 = 11.
        let layer = Layer::named("Design").with_edges(10.4, 0.0, 20.6, 10.0);
        let rect = resolve(&layer).unwrap();
        assert_eq!(rect.width(), (20.6f64 - 10.4).round() as i64);
        assert_eq!(rect.width(), 10);
        assert_eq!(rect.left, 10);
    }

    #[test]
    fn width_preserved_across_many_fractional_offsets() {
        for i in 0..100 {
            let left = i as f64 * 0.37;
            let right = left + 123.45;
            let layer = Layer::named("Design").with_edges(left, 0.0, right, 10.0);
            let rect = resolve(&layer).unwrap();
            assert_eq!(rect.width(), (right - left).round() as i64, "left = {left}");
        }
    }

    #[test]
    fn degenerate_bounds_fall_back_to_canvas_size() {
        let layer = Layer::named("Design")
            .with_edges(40.0, 50.0, 40.0, 50.0)
            .with_canvas(RgbaImage::new(300, 200));
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(40, 50, 300, 200));
    }

    #[test]
    fn missing_geometry_falls_back_to_image_data_at_zero() {
        let mut layer = Layer::named("Design");
        layer.image_data = Some(ImageData {
            width: 12,
            height: 9,
            data: vec![0; 12 * 9 * 4],
        });
        assert_eq!(resolve(&layer).unwrap(), Rect::from_origin_size(0, 0, 12, 9));
    }

    #[test]
    fn degenerate_without_raster_is_an_error() {
        let layer = Layer::named("Design").with_edges(10.0, 10.0, 5.0, 30.0);
        let err = resolve(&layer).unwrap_err();
        assert_eq!(err.layer, "Design");
        assert_eq!(err.width, -5);
        assert_eq!(err.height, 20);
    }

    #[test]
    fn paint_origin_defaults_to_zero() {
        assert_eq!(paint_origin(&Layer::named("bg")), (0, 0));
        let layer = Layer::named("shadow").with_edges(-3.6, 4.4, 10.0, 10.0);
        assert_eq!(paint_origin(&layer), (-4, 4));
    }

    #[test]
    fn paint_origin_skips_an_empty_record() {
        let mut layer = Layer::named("shadow")
            .with_edges(30.0, 40.0, 40.0, 50.0)
            .with_canvas(RgbaImage::new(10, 10));
        layer.bounds = Some(BoundsRecord::default());
        assert_eq!(paint_origin(&layer), (30, 40));
        let rect = resolve(&layer).unwrap();
        assert_eq!(paint_origin(&layer), (rect.left, rect.top));
    }

    #[test]
    fn paint_origin_keeps_degenerate_origin_when_nothing_resolves() {
        let layer = Layer::named("glow").with_edges(12.0, 7.0, 12.0, 7.0);
        assert_eq!(paint_origin(&layer), (12, 7));
    }
}
