//! JSON layer-manifest decoder.
//!
//! A manifest is an already-decoded layered document written out as JSON,
//! with each raster stored as an image file next to it. It is what a PSD
//! export script (or any other layered-format reader) hands this crate.
//!
//! ```json
//! {
//!   "width": 2000,
//!   "height": 2000,
//!   "resolution": 72,
//!   "composite": "preview.png",
//!   "layers": [
//!     { "name": "Background", "canvas": "bg.png", "left": 0, "top": 0 },
//!     {
//!       "name": "YOUR DESIGN HERE",
//!       "placed": true,
//!       "bounds": { "left": 200, "top": 300, "right": 1800, "bottom": 1700 },
//!       "mask": { "left": 200, "top": 300, "right": 1800, "bottom": 1700, "canvas": "mask.png" }
//!     },
//!     { "name": "Glare", "hidden": true, "canvas": "glare.png", "left": 0, "top": 0 }
//!   ]
//! }
//! ```
//!
//! Raster paths are relative to the decoder's root. Layer `canvas` files
//! decode to RGBA; a layer or mask `data` file is loaded as raw RGBA image
//! data instead (masks then read the red channel). Positional fields follow
//! [`crate::document::Layer`] and may be mixed freely.

use crate::document::{
    BoundsRecord, Document, DocumentDecodeError, DocumentDecoder, ImageData, Layer, Mask,
    MaskRaster,
};
use image::RgbaImage;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    resolution: Option<f64>,
    composite: Option<String>,
    #[serde(default, alias = "children")]
    layers: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerEntry {
    name: Option<String>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    placed: bool,
    bounds: Option<BoundsRecord>,
    left: Option<f64>,
    top: Option<f64>,
    right: Option<f64>,
    bottom: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
    canvas: Option<String>,
    data: Option<String>,
    mask: Option<MaskEntry>,
    #[serde(alias = "realMask")]
    real_mask: Option<MaskEntry>,
    #[serde(default)]
    children: Vec<LayerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MaskEntry {
    left: Option<f64>,
    top: Option<f64>,
    right: Option<f64>,
    bottom: Option<f64>,
    #[serde(default)]
    disabled: bool,
    canvas: Option<String>,
    data: Option<String>,
}

/// Decodes JSON manifests, resolving raster paths against `root`.
#[derive(Debug, Clone)]
pub struct ManifestDecoder {
    root: PathBuf,
}

impl ManifestDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decoder for the manifest at `path`; rasters resolve next to it.
    pub fn for_manifest(path: &Path) -> Self {
        Self::new(path.parent().unwrap_or(Path::new(".")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and decode the manifest at `path`.
    pub fn load(path: &Path) -> Result<Document, DocumentDecodeError> {
        let bytes = std::fs::read(path)?;
        Self::for_manifest(path).decode(&bytes)
    }

    fn read_raster(&self, relative: &str) -> Result<RgbaImage, DocumentDecodeError> {
        image::open(self.root.join(relative))
            .map(|img| img.to_rgba8())
            .map_err(|e| DocumentDecodeError::Raster {
                path: relative.to_string(),
                message: e.to_string(),
            })
    }

    fn read_image_data(&self, relative: &str) -> Result<ImageData, DocumentDecodeError> {
        let raster = self.read_raster(relative)?;
        Ok(ImageData {
            width: raster.width(),
            height: raster.height(),
            data: raster.into_raw(),
        })
    }

    fn convert_mask(&self, entry: MaskEntry) -> Result<Mask, DocumentDecodeError> {
        let raster = match (entry.canvas, entry.data) {
            (Some(canvas), _) => Some(MaskRaster::Canvas(self.read_raster(&canvas)?)),
            (None, Some(data)) => Some(MaskRaster::ImageData(self.read_image_data(&data)?)),
            (None, None) => None,
        };
        Ok(Mask {
            left: entry.left,
            top: entry.top,
            right: entry.right,
            bottom: entry.bottom,
            disabled: entry.disabled,
            raster,
        })
    }

    fn convert_layer(&self, entry: LayerEntry) -> Result<Layer, DocumentDecodeError> {
        let canvas = entry
            .canvas
            .as_deref()
            .map(|path| self.read_raster(path))
            .transpose()?;
        let image_data = entry
            .data
            .as_deref()
            .map(|path| self.read_image_data(path))
            .transpose()?;
        let mask = entry.mask.map(|m| self.convert_mask(m)).transpose()?;
        let real_mask = entry.real_mask.map(|m| self.convert_mask(m)).transpose()?;
        let children = entry
            .children
            .into_iter()
            .map(|child| self.convert_layer(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Layer {
            name: entry.name,
            hidden: entry.hidden,
            placed: entry.placed,
            bounds: entry.bounds,
            left: entry.left,
            top: entry.top,
            right: entry.right,
            bottom: entry.bottom,
            x: entry.x,
            y: entry.y,
            width: entry.width,
            height: entry.height,
            canvas,
            image_data,
            mask,
            real_mask,
            children,
        })
    }
}

impl DocumentDecoder for ManifestDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Document, DocumentDecodeError> {
        let file: ManifestFile = serde_json::from_slice(bytes)
            .map_err(|e| DocumentDecodeError::Malformed(e.to_string()))?;

        let composite = file
            .composite
            .as_deref()
            .map(|path| self.read_raster(path))
            .transpose()?;
        let children = file
            .layers
            .into_iter()
            .map(|entry| self.convert_layer(entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Document {
            width: file.width,
            height: file.height,
            resolution: file.resolution,
            children,
            composite,
        })
    }
}
