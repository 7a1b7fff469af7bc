//! Mockup configuration module.
//!
//! Handles loading, validating, and merging `mockup.toml`. Stock defaults are
//! the base layer; a user file overrides whichever keys it names, and CLI
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [placeholder]
//! names = ["YOUR DESIGN HERE", "Design Here", "Design"]
//!
//! [export]
//! format = "jpg"            # "jpg"/"jpeg" -> JPEG, anything else -> PNG
//! quality = 90              # JPEG quality (0-100)
//! dpi = 72                  # Output density; <= 0 means 72
//!
//! [fit]
//! mode = "cover"            # "cover" crops, "contain" letterboxes
//!
//! [processing]
//! max_processes = 4         # Max parallel batch renders (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want.
//!
//! ```toml
//! [export]
//! format = "png"
//! dpi = 300
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::FitMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Mockup configuration loaded from `mockup.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MockupConfig {
    /// Which layers count as the design placeholder.
    pub placeholder: PlaceholderConfig,
    /// Output format, quality and density.
    pub export: ExportConfig,
    /// How the design fills its frame.
    pub fit: FitConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl MockupConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.export.quality > 100 {
            return Err(ConfigError::Validation(
                "export.quality must be 0-100".into(),
            ));
        }
        if !self.export.dpi.is_finite() {
            return Err(ConfigError::Validation(
                "export.dpi must be a finite number".into(),
            ));
        }
        if self.placeholder.names.iter().all(|n| n.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "placeholder.names must contain at least one non-empty name".into(),
            ));
        }
        Ok(())
    }
}

/// Candidate placeholder layer names, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// Matched case-insensitively after trimming.
    pub names: Vec<String>,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            names: crate::mockup::DEFAULT_PLACEHOLDER_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Encoded output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// `jpg`/`jpeg` for JPEG; anything else encodes PNG.
    pub format: String,
    /// JPEG quality (0 = worst, 100 = best).
    pub quality: u32,
    /// Output density in pixels per inch.
    pub dpi: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: "jpg".to_string(),
            quality: 90,
            dpi: 72.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    pub mode: FitMode,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of documents rendered at once in a batch.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MockupConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MockupConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MockupConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file path.
///
/// A missing file yields the stock defaults. Otherwise user values are merged
/// on top of the defaults, unknown keys are rejected, and the result is
/// validated.
pub fn load_config(path: &Path) -> Result<MockupConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `mockup.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Mockup Press Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Placeholder
# ---------------------------------------------------------------------------
[placeholder]
# Layer names that mark where the design goes, in priority order.
# Matching trims whitespace and ignores case. Hidden layers never match.
names = ["YOUR DESIGN HERE", "Design Here", "Design"]

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# "jpg" or "jpeg" for JPEG. Any other value produces PNG.
format = "jpg"

# JPEG quality (0-100, higher = better quality, larger files).
quality = 90

# Output density in pixels per inch. The composite is resampled by
# dpi / document resolution (72 when the document records none).
# Values <= 0 are treated as 72.
dpi = 72.0

# ---------------------------------------------------------------------------
# Fit
# ---------------------------------------------------------------------------
[fit]
# How the design fills its frame. Both keep the design's aspect ratio.
#   "cover"   - fill the frame, centre-cropping the overflow
#   "contain" - fit inside the frame, padding with off-white
mode = "cover"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel renders during `batch`. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
