//! Configuration for batch stamping.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::StampPlacement;
use crate::identifier::ExtractionConfig;
use crate::records::DEFAULT_STORE_PATH;
use crate::writer::barcode::BarcodeOptions;

/// Name of the output subdirectory created under the source directory.
pub const DEFAULT_OUTPUT_DIR: &str = "processed";

/// Batch processing configuration.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Output subdirectory name under the source directory.
    pub output_dir_name: String,

    /// Record store file.
    pub store_path: PathBuf,

    /// Where temporary barcode images are written.
    pub temp_dir: PathBuf,

    /// Barcode placement on each page.
    pub placement: StampPlacement,

    /// Barcode raster options.
    pub barcode: BarcodeOptions,

    /// Identifier extraction policy.
    pub extraction: ExtractionConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            output_dir_name: DEFAULT_OUTPUT_DIR.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            temp_dir: std::env::temp_dir(),
            placement: StampPlacement::default(),
            barcode: BarcodeOptions::default(),
            extraction: ExtractionConfig::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.output_dir_name).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_name {
            return Err(Error::Config(format!(
                "output_dir_name must be a single directory name, got '{}'",
                self.output_dir_name
            )));
        }
        if self.placement.width <= 0.0 || self.placement.height <= 0.0 {
            return Err(Error::Config("placement width and height must be positive".to_string()));
        }
        if !self.placement.caption_size.is_finite() || self.placement.caption_size < 0.0 {
            return Err(Error::Config("caption_size must be zero or positive".to_string()));
        }
        if self.barcode.width == 0 || self.barcode.height == 0 {
            return Err(Error::Config("barcode width and height must be positive".to_string()));
        }
        Ok(())
    }

    /// Set the output subdirectory name.
    pub fn with_output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.output_dir_name = name.into();
        self
    }

    /// Set the record store file.
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    /// Set the temporary directory for barcode images.
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_dir = path.into();
        self
    }

    /// Set the barcode placement.
    pub fn with_placement(mut self, placement: StampPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the barcode raster options.
    pub fn with_barcode(mut self, options: BarcodeOptions) -> Self {
        self.barcode = options;
        self
    }

    /// Set the identifier extraction pattern.
    pub fn with_extraction_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.extraction.pattern = pattern.into();
        self
    }
}
