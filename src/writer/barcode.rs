//! Code 128 barcode rendering.
//!
//! Even-length digit payloads are encoded with code set C (two digits per
//! symbol); everything else uses code set B, which accepts printable ASCII.
//! The bars are rendered by the `barcoders` crate at a whole number of pixels
//! per module and never resampled, so every module survives into the PNG. The
//! page stamper scales the image into its footprint.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_barcode_stamper::writer::barcode::{BarcodeOptions, BarcodeRenderer};
//!
//! let renderer = BarcodeRenderer::new(BarcodeOptions::default(), std::env::temp_dir());
//! let artifact = renderer.render(&identifier)?;
//! // ... stamp artifact.path() ...
//! artifact.release()?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifier::Identifier;

/// Code 128 code set B selector understood by `barcoders`.
const CODE_SET_B: char = '\u{0181}';

/// Code 128 code set C selector understood by `barcoders`.
const CODE_SET_C: char = '\u{0106}';

/// Options for barcode raster generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeOptions {
    /// Width of the barcode in pixels
    pub width: u32,
    /// Height of the barcode in pixels
    pub height: u32,
    /// Foreground color (RGBA)
    pub foreground: [u8; 4],
    /// Background color (RGBA)
    pub background: [u8; 4],
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            width: 200,
            height: 80,
            foreground: [0, 0, 0, 255],       // Black
            background: [255, 255, 255, 255], // White
        }
    }
}

impl BarcodeOptions {
    /// Create new barcode options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the width in pixels.
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the height in pixels.
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the foreground color (RGBA).
    pub fn foreground(mut self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.foreground = [r, g, b, a];
        self
    }

    /// Set the background color (RGBA).
    pub fn background(mut self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.background = [r, g, b, a];
        self
    }
}

/// Check that every character of `payload` is encodable with code set B.
pub fn validate_payload(payload: &str) -> Result<()> {
    if payload.is_empty() {
        return Err(Error::Barcode("empty payload".to_string()));
    }
    match payload.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        Some(character) => Err(Error::UnsupportedCharacter {
            payload: payload.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

/// Encode `payload` as Code 128 modules (1 = bar, 0 = space).
pub fn encode_code128(payload: &str) -> Result<Vec<u8>> {
    use barcoders::sym::code128::Code128;

    validate_payload(payload)?;
    let set = if payload.len() % 2 == 0 && payload.bytes().all(|b| b.is_ascii_digit()) {
        CODE_SET_C
    } else {
        CODE_SET_B
    };
    let barcode = Code128::new(format!("{}{}", set, payload))
        .map_err(|e| Error::Barcode(format!("Code128 encoding error: {}", e)))?;
    Ok(barcode.encode())
}

/// Generate a Code 128 barcode as PNG bytes.
///
/// Modules are widened to the largest whole number of pixels that fits the
/// requested width and centred on the background colour. A payload with more
/// modules than the requested width is drawn one pixel per module, making the
/// image wider than requested rather than dropping bars.
pub fn generate_code128(payload: &str, options: &BarcodeOptions) -> Result<Vec<u8>> {
    use barcoders::generators::image::*;

    if options.width == 0 || options.height == 0 {
        return Err(Error::Barcode(format!(
            "invalid raster size {}x{}",
            options.width, options.height
        )));
    }
    let encoded = encode_code128(payload)?;

    let modules = encoded.len().max(1) as u32;
    let xdim = (options.width / modules).max(1);

    let image_gen = Image::PNG {
        height: options.height,
        xdim,
        rotation: Rotation::Zero,
        foreground: Color::new(options.foreground),
        background: Color::new(options.background),
    };

    let png_bytes = image_gen
        .generate(&encoded)
        .map_err(|e| Error::Barcode(format!("Image generation error: {}", e)))?;

    let bars = image::load_from_memory(&png_bytes)
        .map_err(|e| Error::Image(format!("cannot decode generated barcode: {}", e)))?
        .to_rgba8();

    let canvas_width = options.width.max(bars.width());
    let mut canvas =
        image::RgbaImage::from_pixel(canvas_width, options.height, image::Rgba(options.background));
    let offset_x = (canvas_width - bars.width()) / 2;
    image::imageops::overlay(&mut canvas, &bars, offset_x as i64, 0);

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Error::Image(format!("PNG encoding error: {}", e)))?;
    Ok(buf)
}

/// Renders identifiers into temporary PNG files.
#[derive(Debug, Clone)]
pub struct BarcodeRenderer {
    options: BarcodeOptions,
    temp_dir: PathBuf,
}

impl BarcodeRenderer {
    /// Create a renderer writing artifacts into `temp_dir`.
    pub fn new(options: BarcodeOptions, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            temp_dir: temp_dir.into(),
        }
    }

    /// Raster options in use.
    pub fn options(&self) -> &BarcodeOptions {
        &self.options
    }

    /// Render `identifier` to a uniquely named PNG file.
    ///
    /// The caller owns the returned artifact and is responsible for
    /// [releasing](BarcodeArtifact::release) it.
    pub fn render(&self, identifier: &Identifier) -> Result<BarcodeArtifact> {
        let png = generate_code128(identifier.as_str(), &self.options)?;
        let path = self.temp_dir.join(artifact_file_name(identifier));

        if let Err(e) = fs::write(&path, &png) {
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }
        log::debug!("Rendered barcode {} to {}", identifier, path.display());

        Ok(BarcodeArtifact {
            path,
            released: false,
        })
    }
}

/// `barcode_<identifier>_<uuid>.png`, with path-hostile characters replaced.
fn artifact_file_name(identifier: &Identifier) -> String {
    let stem: String = identifier
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("barcode_{}_{}.png", stem, uuid::Uuid::new_v4().simple())
}

/// A rendered barcode image on disk, deleted when released or dropped.
#[derive(Debug)]
pub struct BarcodeArtifact {
    path: PathBuf,
    released: bool,
}

impl BarcodeArtifact {
    /// Location of the PNG file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file, reporting any error other than it already being gone.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for BarcodeArtifact {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}
