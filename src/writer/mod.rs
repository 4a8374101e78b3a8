//! Raster generation and image embedding.
//!
//! - [`barcode`]: Code 128 rendering into temporary PNG files
//! - [`caption`]: Helvetica metrics for the text printed under the bars
//! - [`image_handler`]: conversion of raster images into PDF image XObjects

pub mod barcode;
pub mod caption;
pub mod image_handler;

pub use barcode::{BarcodeArtifact, BarcodeOptions, BarcodeRenderer};
pub use image_handler::{ColorSpace, ImageData};
