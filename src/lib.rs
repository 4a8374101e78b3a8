//! # PDF Barcode Stamper
//!
//! Batch-stamps a Code 128 barcode onto every page of the PDFs in a folder.
//!
//! For each `*.pdf` in the source directory the pipeline:
//!
//! 1. derives an identifier from the filename (digit runs, concatenated:
//!    `file-01-02-03-26.pdf` → `01020326`),
//! 2. renders the identifier as a Code 128 PNG in a temporary file,
//! 3. overlays the image, captioned with the identifier, 20 units from the
//!    left and bottom edges of every page as displayed, writing the result to
//!    `<source>/processed/<filename>`,
//! 4. appends an outcome record to a SQLite store.
//!
//! Files are processed one at a time. A file that cannot be handled is
//! skipped with a logged reason; the rest of the batch continues.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_barcode_stamper::batch::{BatchOrchestrator, NullObserver};
//! use pdf_barcode_stamper::config::BatchConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = BatchOrchestrator::new(BatchConfig::default())?;
//! let result = orchestrator.run(std::path::Path::new("scans"), &NullObserver)?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

/// Batch configuration
pub mod config;

// Geometry and placement
pub mod geometry;

// Pipeline stages
pub mod identifier;
pub mod writer;
pub mod editor;
pub mod records;

// Orchestration
pub mod batch;

// Re-exports
pub use batch::{spawn_batch, BatchEvent, BatchObserver, BatchOrchestrator, BatchResult};
pub use config::BatchConfig;
pub use error::{Error, Result};
pub use identifier::{Identifier, IdentifierExtractor};
pub use records::{OutcomeRecord, RecordSink, SqliteRecordSink};
