//! Error types for the barcode stamping pipeline.
//!
//! Every pipeline stage returns [`Result`]; the batch orchestrator maps the
//! error it receives onto a per-file [`FailureKind`](crate::batch::FailureKind)
//! or, for directory-level problems, aborts the run.

use std::path::PathBuf;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while stamping a batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Payload contains a character the symbology cannot encode
    #[error("Unsupported barcode character {character:?} in payload '{payload}'")]
    UnsupportedCharacter {
        /// Offending payload
        payload: String,
        /// First character that could not be encoded
        character: char,
    },

    /// Barcode encoding or raster generation failed
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Image decoding or compression failed
    #[error("Image error: {0}")]
    Image(String),

    /// PDF could not be parsed or serialized
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// PDF parsed but its structure cannot be stamped
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Encrypted documents are not stamped
    #[error("PDF is encrypted")]
    Encrypted,

    /// Record store error
    #[error("Record store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Source directory could not be listed
    #[error("Cannot read source directory {path}: {source}")]
    SourceDirectory {
        /// Directory being enumerated
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created
    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory being created
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
