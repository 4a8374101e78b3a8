//! Barcode payload extraction from filenames.
//!
//! The default policy keeps every run of ASCII digits in the filename, in
//! order, and drops everything else: `file-01-02-03-26.pdf` becomes
//! `01020326`. A filename without digits has no identifier.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pattern used when no custom extraction policy is configured.
pub const DEFAULT_PATTERN: &str = "[0-9]+";

lazy_static! {
    /// Maximal runs of ASCII decimal digits
    static ref RE_DIGIT_RUNS: Regex = Regex::new(DEFAULT_PATTERN).unwrap();
}

/// A non-empty barcode payload derived from a filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap a payload, rejecting the empty string.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Borrow the payload.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extraction policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Regular expression; all matches are concatenated left to right
    pub pattern: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
        }
    }
}

/// Derives identifiers from filenames.
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    pattern: Regex,
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierExtractor {
    /// Extractor using the digit-run policy.
    pub fn new() -> Self {
        Self {
            pattern: RE_DIGIT_RUNS.clone(),
        }
    }

    /// Extractor using a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("invalid extraction pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Build the extractor described by a config section.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        if config.pattern == DEFAULT_PATTERN {
            Ok(Self::new())
        } else {
            Self::with_pattern(&config.pattern)
        }
    }

    /// Concatenate every match in `filename`, or `None` when nothing matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_barcode_stamper::identifier::IdentifierExtractor;
    ///
    /// let extractor = IdentifierExtractor::new();
    /// let id = extractor.extract("file-01-02-03-26.pdf").unwrap();
    /// assert_eq!(id.as_str(), "01020326");
    /// assert!(extractor.extract("no-digits-here.pdf").is_none());
    /// ```
    pub fn extract(&self, filename: &str) -> Option<Identifier> {
        let joined: String = self
            .pattern
            .find_iter(filename)
            .map(|m| m.as_str())
            .collect();
        Identifier::new(joined)
    }
}

/// Extract with the default digit-run policy.
pub fn extract(filename: &str) -> Option<Identifier> {
    IdentifierExtractor::new().extract(filename)
}
