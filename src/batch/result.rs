//! Per-file outcomes and the batch summary.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::identifier::Identifier;

/// One candidate PDF found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    file_name: String,
}

impl SourceFile {
    /// Reference a file by its full path and base name.
    pub fn new(path: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: file_name.into(),
        }
    }

    /// Full path to the source PDF.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base filename, the input to identifier extraction.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Why a file did not reach [`FileStatus::Succeeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Filename yielded no identifier
    NoIdentifier,
    /// Barcode could not be rendered
    RenderFailed,
    /// PDF could not be opened, stamped or saved
    StampFailed,
    /// Output was written but the record could not be appended
    SinkFailed,
}

impl FailureKind {
    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::NoIdentifier => "no identifier",
            FailureKind::RenderFailed => "render failed",
            FailureKind::StampFailed => "stamp failed",
            FailureKind::SinkFailed => "record failed",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Stamped and recorded
    Succeeded,
    /// Dropped before producing output
    Skipped,
    /// Output produced but the run could not complete its bookkeeping
    Failed,
}

/// A file that did not succeed, with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileIssue {
    /// Source filename
    pub file_name: String,
    /// Identifier, when one was extracted
    pub identifier: Option<Identifier>,
    /// Failure class
    pub kind: FailureKind,
    /// Underlying cause, if any
    pub detail: Option<String>,
}

impl FileIssue {
    /// Terminal state implied by the failure class.
    pub fn status(&self) -> FileStatus {
        match self.kind {
            FailureKind::SinkFailed => FileStatus::Failed,
            _ => FileStatus::Skipped,
        }
    }
}

impl fmt::Display for FileIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.kind)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

/// Summary of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Number of candidate PDFs found
    pub total: usize,
    /// Files stamped and recorded
    pub succeeded: usize,
    /// Files that were skipped or failed, in processing order
    pub issues: Vec<FileIssue>,
}

impl BatchResult {
    /// Empty result for a run over `total` candidates.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            issues: Vec::new(),
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub(crate) fn record_issue(&mut self, issue: FileIssue) {
        self.issues.push(issue);
    }

    /// Issues of a given class.
    pub fn issues_of(&self, kind: FailureKind) -> impl Iterator<Item = &FileIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Number of files that ended Skipped.
    pub fn skipped(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.status() == FileStatus::Skipped)
            .count()
    }

    /// Number of files that ended Failed.
    pub fn failed(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.status() == FileStatus::Failed)
            .count()
    }

    /// True when every candidate succeeded (vacuously true for an empty run).
    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processed {}/{} files", self.succeeded, self.total)
    }
}
