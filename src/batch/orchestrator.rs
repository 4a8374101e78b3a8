//! Sequential batch driver.
//!
//! Each candidate PDF goes through extraction, rendering, stamping and
//! recording before the next one starts. Failures of a single file are turned
//! into a [`FileIssue`] and the loop moves on; only directory-level problems
//! (listing the source, creating the output directory, opening the record
//! store) abort the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use log::Level;

use super::events::{BatchEvent, BatchObserver};
use super::result::{BatchResult, FailureKind, FileIssue, SourceFile};
use crate::config::BatchConfig;
use crate::editor::PageStamper;
use crate::error::{Error, Result};
use crate::identifier::{Identifier, IdentifierExtractor};
use crate::records::{OutcomeRecord, RecordSink, SqliteRecordSink};
use crate::writer::barcode::BarcodeRenderer;

/// Drives a directory of PDFs through the stamping pipeline.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    config: BatchConfig,
    extractor: IdentifierExtractor,
    renderer: BarcodeRenderer,
    stamper: PageStamper,
}

impl BatchOrchestrator {
    /// Build the pipeline described by `config`.
    pub fn new(config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let extractor = IdentifierExtractor::from_config(&config.extraction)?;
        let renderer = BarcodeRenderer::new(config.barcode.clone(), config.temp_dir.clone());
        let stamper = PageStamper::new(config.placement);
        Ok(Self {
            config,
            extractor,
            renderer,
            stamper,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process `source_dir`, recording outcomes in the configured SQLite store.
    pub fn run(&self, source_dir: &Path, observer: &dyn BatchObserver) -> Result<BatchResult> {
        let store_path = self.config.store_path.clone();
        self.run_with_sink(source_dir, move || SqliteRecordSink::open(store_path), observer)
    }

    /// Process `source_dir` with a caller-provided record session.
    ///
    /// `open_sink` is invoked once, after the output directory exists and only
    /// if there is at least one candidate file.
    pub fn run_with_sink<S, F>(
        &self,
        source_dir: &Path,
        open_sink: F,
        observer: &dyn BatchObserver,
    ) -> Result<BatchResult>
    where
        S: RecordSink,
        F: FnOnce() -> Result<S>,
    {
        match self.run_inner(source_dir, open_sink, observer) {
            Ok(result) => Ok(result),
            Err(e) => {
                emit(observer, Level::Error, &format!("Critical Error: {}", e));
                Err(e)
            },
        }
    }

    fn run_inner<S, F>(
        &self,
        source_dir: &Path,
        open_sink: F,
        observer: &dyn BatchObserver,
    ) -> Result<BatchResult>
    where
        S: RecordSink,
        F: FnOnce() -> Result<S>,
    {
        let candidates = enumerate_candidates(source_dir)?;
        let total = candidates.len();
        if total == 0 {
            emit(
                observer,
                Level::Info,
                &format!("No PDF files found in {}.", source_dir.display()),
            );
            return Ok(BatchResult::new(0));
        }
        emit(
            observer,
            Level::Info,
            &format!("Found {} PDF file(s) in {}", total, source_dir.display()),
        );

        let output_dir = source_dir.join(&self.config.output_dir_name);
        fs::create_dir_all(&output_dir).map_err(|source| Error::OutputDirectory {
            path: output_dir.clone(),
            source,
        })?;

        let mut sink = open_sink()?;
        let mut result = BatchResult::new(total);

        for (index, file) in candidates.iter().enumerate() {
            match self.process_file(file, &output_dir, &mut sink, observer) {
                Ok(()) => result.record_success(),
                Err(issue) => result.record_issue(issue),
            }
            observer.on_progress(index + 1, total);
        }

        if let Err(e) = sink.close() {
            emit(
                observer,
                Level::Warn,
                &format!("Record store did not close cleanly: {}", e),
            );
        }

        emit(
            observer,
            Level::Info,
            &format!("Done! Processed {}/{} files.", result.succeeded, total),
        );
        Ok(result)
    }

    /// Run one file through the pipeline.
    fn process_file<S: RecordSink>(
        &self,
        file: &SourceFile,
        output_dir: &Path,
        sink: &mut S,
        observer: &dyn BatchObserver,
    ) -> std::result::Result<(), FileIssue> {
        let name = file.file_name();
        emit(observer, Level::Info, &format!("Processing: {}...", name));

        let Some(identifier) = self.extractor.extract(name) else {
            emit(
                observer,
                Level::Warn,
                &format!("Skipping {}: Could not extract barcode number.", name),
            );
            return Err(issue(file, None, FailureKind::NoIdentifier, None));
        };

        let artifact = match self.renderer.render(&identifier) {
            Ok(artifact) => artifact,
            Err(e) => {
                emit(
                    observer,
                    Level::Warn,
                    &format!("Skipping {}: Error generating barcode for {}: {}", name, identifier, e),
                );
                return Err(issue(file, Some(identifier), FailureKind::RenderFailed, Some(&e)));
            },
        };

        let output_path = output_path(output_dir, file);
        let stamped = self.stamper.stamp_with_caption(
            file.path(),
            &output_path,
            artifact.path(),
            Some(identifier.as_str()),
        );

        if let Err(e) = artifact.release() {
            emit(
                observer,
                Level::Warn,
                &format!("Could not remove temporary barcode image for {}: {}", name, e),
            );
        }

        match stamped {
            Ok(report) => log::debug!("{}: {} page(s) stamped", name, report.page_count),
            Err(e) => {
                emit(
                    observer,
                    Level::Warn,
                    &format!("Skipping {}: Error stamping PDF: {}", name, e),
                );
                return Err(issue(file, Some(identifier), FailureKind::StampFailed, Some(&e)));
            },
        }

        let record = OutcomeRecord::now(name, identifier.clone());
        match sink.append(&record) {
            Ok(()) => {
                emit(
                    observer,
                    Level::Info,
                    &format!("Success! Saved to {}", output_path.display()),
                );
                Ok(())
            },
            Err(e) => {
                emit(
                    observer,
                    Level::Error,
                    &format!(
                        "Database error for {}: {} (stamped output kept at {})",
                        name,
                        e,
                        output_path.display()
                    ),
                );
                Err(issue(file, Some(identifier), FailureKind::SinkFailed, Some(&e)))
            },
        }
    }
}

/// Run `orchestrator` over `source_dir` on a dedicated worker thread.
///
/// Log and progress notifications arrive on the returned receiver, followed by
/// exactly one [`BatchEvent::Finished`] or [`BatchEvent::Aborted`].
pub fn spawn_batch(
    orchestrator: BatchOrchestrator,
    source_dir: impl Into<PathBuf>,
) -> Result<(JoinHandle<Result<BatchResult>>, Receiver<BatchEvent>)> {
    let source_dir = source_dir.into();
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("batch-worker".to_string())
        .spawn(move || {
            let outcome = orchestrator.run(&source_dir, &tx);
            let final_event = match &outcome {
                Ok(result) => BatchEvent::Finished(result.clone()),
                Err(e) => BatchEvent::Aborted(e.to_string()),
            };
            let _ = tx.send(final_event);
            outcome
        })?;
    Ok((handle, rx))
}

/// Whether `name` carries the PDF extension, compared case-insensitively.
pub fn is_pdf_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

/// Regular `*.pdf` files directly under `dir`, sorted by filename.
pub fn enumerate_candidates(dir: &Path) -> Result<Vec<SourceFile>> {
    let listing_error = |source| Error::SourceDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if is_pdf_name(&file_name) && path.is_file() {
            files.push(SourceFile::new(path, file_name));
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    Ok(files)
}

fn output_path(output_dir: &Path, file: &SourceFile) -> PathBuf {
    match file.path().file_name() {
        Some(original) => output_dir.join(original),
        None => output_dir.join(file.file_name()),
    }
}

fn issue(
    file: &SourceFile,
    identifier: Option<Identifier>,
    kind: FailureKind,
    cause: Option<&Error>,
) -> FileIssue {
    FileIssue {
        file_name: file.file_name().to_string(),
        identifier,
        kind,
        detail: cause.map(|e| e.to_string()),
    }
}

/// Send a line to the observer and mirror it to the `log` facade.
fn emit(observer: &dyn BatchObserver, level: Level, message: &str) {
    log::log!(level, "{}", message);
    observer.on_log(message);
}
