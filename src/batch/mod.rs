//! Batch orchestration over a directory of PDFs.
//!
//! - [`orchestrator`]: the sequential driver and its worker-thread wrapper
//! - [`events`]: observer trait and the event queue used across threads
//! - [`result`]: per-file outcomes and the run summary

pub mod events;
pub mod orchestrator;
pub mod result;

pub use events::{timestamped, BatchEvent, BatchObserver, NullObserver};
pub use orchestrator::{enumerate_candidates, is_pdf_name, spawn_batch, BatchOrchestrator};
pub use result::{BatchResult, FailureKind, FileIssue, FileStatus, SourceFile};
