//! Mural Workflow Service - persistence and auto-save around the
//! canvas engine
//!
//! Host-agnostic application services for open workflows:
//!
//! - `WorkflowDocument`: the interchange shape at the persistence and
//!   import/export boundary, with structural validation of untrusted
//!   payloads
//! - `WorkflowStore`: the opaque persistence collaborator, with a
//!   JSON-file implementation and an in-memory one for tests
//! - `AutosaveCoordinator`: debounced saves, the Loading/Editing/
//!   Creating lifecycle, a single-flight create guard, and an
//!   opportunistic throttled thumbnail capture
//!
//! The coordinator never blocks the editing loop: the only spawned
//! work is the debounce timer, and the timer reads the latest document
//! snapshot when it fires.

pub mod autosave;
pub mod document;
pub mod error;
pub mod persistence;

// Re-export key types
pub use autosave::{AutosaveConfig, AutosaveCoordinator, Phase, SnapshotFn};
pub use document::{import_document, DocumentError, WorkflowDocument};
pub use error::{Result, ServiceError};
pub use persistence::{
    FileWorkflowStore, MemoryWorkflowStore, NoThumbnails, ThumbnailSink, WorkflowId,
    WorkflowStore, WorkflowSummary,
};
