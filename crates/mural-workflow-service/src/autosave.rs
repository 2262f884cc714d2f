//! Debounced auto-save coordination
//!
//! Every graph mutation restarts a fixed-delay timer (debounce, not
//! throttle); when the timer fires the coordinator snapshots the
//! LATEST document state — not a snapshot captured at schedule time —
//! and hands it to the persistence collaborator. Save failures are
//! transient: they are logged, nothing is rolled back, and the next
//! mutation simply re-triggers another attempt. A thumbnail capture
//! rides along opportunistically, throttled to a minimum interval.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::document::WorkflowDocument;
use crate::error::Result;
use crate::persistence::{ThumbnailSink, WorkflowId, WorkflowStore};

/// Timing knobs for the coordinator
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Delay between the last mutation and the save
    pub debounce: Duration,
    /// Minimum interval between thumbnail captures
    pub thumbnail_interval: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            thumbnail_interval: Duration::from_secs(30),
        }
    }
}

/// Lifecycle phase of the open workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial fetch in flight; mutation side effects suppressed
    Loading,
    /// Normal editing; mutations debounce saves
    Editing,
    /// A "create new workflow" request is in flight
    Creating,
}

/// Produces the current document at save time
pub type SnapshotFn = dyn Fn() -> WorkflowDocument + Send + Sync;

struct State {
    phase: Phase,
    workflow_id: Option<WorkflowId>,
    pending: Option<JoinHandle<()>>,
    last_thumbnail: Option<Instant>,
}

struct Inner {
    store: Arc<dyn WorkflowStore>,
    thumbnails: Arc<dyn ThumbnailSink>,
    snapshot: Arc<SnapshotFn>,
    config: AutosaveConfig,
    state: Mutex<State>,
}

/// Coordinates debounced saves for one open workflow
///
/// All methods are re-entrant from the host's event loop; the only
/// spawned work is the debounce timer. There is no cancellation of an
/// in-flight save call — a new mutation only cancels a timer that has
/// not fired yet.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    inner: Arc<Inner>,
}

impl AutosaveCoordinator {
    /// Create a coordinator in the Loading phase
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        thumbnails: Arc<dyn ThumbnailSink>,
        snapshot: Arc<SnapshotFn>,
        config: AutosaveConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                thumbnails,
                snapshot,
                config,
                state: Mutex::new(State {
                    phase: Phase::Loading,
                    workflow_id: None,
                    pending: None,
                    last_thumbnail: None,
                }),
            }),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// The workflow this coordinator saves into, once known
    pub fn workflow_id(&self) -> Option<WorkflowId> {
        self.inner.state.lock().workflow_id.clone()
    }

    /// Enter the Loading phase, suppressing mutation side effects
    pub fn begin_loading(&self) {
        let mut state = self.inner.state.lock();
        state.phase = Phase::Loading;
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }
    }

    /// Leave the Loading phase with the loaded workflow's ID
    pub fn finish_loading(&self, workflow_id: WorkflowId) {
        let mut state = self.inner.state.lock();
        state.workflow_id = Some(workflow_id);
        state.phase = Phase::Editing;
    }

    /// Ensure a workflow exists to save into
    ///
    /// Single-flight: a re-entrant call while a create request is in
    /// flight returns `None` instead of issuing a duplicate request.
    /// The latch is released whether the request succeeds or fails.
    pub async fn ensure_created(&self, name: Option<String>) -> Result<Option<WorkflowId>> {
        {
            let mut state = self.inner.state.lock();
            if let Some(id) = &state.workflow_id {
                return Ok(Some(id.clone()));
            }
            if state.phase == Phase::Creating {
                return Ok(None);
            }
            state.phase = Phase::Creating;
        }

        let result = self.inner.store.create(name).await;

        // Latch released regardless of outcome.
        let mut state = self.inner.state.lock();
        match result {
            Ok(id) => {
                state.workflow_id = Some(id.clone());
                state.phase = Phase::Editing;
                Ok(Some(id))
            }
            Err(e) => {
                state.phase = Phase::Editing;
                Err(e)
            }
        }
    }

    /// Record a graph mutation, restarting the debounce timer
    ///
    /// Suppressed while Loading. A pending timer is always canceled
    /// before rescheduling.
    pub fn note_mutation(&self) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Loading {
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        let inner = self.inner.clone();
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            Self::run_save(&inner).await;
        }));
    }

    /// Save immediately, bypassing the debounce
    pub async fn flush(&self) {
        if let Some(pending) = self.inner.state.lock().pending.take() {
            pending.abort();
        }
        Self::run_save(&self.inner).await;
    }

    async fn run_save(inner: &Arc<Inner>) {
        let Some(workflow_id) = inner.state.lock().workflow_id.clone() else {
            log::debug!("Auto-save skipped: no workflow yet");
            return;
        };

        // The snapshot is taken at fire time, so edits made while the
        // timer was pending are included.
        let document = (inner.snapshot)();
        match inner.store.save(&workflow_id, &document).await {
            Ok(()) => {
                log::debug!("Auto-saved workflow '{}'", workflow_id);
                Self::maybe_capture_thumbnail(inner, &workflow_id).await;
            }
            Err(e) => {
                // Transient: the next mutation re-triggers a save.
                log::warn!("Auto-save of workflow '{}' failed: {}", workflow_id, e);
            }
        }
    }

    async fn maybe_capture_thumbnail(inner: &Arc<Inner>, workflow_id: &str) {
        let due = {
            let state = inner.state.lock();
            match state.last_thumbnail {
                Some(at) => at.elapsed() >= inner.config.thumbnail_interval,
                None => true,
            }
        };
        if !due {
            return;
        }
        match inner.thumbnails.capture(workflow_id).await {
            Ok(()) => {
                inner.state.lock().last_thumbnail = Some(Instant::now());
            }
            Err(e) => {
                log::warn!("Thumbnail capture for '{}' failed: {}", workflow_id, e);
            }
        }
    }
}
