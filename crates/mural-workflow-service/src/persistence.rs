//! Workflow persistence collaborators
//!
//! The auto-save coordinator and the host talk to persistence through
//! the [`WorkflowStore`] trait; only success/failure and the payload
//! shape matter. Two implementations ship here: a JSON-file store for
//! desktop hosts and an in-memory store for tests and previews.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::document::WorkflowDocument;
use crate::error::{Result, ServiceError};

/// Identifier of a stored workflow
pub type WorkflowId = String;

/// Listing entry for a stored workflow
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub name: String,
    pub node_count: usize,
}

/// Opaque persistence collaborator for workflows
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Persist the current document under an existing workflow ID
    async fn save(&self, id: &str, document: &WorkflowDocument) -> Result<()>;

    /// Create a new empty workflow, returning its ID
    async fn create(&self, name: Option<String>) -> Result<WorkflowId>;

    /// Rename a stored workflow
    async fn rename(&self, id: &str, name: &str) -> Result<()>;

    /// Delete a stored workflow
    async fn delete(&self, id: &str) -> Result<()>;

    /// Clone a stored workflow, returning the copy's ID
    async fn duplicate_workflow(&self, id: &str) -> Result<WorkflowId>;

    /// Load a stored workflow
    async fn load(&self, id: &str) -> Result<WorkflowDocument>;

    /// List stored workflows
    async fn list(&self) -> Result<Vec<WorkflowSummary>>;
}

/// Thumbnail collaborator, invoked opportunistically after saves
///
/// Capture failures are swallowed by the caller (logged only) — a
/// missing thumbnail never blocks or fails a save.
#[async_trait]
pub trait ThumbnailSink: Send + Sync {
    async fn capture(&self, workflow_id: &str) -> Result<()>;
}

/// Thumbnail sink that does nothing, for hosts without a renderer
pub struct NoThumbnails;

#[async_trait]
impl ThumbnailSink for NoThumbnails {
    async fn capture(&self, _workflow_id: &str) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// File-backed store
// =============================================================================

/// JSON-file-backed workflow store
///
/// One `{id}.json` per workflow under the given directory, created on
/// first save.
pub struct FileWorkflowStore {
    dir: PathBuf,
}

impl FileWorkflowStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read(&self, id: &str) -> Result<WorkflowDocument> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(ServiceError::WorkflowNotFound(id.to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, id: &str, document: &WorkflowDocument) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(id);
        let content = serde_json::to_string_pretty(document)?;
        std::fs::write(&path, content)?;
        log::debug!("Saved workflow '{}' to {:?}", id, path);
        Ok(())
    }
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    async fn save(&self, id: &str, document: &WorkflowDocument) -> Result<()> {
        let mut document = document.clone();
        document.id = Some(id.to_string());
        document.sanitize();
        self.write(id, &document)
    }

    async fn create(&self, name: Option<String>) -> Result<WorkflowId> {
        let id = uuid::Uuid::new_v4().to_string();
        let document = WorkflowDocument {
            id: Some(id.clone()),
            name: name.unwrap_or_else(|| "Untitled workflow".to_string()),
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Default::default(),
            exported_at: None,
        };
        self.write(&id, &document)?;
        log::info!("Created workflow '{}' ({})", document.name, id);
        Ok(id)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let mut document = self.read(id)?;
        document.name = name.to_string();
        self.write(id, &document)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(ServiceError::WorkflowNotFound(id.to_string()));
        }
        std::fs::remove_file(&path)?;
        log::debug!("Deleted workflow '{}'", id);
        Ok(())
    }

    async fn duplicate_workflow(&self, id: &str) -> Result<WorkflowId> {
        let mut document = self.read(id)?;
        let copy_id = uuid::Uuid::new_v4().to_string();
        document.id = Some(copy_id.clone());
        document.name = format!("Copy of {}", document.name);
        self.write(&copy_id, &document)?;
        Ok(copy_id)
    }

    async fn load(&self, id: &str) -> Result<WorkflowDocument> {
        self.read(id)
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        let mut summaries = Vec::new();
        if !self.dir.exists() {
            return Ok(summaries);
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                let content = std::fs::read_to_string(&path)?;
                match serde_json::from_str::<WorkflowDocument>(&content) {
                    Ok(document) => summaries.push(WorkflowSummary {
                        id: document.id.unwrap_or_default(),
                        name: document.name,
                        node_count: document.nodes.len(),
                    }),
                    Err(e) => {
                        log::warn!("Skipping unreadable workflow at {:?}: {}", path, e);
                    }
                }
            }
        }
        Ok(summaries)
    }
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Default)]
struct MemoryState {
    documents: HashMap<WorkflowId, WorkflowDocument>,
    save_count: usize,
    fail_next_save: bool,
}

/// In-memory workflow store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryWorkflowStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.state.lock().save_count
    }

    /// Make the next save fail (transient-error simulation)
    pub fn fail_next_save(&self) {
        self.state.lock().fail_next_save = true;
    }

    /// Current stored document, if any
    pub fn document(&self, id: &str) -> Option<WorkflowDocument> {
        self.state.lock().documents.get(id).cloned()
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn save(&self, id: &str, document: &WorkflowDocument) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_next_save {
            state.fail_next_save = false;
            return Err(ServiceError::Persistence("simulated failure".to_string()));
        }
        let mut document = document.clone();
        document.id = Some(id.to_string());
        document.sanitize();
        state.documents.insert(id.to_string(), document);
        state.save_count += 1;
        Ok(())
    }

    async fn create(&self, name: Option<String>) -> Result<WorkflowId> {
        let id = uuid::Uuid::new_v4().to_string();
        let document = WorkflowDocument {
            id: Some(id.clone()),
            name: name.unwrap_or_else(|| "Untitled workflow".to_string()),
            nodes: Vec::new(),
            edges: Vec::new(),
            viewport: Default::default(),
            exported_at: None,
        };
        self.state.lock().documents.insert(id.clone(), document);
        Ok(id)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let document = state
            .documents
            .get_mut(id)
            .ok_or_else(|| ServiceError::WorkflowNotFound(id.to_string()))?;
        document.name = name.to_string();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.state
            .lock()
            .documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::WorkflowNotFound(id.to_string()))
    }

    async fn duplicate_workflow(&self, id: &str) -> Result<WorkflowId> {
        let mut state = self.state.lock();
        let mut document = state
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::WorkflowNotFound(id.to_string()))?;
        let copy_id = uuid::Uuid::new_v4().to_string();
        document.id = Some(copy_id.clone());
        document.name = format!("Copy of {}", document.name);
        state.documents.insert(copy_id.clone(), document);
        Ok(copy_id)
    }

    async fn load(&self, id: &str) -> Result<WorkflowDocument> {
        self.state
            .lock()
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::WorkflowNotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        Ok(self
            .state
            .lock()
            .documents
            .values()
            .map(|d| WorkflowSummary {
                id: d.id.clone().unwrap_or_default(),
                name: d.name.clone(),
                node_count: d.nodes.len(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_engine::builder::CanvasBuilder;
    use canvas_engine::types::{NodeType, Viewport};
    use tempfile::TempDir;

    fn sample_document(name: &str) -> WorkflowDocument {
        let graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .with_data(serde_json::json!({"text": "hello"}))
            .add_node("b", NodeType::ImageGenerate, (200.0, 0.0))
            .add_edge("a", "text_output", "b", "prompt")
            .build();
        WorkflowDocument::from_graph(name, &graph, Viewport::default())
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileWorkflowStore::new(dir.path().join("workflows"));

        let id = store.create(Some("Storyboard".to_string())).await.unwrap();
        store.save(&id, &sample_document("Storyboard")).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.name, "Storyboard");
        assert_eq!(loaded.nodes.len(), 2);
        assert_eq!(loaded.edges.len(), 1);
        assert_eq!(loaded.id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_file_store_list_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileWorkflowStore::new(dir.path());

        let id1 = store.create(Some("One".to_string())).await.unwrap();
        let _id2 = store.create(Some("Two".to_string())).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);

        store.delete(&id1).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(matches!(
            store.load(&id1).await,
            Err(ServiceError::WorkflowNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_store_duplicate_workflow() {
        let dir = TempDir::new().unwrap();
        let store = FileWorkflowStore::new(dir.path());

        let id = store.create(Some("Original".to_string())).await.unwrap();
        store.save(&id, &sample_document("Original")).await.unwrap();

        let copy_id = store.duplicate_workflow(&id).await.unwrap();
        assert_ne!(copy_id, id);
        let copy = store.load(&copy_id).await.unwrap();
        assert_eq!(copy.name, "Copy of Original");
        assert_eq!(copy.nodes.len(), 2);
    }

    #[tokio::test]
    async fn test_file_store_rename() {
        let dir = TempDir::new().unwrap();
        let store = FileWorkflowStore::new(dir.path());

        let id = store.create(None).await.unwrap();
        store.rename(&id, "Named at last").await.unwrap();
        assert_eq!(store.load(&id).await.unwrap().name, "Named at last");
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves_and_fails_on_demand() {
        let store = MemoryWorkflowStore::new();
        let id = store.create(None).await.unwrap();

        store.save(&id, &sample_document("wf")).await.unwrap();
        assert_eq!(store.save_count(), 1);

        store.fail_next_save();
        assert!(store.save(&id, &sample_document("wf")).await.is_err());
        // Failure is transient; the next save succeeds.
        store.save(&id, &sample_document("wf")).await.unwrap();
        assert_eq!(store.save_count(), 2);
    }
}
