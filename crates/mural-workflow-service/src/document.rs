//! Workflow document — the interchange shape at the persistence and
//! import/export boundary
//!
//! A document is `{ id?, name, nodes, edges, viewport, exportedAt? }`.
//! Imported payloads are untrusted: they must pass
//! [`import_document`]'s structural validation before reaching the
//! graph store, and node data is sanitized of reserved engine keys
//! before being written out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use canvas_engine::types::{CanvasEdge, CanvasGraph, CanvasNode, Viewport};

/// Zoom bounds accepted from imported documents
const MIN_ZOOM: f64 = 0.01;
const MAX_ZOOM: f64 = 100.0;

/// Keys the engine manages or legacy hosts stored in node data;
/// stripped before save and on import
const RESERVED_DATA_KEYS: &[&str] = &["inputs", "outputs", "onDataChange"];

/// The serialized shape of one workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// Workflow ID; absent on documents that were exported to a file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable workflow name
    pub name: String,
    /// Nodes in parent-before-child order
    pub nodes: Vec<CanvasNode>,
    /// Edges connecting node handles
    pub edges: Vec<CanvasEdge>,
    /// Last viewport the user was looking at
    #[serde(default)]
    pub viewport: Viewport,
    /// Export timestamp, set on file export only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl WorkflowDocument {
    /// Snapshot the current graph into a document
    pub fn from_graph(name: impl Into<String>, graph: &CanvasGraph, viewport: Viewport) -> Self {
        let mut doc = Self {
            id: None,
            name: name.into(),
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
            viewport,
            exported_at: None,
        };
        doc.sanitize();
        doc
    }

    /// Take the nodes and edges back into a graph store
    pub fn into_graph(self) -> CanvasGraph {
        CanvasGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// Strip reserved engine keys from every node's data
    ///
    /// Handle lists are recomputed from type tags and never persisted;
    /// documents exported by older hosts may still carry them.
    pub fn sanitize(&mut self) {
        for node in &mut self.nodes {
            for key in RESERVED_DATA_KEYS {
                node.data.remove(*key);
            }
        }
    }
}

/// Reasons an imported payload was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Payload is not a JSON object
    #[error("Workflow payload must be a JSON object")]
    NotAnObject,

    /// `nodes` is missing or not an array
    #[error("Workflow payload field '{0}' is missing or not an array")]
    NotAnArray(&'static str),

    /// The payload does not deserialize into the document shape
    #[error("Malformed workflow payload: {0}")]
    Malformed(String),

    /// `viewport.zoom` is non-finite or outside the sane range
    #[error("Viewport zoom {0} is out of range")]
    ZoomOutOfRange(String),
}

/// Validate and deserialize an untrusted workflow payload
///
/// Rejects payloads whose `nodes` or `edges` are missing or not
/// arrays, and viewports whose zoom is non-finite or outside
/// [`MIN_ZOOM`, `MAX_ZOOM`], before anything reaches the graph store.
/// The returned document is already sanitized.
pub fn import_document(payload: serde_json::Value) -> Result<WorkflowDocument, DocumentError> {
    let object = payload.as_object().ok_or(DocumentError::NotAnObject)?;
    for field in ["nodes", "edges"] {
        match object.get(field) {
            Some(value) if value.is_array() => {}
            _ => return Err(DocumentError::NotAnArray(field)),
        }
    }

    let mut document: WorkflowDocument = serde_json::from_value(payload)
        .map_err(|e| DocumentError::Malformed(e.to_string()))?;

    let zoom = document.viewport.zoom;
    if !zoom.is_finite() || !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        return Err(DocumentError::ZoomOutOfRange(format!("{zoom}")));
    }

    document.sanitize();
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_engine::builder::CanvasBuilder;
    use canvas_engine::types::NodeType;

    fn valid_payload() -> serde_json::Value {
        serde_json::json!({
            "name": "Storyboard",
            "nodes": [
                {"id": "a", "type": "text-input", "position": {"x": 0.0, "y": 0.0}}
            ],
            "edges": [],
            "viewport": {"x": 0.0, "y": 0.0, "zoom": 1.0}
        })
    }

    #[test]
    fn test_import_accepts_valid_payload() {
        let doc = import_document(valid_payload()).unwrap();
        assert_eq!(doc.name, "Storyboard");
        assert_eq!(doc.nodes.len(), 1);
        let graph = doc.into_graph();
        assert!(graph.find_node("a").is_some());
    }

    #[test]
    fn test_import_rejects_missing_nodes() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("nodes");
        assert_eq!(
            import_document(payload),
            Err(DocumentError::NotAnArray("nodes"))
        );
    }

    #[test]
    fn test_import_rejects_non_array_edges() {
        let mut payload = valid_payload();
        payload["edges"] = serde_json::json!({"not": "an array"});
        assert_eq!(
            import_document(payload),
            Err(DocumentError::NotAnArray("edges"))
        );
    }

    #[test]
    fn test_import_rejects_non_object() {
        assert_eq!(
            import_document(serde_json::json!([1, 2, 3])),
            Err(DocumentError::NotAnObject)
        );
    }

    #[test]
    fn test_import_rejects_absurd_zoom() {
        let mut payload = valid_payload();
        payload["viewport"]["zoom"] = serde_json::json!(1e9);
        assert!(matches!(
            import_document(payload),
            Err(DocumentError::ZoomOutOfRange(_))
        ));

        let mut payload = valid_payload();
        payload["viewport"]["zoom"] = serde_json::json!(0.0);
        assert!(matches!(
            import_document(payload),
            Err(DocumentError::ZoomOutOfRange(_))
        ));
    }

    #[test]
    fn test_import_strips_reserved_keys() {
        let mut payload = valid_payload();
        payload["nodes"][0]["data"] = serde_json::json!({
            "text": "keep me",
            "inputs": [{"id": "stale"}],
            "outputs": [],
            "onDataChange": "function-ref"
        });
        let doc = import_document(payload).unwrap();
        let data = &doc.nodes[0].data;
        assert_eq!(data.get("text"), Some(&serde_json::json!("keep me")));
        assert!(data.get("inputs").is_none());
        assert!(data.get("outputs").is_none());
        assert!(data.get("onDataChange").is_none());
    }

    #[test]
    fn test_from_graph_sanitizes() {
        let graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .with_data(serde_json::json!({"text": "hello", "inputs": []}))
            .build();

        let doc = WorkflowDocument::from_graph("wf", &graph, Viewport::default());
        assert!(doc.nodes[0].data.get("inputs").is_none());
        assert_eq!(doc.nodes[0].data_str("text"), Some("hello"));
        // The in-memory graph keeps its fields; sanitization is a
        // serialization-boundary concern.
        assert!(graph.find_node("a").unwrap().data.get("inputs").is_some());
    }

    #[test]
    fn test_document_serde_roundtrip() {
        let doc = import_document(valid_payload()).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        let restored = import_document(json).unwrap();
        assert_eq!(restored.name, doc.name);
        assert_eq!(restored.nodes.len(), doc.nodes.len());
    }
}
