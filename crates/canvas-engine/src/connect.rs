//! Connection validation for edge creation
//!
//! Decides whether a proposed edge may be created. Purely advisory —
//! the caller inserts the edge on accept and styles it from the
//! producer's handle kind via [`crate::handles::edge_style_for`].

use thiserror::Error;

use crate::handles::{kind_of_output, resolve_handles};
use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, EdgeStyle, HandleId, NodeId};

/// A proposed edge, as produced by a connect gesture
///
/// All fields are optional because the host widget reports partial
/// gestures (e.g. a drag released over empty canvas).
#[derive(Debug, Clone, Default)]
pub struct ConnectionRequest {
    pub source: Option<NodeId>,
    pub source_handle: Option<HandleId>,
    pub target: Option<NodeId>,
    pub target_handle: Option<HandleId>,
}

impl ConnectionRequest {
    /// A fully specified candidate edge
    pub fn new(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            source_handle: Some(source_handle.into()),
            target: Some(target.into()),
            target_handle: Some(target_handle.into()),
        }
    }
}

/// Reasons a proposed connection is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The gesture did not name both endpoints
    #[error("Connection is missing an endpoint or handle")]
    IncompleteRequest,

    /// The target node does not exist in the graph
    #[error("Target node '{0}' not found")]
    UnknownTargetNode(NodeId),

    /// Another edge already terminates at this input handle
    #[error("Input '{handle}' on node '{node}' already has a producer")]
    HandleOccupied { node: NodeId, handle: HandleId },

    /// The target handle is not among the node's current inputs
    #[error("Node '{node}' has no input handle '{handle}'")]
    UnknownTargetHandle { node: NodeId, handle: HandleId },

    /// The input does not accept the candidate's source handle
    #[error("Input '{target_handle}' does not accept values from '{source_handle}'")]
    KindMismatch {
        source_handle: HandleId,
        target_handle: HandleId,
    },
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Validate a proposed connection against the current graph
///
/// Checks, in order: endpoint presence, the single-producer-per-input
/// invariant, target handle existence on the consumer's current handle
/// set, and the input's accepted source handle set.
pub fn validate_connection(
    candidate: &ConnectionRequest,
    graph: &CanvasGraph,
) -> Result<(), ConnectionError> {
    let target = present(&candidate.target).ok_or(ConnectionError::IncompleteRequest)?;
    let target_handle =
        present(&candidate.target_handle).ok_or(ConnectionError::IncompleteRequest)?;
    let source_handle =
        present(&candidate.source_handle).ok_or(ConnectionError::IncompleteRequest)?;

    if graph.edge_into(target, target_handle).is_some() {
        return Err(ConnectionError::HandleOccupied {
            node: target.to_string(),
            handle: target_handle.to_string(),
        });
    }

    let target_node = graph
        .find_node(target)
        .ok_or_else(|| ConnectionError::UnknownTargetNode(target.to_string()))?;

    let handles = resolve_handles(target_node.node_type, &target_node.data);
    let input = handles
        .input(target_handle)
        .ok_or_else(|| ConnectionError::UnknownTargetHandle {
            node: target.to_string(),
            handle: target_handle.to_string(),
        })?;

    if !input.accepts.contains(source_handle) {
        return Err(ConnectionError::KindMismatch {
            source_handle: source_handle.to_string(),
            target_handle: target_handle.to_string(),
        });
    }

    Ok(())
}

/// Advisory boolean form of [`validate_connection`]
pub fn can_connect(candidate: &ConnectionRequest, graph: &CanvasGraph) -> bool {
    validate_connection(candidate, graph).is_ok()
}

/// Build a styled edge from an accepted connection request
///
/// Returns `None` when the request is incomplete or invalid; on
/// success the edge carries a fresh uuid ID and styling derived from
/// the producer's handle kind.
pub fn build_edge(candidate: &ConnectionRequest, graph: &CanvasGraph) -> Option<CanvasEdge> {
    validate_connection(candidate, graph).ok()?;
    let source_handle = candidate.source_handle.clone()?;
    let style = edge_style_for_source(&source_handle);
    Some(CanvasEdge {
        id: format!("edge-{}", uuid::Uuid::new_v4()),
        source: candidate.source.clone()?,
        source_handle,
        target: candidate.target.clone()?,
        target_handle: candidate.target_handle.clone()?,
        style: Some(style),
    })
}

fn edge_style_for_source(source_handle: &str) -> EdgeStyle {
    crate::handles::edge_style_for(kind_of_output(source_handle))
}

/// Nodes eligible as producers for a given input, for host-side hints
pub fn compatible_sources<'a>(
    graph: &'a CanvasGraph,
    target: &str,
    target_handle: &str,
) -> Vec<&'a CanvasNode> {
    let Some(target_node) = graph.find_node(target) else {
        return Vec::new();
    };
    let handles = resolve_handles(target_node.node_type, &target_node.data);
    let Some(input) = handles.input(target_handle) else {
        return Vec::new();
    };
    graph
        .nodes
        .iter()
        .filter(|n| n.id != target)
        .filter(|n| {
            resolve_handles(n.node_type, &n.data)
                .outputs
                .iter()
                .any(|out| input.accepts.contains(&out.id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CanvasBuilder;
    use crate::handles::{IMAGE_OUTPUT, TEXT_OUTPUT};
    use crate::types::NodeType;

    fn two_node_graph() -> CanvasGraph {
        CanvasBuilder::new()
            .add_node("text", NodeType::TextInput, (0.0, 0.0))
            .add_node("image", NodeType::ImageGenerate, (200.0, 0.0))
            .build()
    }

    #[test]
    fn test_accepts_compatible_connection() {
        let graph = two_node_graph();
        let req = ConnectionRequest::new("text", TEXT_OUTPUT, "image", "prompt");
        assert!(can_connect(&req, &graph));
    }

    #[test]
    fn test_rejects_incomplete_request() {
        let graph = two_node_graph();
        let req = ConnectionRequest {
            source: Some("text".to_string()),
            source_handle: Some(TEXT_OUTPUT.to_string()),
            target: None,
            target_handle: Some("prompt".to_string()),
        };
        assert_eq!(
            validate_connection(&req, &graph),
            Err(ConnectionError::IncompleteRequest)
        );

        let blank = ConnectionRequest::new("text", "", "image", "prompt");
        assert_eq!(
            validate_connection(&blank, &graph),
            Err(ConnectionError::IncompleteRequest)
        );
    }

    #[test]
    fn test_rejects_occupied_handle() {
        let mut graph = two_node_graph();
        let req = ConnectionRequest::new("text", TEXT_OUTPUT, "image", "prompt");
        let edge = build_edge(&req, &graph).unwrap();
        graph.add_edge(edge);

        assert_eq!(
            validate_connection(&req, &graph),
            Err(ConnectionError::HandleOccupied {
                node: "image".to_string(),
                handle: "prompt".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_unknown_target_handle() {
        let graph = two_node_graph();
        let req = ConnectionRequest::new("text", TEXT_OUTPUT, "image", "nonexistent");
        assert!(matches!(
            validate_connection(&req, &graph),
            Err(ConnectionError::UnknownTargetHandle { .. })
        ));
    }

    #[test]
    fn test_rejects_kind_mismatch() {
        let graph = two_node_graph();
        // An image output cannot feed a text prompt
        let req = ConnectionRequest::new("upload", IMAGE_OUTPUT, "image", "prompt");
        assert!(matches!(
            validate_connection(&req, &graph),
            Err(ConnectionError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_accepts_every_declared_combination() {
        let graph = CanvasBuilder::new()
            .add_node("text", NodeType::TextInput, (0.0, 0.0))
            .add_node("upload", NodeType::ImageUpload, (0.0, 100.0))
            .add_node("llm", NodeType::TextGenerate, (200.0, 0.0))
            .add_node("gen", NodeType::ImageGenerate, (200.0, 100.0))
            .add_node("edit", NodeType::ImageEdit, (200.0, 200.0))
            .add_node("video", NodeType::VideoGenerate, (200.0, 300.0))
            .build();

        let accepted = [
            ("text", TEXT_OUTPUT, "llm", "prompt"),
            ("text", TEXT_OUTPUT, "gen", "prompt"),
            ("text", TEXT_OUTPUT, "edit", "prompt"),
            ("text", TEXT_OUTPUT, "video", "prompt"),
            ("upload", IMAGE_OUTPUT, "edit", "image_0"),
            ("upload", IMAGE_OUTPUT, "video", "image_0"),
            ("gen", IMAGE_OUTPUT, "edit", "image_0"),
        ];
        for (s, sh, t, th) in accepted {
            let req = ConnectionRequest::new(s, sh, t, th);
            assert!(can_connect(&req, &graph), "expected accept: {s}->{t}.{th}");
        }

        let rejected = [
            ("upload", IMAGE_OUTPUT, "llm", "prompt"),
            ("text", TEXT_OUTPUT, "edit", "image_0"),
            ("upload", IMAGE_OUTPUT, "text", "prompt"),
        ];
        for (s, sh, t, th) in rejected {
            let req = ConnectionRequest::new(s, sh, t, th);
            assert!(!can_connect(&req, &graph), "expected reject: {s}->{t}.{th}");
        }
    }

    #[test]
    fn test_build_edge_styles_from_producer_kind() {
        let graph = two_node_graph();
        let req = ConnectionRequest::new("text", TEXT_OUTPUT, "image", "prompt");
        let edge = build_edge(&req, &graph).unwrap();
        let style = edge.style.unwrap();
        assert_eq!(style.color, "#3b82f6");
        assert!(style.animated);
    }

    #[test]
    fn test_compatible_sources() {
        let graph = CanvasBuilder::new()
            .add_node("text", NodeType::TextInput, (0.0, 0.0))
            .add_node("upload", NodeType::ImageUpload, (0.0, 100.0))
            .add_node("edit", NodeType::ImageEdit, (200.0, 0.0))
            .build();

        let sources = compatible_sources(&graph, "edit", "image_0");
        let ids: Vec<&str> = sources.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["upload"]);
    }
}
