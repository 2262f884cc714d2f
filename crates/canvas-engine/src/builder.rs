//! Fluent builder for canvas graphs
//!
//! Used by tests and embedding hosts to construct graphs
//! programmatically.
//!
//! # Example
//!
//! ```
//! use canvas_engine::builder::CanvasBuilder;
//! use canvas_engine::types::NodeType;
//!
//! let graph = CanvasBuilder::new()
//!     .add_node("text-1", NodeType::TextInput, (0.0, 0.0))
//!     .with_data(serde_json::json!({"text": "Hello"}))
//!     .add_node("image-1", NodeType::ImageGenerate, (200.0, 0.0))
//!     .add_edge("text-1", "text_output", "image-1", "prompt")
//!     .build();
//! assert_eq!(graph.nodes.len(), 2);
//! ```

use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, NodeType, Position, Size};

/// Fluent builder for constructing canvas graphs
pub struct CanvasBuilder {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    edge_counter: usize,
}

impl CanvasBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node at a position
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        node_type: NodeType,
        position: (f64, f64),
    ) -> Self {
        self.nodes.push(CanvasNode::new(
            id,
            node_type,
            Position::new(position.0, position.1),
        ));
        self
    }

    /// Set data on the most recently added node
    ///
    /// Must be called immediately after `add_node`. Non-object values
    /// are ignored.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        if let (Some(node), serde_json::Value::Object(map)) = (self.nodes.last_mut(), data) {
            node.data = map;
        }
        self
    }

    /// Set the explicit size of the most recently added node
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.size = Some(Size::new(width, height));
        }
        self
    }

    /// Set the parent frame of the most recently added node
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.parent_id = Some(parent_id.into());
        }
        self
    }

    /// Mark the most recently added node selected
    pub fn selected(mut self) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.selected = true;
        }
        self
    }

    /// Add an edge between two handles (auto-generates the edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(CanvasEdge {
            id: format!("edge-{}", self.edge_counter),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
            style: None,
        });
        self
    }

    /// Build the graph
    pub fn build(self) -> CanvasGraph {
        CanvasGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

impl Default for CanvasBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .with_data(serde_json::json!({"text": "Hello"}))
            .add_node("b", NodeType::ImageGenerate, (200.0, 0.0))
            .add_edge("a", "text_output", "b", "prompt")
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes[0].data_str("text"), Some("Hello"));
    }

    #[test]
    fn test_builder_auto_edge_ids() {
        let graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::TextGenerate, (100.0, 0.0))
            .add_node("c", NodeType::ImageGenerate, (200.0, 0.0))
            .add_edge("a", "text_output", "b", "prompt")
            .add_edge("b", "text_output", "c", "prompt")
            .build();

        assert_eq!(graph.edges[0].id, "edge-1");
        assert_eq!(graph.edges[1].id, "edge-2");
    }

    #[test]
    fn test_builder_parent_and_size() {
        let graph = CanvasBuilder::new()
            .add_node("g", NodeType::Group, (0.0, 0.0))
            .with_size(300.0, 200.0)
            .add_node("a", NodeType::TextInput, (10.0, 10.0))
            .with_parent("g")
            .selected()
            .build();

        assert_eq!(graph.nodes[0].size, Some(Size::new(300.0, 200.0)));
        assert_eq!(graph.nodes[1].parent_id.as_deref(), Some("g"));
        assert!(graph.nodes[1].selected);
    }

    #[test]
    fn test_serde_roundtrip() {
        let graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::VideoGenerate, (100.0, 0.0))
            .add_edge("a", "text_output", "b", "prompt")
            .build();

        let json = serde_json::to_string(&graph).unwrap();
        let restored: CanvasGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.nodes.len(), 2);
        assert_eq!(restored.nodes[1].node_type, NodeType::VideoGenerate);
        assert_eq!(restored.edges.len(), 1);
    }
}
