//! Core types for canvas graphs
//!
//! These types define the structure of a canvas graph: nodes, edges,
//! coordinate frames, and the store operations that mutate them.
//! Node insertion order is significant — a group frame must appear in
//! the node list before any node that declares it as `parent_id`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a handle (input or output port)
pub type HandleId = String;

/// The type tag of a canvas node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Raw text entered by the user
    TextInput,
    /// Text produced by a language model
    TextGenerate,
    /// Image produced by a diffusion model
    ImageGenerate,
    /// Image transform with a variable number of image inputs
    ImageEdit,
    /// Image uploaded by the user
    ImageUpload,
    /// Video produced from a prompt and optional start frame
    VideoGenerate,
    /// Group frame that owns a local coordinate frame for its children
    Group,
    /// Unrecognized type tag (resolves to empty handle sets)
    #[serde(other)]
    Unknown,
}

impl NodeType {
    /// Whether this node owns a coordinate frame for child nodes
    pub fn is_group(&self) -> bool {
        matches!(self, NodeType::Group)
    }
}

/// A point on the canvas, local to the owning node's parent frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum
    pub fn plus(&self, other: &Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference
    pub fn minus(&self, other: &Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y)
    }
}

/// Rendered extent of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Visible region of the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Type-specific node data
///
/// Holds fields such as `text`, `prompt`, `imageUrl`, `output`, and the
/// engine-written `connected*` cache fields. Handle lists are never
/// stored here; they are recomputed from the type tag on demand.
pub type NodeData = serde_json::Map<String, serde_json::Value>;

/// A node instance on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Type tag that drives handle resolution and propagation rules
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Position local to the parent frame (absolute when `parent_id` is None)
    pub position: Position,
    /// Group frame this node belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Explicit size, if the host has one (group frames always do)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Whether this node is part of the current selection
    #[serde(default)]
    pub selected: bool,
    /// Type-specific data fields
    #[serde(default)]
    pub data: NodeData,
}

impl CanvasNode {
    /// Create a node with empty data
    pub fn new(id: impl Into<String>, node_type: NodeType, position: Position) -> Self {
        Self {
            id: id.into(),
            node_type,
            position,
            parent_id: None,
            size: None,
            selected: false,
            data: NodeData::new(),
        }
    }

    /// Read a string field from `data`
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}

/// Display styling for an edge, derived from the producer's handle kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub color: String,
    pub animated: bool,
}

/// A directed, handle-to-handle connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Producer node ID
    pub source: NodeId,
    /// Output handle on the producer
    pub source_handle: HandleId,
    /// Consumer node ID
    pub target: NodeId,
    /// Input handle on the consumer; accepts at most one producer
    pub target_handle: HandleId,
    /// Optional display styling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<EdgeStyle>,
}

/// The canonical graph store for one open workflow
///
/// Holds the ordered node and edge collections and the mutation
/// operations. All mutations run on one logical thread; every
/// operation computes its full replacement collections before
/// committing, so observers always see a consistent snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasGraph {
    /// Nodes in parent-before-child order
    pub nodes: Vec<CanvasNode>,
    /// Edges connecting node handles
    pub edges: Vec<CanvasEdge>,
}

impl CanvasGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut CanvasNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a CanvasEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a CanvasEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Find the edge terminating at a `(target, target_handle)` pair
    ///
    /// At most one such edge exists at any time — an input handle
    /// accepts a single producer.
    pub fn edge_into(&self, target: &str, target_handle: &str) -> Option<&CanvasEdge> {
        self.edges
            .iter()
            .find(|e| e.target == target && e.target_handle == target_handle)
    }

    /// Absolute canvas position of a node
    ///
    /// Sum of the node's own position and the positions of every
    /// ancestor found by following `parent_id` until none remains.
    /// The parent relation is acyclic by construction.
    pub fn absolute_position(&self, node_id: &str) -> Option<Position> {
        let mut node = self.find_node(node_id)?;
        let mut acc = node.position;
        while let Some(parent_id) = node.parent_id.as_deref() {
            node = self.find_node(parent_id)?;
            acc = acc.plus(&node.position);
        }
        Some(acc)
    }

    /// Direct children of a group frame
    pub fn children_of<'a>(&'a self, group_id: &'a str) -> impl Iterator<Item = &'a CanvasNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(group_id))
    }

    /// All descendants of a node (children, grandchildren, ...)
    pub fn descendants_of(&self, node_id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut frontier = vec![node_id.to_string()];
        while let Some(current) = frontier.pop() {
            for child in self.children_of(&current) {
                out.push(child.id.clone());
                frontier.push(child.id.clone());
            }
        }
        out
    }

    /// IDs of currently selected nodes
    pub fn selected_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect()
    }

    // =========================================================================
    // Store mutations
    // =========================================================================

    /// Append a node to the graph
    pub fn add_node(&mut self, node: CanvasNode) {
        self.nodes.push(node);
    }

    /// Append an edge without validation
    ///
    /// Callers that take edges from a connect gesture must validate
    /// through [`crate::connect::validate_connection`] first.
    pub fn add_edge(&mut self, edge: CanvasEdge) {
        self.edges.push(edge);
    }

    /// Shallow-merge a patch into a node's data, replacing existing keys
    ///
    /// Returns false when the node does not exist.
    pub fn patch_node_data(&mut self, node_id: &str, patch: NodeData) -> bool {
        match self.find_node_mut(node_id) {
            Some(node) => {
                for (key, value) in patch {
                    node.data.insert(key, value);
                }
                true
            }
            None => false,
        }
    }

    /// Move a node to a new position in its current frame
    pub fn move_node(&mut self, node_id: &str, position: Position) -> bool {
        match self.find_node_mut(node_id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Replace the selection with exactly the given node IDs
    pub fn set_selection(&mut self, ids: &[NodeId]) {
        let wanted: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        for node in &mut self.nodes {
            node.selected = wanted.contains(node.id.as_str());
        }
    }

    /// Remove an edge by ID
    pub fn remove_edge(&mut self, edge_id: &str) -> Option<CanvasEdge> {
        self.edges
            .iter()
            .position(|e| e.id == edge_id)
            .map(|pos| self.edges.remove(pos))
    }

    /// Remove a node, cascading to its incident edges
    ///
    /// Every edge touching the node is removed with it. Direct
    /// children of a removed group frame are re-homed to the removed
    /// node's own parent frame: their position is converted by adding
    /// the removed node's local position, so they do not move on the
    /// canvas.
    pub fn remove_node(&mut self, node_id: &str) -> Option<CanvasNode> {
        let pos = self.nodes.iter().position(|n| n.id == node_id)?;
        let removed = self.nodes.remove(pos);

        let dropped_edges = self
            .edges
            .iter()
            .filter(|e| e.source == node_id || e.target == node_id)
            .count();
        if dropped_edges > 0 {
            log::debug!(
                "Removing node '{}' cascades to {} incident edge(s)",
                node_id,
                dropped_edges
            );
        }
        self.edges
            .retain(|e| e.source != node_id && e.target != node_id);

        for node in &mut self.nodes {
            if node.parent_id.as_deref() == Some(node_id) {
                node.position = node.position.plus(&removed.position);
                node.parent_id = removed.parent_id.clone();
            }
        }

        Some(removed)
    }
}
