//! Value propagation from producers to consumers
//!
//! Two resolution strategies coexist by design, trading responsiveness
//! against correctness:
//!
//! - [`run_merge_pass`] is the reactive pass: it runs whenever the
//!   edge set or a producer's output changes and refreshes the cached
//!   `connected*` display fields on consumer nodes. It is eventually
//!   consistent — a node acting in the same tick as an upstream change
//!   may still observe a stale cached value.
//! - [`resolve_inputs`] / [`gather_action_inputs`] are the on-demand
//!   exact path: they re-walk the current edges and nodes at the
//!   moment an action runs, so the action never acts on a stale cache.

use std::collections::HashMap;

use thiserror::Error;

use crate::handles::{resolve_handles, HandleKind};
use crate::types::{CanvasGraph, CanvasNode, HandleId, NodeData, NodeId, NodeType};

/// Errors raised when gathering inputs for a node action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropagationError {
    /// The node to act on does not exist
    #[error("Node '{0}' not found")]
    UnknownNode(NodeId),

    /// A required input has no resolved upstream value
    #[error("Required input '{handle}' on node '{node}' has no value")]
    MissingRequiredInput { node: NodeId, handle: HandleId },
}

/// Current value offered by a producer node for a given handle kind
///
/// Text: a text-source node exposes its raw `text` field, anything
/// else falls back to the generic `output`. Image: an upload node
/// exposes `imageUrl`, anything else `output` then `imageOutput`.
/// Video: `output` then `videoOutput`.
fn producer_value(producer: &CanvasNode, kind: HandleKind) -> Option<serde_json::Value> {
    let first = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| producer.data.get(*k))
            .filter(|v| !v.is_null())
            .cloned()
    };
    match kind {
        HandleKind::Text => {
            if producer.node_type == NodeType::TextInput {
                first(&["text"])
            } else {
                first(&["output"])
            }
        }
        HandleKind::Image => {
            if producer.node_type == NodeType::ImageUpload {
                first(&["imageUrl"])
            } else {
                first(&["output", "imageOutput"])
            }
        }
        HandleKind::Video => first(&["output", "videoOutput"]),
    }
}

/// Data field that caches the connected value for one input handle
///
/// Image inputs on nodes with several image handles use an indexed
/// field so each slot displays independently.
fn cache_field(input_id: &str, kind: HandleKind, image_input_total: usize) -> String {
    match kind {
        HandleKind::Text => "connectedText".to_string(),
        HandleKind::Video => "connectedVideo".to_string(),
        HandleKind::Image => {
            if image_input_total > 1 {
                let index = input_id.rsplit('_').next().unwrap_or("0");
                format!("connectedImage_{index}")
            } else {
                "connectedImage".to_string()
            }
        }
    }
}

/// Run the reactive merge pass over the whole graph
///
/// For every node, collects its incoming edges and copies each
/// producer's current value into the consumer's `connected*` cache
/// field. A node's data is only written when at least one resolved
/// field differs from the cached value, which makes the pass a fixed
/// point: running it twice with no intervening change mutates nothing.
///
/// Returns the number of nodes whose data changed.
pub fn run_merge_pass(graph: &mut CanvasGraph) -> usize {
    // Phase 1: compute all patches against an immutable snapshot.
    let mut patches: Vec<(NodeId, NodeData)> = Vec::new();

    for node in &graph.nodes {
        let handles = resolve_handles(node.node_type, &node.data);
        if handles.inputs.is_empty() {
            continue;
        }
        let image_input_total = handles
            .inputs
            .iter()
            .filter(|h| h.kind == HandleKind::Image)
            .count();

        let mut patch = NodeData::new();
        for input in &handles.inputs {
            let Some(edge) = graph.edge_into(&node.id, &input.id) else {
                continue;
            };
            let Some(producer) = graph.find_node(&edge.source) else {
                continue;
            };
            let Some(value) = producer_value(producer, input.kind) else {
                continue;
            };
            let field = cache_field(&input.id, input.kind, image_input_total);
            if node.data.get(&field) != Some(&value) {
                patch.insert(field, value);
            }
        }
        if !patch.is_empty() {
            patches.push((node.id.clone(), patch));
        }
    }

    // Phase 2: commit.
    let changed = patches.len();
    for (node_id, patch) in patches {
        graph.patch_node_data(&node_id, patch);
    }
    changed
}

/// Resolve a node's inputs by walking the current edges and nodes
///
/// This is the exact path: it ignores the cached `connected*` fields
/// entirely, so the result reflects the latest available producer
/// values even when the reactive pass has not caught up.
pub fn resolve_inputs(graph: &CanvasGraph, node_id: &str) -> HashMap<HandleId, serde_json::Value> {
    let mut resolved = HashMap::new();
    let Some(node) = graph.find_node(node_id) else {
        return resolved;
    };
    let handles = resolve_handles(node.node_type, &node.data);
    for input in &handles.inputs {
        let Some(edge) = graph.edge_into(node_id, &input.id) else {
            continue;
        };
        let Some(producer) = graph.find_node(&edge.source) else {
            continue;
        };
        if let Some(value) = producer_value(producer, input.kind) {
            resolved.insert(input.id.clone(), value);
        }
    }
    resolved
}

/// Resolve inputs for a node action, failing on missing required inputs
///
/// Called at the moment a node's action (e.g. "run") executes, before
/// any provider call is attempted. A required input with no resolved
/// value is a local validation error.
pub fn gather_action_inputs(
    graph: &CanvasGraph,
    node_id: &str,
) -> Result<HashMap<HandleId, serde_json::Value>, PropagationError> {
    let node = graph
        .find_node(node_id)
        .ok_or_else(|| PropagationError::UnknownNode(node_id.to_string()))?;
    let resolved = resolve_inputs(graph, node_id);

    let handles = resolve_handles(node.node_type, &node.data);
    for input in &handles.inputs {
        if input.required && !resolved.contains_key(&input.id) {
            return Err(PropagationError::MissingRequiredInput {
                node: node_id.to_string(),
                handle: input.id.clone(),
            });
        }
    }
    Ok(resolved)
}
