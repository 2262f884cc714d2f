//! Duplication and clipboard export of canvas selections
//!
//! Duplication clones a selection (including every descendant of any
//! group in it) with deterministic id remapping; only edges fully
//! inside the duplicated set are copied. Clipboard export reuses the
//! same selection closure and edge filter but keeps original ids — it
//! is a readable subgraph export, not an in-graph operation.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, NodeId, NodeType, Position};

/// Canvas offset applied to top-level duplicated nodes
pub const DUPLICATE_OFFSET: f64 = 40.0;

/// New nodes and edges produced by one duplication call
#[derive(Debug, Clone)]
pub struct DuplicateResult {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<String>,
}

/// A copied subgraph for clipboard export (original ids preserved)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowClipboard {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

/// The set of nodes one duplication (or copy) covers
///
/// If the target is part of a multi-node selection the set is the
/// selection, otherwise the single target. Every group in the set
/// pulls in all of its descendants, so group duplication is deep by
/// construction. Order follows the node list, preserving
/// parent-before-child.
fn resolve_duplication_set(
    graph: &CanvasGraph,
    target_id: &str,
    selection: &[NodeId],
) -> Vec<NodeId> {
    let mut wanted: HashSet<NodeId> = if selection.iter().any(|id| id == target_id) {
        selection.iter().cloned().collect()
    } else {
        std::iter::once(target_id.to_string()).collect()
    };

    for id in wanted.clone() {
        if let Some(node) = graph.find_node(&id) {
            if node.node_type.is_group() {
                wanted.extend(graph.descendants_of(&id));
            }
        }
    }

    graph
        .nodes
        .iter()
        .filter(|n| wanted.contains(&n.id))
        .map(|n| n.id.clone())
        .collect()
}

/// Type tag fragment used in duplicated node ids
fn type_slug(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::TextInput => "text-input",
        NodeType::TextGenerate => "text-generate",
        NodeType::ImageGenerate => "image-generate",
        NodeType::ImageEdit => "image-edit",
        NodeType::ImageUpload => "image-upload",
        NodeType::VideoGenerate => "video-generate",
        NodeType::Group => "group",
        NodeType::Unknown => "node",
    }
}

/// Duplicate the target (or its selection) into the graph
///
/// Copies get ids derived from their type tag, a shared timestamp and
/// their index in the set — unique within one call. Top-level copies
/// are offset by [`DUPLICATE_OFFSET`] and become the new selection;
/// nested copies keep their relative position. A copy whose original
/// parent was not duplicated keeps that parent, so a lone child lands
/// back inside its existing group.
pub fn duplicate(
    graph: &mut CanvasGraph,
    target_id: &str,
    selection: &[NodeId],
) -> DuplicateResult {
    duplicate_at(
        graph,
        target_id,
        selection,
        chrono::Utc::now().timestamp_millis(),
    )
}

/// Duplication with an explicit timestamp (deterministic for tests)
pub fn duplicate_at(
    graph: &mut CanvasGraph,
    target_id: &str,
    selection: &[NodeId],
    timestamp_ms: i64,
) -> DuplicateResult {
    let member_ids = resolve_duplication_set(graph, target_id, selection);
    let member_set: HashSet<&str> = member_ids.iter().map(|s| s.as_str()).collect();

    // Shared timestamp + index keeps ids unique within this call.
    let mut id_map: HashMap<NodeId, NodeId> = HashMap::new();
    for (index, id) in member_ids.iter().enumerate() {
        let node_type = graph
            .find_node(id)
            .map(|n| n.node_type)
            .unwrap_or(NodeType::Unknown);
        id_map.insert(
            id.clone(),
            format!("{}-{}-{}", type_slug(node_type), timestamp_ms, index),
        );
    }

    let mut new_nodes: Vec<CanvasNode> = Vec::with_capacity(member_ids.len());
    for id in &member_ids {
        let original = graph.find_node(id).expect("member listed above");
        let mut copy = original.clone();
        copy.id = id_map[id].clone();

        // Remap the parent only when it was duplicated too.
        let remapped_parent = original
            .parent_id
            .as_ref()
            .and_then(|p| id_map.get(p).cloned());
        let parent_duplicated = remapped_parent.is_some();
        if let Some(remapped) = remapped_parent {
            // The clone already carries the original parent otherwise.
            copy.parent_id = Some(remapped);
        }

        if parent_duplicated {
            copy.selected = false;
        } else {
            copy.position = copy
                .position
                .plus(&Position::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET));
            copy.selected = true;
        }

        if copy.node_type.is_group() {
            let label = copy
                .data_str("label")
                .map(|l| format!("Duplicate of {l}"))
                .unwrap_or_else(|| "Duplicate of Group".to_string());
            copy.data.insert("label".to_string(), serde_json::json!(label));
        }

        new_nodes.push(copy);
    }

    // Only edges fully inside the set are copied; edges crossing the
    // boundary are dropped, never rewired to originals.
    let mut new_edges: Vec<CanvasEdge> = Vec::new();
    for edge in &graph.edges {
        let source_inside = member_set.contains(edge.source.as_str());
        let target_inside = member_set.contains(edge.target.as_str());
        if source_inside && target_inside {
            new_edges.push(CanvasEdge {
                id: format!("edge-{}", uuid::Uuid::new_v4()),
                source: id_map[&edge.source].clone(),
                source_handle: edge.source_handle.clone(),
                target: id_map[&edge.target].clone(),
                target_handle: edge.target_handle.clone(),
                style: edge.style.clone(),
            });
        }
    }

    let result = DuplicateResult {
        nodes: new_nodes.iter().map(|n| n.id.clone()).collect(),
        edges: new_edges.iter().map(|e| e.id.clone()).collect(),
    };

    // Originals leave the selection; the copies take it over.
    for node in &mut graph.nodes {
        node.selected = false;
    }
    graph.nodes.extend(new_nodes);
    graph.edges.extend(new_edges);

    log::debug!(
        "Duplicated {} node(s) and {} edge(s)",
        result.nodes.len(),
        result.edges.len()
    );
    result
}

/// Export the target (or its selection) as a clipboard subgraph
///
/// Same selection closure and internal-edge filter as [`duplicate`],
/// with no id remapping.
pub fn copy_selection(
    graph: &CanvasGraph,
    target_id: &str,
    selection: &[NodeId],
) -> WorkflowClipboard {
    let member_ids = resolve_duplication_set(graph, target_id, selection);
    let member_set: HashSet<&str> = member_ids.iter().map(|s| s.as_str()).collect();

    WorkflowClipboard {
        nodes: graph
            .nodes
            .iter()
            .filter(|n| member_set.contains(n.id.as_str()))
            .cloned()
            .collect(),
        edges: graph
            .edges
            .iter()
            .filter(|e| {
                member_set.contains(e.source.as_str()) && member_set.contains(e.target.as_str())
            })
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CanvasBuilder;
    use crate::groups::group_nodes;
    use crate::handles::TEXT_OUTPUT;

    fn ids(v: &[&str]) -> Vec<NodeId> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_duplicate_single_node() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (10.0, 20.0))
            .build();

        let result = duplicate_at(&mut graph, "a", &[], 1_700_000_000_000);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());

        let copy = graph.find_node(&result.nodes[0]).unwrap();
        assert_eq!(copy.id, "text-input-1700000000000-0");
        assert_eq!(copy.position, Position::new(50.0, 60.0));
        assert!(copy.selected);
        // Original is deselected and untouched otherwise.
        let original = graph.find_node("a").unwrap();
        assert!(!original.selected);
        assert_eq!(original.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn test_duplicate_selection_when_target_in_it() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::ImageGenerate, (200.0, 0.0))
            .add_edge("a", TEXT_OUTPUT, "b", "prompt")
            .build();

        let result = duplicate_at(&mut graph, "a", &ids(&["a", "b"]), 42);
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 1);

        // The copied edge connects the new ids.
        let edge = graph
            .edges
            .iter()
            .find(|e| e.id == result.edges[0])
            .unwrap();
        assert!(result.nodes.contains(&edge.source));
        assert!(result.nodes.contains(&edge.target));
    }

    #[test]
    fn test_duplicate_drops_boundary_edges() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::ImageGenerate, (200.0, 0.0))
            .add_edge("a", TEXT_OUTPUT, "b", "prompt")
            .build();

        // Only "b" is duplicated; the edge crosses the set boundary.
        let result = duplicate_at(&mut graph, "b", &[], 42);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn test_duplicate_group_is_deep() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::TextGenerate, (200.0, 0.0))
            .add_edge("a", TEXT_OUTPUT, "b", "prompt")
            .build();
        let group_id = group_nodes(&mut graph, &ids(&["a", "b"]), &HashMap::new()).unwrap();

        let result = duplicate_at(&mut graph, &group_id, &[], 42);
        // Group + 2 children, 1 internal edge.
        assert_eq!(result.nodes.len(), 3);
        assert_eq!(result.edges.len(), 1);

        // The group copy is offset and selected; children keep their
        // relative positions inside the new frame.
        let group_copy = graph.find_node("group-42-0").unwrap();
        assert!(group_copy.selected);
        assert_eq!(graph.selected_ids(), vec!["group-42-0".to_string()]);
        assert_eq!(
            group_copy.data_str("label"),
            Some("Duplicate of Group")
        );

        let child_copy = graph.find_node("text-input-42-1").unwrap();
        assert!(!child_copy.selected);
        assert_eq!(child_copy.parent_id.as_deref(), Some("group-42-0"));
        assert_eq!(
            child_copy.position,
            graph.find_node("a").unwrap().position
        );
    }

    #[test]
    fn test_lone_child_stays_in_existing_group() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::TextInput, (100.0, 0.0))
            .build();
        let group_id = group_nodes(&mut graph, &ids(&["a", "b"]), &HashMap::new()).unwrap();

        let result = duplicate_at(&mut graph, "a", &[], 42);
        let copy = graph.find_node(&result.nodes[0]).unwrap();
        // Parent not duplicated, so the original parent is preserved
        // and the copy is offset within that frame.
        assert_eq!(copy.parent_id.as_deref(), Some(group_id.as_str()));
        let original = graph.find_node("a").unwrap();
        assert_eq!(
            copy.position,
            original
                .position
                .plus(&Position::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET))
        );
    }

    #[test]
    fn test_ids_unique_within_call() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::TextInput, (100.0, 0.0))
            .build();

        let result = duplicate_at(&mut graph, "a", &ids(&["a", "b"]), 42);
        let unique: HashSet<&NodeId> = result.nodes.iter().collect();
        assert_eq!(unique.len(), result.nodes.len());
        // And distinct from every original id.
        assert!(result.nodes.iter().all(|id| id != "a" && id != "b"));
    }

    #[test]
    fn test_copy_selection_preserves_ids() {
        let mut graph = CanvasBuilder::new()
            .add_node("a", NodeType::TextInput, (0.0, 0.0))
            .add_node("b", NodeType::ImageGenerate, (200.0, 0.0))
            .add_node("c", NodeType::TextInput, (400.0, 0.0))
            .add_edge("a", TEXT_OUTPUT, "b", "prompt")
            .build();
        graph.add_edge(CanvasEdge {
            id: "boundary".to_string(),
            source: "b".to_string(),
            source_handle: "image_output".to_string(),
            target: "c".to_string(),
            target_handle: "image_0".to_string(),
            style: None,
        });

        let clipboard = copy_selection(&graph, "a", &ids(&["a", "b"]));
        let node_ids: Vec<&str> = clipboard.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(node_ids, vec!["a", "b"]);
        // Internal edge kept with its original id, boundary edge dropped.
        assert_eq!(clipboard.edges.len(), 1);
        assert_ne!(clipboard.edges[0].id, "boundary");
        // Graph itself is untouched.
        assert_eq!(graph.nodes.len(), 3);
    }
}
