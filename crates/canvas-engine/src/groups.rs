//! Group frames — local coordinate frames over canvas selections
//!
//! Grouping reparents a selection under a new group frame whose
//! rectangle is the padded union bounding box of the members. Child
//! positions are expressed in the group's local frame (origin at the
//! group's own position), so the coordinate transforms here and in
//! [`ungroup`] must round-trip exactly.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::types::{CanvasGraph, CanvasNode, NodeId, NodeType, Position, Size};

/// Padding between the union bounding box and the group rectangle
pub const GROUP_PADDING: f64 = 48.0;

/// Size assumed for nodes with no explicit or measured size
pub const FALLBACK_NODE_SIZE: Size = Size {
    width: 100.0,
    height: 100.0,
};

/// Minimum group rectangle
pub const MIN_GROUP_WIDTH: f64 = 200.0;
pub const MIN_GROUP_HEIGHT: f64 = 150.0;

/// Errors raised by grouping operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// Grouping needs at least two top-level members
    #[error("Select at least two top-level nodes to group")]
    NeedTwoTopLevelNodes,

    /// The group to dissolve does not exist
    #[error("Group '{0}' not found")]
    UnknownGroup(NodeId),

    /// The node exists but is not a group frame
    #[error("Node '{0}' is not a group")]
    NotAGroup(NodeId),
}

/// Effective rendered size of a node: explicit, else measured, else fallback
fn effective_size(node: &CanvasNode, measured: &HashMap<NodeId, Size>) -> Size {
    node.size
        .or_else(|| measured.get(&node.id).copied())
        .unwrap_or(FALLBACK_NODE_SIZE)
}

/// Selected nodes whose ancestor chain contains no other selected node
///
/// A node whose parent (or any further ancestor) is also selected is
/// covered by that ancestor's reparenting and must not be grouped a
/// second time.
fn root_members(graph: &CanvasGraph, selected: &HashSet<&str>) -> Vec<NodeId> {
    let mut roots = Vec::new();
    for id in graph.nodes.iter().map(|n| n.id.as_str()) {
        if !selected.contains(id) {
            continue;
        }
        let mut ancestor = graph.find_node(id).and_then(|n| n.parent_id.as_deref());
        let mut covered = false;
        while let Some(parent_id) = ancestor {
            if selected.contains(parent_id) {
                covered = true;
                break;
            }
            ancestor = graph.find_node(parent_id).and_then(|n| n.parent_id.as_deref());
        }
        if !covered {
            roots.push(id.to_string());
        }
    }
    roots
}

/// Group the selected nodes under a new group frame
///
/// `measured` supplies host-rendered sizes for nodes without an
/// explicit `size`. The new group is inserted into the node list
/// before its children (a frame must appear before any node that
/// declares it as parent), becomes the sole selection, and its ID is
/// returned.
pub fn group_nodes(
    graph: &mut CanvasGraph,
    selected_ids: &[NodeId],
    measured: &HashMap<NodeId, Size>,
) -> Result<NodeId, GroupError> {
    let selected: HashSet<&str> = selected_ids.iter().map(|s| s.as_str()).collect();
    let roots = root_members(graph, &selected);
    if roots.len() < 2 {
        return Err(GroupError::NeedTwoTopLevelNodes);
    }

    // Union bounding box over absolute member rectangles.
    let root_set: HashSet<&str> = roots.iter().map(|s| s.as_str()).collect();
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    let mut absolutes: HashMap<NodeId, Position> = HashMap::new();
    for node in &graph.nodes {
        if !root_set.contains(node.id.as_str()) {
            continue;
        }
        // A dangling parent reference degrades to the local position.
        let abs = graph.absolute_position(&node.id).unwrap_or(node.position);
        let size = effective_size(node, measured);
        min_x = min_x.min(abs.x);
        min_y = min_y.min(abs.y);
        max_x = max_x.max(abs.x + size.width);
        max_y = max_y.max(abs.y + size.height);
        absolutes.insert(node.id.clone(), abs);
    }

    let origin = Position::new(min_x - GROUP_PADDING, min_y - GROUP_PADDING);
    let size = Size::new(
        (max_x - min_x + 2.0 * GROUP_PADDING).max(MIN_GROUP_WIDTH),
        (max_y - min_y + 2.0 * GROUP_PADDING).max(MIN_GROUP_HEIGHT),
    );

    let group_id = format!("group-{}", uuid::Uuid::new_v4());
    let mut group = CanvasNode::new(&group_id, NodeType::Group, origin);
    group.size = Some(size);
    group.selected = true;
    group
        .data
        .insert("label".to_string(), serde_json::json!("Group"));
    group
        .data
        .insert("labelSize".to_string(), serde_json::json!("medium"));

    // Reparent each root into the new frame.
    let mut first_root_index = graph.nodes.len();
    for (index, node) in graph.nodes.iter_mut().enumerate() {
        if root_set.contains(node.id.as_str()) {
            first_root_index = first_root_index.min(index);
            let abs = absolutes[&node.id];
            node.position = abs.minus(&origin);
            node.parent_id = Some(group_id.clone());
        }
        node.selected = false;
    }

    // Ordering is load-bearing: the frame precedes its children.
    graph.nodes.insert(first_root_index, group);

    log::debug!(
        "Grouped {} node(s) into '{}' at ({}, {})",
        roots.len(),
        group_id,
        origin.x,
        origin.y
    );
    Ok(group_id)
}

/// Dissolve a group frame, converting its children one frame up
///
/// Direct children take the group's own parent frame: their position
/// gains the group's local position and their `parent_id` becomes the
/// group's `parent_id`. Grandchildren stay attached to their immediate
/// (still-existing) parents. Grouping then ungrouping restores every
/// child's absolute position exactly.
pub fn ungroup(graph: &mut CanvasGraph, group_id: &str) -> Result<(), GroupError> {
    let pos = graph
        .nodes
        .iter()
        .position(|n| n.id == group_id)
        .ok_or_else(|| GroupError::UnknownGroup(group_id.to_string()))?;
    if !graph.nodes[pos].node_type.is_group() {
        return Err(GroupError::NotAGroup(group_id.to_string()));
    }
    let group = graph.nodes.remove(pos);

    for node in &mut graph.nodes {
        if node.parent_id.as_deref() == Some(group_id) {
            node.position = node.position.plus(&group.position);
            node.parent_id = group.parent_id.clone();
        }
    }
    Ok(())
}
