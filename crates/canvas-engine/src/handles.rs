//! Handle resolution for canvas nodes
//!
//! A node's input/output handle set is a pure function of its type tag
//! and current data — handle lists are never cached in node data, they
//! are recomputed on demand. Several type tags compute a variable
//! input list from a count stored in data (e.g. `imageInputCount`);
//! the host must refresh dependent layout whenever that count changes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::{EdgeStyle, HandleId, NodeData, NodeType};

/// Canonical output handle ID for text producers
pub const TEXT_OUTPUT: &str = "text_output";
/// Canonical output handle ID for image producers
pub const IMAGE_OUTPUT: &str = "image_output";
/// Canonical output handle ID for video producers
pub const VIDEO_OUTPUT: &str = "video_output";

/// The kind of value a handle carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Text,
    Image,
    Video,
}

/// Descriptor for a single input or output handle
///
/// Type compatibility is expressed without a central type table: each
/// input declares the set of output handle IDs it accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDescriptor {
    /// Handle identifier, unique within the node
    pub id: HandleId,
    /// Human-readable label
    pub label: String,
    /// Kind of value carried
    pub kind: HandleKind,
    /// Whether an action on the node fails without this input
    pub required: bool,
    /// Output handle IDs this input accepts (empty for outputs)
    #[serde(default, skip_serializing_if = "HashSet::is_empty")]
    pub accepts: HashSet<HandleId>,
}

impl HandleDescriptor {
    /// Create an input handle accepting the given output handle IDs
    pub fn input(
        id: impl Into<String>,
        label: impl Into<String>,
        kind: HandleKind,
        required: bool,
        accepts: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required,
            accepts: accepts.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create an output handle with the conventional ID for its kind
    pub fn output(id: impl Into<String>, label: impl Into<String>, kind: HandleKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            accepts: HashSet::new(),
        }
    }
}

/// The resolved handle set for one node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeHandles {
    pub inputs: Vec<HandleDescriptor>,
    pub outputs: Vec<HandleDescriptor>,
}

impl NodeHandles {
    /// Find an input descriptor by handle ID
    pub fn input(&self, handle_id: &str) -> Option<&HandleDescriptor> {
        self.inputs.iter().find(|h| h.id == handle_id)
    }

    /// Find an output descriptor by handle ID
    pub fn output(&self, handle_id: &str) -> Option<&HandleDescriptor> {
        self.outputs.iter().find(|h| h.id == handle_id)
    }
}

/// Number of indexed image inputs requested by the node data
///
/// Absent or malformed counts default to one input; negative values
/// clamp to zero.
fn image_input_count(data: &NodeData) -> usize {
    match data.get("imageInputCount") {
        Some(value) => value.as_i64().map(|n| n.max(0) as usize).unwrap_or(1),
        None => 1,
    }
}

/// Resolve the current handle set for a node
///
/// Pure function of the type tag and data. Unknown type tags and group
/// frames resolve to empty handle sets.
pub fn resolve_handles(node_type: NodeType, data: &NodeData) -> NodeHandles {
    match node_type {
        NodeType::TextInput => NodeHandles {
            inputs: vec![],
            outputs: vec![HandleDescriptor::output(TEXT_OUTPUT, "Text", HandleKind::Text)],
        },
        NodeType::TextGenerate => NodeHandles {
            inputs: vec![HandleDescriptor::input(
                "prompt",
                "Prompt",
                HandleKind::Text,
                true,
                &[TEXT_OUTPUT],
            )],
            outputs: vec![HandleDescriptor::output(TEXT_OUTPUT, "Text", HandleKind::Text)],
        },
        NodeType::ImageGenerate => NodeHandles {
            inputs: vec![HandleDescriptor::input(
                "prompt",
                "Prompt",
                HandleKind::Text,
                true,
                &[TEXT_OUTPUT],
            )],
            outputs: vec![HandleDescriptor::output(
                IMAGE_OUTPUT,
                "Image",
                HandleKind::Image,
            )],
        },
        NodeType::ImageEdit => {
            let mut inputs = vec![HandleDescriptor::input(
                "prompt",
                "Prompt",
                HandleKind::Text,
                true,
                &[TEXT_OUTPUT],
            )];
            for index in 0..image_input_count(data) {
                inputs.push(HandleDescriptor::input(
                    format!("image_{index}"),
                    format!("Image {}", index + 1),
                    HandleKind::Image,
                    index == 0,
                    &[IMAGE_OUTPUT],
                ));
            }
            NodeHandles {
                inputs,
                outputs: vec![HandleDescriptor::output(
                    IMAGE_OUTPUT,
                    "Image",
                    HandleKind::Image,
                )],
            }
        }
        NodeType::ImageUpload => NodeHandles {
            inputs: vec![],
            outputs: vec![HandleDescriptor::output(
                IMAGE_OUTPUT,
                "Image",
                HandleKind::Image,
            )],
        },
        NodeType::VideoGenerate => NodeHandles {
            inputs: vec![
                HandleDescriptor::input(
                    "prompt",
                    "Prompt",
                    HandleKind::Text,
                    true,
                    &[TEXT_OUTPUT],
                ),
                HandleDescriptor::input(
                    "image_0",
                    "Start frame",
                    HandleKind::Image,
                    false,
                    &[IMAGE_OUTPUT],
                ),
            ],
            outputs: vec![HandleDescriptor::output(
                VIDEO_OUTPUT,
                "Video",
                HandleKind::Video,
            )],
        },
        NodeType::Group | NodeType::Unknown => NodeHandles::default(),
    }
}

/// Kind of value produced by a canonical output handle ID
pub fn kind_of_output(handle_id: &str) -> Option<HandleKind> {
    match handle_id {
        TEXT_OUTPUT => Some(HandleKind::Text),
        IMAGE_OUTPUT => Some(HandleKind::Image),
        VIDEO_OUTPUT => Some(HandleKind::Video),
        _ => None,
    }
}

/// Display styling for an edge, keyed by the producer's handle kind
///
/// Unknown kinds fall back to the neutral color.
pub fn edge_style_for(kind: Option<HandleKind>) -> EdgeStyle {
    let color = match kind {
        Some(HandleKind::Text) => "#3b82f6",
        Some(HandleKind::Image) => "#a855f7",
        Some(HandleKind::Video) => "#f59e0b",
        None => "#94a3b8",
    };
    EdgeStyle {
        color: color.to_string(),
        animated: true,
    }
}
