//! Canvas Engine - Node-graph dataflow and grouping for Mural
//!
//! This crate is the core of the Mural canvas: an infinite surface of
//! content-generation and content-editing nodes whose outputs feed
//! downstream inputs. It provides:
//!
//! - The graph store (ordered nodes/edges, parent-before-child frames)
//! - Handle resolution as a pure function of type tag and data
//! - Connection validation (single producer per input, accepted
//!   source handle sets)
//! - Value propagation: a reactive merge pass for display caches and
//!   an on-demand exact resolver for node actions
//! - Grouping/ungrouping with exact coordinate-frame round-trips
//! - Duplication with id remapping and internal-edge-only copy
//!
//! The rendering surface, per-node editing UIs, and generation
//! providers are external collaborators; this crate is synchronous
//! and single-writer — every operation commits a complete replacement
//! snapshot.
//!
//! # Example
//!
//! ```
//! use canvas_engine::builder::CanvasBuilder;
//! use canvas_engine::propagate::run_merge_pass;
//! use canvas_engine::types::NodeType;
//!
//! let mut graph = CanvasBuilder::new()
//!     .add_node("text-1", NodeType::TextInput, (0.0, 0.0))
//!     .with_data(serde_json::json!({"text": "a quiet harbor at dawn"}))
//!     .add_node("image-1", NodeType::ImageGenerate, (260.0, 0.0))
//!     .add_edge("text-1", "text_output", "image-1", "prompt")
//!     .build();
//!
//! run_merge_pass(&mut graph);
//! let image = graph.find_node("image-1").unwrap();
//! assert_eq!(image.data_str("connectedText"), Some("a quiet harbor at dawn"));
//! ```

pub mod builder;
pub mod connect;
pub mod duplicate;
pub mod error;
pub mod groups;
pub mod handles;
pub mod propagate;
pub mod types;

// Re-export key types
pub use builder::CanvasBuilder;
pub use connect::{build_edge, can_connect, validate_connection, ConnectionRequest};
pub use duplicate::{copy_selection, duplicate, DuplicateResult, WorkflowClipboard};
pub use error::{EngineError, Result};
pub use groups::{group_nodes, ungroup};
pub use handles::{resolve_handles, HandleDescriptor, HandleKind, NodeHandles};
pub use propagate::{gather_action_inputs, resolve_inputs, run_merge_pass};
pub use types::{
    CanvasEdge, CanvasGraph, CanvasNode, EdgeStyle, HandleId, NodeId, NodeType, Position, Size,
    Viewport,
};
