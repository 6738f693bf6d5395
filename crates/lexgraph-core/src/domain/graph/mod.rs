//! Graph store domain
//!
//! Graphs, nodes and edges with their invariants:
//! - at most one graph per session
//! - `node_count`/`edge_count` match the live tallies after every write
//! - no edge references a node outside its own graph

mod entity;
mod repository;

pub use entity::{
    Edge, Graph, GraphContents, GraphCounts, GraphSnapshot, GraphStatus, NewEdge, NewNode, Node,
    NodePatch, NodeType, Position, default_edge_label,
};
pub use repository::GraphRepository;
