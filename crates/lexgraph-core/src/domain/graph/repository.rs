//! Repository trait for graph persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

use super::entity::{Edge, Graph, GraphContents, GraphCounts, GraphStatus, Node, NodePatch, Position};

/// Repository trait for the graph store
///
/// Session-keyed operations address the graph through its owning session.
/// Node and edge operations are additionally scoped by graph id so a caller
/// authorized on one graph can never reach rows of another.
#[async_trait]
pub trait GraphRepository: Send + Sync {
    // ========== Graph Operations ==========

    /// Get the graph for a session
    async fn get_graph(&self, session_id: &str) -> Result<Option<Graph>>;

    /// Get a graph by its own id
    async fn get_graph_by_id(&self, graph_id: &str) -> Result<Option<Graph>>;

    /// Create the graph row if missing, then set its status
    async fn upsert_graph_shell(&self, session_id: &str, status: GraphStatus) -> Result<Graph>;

    /// Atomically claim the BUILDING flag for a session.
    ///
    /// Succeeds when no graph exists, when the graph is not BUILDING, or when
    /// the BUILDING flag was last touched before `stale_before`. Returns
    /// `false` when another build holds the flag.
    async fn try_begin_build(&self, session_id: &str, stale_before: DateTime<Utc>)
    -> Result<bool>;

    /// Replace all nodes and edges of a session's graph in one transaction.
    ///
    /// Edges whose endpoints are not in `contents.nodes` are dropped and
    /// counted. Fails with NotFound when the session has no graph.
    async fn replace_nodes_and_edges(
        &self,
        session_id: &str,
        contents: &GraphContents,
    ) -> Result<GraphCounts>;

    /// Replace contents and transition to READY in the same transaction
    async fn complete_build(
        &self,
        session_id: &str,
        summary: &str,
        contents: &GraphContents,
    ) -> Result<GraphCounts>;

    /// Transition to ERROR, recording the failure reason
    async fn mark_failed(&self, session_id: &str, message: &str) -> Result<()>;

    /// Delete a session's graph with its nodes, edges, shares and comments
    async fn delete_graph(&self, session_id: &str) -> Result<bool>;

    // ========== Node Operations ==========

    /// List nodes of a session's graph
    async fn list_nodes(&self, session_id: &str) -> Result<Vec<Node>>;

    async fn get_node(&self, graph_id: &str, node_id: &str) -> Result<Option<Node>>;

    /// Apply a partial update; `None` when the node is not in the graph
    async fn update_node(
        &self,
        graph_id: &str,
        node_id: &str,
        patch: &NodePatch,
    ) -> Result<Option<Node>>;

    /// Persist layout hints, ignoring ids outside the graph. Returns rows updated.
    async fn update_positions(&self, graph_id: &str, positions: &[(String, Position)])
    -> Result<u64>;

    /// Delete a node and every edge touching it
    async fn delete_node(&self, graph_id: &str, node_id: &str) -> Result<bool>;

    // ========== Edge Operations ==========

    /// List edges of a session's graph
    async fn list_edges(&self, session_id: &str) -> Result<Vec<Edge>>;

    async fn get_edge(&self, graph_id: &str, edge_id: &str) -> Result<Option<Edge>>;

    async fn delete_edge(&self, graph_id: &str, edge_id: &str) -> Result<bool>;
}
