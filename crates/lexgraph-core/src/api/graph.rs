//! Graph API
//!
//! Graph reads, builds, layout and deletion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::access::Action;
use crate::domain::build::{BuildOutcome, BuildReport};
use crate::domain::graph::{Edge, Graph, GraphStatus, Node, Position};
use crate::error::{Error, Result};

use super::LexGraph;

/// Node as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub description: Option<String>,
    pub properties: Map<String, Value>,
    pub position: Option<Position>,
}

impl From<Node> for NodeDto {
    fn from(n: Node) -> Self {
        Self {
            id: n.id,
            node_type: n.node_type.as_str().to_string(),
            label: n.label,
            description: n.description,
            properties: n.properties,
            position: n.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    pub label: String,
}

impl From<Edge> for EdgeDto {
    fn from(e: Edge) -> Self {
        Self {
            id: e.id,
            source_id: e.source_id,
            target_id: e.target_id,
            relation: e.relation,
            label: e.label,
        }
    }
}

/// Current status and contents of a session's graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    pub session_id: String,
    pub graph_id: Option<String>,
    pub status: String,
    pub summary: Option<String>,
    pub node_count: u32,
    pub edge_count: u32,
    pub last_built_at: Option<String>,
    pub error_message: Option<String>,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

impl GraphView {
    /// View of a session that has never been built
    pub fn not_built(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            graph_id: None,
            status: GraphStatus::NotBuilt.as_str().to_string(),
            summary: None,
            node_count: 0,
            edge_count: 0,
            last_built_at: None,
            error_message: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn from_parts(graph: Graph, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            session_id: graph.session_id,
            graph_id: Some(graph.id),
            status: graph.status.as_str().to_string(),
            summary: graph.summary,
            node_count: graph.node_count,
            edge_count: graph.edge_count,
            last_built_at: graph.last_built_at.map(|t| t.to_rfc3339()),
            error_message: graph.error_message,
            nodes: nodes.into_iter().map(NodeDto::from).collect(),
            edges: edges.into_iter().map(EdgeDto::from).collect(),
        }
    }

    pub fn is_building(&self) -> bool {
        self.status == GraphStatus::Building.as_str()
    }
}

/// Result of a build request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    /// `COMPLETED`, `ALREADY_BUILDING` or `FAILED`
    pub outcome: String,
    pub error: Option<String>,
    pub dropped_edges: u32,
    pub skipped_nodes: u32,
    pub graph: GraphView,
}

impl BuildResult {
    pub fn already_building(&self) -> bool {
        self.outcome == "ALREADY_BUILDING"
    }
}

/// Layout hint for one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: String,
    pub position: Position,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutResult {
    pub updated: u64,
}

impl LexGraph {
    async fn load_view(&self, graph: Graph) -> Result<GraphView> {
        let nodes = self.graphs.list_nodes(&graph.session_id).await?;
        let edges = self.graphs.list_edges(&graph.session_id).await?;
        Ok(GraphView::from_parts(graph, nodes, edges))
    }

    /// Current status, nodes and edges of a session's graph
    pub async fn get_graph(&self, session_id: &str, actor_id: &str) -> Result<GraphView> {
        let grant = self
            .access
            .authorize(session_id, actor_id, Action::ViewGraph)
            .await?;
        match grant.graph {
            Some(graph) => self.load_view(graph).await,
            None => Ok(GraphView::not_built(session_id)),
        }
    }

    /// Build or rebuild a session's graph
    pub async fn build_graph(&self, session_id: &str, actor_id: &str) -> Result<BuildResult> {
        let BuildReport {
            graph,
            outcome,
            dropped_edges,
            skipped_nodes,
        } = self.builder.build(session_id, actor_id).await?;

        let (outcome, error) = match outcome {
            BuildOutcome::Completed => ("COMPLETED", None),
            BuildOutcome::AlreadyBuilding => ("ALREADY_BUILDING", None),
            BuildOutcome::Failed { message } => ("FAILED", Some(message)),
        };

        Ok(BuildResult {
            outcome: outcome.to_string(),
            error,
            dropped_edges,
            skipped_nodes,
            graph: self.load_view(graph).await?,
        })
    }

    /// Persist layout hints; ids outside the graph are ignored
    pub async fn save_layout(
        &self,
        session_id: &str,
        actor_id: &str,
        positions: Vec<PositionUpdate>,
    ) -> Result<LayoutResult> {
        let grant = self
            .access
            .authorize(session_id, actor_id, Action::MutateGraph)
            .await?;
        let graph = grant.require_graph()?;

        let positions: Vec<(String, Position)> =
            positions.into_iter().map(|p| (p.id, p.position)).collect();
        let updated = self.graphs.update_positions(&graph.id, &positions).await?;
        Ok(LayoutResult { updated })
    }

    /// Delete a session's graph with its nodes, edges, shares and comments
    pub async fn delete_graph(&self, session_id: &str, actor_id: &str) -> Result<()> {
        self.access
            .authorize(session_id, actor_id, Action::Manage)
            .await?;
        if !self.graphs.delete_graph(session_id).await? {
            return Err(Error::not_found("graph", session_id));
        }
        info!(session_id = %session_id, actor_id = %actor_id, "Graph deleted by owner");
        Ok(())
    }

    /// Read-only graph view for a share-link token
    pub async fn shared_graph(&self, token: &str) -> Result<GraphView> {
        let access = self.access.resolve_access_by_token(token).await;
        let Some(graph_id) = access.graph_id.filter(|_| access.level.allows(Action::ViewGraph))
        else {
            return Err(Error::denied("Invalid or expired share link"));
        };

        let graph = self
            .graphs
            .get_graph_by_id(&graph_id)
            .await?
            .ok_or_else(|| Error::not_found("graph", &graph_id))?;
        self.load_view(graph).await
    }
}
