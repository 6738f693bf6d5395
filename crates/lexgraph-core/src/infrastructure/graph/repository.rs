//! SQLite implementation of the GraphRepository
//!
//! Every multi-row write runs inside one transaction so readers see either the
//! previous node/edge set or the new one, never a mix.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::graph::{
    Edge, Graph, GraphContents, GraphCounts, GraphRepository, GraphStatus, Node, NodePatch,
    NodeType, Position,
};
use crate::error::{Error, Result};
use crate::storage::timestamp;

/// SQLite implementation of the graph repository
#[derive(Clone)]
pub struct SqliteGraphRepository {
    pool: SqlitePool,
}

impl SqliteGraphRepository {
    /// Create a new SQLite graph repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve the graph id with a write so the transaction holds the write
    /// lock from its first statement. A deferred transaction that reads first
    /// cannot upgrade once another connection has written.
    async fn lock_graph_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        session_id: &str,
    ) -> Result<String> {
        let row: Option<(String,)> = sqlx::query_as(
            "UPDATE knowledge_graphs SET updated_at = ? WHERE session_id = ? RETURNING id",
        )
        .bind(timestamp::encode(&Utc::now()))
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|(id,)| id)
            .ok_or_else(|| Error::not_found("graph", session_id))
    }

    /// Delete the current node/edge set and insert `contents`
    async fn write_contents(
        tx: &mut Transaction<'_, Sqlite>,
        graph_id: &str,
        contents: &GraphContents,
    ) -> Result<GraphCounts> {
        sqlx::query("DELETE FROM graph_edges WHERE graph_id = ?")
            .bind(graph_id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM graph_nodes WHERE graph_id = ?")
            .bind(graph_id)
            .execute(&mut **tx)
            .await?;

        let mut node_ids = HashSet::with_capacity(contents.nodes.len());
        for node in &contents.nodes {
            let properties = serde_json::to_string(&node.properties)?;
            sqlx::query(
                r#"
                INSERT INTO graph_nodes (id, graph_id, node_type, label, description, properties)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&node.id)
            .bind(graph_id)
            .bind(node.node_type.as_str())
            .bind(&node.label)
            .bind(&node.description)
            .bind(&properties)
            .execute(&mut **tx)
            .await?;
            node_ids.insert(node.id.as_str());
        }

        let mut counts = GraphCounts {
            node_count: node_ids.len() as u32,
            ..Default::default()
        };

        for edge in &contents.edges {
            if !node_ids.contains(edge.source_id.as_str())
                || !node_ids.contains(edge.target_id.as_str())
            {
                warn!(
                    graph_id = %graph_id,
                    source_id = %edge.source_id,
                    target_id = %edge.target_id,
                    relation = %edge.relation,
                    "Dropping edge with unresolved endpoint"
                );
                counts.dropped_edges += 1;
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO graph_edges (id, graph_id, source_id, target_id, relation, label)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&edge.id)
            .bind(graph_id)
            .bind(&edge.source_id)
            .bind(&edge.target_id)
            .bind(&edge.relation)
            .bind(&edge.label)
            .execute(&mut **tx)
            .await?;
            counts.edge_count += 1;
        }

        Ok(counts)
    }

    /// Recompute the derived counts from the live rows
    async fn refresh_counts(tx: &mut Transaction<'_, Sqlite>, graph_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE knowledge_graphs SET
                node_count = (SELECT COUNT(*) FROM graph_nodes WHERE graph_id = ?),
                edge_count = (SELECT COUNT(*) FROM graph_edges WHERE graph_id = ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(graph_id)
        .bind(graph_id)
        .bind(timestamp::encode(&Utc::now()))
        .bind(graph_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GraphRepository for SqliteGraphRepository {
    // ========== Graph Operations ==========

    async fn get_graph(&self, session_id: &str) -> Result<Option<Graph>> {
        let row: Option<GraphRow> =
            sqlx::query_as("SELECT * FROM knowledge_graphs WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.into_graph()).transpose()
    }

    async fn get_graph_by_id(&self, graph_id: &str) -> Result<Option<Graph>> {
        let row: Option<GraphRow> = sqlx::query_as("SELECT * FROM knowledge_graphs WHERE id = ?")
            .bind(graph_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_graph()).transpose()
    }

    async fn upsert_graph_shell(&self, session_id: &str, status: GraphStatus) -> Result<Graph> {
        let now = timestamp::encode(&Utc::now());

        sqlx::query(
            r#"
            INSERT INTO knowledge_graphs (id, session_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(status.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(session_id = %session_id, status = %status, "Graph shell upserted");

        self.get_graph(session_id)
            .await?
            .ok_or_else(|| Error::not_found("graph", session_id))
    }

    async fn try_begin_build(
        &self,
        session_id: &str,
        stale_before: DateTime<Utc>,
    ) -> Result<bool> {
        let now = timestamp::encode(&Utc::now());

        // A conditional upsert: the UPDATE branch only fires when no other
        // build holds the flag, so exactly one concurrent caller sees a row change.
        let result = sqlx::query(
            r#"
            INSERT INTO knowledge_graphs (id, session_id, status, created_at, updated_at)
            VALUES (?, ?, 'BUILDING', ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                status = 'BUILDING',
                error_message = NULL,
                updated_at = excluded.updated_at
            WHERE knowledge_graphs.status != 'BUILDING'
               OR knowledge_graphs.updated_at < ?
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(&now)
        .bind(&now)
        .bind(timestamp::encode(&stale_before))
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        debug!(session_id = %session_id, claimed, "Build claim attempted");
        Ok(claimed)
    }

    async fn replace_nodes_and_edges(
        &self,
        session_id: &str,
        contents: &GraphContents,
    ) -> Result<GraphCounts> {
        let mut tx = self.pool.begin().await?;
        let graph_id = Self::lock_graph_in_tx(&mut tx, session_id).await?;

        let counts = Self::write_contents(&mut tx, &graph_id, contents).await?;
        Self::refresh_counts(&mut tx, &graph_id).await?;

        tx.commit().await?;

        info!(
            session_id = %session_id,
            node_count = counts.node_count,
            edge_count = counts.edge_count,
            dropped_edges = counts.dropped_edges,
            "Graph contents replaced"
        );
        Ok(counts)
    }

    async fn complete_build(
        &self,
        session_id: &str,
        summary: &str,
        contents: &GraphContents,
    ) -> Result<GraphCounts> {
        let mut tx = self.pool.begin().await?;
        let graph_id = Self::lock_graph_in_tx(&mut tx, session_id).await?;

        let counts = Self::write_contents(&mut tx, &graph_id, contents).await?;

        let now = timestamp::encode(&Utc::now());
        sqlx::query(
            r#"
            UPDATE knowledge_graphs SET
                status = 'READY',
                summary = ?,
                node_count = ?,
                edge_count = ?,
                last_built_at = ?,
                error_message = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(summary)
        .bind(counts.node_count)
        .bind(counts.edge_count)
        .bind(&now)
        .bind(&now)
        .bind(&graph_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            session_id = %session_id,
            node_count = counts.node_count,
            edge_count = counts.edge_count,
            "Graph build completed"
        );
        Ok(counts)
    }

    async fn mark_failed(&self, session_id: &str, message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE knowledge_graphs SET
                status = 'ERROR',
                error_message = ?,
                updated_at = ?
            WHERE session_id = ?
            "#,
        )
        .bind(message)
        .bind(timestamp::encode(&Utc::now()))
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        warn!(session_id = %session_id, error = %message, "Graph marked as failed");
        Ok(())
    }

    async fn delete_graph(&self, session_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let graph_id = match Self::lock_graph_in_tx(&mut tx, session_id).await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };

        for statement in [
            "DELETE FROM graph_comments WHERE graph_id = ?",
            "DELETE FROM graph_shares WHERE graph_id = ?",
            "DELETE FROM graph_edges WHERE graph_id = ?",
            "DELETE FROM graph_nodes WHERE graph_id = ?",
            "DELETE FROM knowledge_graphs WHERE id = ?",
        ] {
            sqlx::query(statement)
                .bind(&graph_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(session_id = %session_id, graph_id = %graph_id, "Graph deleted");
        Ok(true)
    }

    // ========== Node Operations ==========

    async fn list_nodes(&self, session_id: &str) -> Result<Vec<Node>> {
        let rows: Vec<NodeRow> = sqlx::query_as(
            r#"
            SELECT n.* FROM graph_nodes n
            JOIN knowledge_graphs g ON g.id = n.graph_id
            WHERE g.session_id = ?
            ORDER BY n.rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_node()).collect()
    }

    async fn get_node(&self, graph_id: &str, node_id: &str) -> Result<Option<Node>> {
        let row: Option<NodeRow> =
            sqlx::query_as("SELECT * FROM graph_nodes WHERE id = ? AND graph_id = ?")
                .bind(node_id)
                .bind(graph_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.into_node()).transpose()
    }

    async fn update_node(
        &self,
        graph_id: &str,
        node_id: &str,
        patch: &NodePatch,
    ) -> Result<Option<Node>> {
        let properties = patch
            .properties
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // Absent patch fields keep the stored column, so concurrent patches
        // touching different fields both survive.
        let mut tx = self.pool.begin().await?;
        let row: Option<NodeRow> = sqlx::query_as(
            r#"
            UPDATE graph_nodes SET
                node_type = COALESCE(?, node_type),
                label = COALESCE(?, label),
                description = COALESCE(?, description),
                properties = COALESCE(?, properties)
            WHERE id = ? AND graph_id = ?
            RETURNING *
            "#,
        )
        .bind(patch.node_type.map(|t| t.as_str()))
        .bind(patch.label.as_deref())
        .bind(patch.description.as_deref())
        .bind(properties.as_deref())
        .bind(node_id)
        .bind(graph_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            debug!(graph_id = %graph_id, node_id = %node_id, "Node to update not found");
            return Ok(None);
        };

        sqlx::query("UPDATE knowledge_graphs SET updated_at = ? WHERE id = ?")
            .bind(timestamp::encode(&Utc::now()))
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(graph_id = %graph_id, node_id = %node_id, "Node updated");
        row.into_node().map(Some)
    }

    async fn update_positions(
        &self,
        graph_id: &str,
        positions: &[(String, Position)],
    ) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for (node_id, position) in positions {
            let result = sqlx::query(
                "UPDATE graph_nodes SET position_x = ?, position_y = ? WHERE id = ? AND graph_id = ?",
            )
            .bind(position.x)
            .bind(position.y)
            .bind(node_id)
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;

        debug!(graph_id = %graph_id, requested = positions.len(), updated, "Node positions saved");
        Ok(updated)
    }

    async fn delete_node(&self, graph_id: &str, node_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let edges = sqlx::query(
            "DELETE FROM graph_edges WHERE graph_id = ? AND (source_id = ? OR target_id = ?)",
        )
        .bind(graph_id)
        .bind(node_id)
        .bind(node_id)
        .execute(&mut *tx)
        .await?;

        let nodes = sqlx::query("DELETE FROM graph_nodes WHERE id = ? AND graph_id = ?")
            .bind(node_id)
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;

        if nodes.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::refresh_counts(&mut tx, graph_id).await?;
        tx.commit().await?;

        info!(
            graph_id = %graph_id,
            node_id = %node_id,
            edges_removed = edges.rows_affected(),
            "Node deleted"
        );
        Ok(true)
    }

    // ========== Edge Operations ==========

    async fn list_edges(&self, session_id: &str) -> Result<Vec<Edge>> {
        let rows: Vec<EdgeRow> = sqlx::query_as(
            r#"
            SELECT e.* FROM graph_edges e
            JOIN knowledge_graphs g ON g.id = e.graph_id
            WHERE g.session_id = ?
            ORDER BY e.rowid
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_edge()).collect())
    }

    async fn get_edge(&self, graph_id: &str, edge_id: &str) -> Result<Option<Edge>> {
        let row: Option<EdgeRow> =
            sqlx::query_as("SELECT * FROM graph_edges WHERE id = ? AND graph_id = ?")
                .bind(edge_id)
                .bind(graph_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.into_edge()))
    }

    async fn delete_edge(&self, graph_id: &str, edge_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM graph_edges WHERE id = ? AND graph_id = ?")
            .bind(edge_id)
            .bind(graph_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::refresh_counts(&mut tx, graph_id).await?;
        tx.commit().await?;

        info!(graph_id = %graph_id, edge_id = %edge_id, "Edge deleted");
        Ok(true)
    }
}

// ========== Row Types ==========

#[derive(Debug, FromRow)]
struct GraphRow {
    id: String,
    session_id: String,
    status: String,
    summary: Option<String>,
    node_count: i64,
    edge_count: i64,
    last_built_at: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl GraphRow {
    fn into_graph(self) -> Result<Graph> {
        let status = GraphStatus::parse(&self.status)
            .ok_or_else(|| Error::Other(format!("Invalid graph status: {}", self.status)))?;

        Ok(Graph {
            id: self.id,
            session_id: self.session_id,
            status,
            summary: self.summary,
            node_count: self.node_count as u32,
            edge_count: self.edge_count as u32,
            last_built_at: timestamp::decode_opt(self.last_built_at.as_deref())?,
            error_message: self.error_message,
            created_at: timestamp::decode(&self.created_at)?,
            updated_at: timestamp::decode(&self.updated_at)?,
        })
    }
}

#[derive(Debug, FromRow)]
struct NodeRow {
    id: String,
    graph_id: String,
    node_type: String,
    label: String,
    description: Option<String>,
    properties: String,
    position_x: Option<f64>,
    position_y: Option<f64>,
}

impl NodeRow {
    fn into_node(self) -> Result<Node> {
        let node_type = NodeType::parse(&self.node_type)
            .ok_or_else(|| Error::Other(format!("Invalid node type: {}", self.node_type)))?;

        let properties = serde_json::from_str(&self.properties).unwrap_or_default();

        let position = match (self.position_x, self.position_y) {
            (Some(x), Some(y)) => Some(Position { x, y }),
            _ => None,
        };

        Ok(Node {
            id: self.id,
            graph_id: self.graph_id,
            node_type,
            label: self.label,
            description: self.description,
            properties,
            position,
        })
    }
}

#[derive(Debug, FromRow)]
struct EdgeRow {
    id: String,
    graph_id: String,
    source_id: String,
    target_id: String,
    relation: String,
    label: String,
}

impl EdgeRow {
    fn into_edge(self) -> Edge {
        Edge {
            id: self.id,
            graph_id: self.graph_id,
            source_id: self.source_id,
            target_id: self.target_id,
            relation: self.relation,
            label: self.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::{NewEdge, NewNode};
    use crate::storage::Database;
    use chrono::Duration;
    use serde_json::json;

    async fn setup_test_db() -> SqliteGraphRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        SqliteGraphRepository::new(db.pool().clone())
    }

    fn sample_contents() -> GraphContents {
        let x = NewNode::new(NodeType::Person, "X");
        let y = NewNode::new(NodeType::Person, "Y");
        let law = NewNode::new(NodeType::LawReference, "Section 420");
        let edges = vec![
            NewEdge::new(&x.id, &y.id, "SUED"),
            NewEdge::new(&x.id, &law.id, "CITES"),
        ];
        GraphContents {
            nodes: vec![x, y, law],
            edges,
        }
    }

    #[tokio::test]
    async fn test_upsert_graph_shell() {
        let repo = setup_test_db().await;

        let graph = repo
            .upsert_graph_shell("s1", GraphStatus::NotBuilt)
            .await
            .unwrap();
        assert_eq!(graph.status, GraphStatus::NotBuilt);
        assert_eq!(graph.node_count, 0);

        let again = repo.upsert_graph_shell("s1", GraphStatus::Error).await.unwrap();
        assert_eq!(again.id, graph.id);
        assert_eq!(again.status, GraphStatus::Error);
    }

    #[tokio::test]
    async fn test_replace_unknown_session_is_not_found() {
        let repo = setup_test_db().await;
        let err = repo
            .replace_nodes_and_edges("missing", &sample_contents())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_replace_counts_match_rows() {
        let repo = setup_test_db().await;
        repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();

        let counts = repo
            .replace_nodes_and_edges("s1", &sample_contents())
            .await
            .unwrap();
        assert_eq!(counts.node_count, 3);
        assert_eq!(counts.edge_count, 2);

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.node_count as usize, repo.list_nodes("s1").await.unwrap().len());
        assert_eq!(graph.edge_count as usize, repo.list_edges("s1").await.unwrap().len());
    }

    #[tokio::test]
    async fn test_replace_drops_dangling_edges() {
        let repo = setup_test_db().await;
        repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();

        let mut contents = sample_contents();
        let x = contents.nodes[0].id.clone();
        contents.edges.push(NewEdge::new(&x, "not-a-node", "KNOWS"));

        let counts = repo.replace_nodes_and_edges("s1", &contents).await.unwrap();
        assert_eq!(counts.edge_count, 2);
        assert_eq!(counts.dropped_edges, 1);

        let node_ids: HashSet<String> = repo
            .list_nodes("s1")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        for edge in repo.list_edges("s1").await.unwrap() {
            assert!(node_ids.contains(&edge.source_id));
            assert!(node_ids.contains(&edge.target_id));
        }
    }

    #[tokio::test]
    async fn test_rebuild_leaves_no_residue() {
        let repo = setup_test_db().await;
        repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        repo.complete_build("s1", "first", &sample_contents()).await.unwrap();

        let a = NewNode::new(NodeType::Concept, "Negligence");
        let second = GraphContents {
            nodes: vec![a],
            edges: vec![],
        };
        repo.complete_build("s1", "second", &second).await.unwrap();

        let nodes = repo.list_nodes("s1").await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].label, "Negligence");
        assert!(repo.list_edges("s1").await.unwrap().is_empty());

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.status, GraphStatus::Ready);
        assert_eq!(graph.summary.as_deref(), Some("second"));
        assert_eq!((graph.node_count, graph.edge_count), (1, 0));
        assert!(graph.last_built_at.is_some());
    }

    #[tokio::test]
    async fn test_try_begin_build_is_exclusive() {
        let repo = setup_test_db().await;
        let stale_before = Utc::now() - Duration::minutes(15);

        assert!(repo.try_begin_build("s1", stale_before).await.unwrap());
        assert!(!repo.try_begin_build("s1", stale_before).await.unwrap());

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.status, GraphStatus::Building);

        repo.complete_build("s1", "done", &GraphContents::default())
            .await
            .unwrap();
        assert!(repo.try_begin_build("s1", stale_before).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_build_can_be_taken_over() {
        let repo = setup_test_db().await;
        assert!(repo
            .try_begin_build("s1", Utc::now() - Duration::minutes(15))
            .await
            .unwrap());

        // Any flag written before "the future" is stale
        let future = Utc::now() + Duration::seconds(5);
        assert!(repo.try_begin_build("s1", future).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_failed_clears_on_next_claim() {
        let repo = setup_test_db().await;
        repo.try_begin_build("s1", Utc::now()).await.unwrap();
        repo.mark_failed("s1", "extraction timed out").await.unwrap();

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!(graph.status, GraphStatus::Error);
        assert_eq!(graph.error_message.as_deref(), Some("extraction timed out"));

        assert!(repo.try_begin_build("s1", Utc::now()).await.unwrap());
        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert!(graph.error_message.is_none());
    }

    #[tokio::test]
    async fn test_delete_node_cascades_edges() {
        let repo = setup_test_db().await;
        let graph = repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        let contents = sample_contents();
        let y = contents.nodes[1].id.clone();
        repo.replace_nodes_and_edges("s1", &contents).await.unwrap();

        assert!(repo.delete_node(&graph.id, &y).await.unwrap());

        let edges = repo.list_edges("s1").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert!(edges.iter().all(|e| e.source_id != y && e.target_id != y));

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!((graph.node_count, graph.edge_count), (2, 1));

        assert!(!repo.delete_node(&graph.id, &y).await.unwrap());
    }

    #[tokio::test]
    async fn test_node_operations_are_graph_scoped() {
        let repo = setup_test_db().await;
        repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        let other = repo.upsert_graph_shell("s2", GraphStatus::NotBuilt).await.unwrap();
        let contents = sample_contents();
        let x = contents.nodes[0].id.clone();
        repo.replace_nodes_and_edges("s1", &contents).await.unwrap();

        assert!(repo.get_node(&other.id, &x).await.unwrap().is_none());
        assert!(!repo.delete_node(&other.id, &x).await.unwrap());
        let patch = NodePatch {
            label: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(repo.update_node(&other.id, &x, &patch).await.unwrap().is_none());
        assert_eq!(repo.list_nodes("s1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_node_and_positions() {
        let repo = setup_test_db().await;
        let graph = repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        let contents = sample_contents();
        let y = contents.nodes[1].id.clone();
        repo.replace_nodes_and_edges("s1", &contents).await.unwrap();

        let patch = NodePatch::from_value(&json!({"label": "Y Corp", "type": "ORGANIZATION"}))
            .unwrap();
        let node = repo.update_node(&graph.id, &y, &patch).await.unwrap().unwrap();
        assert_eq!(node.label, "Y Corp");
        assert_eq!(node.node_type, NodeType::Organization);

        let updated = repo
            .update_positions(
                &graph.id,
                &[
                    (y.clone(), Position { x: 10.0, y: -4.5 }),
                    ("unknown".to_string(), Position { x: 0.0, y: 0.0 }),
                ],
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let node = repo.get_node(&graph.id, &y).await.unwrap().unwrap();
        assert_eq!(node.position, Some(Position { x: 10.0, y: -4.5 }));
    }

    #[tokio::test]
    async fn test_update_node_keeps_fields_absent_from_patch() {
        let repo = setup_test_db().await;
        let graph = repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        let mut contents = sample_contents();
        contents.nodes[1].description = Some("defendant".into());
        let y = contents.nodes[1].id.clone();
        repo.replace_nodes_and_edges("s1", &contents).await.unwrap();

        // Two patches on disjoint fields, as two reviewers would send them
        let label = NodePatch::from_value(&json!({"label": "Y Corp"})).unwrap();
        let node_type = NodePatch::from_value(&json!({"type": "ORGANIZATION"})).unwrap();
        repo.update_node(&graph.id, &y, &label).await.unwrap().unwrap();
        let node = repo.update_node(&graph.id, &y, &node_type).await.unwrap().unwrap();

        assert_eq!(node.label, "Y Corp");
        assert_eq!(node.node_type, NodeType::Organization);
        assert_eq!(node.description.as_deref(), Some("defendant"));
        assert_eq!(repo.get_node(&graph.id, &y).await.unwrap().unwrap(), node);
    }

    #[tokio::test]
    async fn test_update_deleted_node_returns_none() {
        let repo = setup_test_db().await;
        let graph = repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        let contents = sample_contents();
        let y = contents.nodes[1].id.clone();
        repo.replace_nodes_and_edges("s1", &contents).await.unwrap();
        assert!(repo.delete_node(&graph.id, &y).await.unwrap());

        let patch = NodePatch::from_value(&json!({"label": "Y Corp"})).unwrap();
        assert!(repo.update_node(&graph.id, &y, &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_edge_refreshes_counts() {
        let repo = setup_test_db().await;
        let graph = repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        repo.replace_nodes_and_edges("s1", &sample_contents()).await.unwrap();

        let edge = repo.list_edges("s1").await.unwrap().remove(0);
        assert!(repo.delete_edge(&graph.id, &edge.id).await.unwrap());
        assert!(!repo.delete_edge(&graph.id, &edge.id).await.unwrap());

        let graph = repo.get_graph("s1").await.unwrap().unwrap();
        assert_eq!((graph.node_count, graph.edge_count), (3, 1));
    }

    #[tokio::test]
    async fn test_delete_graph_cascades() {
        let repo = setup_test_db().await;
        repo.upsert_graph_shell("s1", GraphStatus::NotBuilt).await.unwrap();
        repo.replace_nodes_and_edges("s1", &sample_contents()).await.unwrap();

        assert!(repo.delete_graph("s1").await.unwrap());
        assert!(repo.get_graph("s1").await.unwrap().is_none());
        assert!(repo.list_nodes("s1").await.unwrap().is_empty());

        let (orphans,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_edges")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(!repo.delete_graph("s1").await.unwrap());
    }
}
