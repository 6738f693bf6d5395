//! Build orchestration
//!
//! Drives `NOT_BUILT -> BUILDING -> READY | ERROR` for one session:
//! 1. Claim the BUILDING flag with a single conditional write
//! 2. Gather session content
//! 3. Call the extractor under a timeout
//! 4. Resolve edge endpoints to node ids
//! 5. Replace nodes/edges and transition to READY in one transaction
//!
//! Any failure after the claim lands the graph in ERROR and is reported in the
//! returned [`BuildReport`] rather than as an `Err`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::access::{AccessResolver, Action};
use crate::domain::graph::{Graph, GraphContents, GraphRepository};
use crate::domain::session::SessionSource;
use crate::error::{Error, Result};

use super::extraction::{ExtractionClient, ExtractionRequest};
use super::resolve::resolve;

/// Sessions with less combined text than this are not sent to the extractor
pub const MIN_CONTENT_CHARS: usize = 50;

/// Summary recorded for sessions too small to extract from
pub const NOT_ENOUGH_CONTENT_SUMMARY: &str = "Not enough content to build a knowledge graph.";

/// Summary recorded when the extractor returns none
pub const DEFAULT_SUMMARY: &str = "Knowledge graph generated from session data.";

/// Timing knobs for builds
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Upper bound on one extractor call
    pub extraction_timeout: Duration,
    /// A BUILDING flag untouched for this long is considered abandoned
    pub stale_after: Duration,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            extraction_timeout: Duration::from_secs(120),
            stale_after: Duration::from_secs(900),
        }
    }
}

/// How a build request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BuildOutcome {
    Completed,
    /// Another build holds the flag; poll and retry later
    AlreadyBuilding,
    Failed { message: String },
}

/// Result of a build request
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub graph: Graph,
    pub outcome: BuildOutcome,
    /// Edges discarded because an endpoint did not resolve
    pub dropped_edges: u32,
    /// Node specs discarded for unknown type or blank label
    pub skipped_nodes: u32,
}

#[derive(Debug, Default)]
struct BuildStats {
    dropped_edges: u32,
    skipped_nodes: u32,
}

pub struct BuildOrchestrator {
    graphs: Arc<dyn GraphRepository>,
    sessions: Arc<dyn SessionSource>,
    extractor: Arc<dyn ExtractionClient>,
    access: Arc<AccessResolver>,
    settings: BuildSettings,
}

impl BuildOrchestrator {
    pub fn new(
        graphs: Arc<dyn GraphRepository>,
        sessions: Arc<dyn SessionSource>,
        extractor: Arc<dyn ExtractionClient>,
        access: Arc<AccessResolver>,
    ) -> Self {
        Self {
            graphs,
            sessions,
            extractor,
            access,
            settings: BuildSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build or rebuild a session's graph on behalf of `actor_id`.
    ///
    /// Requires ownership or an EDIT share. Re-running on a READY graph
    /// discards and replaces its nodes and edges.
    pub async fn build(&self, session_id: &str, actor_id: &str) -> Result<BuildReport> {
        self.access
            .authorize(session_id, actor_id, Action::MutateGraph)
            .await?;
        self.run_build(session_id).await
    }

    /// Build without an access check
    pub async fn run_build(&self, session_id: &str) -> Result<BuildReport> {
        let stale_before = Utc::now()
            - chrono::Duration::from_std(self.settings.stale_after)
                .map_err(|e| Error::ConfigError(format!("Invalid stale_after: {}", e)))?;

        if !self.graphs.try_begin_build(session_id, stale_before).await? {
            info!(session_id = %session_id, "Build already in progress");
            return Ok(BuildReport {
                graph: self.current_graph(session_id).await?,
                outcome: BuildOutcome::AlreadyBuilding,
                dropped_edges: 0,
                skipped_nodes: 0,
            });
        }

        info!(session_id = %session_id, "Graph build started");

        match self.execute(session_id).await {
            Ok(stats) => Ok(BuildReport {
                graph: self.current_graph(session_id).await?,
                outcome: BuildOutcome::Completed,
                dropped_edges: stats.dropped_edges,
                skipped_nodes: stats.skipped_nodes,
            }),
            Err(e) => {
                let message = e.to_string();
                warn!(session_id = %session_id, error = %message, "Graph build failed");
                self.graphs.mark_failed(session_id, &message).await?;
                Ok(BuildReport {
                    graph: self.current_graph(session_id).await?,
                    outcome: BuildOutcome::Failed { message },
                    dropped_edges: 0,
                    skipped_nodes: 0,
                })
            }
        }
    }

    async fn execute(&self, session_id: &str) -> Result<BuildStats> {
        let content = self.sessions.load_content(session_id).await?;

        if content.content_len() < MIN_CONTENT_CHARS {
            info!(session_id = %session_id, "Not enough content, completing with empty graph");
            self.graphs
                .complete_build(session_id, NOT_ENOUGH_CONTENT_SUMMARY, &GraphContents::default())
                .await?;
            return Ok(BuildStats::default());
        }

        let request = ExtractionRequest::new(session_id, content);
        let response = tokio::time::timeout(
            self.settings.extraction_timeout,
            self.extractor.extract(&request),
        )
        .await
        .map_err(|_| {
            Error::ExtractionFailed(format!(
                "extractor did not respond within {:?}",
                self.settings.extraction_timeout
            ))
        })??;

        let resolution = resolve(&response);
        let summary = response
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUMMARY);

        let counts = self
            .graphs
            .complete_build(session_id, summary, &resolution.contents)
            .await?;

        let stats = BuildStats {
            dropped_edges: resolution.unresolved_edges + counts.dropped_edges,
            skipped_nodes: resolution.skipped_nodes,
        };

        info!(
            session_id = %session_id,
            node_count = counts.node_count,
            edge_count = counts.edge_count,
            dropped_edges = stats.dropped_edges,
            skipped_nodes = stats.skipped_nodes,
            label_collisions = resolution.label_collisions,
            "Graph build finished"
        );
        Ok(stats)
    }

    async fn current_graph(&self, session_id: &str) -> Result<Graph> {
        self.graphs
            .get_graph(session_id)
            .await?
            .ok_or_else(|| Error::not_found("graph", session_id))
    }
}
