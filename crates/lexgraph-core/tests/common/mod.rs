//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use lexgraph_core::api::LexGraph;
use lexgraph_core::config::Config;
use lexgraph_core::domain::build::{
    EdgeSpec, ExtractionClient, ExtractionRequest, ExtractionResponse, NodeSpec,
};
use lexgraph_core::storage::{Database, DatabaseConfig, timestamp};
use lexgraph_core::{Error, Result};
use tempfile::TempDir;

pub const OWNER: &str = "owner";
pub const ADMIN: &str = "admin";

/// Replays queued extraction responses in order
#[derive(Default)]
pub struct QueuedExtractor {
    responses: Mutex<VecDeque<ExtractionResponse>>,
}

impl QueuedExtractor {
    pub fn new(responses: Vec<ExtractionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ExtractionClient for QueuedExtractor {
    async fn extract(&self, _request: &ExtractionRequest) -> Result<ExtractionResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::ExtractionFailed("no response queued".into()))
    }
}

/// The "X sued Y under Section 420" extraction
pub fn section_420() -> ExtractionResponse {
    ExtractionResponse {
        summary: Some("X sued Y under Section 420".into()),
        nodes: vec![
            NodeSpec::new("PERSON", "X"),
            NodeSpec::new("PERSON", "Y"),
            NodeSpec::new("LAW_REFERENCE", "Section 420"),
        ],
        edges: vec![
            EdgeSpec::new("X", "Y", "SUED"),
            EdgeSpec::new("X", "Section 420", "CITES"),
        ],
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.server.admin_user_ids = vec![ADMIN.to_string()];
    config
}

pub async fn seed_session(db: &Database, session_id: &str, owner: &str, message: &str) {
    let now = timestamp::encode(&chrono::Utc::now());
    sqlx::query(
        "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(session_id)
    .bind(owner)
    .bind(session_id)
    .bind(&now)
    .bind(&now)
    .execute(db.pool())
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO chat_messages (session_id, role, content, created_at) VALUES (?, 'user', ?, ?)",
    )
    .bind(session_id)
    .bind(message)
    .bind(&now)
    .execute(db.pool())
    .await
    .unwrap();
}

/// A service over an in-memory database
pub async fn in_memory_app(responses: Vec<ExtractionResponse>) -> LexGraph {
    let db = Database::in_memory().await.unwrap();
    LexGraph::with_extractor(db, config(), Arc::new(QueuedExtractor::new(responses)))
}

/// A service over a file database with a connection pool, for concurrency tests
pub async fn file_app(dir: &TempDir, responses: Vec<ExtractionResponse>) -> LexGraph {
    let db = Database::new(
        DatabaseConfig::with_path(dir.path().join("lexgraph.db")).max_connections(5),
    )
    .await
    .unwrap();
    LexGraph::with_extractor(db, config(), Arc::new(QueuedExtractor::new(responses)))
}

/// Padding that keeps a session above the minimum content size
pub const CASE_TEXT: &str =
    "X sued Y under Section 420, alleging that Y cheated X out of the sale proceeds.";
