//! Shared fixtures for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::access::AccessResolver;
use crate::domain::build::{ExtractionClient, ExtractionRequest, ExtractionResponse};
use crate::error::{Error, Result};
use crate::infrastructure::access::SqliteShareRepository;
use crate::infrastructure::comments::SqliteCommentRepository;
use crate::infrastructure::feedback::SqliteFeedbackRepository;
use crate::infrastructure::graph::SqliteGraphRepository;
use crate::infrastructure::metrics::SqliteMetricsRepository;
use crate::infrastructure::sessions::SqliteSessionSource;
use crate::storage::{Database, timestamp};

/// An in-memory database with every repository wired to it
pub struct TestContext {
    pub db: Database,
    pub graphs: Arc<SqliteGraphRepository>,
    pub shares: Arc<SqliteShareRepository>,
    pub sessions: Arc<SqliteSessionSource>,
    pub feedback: Arc<SqliteFeedbackRepository>,
    pub metrics: Arc<SqliteMetricsRepository>,
    pub comments: Arc<SqliteCommentRepository>,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let pool = db.pool().clone();
        Self {
            graphs: Arc::new(SqliteGraphRepository::new(pool.clone())),
            shares: Arc::new(SqliteShareRepository::new(pool.clone())),
            sessions: Arc::new(SqliteSessionSource::new(pool.clone())),
            feedback: Arc::new(SqliteFeedbackRepository::new(pool.clone())),
            metrics: Arc::new(SqliteMetricsRepository::new(pool.clone())),
            comments: Arc::new(SqliteCommentRepository::new(pool)),
            db,
        }
    }

    pub fn access_resolver(&self) -> AccessResolver {
        AccessResolver::new(self.graphs.clone(), self.shares.clone(), self.sessions.clone())
    }

    pub async fn seed_session(&self, session_id: &str, owner: Option<&str>) {
        let now = timestamp::encode(&Utc::now());
        sqlx::query(
            "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(owner)
        .bind(format!("Session {}", session_id))
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await
        .expect("Failed to seed session");
    }

    pub async fn seed_message(&self, session_id: &str, role: &str, content: &str) {
        sqlx::query(
            "INSERT INTO chat_messages (session_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(role)
        .bind(content)
        .bind(timestamp::encode(&Utc::now()))
        .execute(self.db.pool())
        .await
        .expect("Failed to seed message");
    }

    pub async fn seed_note(&self, session_id: &str, title: &str, content: &str) {
        let now = timestamp::encode(&Utc::now());
        sqlx::query(
            "INSERT INTO notes (id, session_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(title)
        .bind(content)
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await
        .expect("Failed to seed note");
    }

    pub async fn seed_file(&self, session_id: &str, name: &str, extracted_text: Option<&str>) {
        sqlx::query(
            "INSERT INTO session_files (id, session_id, name, extracted_text, uploaded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(name)
        .bind(extracted_text)
        .bind(timestamp::encode(&Utc::now()))
        .execute(self.db.pool())
        .await
        .expect("Failed to seed file");
    }
}

/// Extraction client that replays a fixed list of outcomes
pub struct ScriptedExtractor {
    outcomes: Mutex<VecDeque<Result<ExtractionResponse>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ExtractionRequest>>,
}

impl ScriptedExtractor {
    pub fn new(outcomes: Vec<Result<ExtractionResponse>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ExtractionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionClient for ScriptedExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(Error::ExtractionFailed("no scripted response left".into())))
    }
}
