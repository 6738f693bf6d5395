//! Service API
//!
//! [`LexGraph`] wires every repository and service to one database and
//! exposes actor-scoped operations that return serializable DTOs. The HTTP
//! server is a thin layer over this module.

pub mod comments;
pub mod feedback;
pub mod graph;
pub mod health;
pub mod learning;
pub mod shares;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::domain::access::{AccessResolver, ShareService};
use crate::domain::build::{BuildOrchestrator, BuildSettings, ExtractionClient};
use crate::domain::comments::CommentService;
use crate::domain::feedback::FeedbackService;
use crate::domain::graph::GraphRepository;
use crate::domain::metrics::MetricsAggregator;
use crate::error::{Error, Result};
use crate::infrastructure::access::SqliteShareRepository;
use crate::infrastructure::comments::SqliteCommentRepository;
use crate::infrastructure::extraction::HttpExtractionClient;
use crate::infrastructure::feedback::SqliteFeedbackRepository;
use crate::infrastructure::graph::SqliteGraphRepository;
use crate::infrastructure::metrics::SqliteMetricsRepository;
use crate::infrastructure::sessions::SqliteSessionSource;
use crate::storage::{Database, DatabaseConfig};

pub use comments::{CommentDto, CommentRequest, CommentUpdate};
pub use feedback::{FeedbackDto, FeedbackRequest};
pub use graph::{BuildResult, EdgeDto, GraphView, LayoutResult, NodeDto, PositionUpdate};
pub use health::HealthReport;
pub use shares::{ShareDto, ShareRequestDto};

/// The assembled knowledge-graph service
pub struct LexGraph {
    db: Database,
    config: Config,
    graphs: Arc<dyn GraphRepository>,
    access: Arc<AccessResolver>,
    builder: BuildOrchestrator,
    shares: ShareService,
    feedback: FeedbackService,
    metrics: Arc<MetricsAggregator>,
    comments: CommentService,
}

impl LexGraph {
    /// Open the configured database and connect to the extraction service
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(DatabaseConfig::from_config(&config)?)
            .await
            .context("Failed to open database")?;
        let extractor = HttpExtractionClient::from_config(&config.extraction)
            .context("Failed to create extraction client")?;

        info!(
            database = %db.path().display(),
            extraction_url = %config.extraction.base_url,
            "Lexgraph opened"
        );
        Ok(Self::with_extractor(db, config, Arc::new(extractor)))
    }

    /// Assemble services over an existing database and extractor
    pub fn with_extractor(
        db: Database,
        config: Config,
        extractor: Arc<dyn ExtractionClient>,
    ) -> Self {
        let pool = db.pool().clone();
        let graphs: Arc<dyn GraphRepository> = Arc::new(SqliteGraphRepository::new(pool.clone()));
        let share_repo = Arc::new(SqliteShareRepository::new(pool.clone()));
        let sessions = Arc::new(SqliteSessionSource::new(pool.clone()));
        let feedback_repo = Arc::new(SqliteFeedbackRepository::new(pool.clone()));
        let metrics_repo = Arc::new(SqliteMetricsRepository::new(pool.clone()));
        let comment_repo = Arc::new(SqliteCommentRepository::new(pool));

        let access = Arc::new(AccessResolver::new(
            graphs.clone(),
            share_repo.clone(),
            sessions.clone(),
        ));

        let builder = BuildOrchestrator::new(graphs.clone(), sessions, extractor, access.clone())
            .with_settings(BuildSettings {
                extraction_timeout: Duration::from_secs(config.extraction.timeout_secs),
                stale_after: Duration::from_secs(config.build.stale_after_secs),
            });

        let shares = ShareService::new(
            share_repo,
            access.clone(),
            config.sharing.link_base_url.clone(),
            config.sharing.token_bytes,
        );
        let metrics = Arc::new(MetricsAggregator::new(
            metrics_repo,
            feedback_repo.clone(),
            config.learning.clone(),
        ));
        let feedback = FeedbackService::new(
            feedback_repo,
            graphs.clone(),
            metrics.clone(),
            access.clone(),
        );
        let comments = CommentService::new(comment_repo, graphs.clone(), access.clone());

        Self {
            db,
            config,
            graphs,
            access,
            builder,
            shares,
            feedback,
            metrics,
            comments,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Whether `actor_id` may use the learning and insight endpoints
    pub fn is_admin(&self, actor_id: &str) -> bool {
        self.config
            .server
            .admin_user_ids
            .iter()
            .any(|id| id == actor_id)
    }

    fn require_admin(&self, actor_id: &str) -> Result<()> {
        if self.is_admin(actor_id) {
            Ok(())
        } else {
            Err(Error::denied("Admin access required"))
        }
    }
}
