//! Database migrations
//!
//! This module manages SQLite schema migrations for lexgraph.
//! Migrations are versioned and applied automatically on database connection.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 4;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Session source tables
///
/// These belong to the surrounding chat product. They are created only when
/// absent so lexgraph can run standalone against an empty database.
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_sessions (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT,
        title TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_sessions_user_id ON chat_sessions(user_id);

    CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chat_messages_session_id ON chat_messages(session_id);

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(session_id, title)
    );

    CREATE TABLE IF NOT EXISTS session_files (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        extracted_text TEXT,
        uploaded_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_session_files_session_id ON session_files(session_id);
"#;

/// Migration 2: Graph store
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS knowledge_graphs (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'NOT_BUILT'
            CHECK (status IN ('NOT_BUILT', 'BUILDING', 'READY', 'ERROR')),
        summary TEXT,
        node_count INTEGER NOT NULL DEFAULT 0,
        edge_count INTEGER NOT NULL DEFAULT 0,
        last_built_at TEXT,
        error_message TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS graph_nodes (
        id TEXT PRIMARY KEY NOT NULL,
        graph_id TEXT NOT NULL REFERENCES knowledge_graphs(id) ON DELETE CASCADE,
        node_type TEXT NOT NULL,
        label TEXT NOT NULL,
        description TEXT,
        properties TEXT NOT NULL DEFAULT '{}',
        position_x REAL,
        position_y REAL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_nodes_graph_id ON graph_nodes(graph_id);

    -- Edge endpoints cascade so a deleted node can never leave a dangling edge
    CREATE TABLE IF NOT EXISTS graph_edges (
        id TEXT PRIMARY KEY NOT NULL,
        graph_id TEXT NOT NULL REFERENCES knowledge_graphs(id) ON DELETE CASCADE,
        source_id TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        target_id TEXT NOT NULL REFERENCES graph_nodes(id) ON DELETE CASCADE,
        relation TEXT NOT NULL,
        label TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_edges_graph_id ON graph_edges(graph_id);
    CREATE INDEX IF NOT EXISTS idx_graph_edges_source_id ON graph_edges(source_id);
    CREATE INDEX IF NOT EXISTS idx_graph_edges_target_id ON graph_edges(target_id);
"#;

/// Migration 3: Sharing and comments
const MIGRATION_V3: &str = r#"
    CREATE TABLE IF NOT EXISTS graph_shares (
        id TEXT PRIMARY KEY NOT NULL,
        graph_id TEXT NOT NULL REFERENCES knowledge_graphs(id) ON DELETE CASCADE,
        shared_with_id TEXT,
        access TEXT NOT NULL CHECK (access IN ('VIEW', 'COMMENT', 'EDIT')),
        token TEXT NOT NULL UNIQUE,
        expires_at TEXT,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_shares_graph_id ON graph_shares(graph_id);
    CREATE INDEX IF NOT EXISTS idx_graph_shares_shared_with ON graph_shares(graph_id, shared_with_id);

    -- node_id / edge_id are soft references: rebuilds replace node rows
    CREATE TABLE IF NOT EXISTS graph_comments (
        id TEXT PRIMARY KEY NOT NULL,
        graph_id TEXT NOT NULL REFERENCES knowledge_graphs(id) ON DELETE CASCADE,
        node_id TEXT,
        edge_id TEXT,
        parent_id TEXT REFERENCES graph_comments(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        content TEXT NOT NULL,
        resolved INTEGER NOT NULL DEFAULT 0,
        resolved_at TEXT,
        resolved_by TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_graph_comments_graph_id ON graph_comments(graph_id);
    CREATE INDEX IF NOT EXISTS idx_graph_comments_parent_id ON graph_comments(parent_id);
"#;

/// Migration 4: Feedback, daily metrics, insights
const MIGRATION_V4: &str = r#"
    -- No foreign key: feedback history outlives graph rebuilds and deletions
    CREATE TABLE IF NOT EXISTS feedback_events (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL,
        node_id TEXT,
        edge_id TEXT,
        feedback_type TEXT NOT NULL
            CHECK (feedback_type IN ('ACCEPT', 'REJECT', 'EDIT', 'DELETE_NODE', 'DELETE_EDGE', 'RATE')),
        original_value TEXT,
        corrected_value TEXT,
        rating INTEGER,
        comment TEXT,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_feedback_events_session_id ON feedback_events(session_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_feedback_events_created_at ON feedback_events(created_at);

    CREATE TABLE IF NOT EXISTS daily_feedback_metrics (
        date TEXT PRIMARY KEY NOT NULL,
        total_feedback INTEGER NOT NULL DEFAULT 0,
        accept_count INTEGER NOT NULL DEFAULT 0,
        reject_count INTEGER NOT NULL DEFAULT 0,
        edit_count INTEGER NOT NULL DEFAULT 0,
        delete_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS insights (
        id TEXT PRIMARY KEY NOT NULL,
        insight_type TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        severity TEXT NOT NULL CHECK (severity IN ('low', 'medium', 'high')),
        actionable INTEGER NOT NULL DEFAULT 1,
        resolved INTEGER NOT NULL DEFAULT 0,
        resolved_at TEXT,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_insights_resolved ON insights(resolved, created_at);
"#;

/// Get current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (i32,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version)
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Session source tables");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Graph store");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    if current_version < 3 {
        tracing::info!("Applying migration v3: Sharing and comments");
        sqlx::raw_sql(MIGRATION_V3).execute(pool).await?;
        record_migration(pool, 3).await?;
    }

    if current_version < 4 {
        tracing::info!("Applying migration v4: Feedback, metrics and insights");
        sqlx::raw_sql(MIGRATION_V4).execute(pool).await?;
        record_migration(pool, 4).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        for table in [
            "chat_sessions",
            "knowledge_graphs",
            "graph_nodes",
            "graph_edges",
            "graph_shares",
            "graph_comments",
            "feedback_events",
            "daily_feedback_metrics",
            "insights",
        ] {
            let (count,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_existing_session_tables_are_kept() {
        let pool = create_test_pool().await;
        sqlx::raw_sql(
            "CREATE TABLE chat_sessions (id TEXT PRIMARY KEY, user_id TEXT, title TEXT, \
             created_at TEXT NOT NULL, updated_at TEXT NOT NULL);
             INSERT INTO chat_sessions VALUES ('s1', 'u1', 't', 'x', 'x');",
        )
        .execute(&pool)
        .await
        .unwrap();

        run_migrations(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
