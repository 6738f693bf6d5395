//! SQLite-backed session source
//!
//! Reads the chat product's `chat_sessions`, `chat_messages`, `notes` and
//! `session_files` tables.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::domain::session::{
    SessionContent, SessionFile, SessionInfo, SessionMessage, SessionNote, SessionSource,
};
use crate::error::Result;

#[derive(Clone)]
pub struct SqliteSessionSource {
    pool: SqlitePool,
}

impl SqliteSessionSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionSource for SqliteSessionSource {
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT id, user_id, title FROM chat_sessions WHERE id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| SessionInfo {
            id: r.id,
            owner_id: r.user_id,
            title: r.title,
        }))
    }

    async fn load_content(&self, session_id: &str) -> Result<SessionContent> {
        let messages: Vec<MessageRow> = sqlx::query_as(
            "SELECT role, content FROM chat_messages WHERE session_id = ? ORDER BY created_at, id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let notes: Vec<NoteRow> = sqlx::query_as(
            "SELECT title, content FROM notes WHERE session_id = ? ORDER BY created_at, title",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let files: Vec<FileRow> = sqlx::query_as(
            "SELECT name, extracted_text FROM session_files WHERE session_id = ? ORDER BY uploaded_at, name",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            session_id = %session_id,
            messages = messages.len(),
            notes = notes.len(),
            files = files.len(),
            "Session content loaded"
        );

        Ok(SessionContent {
            messages: messages
                .into_iter()
                .map(|m| SessionMessage {
                    role: m.role,
                    content: m.content,
                })
                .collect(),
            notes: notes
                .into_iter()
                .map(|n| SessionNote {
                    title: n.title,
                    content: n.content,
                })
                .collect(),
            files: files
                .into_iter()
                .map(|f| SessionFile {
                    filename: f.name.clone(),
                    original_name: f.name,
                    extracted_text: f.extracted_text,
                })
                .collect(),
        })
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    user_id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, FromRow)]
struct MessageRow {
    role: String,
    content: String,
}

#[derive(Debug, FromRow)]
struct NoteRow {
    title: String,
    content: String,
}

#[derive(Debug, FromRow)]
struct FileRow {
    name: String,
    extracted_text: Option<String>,
}
