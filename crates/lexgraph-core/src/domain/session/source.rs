//! Read-only view of the chat product's sessions
//!
//! Sessions, messages, notes and uploaded files are owned by the surrounding
//! product. Lexgraph only reads them: ownership for access checks, and text
//! blocks to feed the extraction collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Assistant replies are clipped before they count toward build content
const ASSISTANT_EXCERPT_CHARS: usize = 500;

/// Per-file clip applied to extracted document text
const FILE_EXCERPT_CHARS: usize = 3000;

/// Session identity and ownership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    /// `None` for anonymous sessions; nobody owns those graphs
    pub owner_id: Option<String>,
    pub title: Option<String>,
}

impl SessionInfo {
    pub fn is_owned_by(&self, actor_id: &str) -> bool {
        self.owner_id.as_deref() == Some(actor_id)
    }
}

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub content: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNote {
    pub title: String,
    pub content: String,
}

/// An uploaded document with its extracted text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub filename: String,
    pub original_name: String,
    pub extracted_text: Option<String>,
}

/// Everything a build sends to the extraction collaborator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContent {
    pub messages: Vec<SessionMessage>,
    pub notes: Vec<SessionNote>,
    pub files: Vec<SessionFile>,
}

impl SessionContent {
    /// Text blocks in the order the extractor reads them.
    ///
    /// Only user and assistant messages count; assistant replies and file
    /// text are clipped.
    pub fn text_blocks(&self) -> Vec<String> {
        let mut blocks = Vec::new();

        for message in &self.messages {
            if message.content.is_empty() {
                continue;
            }
            match message.role.as_str() {
                "user" => blocks.push(format!("[User Message] {}", message.content)),
                "assistant" => blocks.push(format!(
                    "[AI Response] {}",
                    clip(&message.content, ASSISTANT_EXCERPT_CHARS)
                )),
                _ => {}
            }
        }

        for note in &self.notes {
            if !note.content.is_empty() {
                blocks.push(format!("[Note: {}] {}", note.title, note.content));
            }
        }

        for file in &self.files {
            if let Some(text) = file.extracted_text.as_deref().filter(|t| !t.is_empty()) {
                let name = if file.original_name.is_empty() {
                    &file.filename
                } else {
                    &file.original_name
                };
                blocks.push(format!(
                    "[Document: {}] {}",
                    name,
                    clip(text, FILE_EXCERPT_CHARS)
                ));
            }
        }

        blocks
    }

    /// Number of meaningful characters across all text blocks
    pub fn content_len(&self) -> usize {
        self.text_blocks().join("\n\n").trim().chars().count()
    }
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// External collaborator providing session ownership and content
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Look up a session; `None` when it does not exist
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>>;

    /// Load messages, notes and files in display order
    async fn load_content(&self, session_id: &str) -> Result<SessionContent>;
}
