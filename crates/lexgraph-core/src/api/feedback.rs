//! Feedback API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::feedback::{FeedbackEvent, FeedbackSubmission, FeedbackType};
use crate::error::{Error, Result};

use super::LexGraph;

/// Feedback as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    /// `ACCEPT`, `REJECT`, `EDIT`, `DELETE_NODE`, `DELETE_EDGE` or `RATE`
    pub feedback_type: String,
    pub original_value: Option<Value>,
    pub corrected_value: Option<Value>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl TryFrom<FeedbackRequest> for FeedbackSubmission {
    type Error = Error;

    fn try_from(req: FeedbackRequest) -> Result<Self> {
        let feedback_type = FeedbackType::parse(&req.feedback_type).ok_or_else(|| {
            Error::invalid(format!("Unknown feedback type: {}", req.feedback_type))
        })?;

        Ok(Self {
            node_id: req.node_id,
            edge_id: req.edge_id,
            feedback_type,
            original_value: req.original_value,
            corrected_value: req.corrected_value,
            rating: req.rating,
            comment: req.comment,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDto {
    pub id: String,
    pub session_id: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub feedback_type: String,
    pub original_value: Option<Value>,
    pub corrected_value: Option<Value>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub user_id: String,
    pub created_at: String,
}

impl From<FeedbackEvent> for FeedbackDto {
    fn from(e: FeedbackEvent) -> Self {
        Self {
            id: e.id,
            session_id: e.session_id,
            node_id: e.node_id,
            edge_id: e.edge_id,
            feedback_type: e.feedback_type.as_str().to_string(),
            original_value: e.original_value,
            corrected_value: e.corrected_value,
            rating: e.rating,
            comment: e.comment,
            user_id: e.user_id,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

impl LexGraph {
    pub async fn submit_feedback(
        &self,
        session_id: &str,
        actor_id: &str,
        request: FeedbackRequest,
    ) -> Result<FeedbackDto> {
        let submission = FeedbackSubmission::try_from(request)?;
        let event = self
            .feedback
            .submit_feedback(session_id, actor_id, submission)
            .await?;
        Ok(event.into())
    }

    pub async fn list_feedback(&self, session_id: &str, actor_id: &str) -> Result<Vec<FeedbackDto>> {
        let events = self.feedback.list_feedback(session_id, actor_id).await?;
        Ok(events.into_iter().map(FeedbackDto::from).collect())
    }
}
