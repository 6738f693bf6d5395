//! Feedback events and submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::access::Action;
use crate::domain::graph::NodePatch;
use crate::error::{Error, Result};

/// Longest free-text comment accepted with feedback
pub const MAX_FEEDBACK_COMMENT_CHARS: usize = 2000;

/// Kind of judgment recorded by a feedback event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackType {
    Accept,
    Reject,
    Edit,
    DeleteNode,
    DeleteEdge,
    Rate,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
            Self::Edit => "EDIT",
            Self::DeleteNode => "DELETE_NODE",
            Self::DeleteEdge => "DELETE_EDGE",
            Self::Rate => "RATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACCEPT" => Some(Self::Accept),
            "REJECT" => Some(Self::Reject),
            "EDIT" => Some(Self::Edit),
            "DELETE_NODE" => Some(Self::DeleteNode),
            "DELETE_EDGE" => Some(Self::DeleteEdge),
            "RATE" => Some(Self::Rate),
            _ => None,
        }
    }

    /// Whether applying this feedback changes the graph
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Edit | Self::DeleteNode | Self::DeleteEdge)
    }

    /// Access the submitter needs for this kind of feedback
    pub fn required_action(&self) -> Action {
        if self.is_mutating() {
            Action::MutateGraph
        } else {
            Action::FeedbackSignal
        }
    }
}

impl std::fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of a judgment on a node or edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: String,
    pub session_id: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub feedback_type: FeedbackType,
    /// Snapshot of the target at submission time
    pub original_value: Option<Value>,
    pub corrected_value: Option<Value>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl FeedbackEvent {
    /// Entity type recorded in the original snapshot, if any
    pub fn original_type(&self) -> Option<&str> {
        self.original_value
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(Value::as_str)
    }

    /// Entity type requested by an EDIT correction, if any
    pub fn corrected_type(&self) -> Option<&str> {
        self.corrected_value
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(Value::as_str)
    }
}

/// Feedback as submitted by a caller
#[derive(Debug, Clone)]
pub struct FeedbackSubmission {
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
    pub feedback_type: FeedbackType,
    pub original_value: Option<Value>,
    pub corrected_value: Option<Value>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

impl FeedbackSubmission {
    pub fn new(feedback_type: FeedbackType) -> Self {
        Self {
            node_id: None,
            edge_id: None,
            feedback_type,
            original_value: None,
            corrected_value: None,
            rating: None,
            comment: None,
        }
    }

    pub fn on_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn on_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }

    pub fn corrected(mut self, value: Value) -> Self {
        self.corrected_value = Some(value);
        self
    }

    pub fn rated(mut self, rating: i64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Check field requirements for the feedback type.
    ///
    /// Returns the node patch for EDIT submissions.
    pub fn validate(&self) -> Result<Option<NodePatch>> {
        if self.node_id.is_some() && self.edge_id.is_some() {
            return Err(Error::invalid("Feedback may target a node or an edge, not both"));
        }

        if let Some(comment) = &self.comment {
            if comment.chars().count() > MAX_FEEDBACK_COMMENT_CHARS {
                return Err(Error::invalid(format!(
                    "comment must be at most {} characters",
                    MAX_FEEDBACK_COMMENT_CHARS
                )));
            }
        }

        match self.feedback_type {
            FeedbackType::Edit => {
                if self.node_id.is_none() {
                    return Err(Error::invalid("EDIT feedback requires nodeId"));
                }
                let corrected = self
                    .corrected_value
                    .as_ref()
                    .ok_or_else(|| Error::invalid("EDIT feedback requires correctedValue"))?;
                let patch = NodePatch::from_value(corrected)?;
                if patch.is_empty() {
                    return Err(Error::invalid("correctedValue has no editable fields"));
                }
                Ok(Some(patch))
            }
            FeedbackType::DeleteNode if self.node_id.is_none() => {
                Err(Error::invalid("DELETE_NODE feedback requires nodeId"))
            }
            FeedbackType::DeleteEdge if self.edge_id.is_none() => {
                Err(Error::invalid("DELETE_EDGE feedback requires edgeId"))
            }
            FeedbackType::Rate => match self.rating {
                Some(1..=5) => Ok(None),
                _ => Err(Error::invalid("RATE feedback requires a rating between 1 and 5")),
            },
            _ => Ok(None),
        }
    }

    /// Turn the submission into an event
    pub fn into_event(
        self,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        original_value: Option<Value>,
    ) -> FeedbackEvent {
        FeedbackEvent {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            node_id: self.node_id,
            edge_id: self.edge_id,
            feedback_type: self.feedback_type,
            original_value,
            corrected_value: self.corrected_value,
            rating: self.rating,
            comment: self.comment,
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}
