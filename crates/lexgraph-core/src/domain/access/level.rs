//! Access levels and the actions they permit

use serde::{Deserialize, Serialize};

/// Effective permission of an actor on a graph, ordered from least to most
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    None,
    View,
    Comment,
    Edit,
    OwnerEdit,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::View => "VIEW",
            Self::Comment => "COMMENT",
            Self::Edit => "EDIT",
            Self::OwnerEdit => "OWNER_EDIT",
        }
    }

    /// Whether this level is enough for `action`
    pub fn allows(&self, action: Action) -> bool {
        *self >= action.required_level()
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Self::OwnerEdit)
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Level a share can grant; ownership is never shareable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareAccess {
    View,
    Comment,
    Edit,
}

impl ShareAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Comment => "COMMENT",
            Self::Edit => "EDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VIEW" => Some(Self::View),
            "COMMENT" => Some(Self::Comment),
            "EDIT" => Some(Self::Edit),
            _ => None,
        }
    }
}

impl From<ShareAccess> for AccessLevel {
    fn from(access: ShareAccess) -> Self {
        match access {
            ShareAccess::View => AccessLevel::View,
            ShareAccess::Comment => AccessLevel::Comment,
            ShareAccess::Edit => AccessLevel::Edit,
        }
    }
}

/// Operations gated by the access resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read graph, nodes, edges, comments, feedback history
    ViewGraph,
    /// Create comments
    Comment,
    /// ACCEPT / REJECT / RATE feedback
    FeedbackSignal,
    /// Rebuild, edit or delete nodes and edges, save layout
    MutateGraph,
    /// Delete the graph, manage shares
    Manage,
}

impl Action {
    pub fn required_level(&self) -> AccessLevel {
        match self {
            Self::ViewGraph => AccessLevel::View,
            Self::Comment | Self::FeedbackSignal => AccessLevel::Comment,
            Self::MutateGraph => AccessLevel::Edit,
            Self::Manage => AccessLevel::OwnerEdit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewGraph => "view graph",
            Self::Comment => "comment",
            Self::FeedbackSignal => "submit feedback",
            Self::MutateGraph => "modify graph",
            Self::Manage => "manage graph",
        }
    }
}
