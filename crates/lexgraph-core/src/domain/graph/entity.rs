//! Graph store entities
//!
//! A session owns at most one [`Graph`]. Nodes and edges belong to exactly one
//! graph and are replaced wholesale on every build.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Build lifecycle of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphStatus {
    NotBuilt,
    Building,
    Ready,
    Error,
}

impl GraphStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotBuilt => "NOT_BUILT",
            Self::Building => "BUILDING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_BUILT" => Some(Self::NotBuilt),
            "BUILDING" => Some(Self::Building),
            "READY" => Some(Self::Ready),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of entity types a node may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Person,
    Organization,
    LawReference,
    Date,
    Location,
    Claim,
    Evidence,
    Event,
    Document,
    Concept,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::LawReference => "LAW_REFERENCE",
            Self::Date => "DATE",
            Self::Location => "LOCATION",
            Self::Claim => "CLAIM",
            Self::Evidence => "EVIDENCE",
            Self::Event => "EVENT",
            Self::Document => "DOCUMENT",
            Self::Concept => "CONCEPT",
        }
    }

    /// Parse a node type, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
    }

    pub fn all() -> &'static [NodeType] {
        &[
            Self::Person,
            Self::Organization,
            Self::LawReference,
            Self::Date,
            Self::Location,
            Self::Claim,
            Self::Evidence,
            Self::Event,
            Self::Document,
            Self::Concept,
        ]
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout hint owned by the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// The per-session graph aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    pub session_id: String,
    pub status: GraphStatus,
    pub summary: Option<String>,
    /// Always equals the live node tally after a build or mutation
    pub node_count: u32,
    /// Always equals the live edge tally after a build or mutation
    pub edge_count: u32,
    pub last_built_at: Option<DateTime<Utc>>,
    /// Reason for the last ERROR transition
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A typed entity in a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub graph_id: String,
    pub node_type: NodeType,
    pub label: String,
    pub description: Option<String>,
    pub properties: Map<String, Value>,
    pub position: Option<Position>,
}

impl Node {
    /// Denormalized copy stored alongside feedback so history survives rebuilds
    pub fn snapshot(&self) -> Value {
        serde_json::json!({
            "label": self.label,
            "type": self.node_type.as_str(),
            "description": self.description,
        })
    }
}

/// A directed relationship between two nodes of the same graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub graph_id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    pub label: String,
}

impl Edge {
    pub fn snapshot(&self) -> Value {
        serde_json::json!({
            "relation": self.relation,
            "label": self.label,
            "sourceId": self.source_id,
            "targetId": self.target_id,
        })
    }
}

/// Human-readable label for a relation token (`works_for` -> `works for`)
pub fn default_edge_label(relation: &str) -> String {
    relation.replace(['_', '-'], " ")
}

/// A node about to be written by a bulk replace
#[derive(Debug, Clone)]
pub struct NewNode {
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
    pub description: Option<String>,
    pub properties: Map<String, Value>,
}

impl NewNode {
    pub fn new(node_type: NodeType, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_type,
            label: label.into(),
            description: None,
            properties: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

/// An edge about to be written by a bulk replace
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    pub label: String,
}

impl NewEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        let relation = relation.into();
        Self {
            id: Uuid::new_v4().to_string(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: default_edge_label(&relation),
            relation,
        }
    }

    /// Override the derived label; blank labels keep the derived one
    pub fn with_label(mut self, label: Option<String>) -> Self {
        if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
            self.label = label;
        }
        self
    }
}

/// Full replacement node/edge set for a graph
#[derive(Debug, Clone, Default)]
pub struct GraphContents {
    pub nodes: Vec<NewNode>,
    pub edges: Vec<NewEdge>,
}

/// Tallies after a bulk replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphCounts {
    pub node_count: u32,
    pub edge_count: u32,
    /// Edges discarded because an endpoint was outside the node set
    pub dropped_edges: u32,
}

/// Partial node update; only present fields change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<String>,
    pub node_type: Option<NodeType>,
    pub properties: Option<Map<String, Value>>,
}

impl NodePatch {
    /// Build a patch from a feedback `correctedValue` object
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid("correctedValue must be an object"))?;

        let mut patch = Self::default();

        if let Some(label) = object.get("label") {
            let label = label
                .as_str()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .ok_or_else(|| Error::invalid("correctedValue.label must be a non-empty string"))?;
            patch.label = Some(label.to_string());
        }

        if let Some(description) = object.get("description") {
            let description = description
                .as_str()
                .ok_or_else(|| Error::invalid("correctedValue.description must be a string"))?;
            patch.description = Some(description.to_string());
        }

        if let Some(node_type) = object.get("type") {
            let raw = node_type
                .as_str()
                .ok_or_else(|| Error::invalid("correctedValue.type must be a string"))?;
            let parsed = NodeType::parse(raw)
                .ok_or_else(|| Error::invalid(format!("Unknown node type: {}", raw)))?;
            patch.node_type = Some(parsed);
        }

        if let Some(properties) = object.get("properties") {
            let properties = properties
                .as_object()
                .ok_or_else(|| Error::invalid("correctedValue.properties must be an object"))?;
            patch.properties = Some(properties.clone());
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.description.is_none()
            && self.node_type.is_none()
            && self.properties.is_none()
    }
}

/// A graph with its current node and edge sets
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub graph: Graph,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}
