//! Contract with the external entity-extraction collaborator

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::session::{SessionContent, SessionFile, SessionMessage, SessionNote};
use crate::error::Result;

/// Relation used when the extractor omits one
pub const DEFAULT_RELATION: &str = "related_to";

/// Build request sent to the extractor
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest {
    pub session_id: String,
    pub messages: Vec<SessionMessage>,
    pub notes: Vec<SessionNote>,
    pub files: Vec<SessionFile>,
}

impl ExtractionRequest {
    pub fn new(session_id: impl Into<String>, content: SessionContent) -> Self {
        Self {
            session_id: session_id.into(),
            messages: content.messages,
            notes: content.notes,
            files: content.files,
        }
    }
}

/// Extractor output: a summary plus node and edge specs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// A node as proposed by the extractor
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    /// Per-response sequence id, when the extractor supplies one
    #[serde(default, deserialize_with = "deserialize_spec_id")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl NodeSpec {
    pub fn new(node_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            node_type: node_type.into(),
            label: label.into(),
            description: None,
            properties: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// An edge referencing its endpoints by label, or by sequence id when given
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    #[serde(default)]
    pub source_label: String,
    #[serde(default)]
    pub target_label: String,
    #[serde(default, deserialize_with = "deserialize_spec_id")]
    pub source_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_spec_id")]
    pub target_id: Option<String>,
    #[serde(default = "default_relation")]
    pub relation: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl EdgeSpec {
    pub fn new(
        source_label: impl Into<String>,
        target_label: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source_label: source_label.into(),
            target_label: target_label.into(),
            source_id: None,
            target_id: None,
            relation: relation.into(),
            label: None,
        }
    }

    pub fn with_ids(mut self, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self.target_id = Some(target_id.into());
        self
    }
}

fn default_relation() -> String {
    DEFAULT_RELATION.to_string()
}

/// Sequence ids may arrive as strings or numbers
fn deserialize_spec_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// External extraction engine
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Extract entities and relationships from session content.
    ///
    /// Transport failures, non-2xx responses and undecodable bodies are
    /// reported as errors.
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = ExtractionRequest::new(
            "s1",
            SessionContent {
                messages: vec![SessionMessage {
                    role: "user".into(),
                    content: "X sued Y".into(),
                }],
                notes: vec![],
                files: vec![SessionFile {
                    filename: "a.pdf".into(),
                    original_name: "A.pdf".into(),
                    extracted_text: Some("text".into()),
                }],
            },
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["session_id"], "s1");
        assert_eq!(value["messages"][0], json!({"content": "X sued Y", "role": "user"}));
        assert_eq!(value["files"][0]["originalName"], "A.pdf");
        assert_eq!(value["files"][0]["extractedText"], "text");
    }

    #[test]
    fn test_response_decoding() {
        let response: ExtractionResponse = serde_json::from_value(json!({
            "summary": "A dispute",
            "nodes": [
                {"type": "PERSON", "label": "X"},
                {"id": 2, "type": "PERSON", "label": "Y", "properties": {"role": "defendant"}}
            ],
            "edges": [
                {"source_label": "X", "target_label": "Y"},
                {"source_label": "X", "target_label": "Y", "source_id": "1", "target_id": 2, "relation": "SUED"}
            ],
            "node_count": 2
        }))
        .unwrap();

        assert_eq!(response.summary.as_deref(), Some("A dispute"));
        assert_eq!(response.nodes[0].id, None);
        assert_eq!(response.nodes[1].id.as_deref(), Some("2"));
        assert_eq!(response.edges[0].relation, DEFAULT_RELATION);
        assert_eq!(response.edges[1].target_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_missing_lists_default_empty() {
        let response: ExtractionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.nodes.is_empty());
        assert!(response.edges.is_empty());
        assert!(response.summary.is_none());
    }
}
