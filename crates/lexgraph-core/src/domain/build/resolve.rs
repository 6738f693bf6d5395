//! Turning extractor specs into a node/edge set
//!
//! Edge endpoints resolve by sequence id when the extractor supplies one and
//! by trimmed label otherwise. When labels collide the first node keeps the
//! label mapping.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::warn;

use crate::domain::graph::{GraphContents, NewEdge, NewNode, NodeType};

use super::extraction::{DEFAULT_RELATION, EdgeSpec, ExtractionResponse};

/// Resolved contents plus what had to be discarded
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub contents: GraphContents,
    /// Node specs with an unknown type or blank label
    pub skipped_nodes: u32,
    /// Edge specs whose endpoints matched no node
    pub unresolved_edges: u32,
    /// Labels shared by more than one node
    pub label_collisions: u32,
}

pub fn resolve(response: &ExtractionResponse) -> Resolution {
    let mut resolution = Resolution::default();
    let mut by_label: HashMap<String, String> = HashMap::new();
    let mut by_spec_id: HashMap<String, String> = HashMap::new();

    for spec in &response.nodes {
        let label = spec.label.trim();
        let Some(node_type) = NodeType::parse(&spec.node_type) else {
            warn!(node_type = %spec.node_type, label = %label, "Skipping node with unknown type");
            resolution.skipped_nodes += 1;
            continue;
        };
        if label.is_empty() {
            warn!(node_type = %node_type, "Skipping node with blank label");
            resolution.skipped_nodes += 1;
            continue;
        }

        let mut node = NewNode::new(node_type, label);
        if let Some(description) = spec.description.as_deref().filter(|d| !d.trim().is_empty()) {
            node = node.with_description(description);
        }
        if let Some(properties) = &spec.properties {
            node = node.with_properties(properties.clone());
        }

        match by_label.entry(label.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(node.id.clone());
            }
            Entry::Occupied(_) => resolution.label_collisions += 1,
        }
        if let Some(spec_id) = &spec.id {
            by_spec_id.entry(spec_id.clone()).or_insert_with(|| node.id.clone());
        }

        resolution.contents.nodes.push(node);
    }

    for spec in &response.edges {
        let source = endpoint(spec.source_id.as_deref(), &spec.source_label, &by_spec_id, &by_label);
        let target = endpoint(spec.target_id.as_deref(), &spec.target_label, &by_spec_id, &by_label);

        let (Some(source), Some(target)) = (source, target) else {
            warn!(
                source = %spec.source_label,
                target = %spec.target_label,
                relation = %spec.relation,
                "Dropping edge with unresolved endpoint"
            );
            resolution.unresolved_edges += 1;
            continue;
        };

        let relation = match spec.relation.trim() {
            "" => DEFAULT_RELATION,
            relation => relation,
        };
        resolution
            .contents
            .edges
            .push(NewEdge::new(source, target, relation).with_label(spec.label.clone()));
    }

    resolution
}

fn endpoint(
    spec_id: Option<&str>,
    label: &str,
    by_spec_id: &HashMap<String, String>,
    by_label: &HashMap<String, String>,
) -> Option<String> {
    match spec_id {
        Some(id) => by_spec_id.get(id).cloned(),
        None => by_label.get(label.trim()).cloned(),
    }
}

impl Resolution {
    pub fn node_count(&self) -> usize {
        self.contents.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.contents.edges.len()
    }
}
