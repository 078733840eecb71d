//! Lightweight flat graph view derived directly from retained events.
//!
//! This is not the hierarchical builder's tree: one node per retained
//! event, typed by the event kind's category, labelled from payload
//! fields, with a status implied by the kind name's suffix. Edges follow
//! `parent_id` links between retained events.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use flightdeck_types::{payload, AgentEvent, NodeStatus};

/// One node of the flat view.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlatGraphNode {
    /// Event id.
    pub id: String,
    /// Event kind category (`run`, `task`, `tool`, ...).
    pub kind: String,
    /// Display label resolved from the payload.
    pub label: String,
    /// Status implied by the kind name suffix.
    pub status: NodeStatus,
}

/// Directed edge between two retained events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlatGraphEdge {
    /// Parent event id.
    pub from: String,
    /// Child event id.
    pub to: String,
}

/// Flat, non-hierarchical view of a run's retained events.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlatTaskGraph {
    /// Owning run.
    pub run_id: String,
    /// One node per retained event.
    pub nodes: Vec<FlatGraphNode>,
    /// Parent links between retained events.
    pub edges: Vec<FlatGraphEdge>,
}

/// Derive the flat view from a run's retained events.
pub(crate) fn derive(run_id: &str, events: &[AgentEvent]) -> FlatTaskGraph {
    let retained: std::collections::HashSet<&str> =
        events.iter().map(|event| event.id.as_str()).collect();

    let mut nodes = Vec::with_capacity(events.len());
    let mut edges = Vec::new();
    for event in events {
        let label = payload::label(&event.payload)
            .or_else(|| payload::tool_name(&event.payload))
            .or_else(|| payload::prompt(&event.payload))
            .unwrap_or_else(|| event.kind.as_str());
        nodes.push(FlatGraphNode {
            id: event.id.clone(),
            kind: event.kind.category().to_string(),
            label: label.to_string(),
            status: NodeStatus::implied_by_suffix(event.kind.as_str()),
        });
        // Parent links pointing at evicted events are dropped with them.
        if let Some(ref parent_id) = event.parent_id
            && retained.contains(parent_id.as_str())
        {
            edges.push(FlatGraphEdge {
                from: parent_id.clone(),
                to: event.id.clone(),
            });
        }
    }

    FlatTaskGraph {
        run_id: run_id.to_string(),
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightdeck_types::EventKind;
    use serde_json::json;

    #[test]
    fn test_labels_and_statuses() {
        let events = vec![
            AgentEvent::new("e1", "r1", EventKind::TaskStarted)
                .with_payload(json!({"name": "build"})),
            AgentEvent::new("e2", "r1", EventKind::ToolCall)
                .with_payload(json!({"tool": "cargo"}))
                .with_parent("e1"),
        ];
        let graph = derive("r1", &events);
        assert_eq!(graph.nodes[0].label, "build");
        assert_eq!(graph.nodes[0].kind, "task");
        assert_eq!(graph.nodes[0].status, NodeStatus::Running);
        assert_eq!(graph.nodes[1].label, "cargo");
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, "e1");
    }

    #[test]
    fn test_edges_to_missing_parents_are_dropped() {
        let events = vec![
            AgentEvent::new("e2", "r1", EventKind::ToolResult).with_parent("evicted"),
        ];
        let graph = derive("r1", &events);
        assert!(graph.edges.is_empty());
    }
}
