//! Graph node and edge model.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flightdeck_types::NodeStatus;

/// 2-D layout position. Presentation only: position values never affect
/// status or ordering logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    /// Horizontal position (a function of tree depth).
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// Semantic edge type. The builder only emits `Child`; dependency and
/// trigger edges are reserved for future producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent/child containment.
    Child,
    /// `to` depends on `from`.
    DependsOn,
    /// `from` triggers `to`.
    Triggers,
}

/// Directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GraphEdge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Edge semantics.
    pub kind: EdgeKind,
}

/// Variant payload of a graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Root of the tree; one per run.
    Goal {
        /// Initiating prompt, when a wake event carried one.
        prompt: Option<String>,
        /// Session key extracted from the wake event.
        session_key: Option<String>,
        /// Agent that received the wake signal.
        agent_id: Option<String>,
    },
    /// Objective-level unit of work.
    Task,
    /// Action within a task.
    Step,
    /// Tool invocation.
    ToolCall {
        /// Invocation arguments.
        arguments: Option<Value>,
        /// Result value reported by the matching tool-result event.
        result: Option<Value>,
        /// Error reported by the matching tool-result event.
        error: Option<String>,
    },
    /// Raw event passthrough (only when enabled in the builder config).
    Event,
}

/// One node of the derived task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GraphNode {
    /// Deterministic node id (derived from the seeding event id).
    pub id: String,
    /// Variant tag plus variant-specific payload.
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// Current status.
    pub status: NodeStatus,
    /// Parent node id; `None` only for the Goal.
    pub parent: Option<String>,
    /// Ordered child node ids.
    pub children: Vec<String>,
    /// Creation timestamp (from the seeding event).
    pub created_at: DateTime<Utc>,
    /// Completion timestamp, when the node was closed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Derived duration in milliseconds (`completed_at - created_at`).
    pub duration_ms: Option<i64>,
    /// Free-form metadata.
    pub metadata: Value,
    /// Optional layout position.
    pub position: Option<Position>,
}

impl GraphNode {
    pub(crate) fn new(
        id: impl Into<String>,
        kind: NodeKind,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            status: NodeStatus::Running,
            parent: None,
            children: Vec::new(),
            created_at,
            completed_at: None,
            duration_ms: None,
            metadata: Value::Null,
            position: None,
        }
    }

    /// Close the node: stamp completion and derive the duration.
    pub(crate) fn close(&mut self, status: NodeStatus, at: DateTime<Utc>) {
        self.status = status;
        self.completed_at = Some(at);
        self.duration_ms = Some((at - self.created_at).num_milliseconds());
    }
}

/// Derived hierarchical view of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskGraph {
    /// Owning run.
    pub run_id: String,
    /// Id of the Goal root node.
    pub goal_id: String,
    /// All nodes, in creation order (Goal first).
    pub nodes: Vec<GraphNode>,
    /// Child edges, in creation order.
    pub edges: Vec<GraphEdge>,
}

impl TaskGraph {
    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// The Goal root node.
    ///
    /// # Panics
    /// Never panics on builder output: the builder always seeds a Goal.
    #[must_use]
    #[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
    pub fn goal(&self) -> &GraphNode {
        self.node(self.goal_id.as_str()).unwrap()
    }
}
