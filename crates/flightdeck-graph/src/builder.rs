//! Sequential event fold producing the task graph.

use chrono::{DateTime, Utc};
use serde_json::Value;

use flightdeck_types::{payload, AgentEvent, EventKind, NodeStatus};

use crate::layout;
use crate::node::{EdgeKind, GraphEdge, GraphNode, NodeKind, TaskGraph};

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Compute tree layout positions (default on).
    pub auto_layout: bool,
    /// Attach non-structural events as raw `Event` nodes instead of
    /// dropping them from the hierarchy (default off).
    pub include_raw_events: bool,
    /// Status applied to closed nodes when neither the payload nor the
    /// event kind name carries a signal.
    pub default_close_status: NodeStatus,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            auto_layout: true,
            include_raw_events: false,
            default_close_status: NodeStatus::Completed,
        }
    }
}

/// Folds ordered event slices into hierarchical task graphs.
///
/// The fold is strictly sequential: at most one open task and one open
/// step at a time; the model is not re-entrant. Merging new events into an
/// existing graph is defined as discard-and-rebuild from the full slice -
/// there is no incremental update contract.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
}

struct Fold {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    goal_id: String,
    current_task: Option<usize>,
    current_step: Option<usize>,
    /// Indices of ToolCall nodes in opening order.
    tool_calls: Vec<usize>,
}

impl GraphBuilder {
    /// Builder with the given configuration.
    #[must_use]
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Build the task graph for a run from its ordered event slice.
    ///
    /// Pure with respect to its inputs: identical slices produce
    /// byte-identical graphs (node ids derive from event ids; no
    /// randomness anywhere, including layout).
    #[must_use]
    pub fn build(&self, run_id: &str, events: &[AgentEvent]) -> TaskGraph {
        let mut fold = Fold::seed(run_id, events);

        for event in events {
            match event.kind {
                EventKind::TaskStarted => fold.open_task(event),
                EventKind::TaskCompleted | EventKind::TaskFailed => {
                    fold.close_task(event, self.config.default_close_status);
                }
                EventKind::StepStarted => fold.open_step(event),
                EventKind::ToolCall => fold.open_tool_call(event),
                EventKind::ToolResult => fold.close_tool_call(event),
                _ => {
                    if self.config.include_raw_events {
                        fold.attach_raw_event(event);
                    }
                    // Otherwise absent from the hierarchy; the event still
                    // exists in the underlying log.
                }
            }
        }

        fold.finish_goal();

        let mut graph = TaskGraph {
            run_id: run_id.to_string(),
            goal_id: fold.goal_id,
            nodes: fold.nodes,
            edges: fold.edges,
        };
        if self.config.auto_layout {
            layout::apply_tree_layout(&mut graph);
        }
        graph
    }
}

impl Fold {
    /// Seed the Goal from the first wake signal (a `message_user` event),
    /// falling back to "Untitled Goal" when none exists.
    fn seed(run_id: &str, events: &[AgentEvent]) -> Self {
        let wake = events
            .iter()
            .find(|event| event.kind == EventKind::MessageUser);
        let created_at = wake
            .map(|event| event.ts)
            .or_else(|| events.first().map(|event| event.ts))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let prompt = wake
            .and_then(|event| payload::prompt(&event.payload))
            .map(str::to_string);
        let session_key = wake
            .and_then(|event| payload::session_key(&event.payload))
            .map(str::to_string);
        let agent_id = wake.and_then(|event| {
            event
                .agent_id
                .clone()
                .or_else(|| payload::agent_id(&event.payload).map(str::to_string))
        });

        let goal_id = format!("goal:{run_id}");
        let name = prompt.clone().unwrap_or_else(|| "Untitled Goal".to_string());
        let goal = GraphNode::new(
            goal_id.clone(),
            NodeKind::Goal {
                prompt,
                session_key,
                agent_id,
            },
            name,
            created_at,
        );

        Self {
            nodes: vec![goal],
            edges: Vec::new(),
            goal_id,
            current_task: None,
            current_step: None,
            tool_calls: Vec::new(),
        }
    }

    fn push_child(&mut self, parent_idx: usize, mut node: GraphNode) -> usize {
        let parent_id = self.nodes[parent_idx].id.clone();
        node.parent = Some(parent_id.clone());
        let child_id = node.id.clone();
        self.nodes[parent_idx].children.push(child_id.clone());
        self.edges.push(GraphEdge {
            from: parent_id,
            to: child_id,
            kind: EdgeKind::Child,
        });
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// A task-start closes nothing: it opens a new Task under the Goal and
    /// resets the step cursor.
    fn open_task(&mut self, event: &AgentEvent) {
        let name = payload::label(&event.payload).unwrap_or("Task").to_string();
        let mut node = GraphNode::new(
            format!("task:{}", event.id),
            NodeKind::Task,
            name,
            event.ts,
        );
        node.metadata = event.payload.clone();
        let idx = self.push_child(0, node);
        self.current_task = Some(idx);
        self.current_step = None;
    }

    fn close_task(&mut self, event: &AgentEvent, default_status: NodeStatus) {
        let Some(task_idx) = self.current_task.take() else {
            return;
        };
        let status = resolve_status(event, default_status);
        self.nodes[task_idx].close(status, event.ts);
        self.current_step = None;
    }

    /// A step cannot exist outside a task; step events with no open task
    /// are dropped. Opening a step resets the tool-call index.
    fn open_step(&mut self, event: &AgentEvent) {
        let Some(task_idx) = self.current_task else {
            return;
        };
        let name = payload::label(&event.payload).unwrap_or("Step").to_string();
        let mut node = GraphNode::new(
            format!("step:{}", event.id),
            NodeKind::Step,
            name,
            event.ts,
        );
        node.metadata = event.payload.clone();
        let idx = self.push_child(task_idx, node);
        self.current_step = Some(idx);
        self.tool_calls.clear();
    }

    /// Tool calls parent to the innermost open scope: step, else task,
    /// else the Goal itself.
    fn open_tool_call(&mut self, event: &AgentEvent) {
        let parent_idx = self.current_step.or(self.current_task).unwrap_or(0);
        let name = payload::tool_name(&event.payload)
            .unwrap_or("Tool Call")
            .to_string();
        let arguments = payload::first_value(&event.payload, payload::ARGUMENT_KEYS).cloned();
        let node = GraphNode::new(
            format!("tool:{}", event.id),
            NodeKind::ToolCall {
                arguments,
                result: None,
                error: None,
            },
            name,
            event.ts,
        );
        let idx = self.push_child(parent_idx, node);
        self.tool_calls.push(idx);
    }

    /// A tool-result retroactively completes the *most recently opened*
    /// ToolCall that has no completion timestamp yet. Correlation ids are
    /// not guaranteed present, so no id matching is attempted.
    fn close_tool_call(&mut self, event: &AgentEvent) {
        let Some(&idx) = self
            .tool_calls
            .iter()
            .rev()
            .find(|&&idx| self.nodes[idx].completed_at.is_none())
        else {
            return;
        };

        let result = payload::first_value(&event.payload, payload::RESULT_KEYS).cloned();
        let error = event
            .payload
            .as_object()
            .and_then(|map| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let status = match payload::status(&event.payload).and_then(NodeStatus::parse) {
            Some(explicit) => explicit,
            None if error.is_some() => NodeStatus::Failed,
            // A result with no failure signal closes the call cleanly.
            None => NodeStatus::infer_from_kind_name(event.kind.as_str(), NodeStatus::Completed),
        };

        if let NodeKind::ToolCall {
            result: ref mut slot_result,
            error: ref mut slot_error,
            ..
        } = self.nodes[idx].kind
        {
            *slot_result = result;
            *slot_error = error;
        }
        self.nodes[idx].close(status, event.ts);
    }

    fn attach_raw_event(&mut self, event: &AgentEvent) {
        let parent_idx = self.current_step.or(self.current_task).unwrap_or(0);
        let mut node = GraphNode::new(
            format!("event:{}", event.id),
            NodeKind::Event,
            event.kind.as_str().to_string(),
            event.ts,
        );
        node.status = NodeStatus::implied_by_suffix(event.kind.as_str());
        node.metadata = event.payload.clone();
        let _ = self.push_child(parent_idx, node);
    }

    /// The Goal fails if any direct child failed, otherwise it completes.
    fn finish_goal(&mut self) {
        let child_ids = self.nodes[0].children.clone();
        let any_failed = self
            .nodes
            .iter()
            .filter(|node| child_ids.contains(&node.id))
            .any(|node| node.status == NodeStatus::Failed);
        self.nodes[0].status = if any_failed {
            NodeStatus::Failed
        } else {
            NodeStatus::Completed
        };
    }
}

/// Status resolution order: a valid explicit payload `status` wins, then
/// keyword inference over the event kind name, then the supplied default.
fn resolve_status(event: &AgentEvent, default: NodeStatus) -> NodeStatus {
    payload::status(&event.payload)
        .and_then(NodeStatus::parse)
        .unwrap_or_else(|| NodeStatus::infer_from_kind_name(event.kind.as_str(), default))
}
