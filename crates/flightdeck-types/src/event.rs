//! Event model: immutable, timestamped, typed facts belonging to a run.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed enumeration of lifecycle event kinds.
///
/// The wire names are `snake_case`; the text before the first underscore is
/// the event category (`run`, `task`, `tool`, ...) used by the flat graph
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Run began.
    RunStarted,
    /// Run finished without error.
    RunCompleted,
    /// Run finished with an error.
    RunFailed,
    /// Run was cancelled.
    RunCancelled,
    /// An agent came up.
    AgentStarted,
    /// An agent finished its work.
    AgentCompleted,
    /// An agent aborted with an error.
    AgentFailed,
    /// An objective-level task was opened.
    TaskStarted,
    /// Task closed successfully.
    TaskCompleted,
    /// Task closed with an error.
    TaskFailed,
    /// A step within the current task was opened.
    StepStarted,
    /// A step finished.
    StepCompleted,
    /// A tool invocation was issued.
    ToolCall,
    /// A tool invocation returned.
    ToolResult,
    /// Inbound user message (wake signal).
    MessageUser,
    /// Outbound assistant message.
    MessageAssistant,
    /// A file was read.
    FileRead,
    /// A file was written.
    FileWrite,
    /// A checkpoint was created.
    CheckpointCreated,
    /// A checkpoint was restored.
    CheckpointRestored,
    /// A privileged action asked for approval.
    ApprovalRequested,
    /// Approval was granted.
    ApprovalGranted,
    /// Approval was denied.
    ApprovalDenied,
    /// Informational system event.
    SystemInfo,
    /// System-level error.
    SystemError,
}

impl EventKind {
    /// Wire name of the kind (matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::RunCompleted => "run_completed",
            Self::RunFailed => "run_failed",
            Self::RunCancelled => "run_cancelled",
            Self::AgentStarted => "agent_started",
            Self::AgentCompleted => "agent_completed",
            Self::AgentFailed => "agent_failed",
            Self::TaskStarted => "task_started",
            Self::TaskCompleted => "task_completed",
            Self::TaskFailed => "task_failed",
            Self::StepStarted => "step_started",
            Self::StepCompleted => "step_completed",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::MessageUser => "message_user",
            Self::MessageAssistant => "message_assistant",
            Self::FileRead => "file_read",
            Self::FileWrite => "file_write",
            Self::CheckpointCreated => "checkpoint_created",
            Self::CheckpointRestored => "checkpoint_restored",
            Self::ApprovalRequested => "approval_requested",
            Self::ApprovalGranted => "approval_granted",
            Self::ApprovalDenied => "approval_denied",
            Self::SystemInfo => "system_info",
            Self::SystemError => "system_error",
        }
    }

    /// Event category: the text before the first underscore of the wire
    /// name (`run`, `agent`, `task`, `step`, `tool`, `message`, `file`,
    /// `checkpoint`, `approval`, `system`).
    #[must_use]
    pub fn category(self) -> &'static str {
        let name = self.as_str();
        match name.split_once('_') {
            Some((prefix, _)) => prefix,
            None => name,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable fact belonging to a run.
///
/// `seq` is assigned by the event store on append: strictly increasing per
/// run and never reused, even across eviction. `parent_id` links events
/// into a forest (multiple roots per run are allowed).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentEvent {
    /// Unique event identifier.
    pub id: String,
    /// Owning run (required foreign key).
    pub run_id: String,
    /// Event timestamp.
    pub ts: DateTime<Utc>,
    /// Event kind.
    pub kind: EventKind,
    /// Agent that emitted the event, when known.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Parent event, when the emitter nested this under another event.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Per-run monotonic sequence number (store-assigned).
    #[serde(default)]
    pub seq: u64,
    /// Open key-value payload.
    #[serde(default)]
    pub payload: Value,
}

impl AgentEvent {
    /// Create an event stamped now. The store assigns `seq` on append.
    #[must_use]
    pub fn new(id: impl Into<String>, run_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            ts: Utc::now(),
            kind,
            agent_id: None,
            parent_id: None,
            seq: 0,
            payload: Value::Null,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach the emitting agent.
    #[must_use]
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Attach a parent event id.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}
