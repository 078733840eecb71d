//! Run metadata: one record per agent execution session.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is currently executing.
    Running,
    /// Run finished without error.
    Completed,
    /// Run finished with an error.
    Failed,
    /// Run was cancelled before finishing.
    Cancelled,
}

impl RunStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One agent execution session. Owned by the event store.
///
/// `event_count` reflects the currently *retained* event count, not the
/// lifetime total: very long runs lose early history to FIFO eviction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Run {
    /// Opaque unique identifier.
    pub id: String,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// When the run ended, if it has.
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Originating prompt, when known.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Identifier of the root agent driving the run.
    #[serde(default)]
    pub root_agent_id: Option<String>,
    /// Number of retained events for this run.
    #[serde(default)]
    pub event_count: usize,
    /// Error message for failed runs.
    #[serde(default)]
    pub error: Option<String>,
}

impl Run {
    /// Create a new running run starting now.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Running,
            prompt: None,
            root_agent_id: None,
            event_count: 0,
            error: None,
        }
    }

    /// Set the originating prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the root agent identifier.
    #[must_use]
    pub fn with_root_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.root_agent_id = Some(agent_id.into());
        self
    }
}

/// Partial update merged into an existing run by the store.
///
/// Only fields carrying `Some` are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunPatch {
    /// New lifecycle status.
    #[serde(default)]
    pub status: Option<RunStatus>,
    /// Completion timestamp.
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Originating prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Root agent identifier.
    #[serde(default)]
    pub root_agent_id: Option<String>,
    /// Error message.
    #[serde(default)]
    pub error: Option<String>,
}

impl RunPatch {
    /// Patch that marks a run as finished with the given status.
    #[must_use]
    pub fn finished(status: RunStatus) -> Self {
        Self {
            status: Some(status),
            ended_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}
