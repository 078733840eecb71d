//! Derived node status and the single place status inference happens.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of a derived graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not yet started.
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Deliberately not executed.
    Skipped,
    /// Aborted before finishing.
    Cancelled,
}

impl NodeStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse an explicit status string. Only the six valid wire names are
    /// accepted; anything else returns `None` so callers fall back to
    /// keyword inference.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Infer a status from keywords in an event kind name.
    ///
    /// Precedence: error/fail → Failed, complete/success → Completed,
    /// skip → Skipped, cancel → Cancelled, start/begin → Running, else the
    /// supplied default.
    #[must_use]
    pub fn infer_from_kind_name(name: &str, default: Self) -> Self {
        if name.contains("error") || name.contains("fail") {
            Self::Failed
        } else if name.contains("complete") || name.contains("success") {
            Self::Completed
        } else if name.contains("skip") {
            Self::Skipped
        } else if name.contains("cancel") {
            Self::Cancelled
        } else if name.contains("start") || name.contains("begin") {
            Self::Running
        } else {
            default
        }
    }

    /// Status implied by an event kind name's suffix, for the flat view.
    #[must_use]
    pub fn implied_by_suffix(name: &str) -> Self {
        if name.ends_with("started") {
            Self::Running
        } else if name.ends_with("completed") || name.ends_with("result") || name.ends_with("granted")
        {
            Self::Completed
        } else if name.ends_with("failed") || name.ends_with("error") || name.ends_with("denied") {
            Self::Failed
        } else if name.ends_with("cancelled") {
            Self::Cancelled
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_only_valid_names() {
        assert_eq!(NodeStatus::parse("failed"), Some(NodeStatus::Failed));
        assert_eq!(NodeStatus::parse("FAILED"), None);
        assert_eq!(NodeStatus::parse("done"), None);
    }

    #[test]
    fn test_keyword_inference_order() {
        assert_eq!(
            NodeStatus::infer_from_kind_name("task_failed", NodeStatus::Pending),
            NodeStatus::Failed
        );
        assert_eq!(
            NodeStatus::infer_from_kind_name("task_completed", NodeStatus::Pending),
            NodeStatus::Completed
        );
        assert_eq!(
            NodeStatus::infer_from_kind_name("task_started", NodeStatus::Pending),
            NodeStatus::Running
        );
        assert_eq!(
            NodeStatus::infer_from_kind_name("tool_call", NodeStatus::Pending),
            NodeStatus::Pending
        );
    }

    #[test]
    fn test_suffix_mapping() {
        assert_eq!(NodeStatus::implied_by_suffix("step_started"), NodeStatus::Running);
        assert_eq!(NodeStatus::implied_by_suffix("tool_result"), NodeStatus::Completed);
        assert_eq!(NodeStatus::implied_by_suffix("approval_denied"), NodeStatus::Failed);
        assert_eq!(NodeStatus::implied_by_suffix("tool_call"), NodeStatus::Pending);
    }
}
