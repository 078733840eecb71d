//! Event query filters.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{AgentEvent, EventKind};

/// Malformed filter parameters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The timestamp range is inverted.
    #[error("invalid time range: since {since} is after until {until}")]
    InvertedTimeRange {
        /// Lower bound supplied by the caller.
        since: DateTime<Utc>,
        /// Upper bound supplied by the caller.
        until: DateTime<Utc>,
    },
}

/// Conjunctive event filter: every populated predicate must hold.
///
/// An empty filter matches every event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EventFilter {
    /// Kind membership (any of).
    #[serde(default)]
    pub kinds: Option<Vec<EventKind>>,
    /// Emitting agent equality.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Inclusive lower timestamp bound.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper timestamp bound.
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
    /// Parent event equality.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl EventFilter {
    /// Filter matching every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = EventKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Restrict to one emitting agent.
    #[must_use]
    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Restrict to a timestamp range (either bound may be `None`).
    #[must_use]
    pub fn with_time_range(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Restrict to children of one parent event.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Validate the filter parameters.
    ///
    /// # Errors
    /// Returns [`FilterError::InvertedTimeRange`] when `since > until`.
    pub fn validate(&self) -> Result<(), FilterError> {
        if let (Some(since), Some(until)) = (self.since, self.until)
            && since > until
        {
            return Err(FilterError::InvertedTimeRange { since, until });
        }
        Ok(())
    }

    /// Whether the event satisfies every populated predicate.
    #[must_use]
    pub fn matches(&self, event: &AgentEvent) -> bool {
        if let Some(ref kinds) = self.kinds
            && !kinds.contains(&event.kind)
        {
            return false;
        }
        if let Some(ref agent_id) = self.agent_id
            && event.agent_id.as_deref() != Some(agent_id.as_str())
        {
            return false;
        }
        if let Some(since) = self.since
            && event.ts < since
        {
            return false;
        }
        if let Some(until) = self.until
            && event.ts > until
        {
            return false;
        }
        if let Some(ref parent_id) = self.parent_id
            && event.parent_id.as_deref() != Some(parent_id.as_str())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(kind: EventKind, agent: Option<&str>) -> AgentEvent {
        let mut ev = AgentEvent::new("e", "r", kind);
        ev.agent_id = agent.map(String::from);
        ev
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&event(EventKind::ToolCall, None)));
        assert!(filter.matches(&event(EventKind::SystemError, Some("a"))));
    }

    #[test]
    fn test_predicates_compose_as_and() {
        let filter = EventFilter::all()
            .with_kinds([EventKind::ToolCall])
            .with_agent("a1");
        assert!(filter.matches(&event(EventKind::ToolCall, Some("a1"))));
        assert!(!filter.matches(&event(EventKind::ToolCall, Some("a2"))));
        assert!(!filter.matches(&event(EventKind::ToolResult, Some("a1"))));
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        let since = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let filter = EventFilter::all().with_time_range(Some(since), Some(until));
        assert!(filter.validate().is_err());
    }
}
