//! flightdeck-safety - Runtime safety gate for privileged actions.
//!
//! Consulted by collaborators before privileged actions. Two modes:
//! - **kill switch**: blocks every action unconditionally
//! - **safe mode**: blocks a fixed denylist of action-name prefixes
//!   covering file mutation, process execution, and deployment

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Action-name prefixes blocked while safe mode is active.
pub const SAFE_MODE_PREFIXES: &[&str] = &[
    "file.write",
    "file.delete",
    "fs.",
    "exec.",
    "process.",
    "shell.",
    "deploy.",
];

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// The action may proceed.
    Allowed,
    /// The action is blocked.
    Blocked {
        /// Which gate blocked it.
        reason: String,
    },
}

impl GateDecision {
    /// Whether the action is blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Runtime safety gate. Flags are plain atomics: checks are lock-free and
/// safe from any thread.
#[derive(Debug, Default)]
pub struct SafetyGate {
    kill_switch: AtomicBool,
    safe_mode: AtomicBool,
}

impl SafetyGate {
    /// Gate with both modes off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage or release the kill switch.
    pub fn set_kill_switch(&self, engaged: bool) {
        self.kill_switch.store(engaged, Ordering::Relaxed);
        tracing::warn!(engaged, "kill switch toggled");
    }

    /// Engage or release safe mode.
    pub fn set_safe_mode(&self, engaged: bool) {
        self.safe_mode.store(engaged, Ordering::Relaxed);
        tracing::info!(engaged, "safe mode toggled");
    }

    /// Whether the kill switch is engaged.
    #[must_use]
    pub fn kill_switch(&self) -> bool {
        self.kill_switch.load(Ordering::Relaxed)
    }

    /// Whether safe mode is engaged.
    #[must_use]
    pub fn safe_mode(&self) -> bool {
        self.safe_mode.load(Ordering::Relaxed)
    }

    /// Check an action by name. The kill switch blocks unconditionally;
    /// safe mode blocks denylisted prefixes.
    #[must_use]
    pub fn check(&self, action: &str) -> GateDecision {
        if self.kill_switch() {
            return GateDecision::Blocked {
                reason: "kill switch active".to_string(),
            };
        }
        if self.safe_mode()
            && let Some(prefix) = SAFE_MODE_PREFIXES
                .iter()
                .find(|prefix| action.starts_with(*prefix))
        {
            return GateDecision::Blocked {
                reason: format!("safe mode blocks {prefix}*"),
            };
        }
        GateDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        let gate = SafetyGate::new();
        assert_eq!(gate.check("file.write"), GateDecision::Allowed);
        assert_eq!(gate.check("deploy.production"), GateDecision::Allowed);
    }

    #[test]
    fn test_kill_switch_blocks_unconditionally() {
        let gate = SafetyGate::new();
        gate.set_kill_switch(true);
        assert!(gate.check("anything.at.all").is_blocked());
        assert!(gate.check("file.read").is_blocked());
    }

    #[test]
    fn test_safe_mode_blocks_denylisted_prefixes_only() {
        let gate = SafetyGate::new();
        gate.set_safe_mode(true);
        assert!(gate.check("file.write").is_blocked());
        assert!(gate.check("file.delete.recursive").is_blocked());
        assert!(gate.check("exec.command").is_blocked());
        assert!(gate.check("shell.spawn").is_blocked());
        assert!(gate.check("deploy.staging").is_blocked());
        assert_eq!(gate.check("file.read"), GateDecision::Allowed);
        assert_eq!(gate.check("events.query"), GateDecision::Allowed);
    }

    #[test]
    fn test_kill_switch_overrides_safe_mode() {
        let gate = SafetyGate::new();
        gate.set_safe_mode(true);
        gate.set_kill_switch(true);
        match gate.check("events.query") {
            GateDecision::Blocked { reason } => assert!(reason.contains("kill switch")),
            GateDecision::Allowed => panic!("kill switch must block"),
        }
    }

    #[test]
    fn test_release_restores_access() {
        let gate = SafetyGate::new();
        gate.set_kill_switch(true);
        gate.set_kill_switch(false);
        assert_eq!(gate.check("file.write"), GateDecision::Allowed);
    }
}
