//! Structured log event names for the tracker.

/// Log event names attached to `tracing` records emitted by this crate.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TrackerEvent {
    OperationRecorded,
    DiffCreated,
    TrackingFailed,
    DiffsSwept,
    TrackerDisabled,
    HooksInstalled,
    HooksUninstalled,
}

impl TrackerEvent {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::OperationRecorded => "workspace_operation_recorded",
            Self::DiffCreated => "workspace_diff_created",
            Self::TrackingFailed => "workspace_tracking_failed",
            Self::DiffsSwept => "workspace_diffs_swept",
            Self::TrackerDisabled => "workspace_tracker_disabled",
            Self::HooksInstalled => "workspace_hooks_installed",
            Self::HooksUninstalled => "workspace_hooks_uninstalled",
        }
    }
}
