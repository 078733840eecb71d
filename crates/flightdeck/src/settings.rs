//! Runtime settings loader for the Flightdeck core.
//!
//! Loads and merges YAML settings files:
//! - System defaults, then
//! - User overrides
//!
//! Merge precedence is user over system. Missing or unparsable files are
//! warned about and ignored; every field falls back to the documented
//! default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "conf/flightdeck.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "flightdeck/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";

/// Top-level settings document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightdeckSettings {
    /// Persistence root shared by the store (`runs.json`, `events/`) and
    /// the tracker (`diffs/`). `None` keeps everything memory-only.
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub redaction: RedactionSettings,
    #[serde(default)]
    pub safety: SafetySettings,
}

/// Event store settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    pub max_events_per_run: Option<usize>,
    pub max_runs_in_memory: Option<usize>,
    pub flush_interval_secs: Option<u64>,
}

/// Workspace tracker settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceSettings {
    pub enabled: Option<bool>,
    pub max_operations: Option<usize>,
    pub diff_max_age_days: Option<u64>,
}

/// Task graph builder settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphSettings {
    pub auto_layout: Option<bool>,
    pub include_raw_events: Option<bool>,
}

/// Redaction settings. Lists replace the defaults entirely when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedactionSettings {
    pub sensitive_keys: Option<Vec<String>>,
    pub value_patterns: Option<Vec<String>>,
}

/// Safety gate settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SafetySettings {
    pub safe_mode: Option<bool>,
}

impl FlightdeckSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            data_dir: overlay.data_dir.or(self.data_dir),
            store: self.store.merge(overlay.store),
            workspace: self.workspace.merge(overlay.workspace),
            graph: self.graph.merge(overlay.graph),
            redaction: self.redaction.merge(overlay.redaction),
            safety: self.safety.merge(overlay.safety),
        }
    }
}

impl StoreSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            max_events_per_run: overlay.max_events_per_run.or(self.max_events_per_run),
            max_runs_in_memory: overlay.max_runs_in_memory.or(self.max_runs_in_memory),
            flush_interval_secs: overlay.flush_interval_secs.or(self.flush_interval_secs),
        }
    }
}

impl WorkspaceSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            enabled: overlay.enabled.or(self.enabled),
            max_operations: overlay.max_operations.or(self.max_operations),
            diff_max_age_days: overlay.diff_max_age_days.or(self.diff_max_age_days),
        }
    }
}

impl GraphSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            auto_layout: overlay.auto_layout.or(self.auto_layout),
            include_raw_events: overlay.include_raw_events.or(self.include_raw_events),
        }
    }
}

impl RedactionSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            sensitive_keys: overlay.sensitive_keys.or(self.sensitive_keys),
            value_patterns: overlay.value_patterns.or(self.value_patterns),
        }
    }
}

impl SafetySettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            safe_mode: overlay.safe_mode.or(self.safe_mode),
        }
    }
}

/// Load merged settings from the default locations (user overrides
/// system).
#[must_use]
pub fn load_settings() -> FlightdeckSettings {
    let root = project_root();
    let system_path = root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH);
    let user_path = resolve_config_home(&root).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH);
    load_settings_from_paths(&system_path, &user_path)
}

fn project_root() -> PathBuf {
    std::env::var("FLIGHTDECK_ROOT")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn resolve_config_home(root: &Path) -> PathBuf {
    std::env::var("FLIGHTDECK_CONFIG_HOME")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_HOME_RELATIVE_PATH))
}

/// Load merged settings from explicit paths (user overrides system).
#[must_use]
pub fn load_settings_from_paths(system: &Path, user: &Path) -> FlightdeckSettings {
    load_one(system).merge(load_one(user))
}

fn load_one(path: &Path) -> FlightdeckSettings {
    if !path.exists() {
        return FlightdeckSettings::default();
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to read settings file; ignoring"
            );
            return FlightdeckSettings::default();
        }
    };
    match serde_yaml::from_str::<FlightdeckSettings>(&raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to parse settings yaml; ignoring file"
            );
            FlightdeckSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_with_missing_sections_falls_back_to_defaults() {
        let settings: FlightdeckSettings =
            serde_yaml::from_str("store:\n  max_events_per_run: 50\n").unwrap();
        assert_eq!(settings.store.max_events_per_run, Some(50));
        assert!(settings.workspace.enabled.is_none());
        assert!(settings.data_dir.is_none());
    }

    #[test]
    fn test_user_overrides_system() {
        let system: FlightdeckSettings = serde_yaml::from_str(
            "data_dir: /srv/flightdeck\nstore:\n  max_events_per_run: 100\n  max_runs_in_memory: 10\n",
        )
        .unwrap();
        let user: FlightdeckSettings =
            serde_yaml::from_str("store:\n  max_events_per_run: 500\n").unwrap();
        let merged = system.merge(user);
        assert_eq!(merged.store.max_events_per_run, Some(500));
        assert_eq!(merged.store.max_runs_in_memory, Some(10));
        assert_eq!(merged.data_dir, Some(PathBuf::from("/srv/flightdeck")));
    }

    #[test]
    fn test_missing_files_yield_defaults() {
        let settings = load_settings_from_paths(
            Path::new("/nonexistent/system.yaml"),
            Path::new("/nonexistent/user.yaml"),
        );
        assert!(settings.store.max_events_per_run.is_none());
    }
}
