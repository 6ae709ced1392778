//! Channel configuration: location, shape, and the live-reload rules.

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ConfigError;

const CONFIG_PATH_ENV: &str = "WAVEHUB_CONFIG";
const APP_NAME: &str = "wavehub";

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    #[serde(alias = "transform_spec")]
    pub transform: String,
    #[serde(default)]
    pub params: toml::value::Table,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub indicator: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub capacity_bytes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    /// Interval for periodic traffic summaries; takes effect live on the
    /// next config re-read.
    #[serde(default = "default_log_every_ms")]
    pub log_every_ms: u64,
    /// Sustained-idle threshold before a channel emits a "disconnected"
    /// transition.
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,
}

fn default_log_every_ms() -> u64 {
    5_000
}

fn default_idle_threshold_ms() -> u64 {
    5_000
}

impl HubConfig {
    /// Validates channel name non-emptiness/uniqueness and that every
    /// enabled channel's `transform` resolves in the built-in registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for channel in &self.channels {
            if channel.name.is_empty() {
                return Err(ConfigError::EmptyChannelName(channel.name.clone()));
            }
            if !seen.insert(channel.name.clone()) {
                return Err(ConfigError::DuplicateChannelName(channel.name.clone()));
            }
            if channel.disabled {
                continue;
            }
            wavehub_transform::registry::build(&channel.transform).map_err(|source| {
                ConfigError::InvalidTransform { channel: channel.name.clone(), source }
            })?;
        }
        Ok(())
    }
}

/// Resolves the configuration file path by precedence: an
/// explicit path from `WAVEHUB_CONFIG`, a built-in default next to the
/// running executable, then a user-scope path.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV) {
        candidates.push(PathBuf::from(env_path));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("wavehub.toml"));
        }
    }
    if let Some(user_dir) = wavehub_utils::directories::user_config_dir(APP_NAME) {
        candidates.push(user_dir.join("wavehub.toml"));
    }
    candidates
}

/// Loads and validates the configuration from the first candidate path that
/// exists. Missing or malformed configuration is fatal.
pub fn load(explicit: Option<&Path>) -> Result<(HubConfig, PathBuf), ConfigError> {
    let candidates = resolve_config_path(explicit);
    let Some(path) = candidates.iter().find(|p| p.exists()) else {
        return Err(ConfigError::NotFound { checked: candidates });
    };
    let config = load_from_path(path)?;
    Ok((config, path.clone()))
}

fn load_from_path(path: &Path) -> Result<HubConfig, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let config: HubConfig =
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    config.validate()?;
    Ok(config)
}

/// Watches a configuration file's mtime and re-reads it on change, applying
/// a live/restart-only field split: `log_every_ms` takes effect immediately,
/// `name`/`capacity_bytes` changes are only warned about since the owning
/// worker must restart to pick them up.
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    current: HubConfig,
}

impl ConfigWatcher {
    #[must_use]
    pub fn new(path: PathBuf, current: HubConfig) -> Self {
        let last_modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        Self { path, last_modified, current }
    }

    #[must_use]
    pub fn current(&self) -> &HubConfig {
        &self.current
    }

    /// Re-reads the file if its mtime advanced. Returns `true` if
    /// `log_every_ms` changed (the only field this watcher applies live);
    /// logs a warning naming any channel whose restart-only fields changed.
    pub fn poll(&mut self) -> bool {
        let Ok(metadata) = std::fs::metadata(&self.path) else { return false };
        let Ok(modified) = metadata.modified() else { return false };
        if self.last_modified == Some(modified) {
            return false;
        }
        self.last_modified = Some(modified);

        let Ok(reloaded) = load_from_path(&self.path) else {
            warn!(path = %self.path.display(), "configuration re-read failed, keeping previous configuration");
            return false;
        };

        for old in &self.current.channels {
            if let Some(new) = reloaded.channels.iter().find(|c| c.name == old.name) {
                if new.capacity_bytes != old.capacity_bytes {
                    warn!(channel = %old.name, "capacity_bytes changed in configuration; restart required to apply");
                }
            }
        }

        let log_every_changed = reloaded.log_every_ms != self.current.log_every_ms;
        if log_every_changed {
            info!(log_every_ms = reloaded.log_every_ms, "applying live log_every_ms change");
        }
        self.current = reloaded;
        log_every_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("wavehub.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn rejects_duplicate_channel_names() {
        let config: HubConfig = toml::from_str(
            r#"
            [[channels]]
            name = "a"
            transform = "dominant_wave"

            [[channels]]
            name = "a"
            transform = "fisher"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateChannelName(_))));
    }

    #[test]
    fn rejects_unknown_transform() {
        let config: HubConfig = toml::from_str(
            r#"
            [[channels]]
            name = "a"
            transform = "not_a_transform"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTransform { .. })));
    }

    #[test]
    fn disabled_channel_skips_transform_validation() {
        let config: HubConfig = toml::from_str(
            r#"
            [[channels]]
            name = "a"
            transform = "not_a_transform"
            disabled = true
            "#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            log_every_ms = 1000

            [[channels]]
            name = "eurusd"
            transform = "dominant_wave"
            "#,
        );
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.log_every_ms, 1000);
    }

    #[test]
    fn watcher_reports_live_log_every_ms_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            log_every_ms = 1000
            [[channels]]
            name = "eurusd"
            transform = "dominant_wave"
            "#,
        );
        let initial = load_from_path(&path).unwrap();
        let mut watcher = ConfigWatcher::new(path.clone(), initial);

        std::thread::sleep(std::time::Duration::from_millis(10));
        write_config(
            &dir,
            r#"
            log_every_ms = 2000
            [[channels]]
            name = "eurusd"
            transform = "dominant_wave"
            "#,
        );
        assert!(watcher.poll());
        assert_eq!(watcher.current().log_every_ms, 2000);
    }
}
