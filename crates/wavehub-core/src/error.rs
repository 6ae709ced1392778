use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup errors: missing/malformed configuration,
/// duplicate channel names, or a channel naming a transform the registry
/// cannot resolve.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration file found (checked {checked:?})")]
    NotFound { checked: Vec<PathBuf> },

    #[error("failed to read configuration file {path:?}: {source}")]
    Read { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse configuration file {path:?}: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },

    #[error("channel name {0:?} is empty")]
    EmptyChannelName(String),

    #[error("duplicate channel name {0:?}")]
    DuplicateChannelName(String),

    #[error("channel {channel:?}: {source}")]
    InvalidTransform { channel: String, #[source] source: wavehub_transform::TransformError },

    #[error("channel {channel:?}: failed to open bridge: {source}")]
    BridgeOpen { channel: String, #[source] source: wavehub_bridge::BridgeError },
}
