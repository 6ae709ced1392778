//! Supervisor: locates and validates configuration,
//! constructs a bridge client and channel worker per enabled channel,
//! starts them, waits for a termination signal, then joins workers within a
//! bounded timeout and abandons stragglers.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use tracing::{error, info, warn};
use wavehub_bridge::BridgeClient;

use crate::{
    config::{self, ChannelConfig, ConfigWatcher, HubConfig},
    error::ConfigError,
    shutdown::ShutdownScope,
    worker::ChannelWorker,
};

pub struct SupervisorOptions {
    pub dll_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub default_capacity_bytes: i64,
    pub join_timeout: Duration,
    pub config_poll_interval: Duration,
    /// `--channel`/`--capacity`: run a single ad-hoc channel instead of
    /// reading the channel configuration file. The ad-hoc channel always
    /// runs `dominant_wave` with default parameters, since the CLI surface
    /// has no flag to name a transform.
    pub ad_hoc_channel: Option<String>,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            dll_path: wavehub_bridge::default_library_search_name(),
            config_path: None,
            default_capacity_bytes: 1 << 20,
            join_timeout: Duration::from_secs(2),
            config_poll_interval: Duration::from_secs(1),
            ad_hoc_channel: None,
        }
    }
}

/// Runs every enabled channel until a termination signal arrives. With
/// `ad_hoc_channel` set, a single in-memory channel is run and the
/// configuration file is never consulted; otherwise configuration is loaded
/// and re-polled at `config_poll_interval`. Returns `Ok(())` on clean
/// shutdown. A configuration load failure, or a bridge-open failure for any
/// enabled channel, is fatal: already-started workers are signaled to stop
/// and joined before the error is returned, and the caller maps it to a
/// non-zero process exit code.
pub fn run(options: SupervisorOptions) -> Result<(), ConfigError> {
    let (config, path) = match &options.ad_hoc_channel {
        Some(name) => (ad_hoc_config(name), None),
        None => {
            let (config, path) = config::load(options.config_path.as_deref())?;
            info!(path = %path.display(), channels = config.channels.len(), "loaded configuration");
            (config, Some(path))
        }
    };

    thread::scope(|scope| {
        let shutdown = ShutdownScope::new(scope);
        let mut handles = Vec::new();
        let log_every_ms = Arc::new(AtomicU64::new(config.log_every_ms));

        for channel in &config.channels {
            if channel.disabled {
                info!(channel = %channel.name, "channel disabled, skipping");
                continue;
            }
            let capacity_bytes = channel.capacity_bytes.unwrap_or(options.default_capacity_bytes);
            let transform = match wavehub_transform::registry::build(&channel.transform) {
                Ok(t) => t,
                Err(err) => {
                    error!(channel = %channel.name, %err, "failed to build transform, skipping channel");
                    continue;
                }
            };
            let bridge = match BridgeClient::open(&options.dll_path, &channel.name, capacity_bytes) {
                Ok(b) => b,
                Err(source) => {
                    error!(channel = %channel.name, %source, "failed to open bridge, aborting supervisor");
                    shutdown.stop_flag.store(1, Ordering::Relaxed);
                    join_with_timeout(handles, options.join_timeout);
                    return Err(ConfigError::BridgeOpen { channel: channel.name.clone(), source });
                }
            };
            let idle_threshold = Duration::from_millis(config.idle_threshold_ms);
            let worker = ChannelWorker::new(
                channel.name.clone(),
                bridge,
                transform,
                idle_threshold,
                Arc::clone(&log_every_ms),
            );
            let stop_flag = Arc::clone(&shutdown.stop_flag);
            let name = channel.name.clone();
            info!(channel = %name, "starting channel worker");
            handles.push((name, shutdown.spawn(move || worker.run(&stop_flag))));
        }

        match path {
            Some(path) => {
                let mut watcher = ConfigWatcher::new(path, config);
                while !shutdown.stop_requested() {
                    thread::sleep(options.config_poll_interval);
                    if watcher.poll() {
                        log_every_ms.store(watcher.current().log_every_ms, Ordering::Relaxed);
                    }
                }
            }
            None => {
                while !shutdown.stop_requested() {
                    thread::sleep(options.config_poll_interval);
                }
            }
        }

        join_with_timeout(handles, options.join_timeout);
        Ok(())
    })
}

fn ad_hoc_config(channel_name: &str) -> HubConfig {
    HubConfig {
        channels: vec![ChannelConfig {
            name: channel_name.to_string(),
            transform: wavehub_transform::registry::DOMINANT_WAVE.to_string(),
            params: toml::value::Table::new(),
            disabled: false,
            indicator: None,
            color: None,
            capacity_bytes: None,
        }],
        log_every_ms: 5_000,
        idle_threshold_ms: 5_000,
    }
}

fn join_with_timeout(handles: Vec<(String, thread::ScopedJoinHandle<'_, ()>)>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    let mut pending = handles;
    while !pending.is_empty() && Instant::now() < deadline {
        pending.retain(|(_, handle)| !handle.is_finished());
        thread::sleep(Duration::from_millis(20));
    }
    for (name, handle) in pending {
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            warn!(channel = %name, "channel worker did not stop within the join timeout, abandoning");
        }
    }
}
