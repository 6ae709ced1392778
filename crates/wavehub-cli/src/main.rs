use std::{path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, ValueEnum};
use tracing::error;
use wavehub_core::supervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Cpu,
    Gpu,
}

/// Shared-memory compute hub: drains trading-terminal channels, runs the
/// configured transform, and writes results back over the same bridge.
#[derive(Parser)]
#[command(name = "wavehub", version)]
struct Cli {
    /// Path to the native bridge library (defaults to a platform-specific
    /// name resolved from the working directory / library search path).
    #[arg(long)]
    dll: Option<PathBuf>,

    /// Run a single ad-hoc channel instead of reading the channel
    /// configuration file. Requires `--capacity`.
    #[arg(long)]
    channel: Option<String>,

    /// Ring capacity in bytes for `--channel`.
    #[arg(long)]
    capacity: Option<i64>,

    /// Path to the channel configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Polling cadence, in milliseconds, for the configuration watcher.
    #[arg(long, default_value_t = 1000)]
    sleep_ms: u64,

    #[arg(long)]
    verbose: bool,

    #[arg(long, value_enum, default_value_t = Backend::Cpu)]
    backend: Backend,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.backend == Backend::Gpu {
        error!("GPU backend is not implemented by this build; rerun with --backend cpu");
        return ExitCode::from(2);
    }

    if cli.channel.is_some() && cli.capacity.is_none() {
        error!("--channel requires --capacity");
        return ExitCode::from(2);
    }

    let mut options = supervisor::SupervisorOptions {
        config_path: cli.config,
        config_poll_interval: Duration::from_millis(cli.sleep_ms),
        ad_hoc_channel: cli.channel,
        ..supervisor::SupervisorOptions::default()
    };
    if let Some(dll) = cli.dll {
        options.dll_path = dll;
    }
    if let Some(capacity) = cli.capacity {
        options.default_capacity_bytes = capacity;
    }

    match supervisor::run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "configuration failed to load");
            ExitCode::from(2)
        }
    }
}
