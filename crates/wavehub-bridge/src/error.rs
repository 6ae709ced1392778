use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors from `BridgeClient::open`. These abort the owning channel
/// worker's boot.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("failed to load native bridge library at {path:?}: {source}")]
    LibraryLoad { path: PathBuf, #[source] source: libloading::Error },

    #[error("native bridge library at {path:?} is missing required symbol {symbol:?}: {source}")]
    MissingSymbol { path: PathBuf, symbol: &'static str, #[source] source: libloading::Error },

    #[error("channel name {0:?} is invalid (empty or not representable as UTF-16)")]
    InvalidChannelName(String),

    #[error("capacity_bytes must be positive, got {0}")]
    NonPositiveCapacity(i64),

    #[error("native library rejected PB_Init for channel {channel:?}")]
    InitRejected { channel: String },

    #[error("bridge is not open")]
    NotOpen,
}

/// Recoverable, steady-state errors. These are logged and the worker
/// continues.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("payload length {len} exceeds max_doubles {max}")]
    TooLarge { len: usize, max: usize },
    #[error("native library rejected the write")]
    Rejected,
}
