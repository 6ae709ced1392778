use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    error::{BridgeError, WriteError},
    frame::{InboundFrame, SeriesId, STREAM_INBOUND},
    native::NativeBridge,
};

/// Wraps the native shared-memory library for one channel.
///
/// Owns the ring handle and a single scratch buffer sized to `max_doubles`.
/// Never shared across channel workers — each worker owns its
/// `BridgeClient` exclusively.
pub struct BridgeClient {
    native: NativeBridge,
    channel: String,
    max_doubles: usize,
    scratch: Vec<f64>,
    warned_legacy_read: bool,
}

impl BridgeClient {
    /// Loads the native library and opens `channel` with the given ring
    /// capacity. Fatal for the owning worker on failure.
    pub fn open(
        library_path: &Path,
        channel: &str,
        capacity_bytes: i64,
    ) -> Result<Self, BridgeError> {
        if channel.is_empty() {
            return Err(BridgeError::InvalidChannelName(channel.to_string()));
        }
        if capacity_bytes <= 0 {
            return Err(BridgeError::NonPositiveCapacity(capacity_bytes));
        }

        let native = NativeBridge::load(library_path)?;

        let mut channel_wide: Vec<u16> = channel.encode_utf16().collect();
        channel_wide.push(0); // native contract expects a null-terminated UTF-16 string

        let rc = native.init(&channel_wide, capacity_bytes);
        if rc != 1 {
            return Err(BridgeError::InitRejected { channel: channel.to_string() });
        }

        let max_doubles = native.max_doubles();
        if max_doubles <= 0 {
            return Err(BridgeError::InitRejected { channel: channel.to_string() });
        }
        let max_doubles = max_doubles as usize;

        if !native.prefers_fifo() {
            warn!(
                channel,
                "PB_ReadNextDoubles not found in native library, degrading to PB_ReadDoubles \
                 (ordering guarantees weaken across reads of the same stream)"
            );
        }

        Ok(Self {
            native,
            channel: channel.to_string(),
            max_doubles,
            scratch: vec![0.0; max_doubles],
            warned_legacy_read: false,
        })
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    #[must_use]
    pub fn max_doubles(&self) -> usize {
        self.max_doubles
    }

    /// Non-blocking FIFO read of the oldest unread frame on `stream`.
    /// Returns `None` if no frame is available.
    pub fn read_next(&mut self, stream: i32) -> Option<InboundFrame> {
        let mut sid: i32 = 0;
        let mut got: i32 = 0;
        let mut ts: i64 = 0;

        let (code, was_fifo) =
            self.native.read_next(stream, &mut sid, &mut self.scratch, &mut got, &mut ts);

        if code != 1 || got <= 0 {
            return None;
        }
        if !was_fifo && !self.warned_legacy_read {
            debug!(channel = %self.channel, "reading via legacy PB_ReadDoubles path");
            self.warned_legacy_read = true;
        }

        let got = got as usize;
        let payload = self.scratch[..got.min(self.scratch.len())].to_vec();
        Some(InboundFrame { series_id: SeriesId::from_raw(sid as u16), payload, timestamp: ts })
    }

    /// Writes `payload` on `stream` as `series_id`. Returns the number of
    /// elements written; a too-large payload or a ring rejection is a
    /// recoverable, logged error (empty return, not a panic).
    pub fn write(
        &self,
        stream: i32,
        series_id: SeriesId,
        payload: &[f64],
        timestamp: i64,
    ) -> Result<usize, WriteError> {
        if payload.len() > self.max_doubles {
            return Err(WriteError::TooLarge { len: payload.len(), max: self.max_doubles });
        }

        let written =
            self.native.write_doubles(stream, i32::from(series_id.to_raw()), payload, timestamp);
        if written <= 0 {
            return Err(WriteError::Rejected);
        }
        Ok(written as usize)
    }

    /// Releases the ring. Idempotent: the native `PB_Close` contract is
    /// idempotent, and repeated calls from this side are harmless.
    pub fn close(&self) {
        self.native.close();
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[must_use]
pub fn default_library_search_name() -> PathBuf {
    PathBuf::from(if cfg!(windows) { "bridge.dll" } else { "libbridge.so" })
}

// `read_next` always targets the inbound stream from the worker's
// perspective; re-exported here so callers don't need to import the
// constant separately when they only ever read stream 0.
pub const INBOUND: i32 = STREAM_INBOUND;
