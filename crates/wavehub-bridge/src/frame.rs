//! The on-wire frame: `(stream, series_id, payload, timestamp)`.
//!
//! The native library owns framing (atomic frame boundaries); this module
//! only pins the payload element type to IEEE-754 double, little-endian, and
//! gives the worker typed access to the semantic series IDs.

/// Inbound stream (host → hub).
pub const STREAM_INBOUND: i32 = 0;
/// Outbound stream (hub → host).
pub const STREAM_OUTBOUND: i32 = 1;

/// Semantic classes of frame, keyed by `series_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesId {
    /// 100: FULL price window, newest-first.
    Full,
    /// 101: UPDATE, newest-first, typically length 1.
    Update,
    /// 900: META, a typed parameter vector.
    Meta,
    /// 201: FULL result, newest-first.
    FullResult,
    /// 202: UPDATE result, newest-first.
    UpdateResult,
    /// 990: META acknowledgement, payload = `[count_received]`.
    MetaAck,
    /// Any series id the core does not assign meaning to; passed through for
    /// forward-compatibility with host protocol extensions.
    Other(u16),
}

impl SeriesId {
    pub const FULL_RAW: u16 = 100;
    pub const UPDATE_RAW: u16 = 101;
    pub const META_RAW: u16 = 900;
    pub const FULL_RESULT_RAW: u16 = 201;
    pub const UPDATE_RESULT_RAW: u16 = 202;
    pub const META_ACK_RAW: u16 = 990;

    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            Self::FULL_RAW => Self::Full,
            Self::UPDATE_RAW => Self::Update,
            Self::META_RAW => Self::Meta,
            Self::FULL_RESULT_RAW => Self::FullResult,
            Self::UPDATE_RESULT_RAW => Self::UpdateResult,
            Self::META_ACK_RAW => Self::MetaAck,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub fn to_raw(self) -> u16 {
        match self {
            Self::Full => Self::FULL_RAW,
            Self::Update => Self::UPDATE_RAW,
            Self::Meta => Self::META_RAW,
            Self::FullResult => Self::FULL_RESULT_RAW,
            Self::UpdateResult => Self::UPDATE_RESULT_RAW,
            Self::MetaAck => Self::META_ACK_RAW,
            Self::Other(raw) => raw,
        }
    }
}

/// One inbound frame as read off the ring: the raw series id (not yet
/// interpreted), the payload, and the host-defined timestamp.
///
/// `0 < payload.len() <= max_doubles` is the bridge's invariant;
/// `BridgeClient::read_next` only ever returns frames already upholding it.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub series_id: SeriesId,
    pub payload: Vec<f64>,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_id_round_trips_known_values() {
        for raw in [100, 101, 900, 201, 202, 990] {
            assert_eq!(SeriesId::from_raw(raw).to_raw(), raw);
        }
    }

    #[test]
    fn unknown_series_id_passes_through() {
        let id = SeriesId::from_raw(4242);
        assert_eq!(id, SeriesId::Other(4242));
        assert_eq!(id.to_raw(), 4242);
    }
}
