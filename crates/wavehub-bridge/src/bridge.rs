use crate::{
    error::WriteError,
    frame::{InboundFrame, SeriesId},
};

/// The contract a channel worker needs from its bridge: non-blocking FIFO
/// read of the inbound stream, write of the outbound stream, and a fixed
/// per-frame payload cap. `BridgeClient` is the native-library-backed
/// implementation; `fake::FakeBridge` is an in-process test double that
/// upholds the same ordering and capacity rules without any shared memory,
/// so worker logic (coalescing, tie-breaks, outbound contracts) can be
/// exercised without a host process.
pub trait Bridge {
    fn max_doubles(&self) -> usize;
    fn read_next(&mut self, stream: i32) -> Option<InboundFrame>;
    fn write(
        &self,
        stream: i32,
        series_id: SeriesId,
        payload: &[f64],
        timestamp: i64,
    ) -> Result<usize, WriteError>;
}

impl Bridge for crate::client::BridgeClient {
    fn max_doubles(&self) -> usize {
        self.max_doubles()
    }

    fn read_next(&mut self, stream: i32) -> Option<InboundFrame> {
        self.read_next(stream)
    }

    fn write(
        &self,
        stream: i32,
        series_id: SeriesId,
        payload: &[f64],
        timestamp: i64,
    ) -> Result<usize, WriteError> {
        self.write(stream, series_id, payload, timestamp)
    }
}
