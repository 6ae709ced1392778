//! An in-process `Bridge` double used to exercise channel-worker logic
//! (coalescing, tie-breaks, outbound length contracts) without shared memory
//! or a native library.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
    bridge::Bridge,
    error::WriteError,
    frame::{InboundFrame, STREAM_INBOUND},
};

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenFrame {
    pub stream: i32,
    pub series_id: u16,
    pub payload: Vec<f64>,
    pub timestamp: i64,
}

/// `Bridge::write` takes `&self` (the real `BridgeClient`'s mutation happens
/// across the FFI boundary, not through Rust's aliasing rules), so recording
/// writes in a test double needs interior mutability. State lives behind
/// `Rc` so a test can keep a handle (`FakeBridge::clone`) after moving one
/// into a `ChannelWorker`.
#[derive(Clone)]
pub struct FakeBridge {
    max_doubles: usize,
    inbound: Rc<RefCell<VecDeque<InboundFrame>>>,
    written: Rc<RefCell<Vec<WrittenFrame>>>,
}

impl FakeBridge {
    #[must_use]
    pub fn new(max_doubles: usize) -> Self {
        Self {
            max_doubles,
            inbound: Rc::new(RefCell::new(VecDeque::new())),
            written: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Queues a frame to be returned by a future `read_next(STREAM_INBOUND)`
    /// call, preserving FIFO order across pushes.
    pub fn push_inbound(&self, frame: InboundFrame) {
        self.inbound.borrow_mut().push_back(frame);
    }

    #[must_use]
    pub fn outbound_writes(&self) -> Vec<WrittenFrame> {
        self.written.borrow().clone()
    }
}

impl Bridge for FakeBridge {
    fn max_doubles(&self) -> usize {
        self.max_doubles
    }

    fn read_next(&mut self, stream: i32) -> Option<InboundFrame> {
        if stream != STREAM_INBOUND {
            return None;
        }
        self.inbound.borrow_mut().pop_front()
    }

    fn write(
        &self,
        stream: i32,
        series_id: crate::frame::SeriesId,
        payload: &[f64],
        timestamp: i64,
    ) -> Result<usize, WriteError> {
        if payload.len() > self.max_doubles {
            return Err(WriteError::TooLarge { len: payload.len(), max: self.max_doubles });
        }
        self.written.borrow_mut().push(WrittenFrame {
            stream,
            series_id: series_id.to_raw(),
            payload: payload.to_vec(),
            timestamp,
        });
        Ok(payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{STREAM_OUTBOUND, SeriesId};

    #[test]
    fn fifo_order_preserved_across_pushes() {
        let bridge = FakeBridge::new(16);
        bridge.push_inbound(InboundFrame {
            series_id: SeriesId::Update,
            payload: vec![1.0],
            timestamp: 1,
        });
        bridge.push_inbound(InboundFrame {
            series_id: SeriesId::Update,
            payload: vec![2.0],
            timestamp: 2,
        });

        let mut bridge = bridge;
        let first = Bridge::read_next(&mut bridge, STREAM_INBOUND).unwrap();
        let second = Bridge::read_next(&mut bridge, STREAM_INBOUND).unwrap();
        assert_eq!(first.timestamp, 1);
        assert_eq!(second.timestamp, 2);
        assert!(Bridge::read_next(&mut bridge, STREAM_INBOUND).is_none());
    }

    #[test]
    fn write_over_max_doubles_is_rejected() {
        let bridge = FakeBridge::new(2);
        let err = Bridge::write(&bridge, STREAM_OUTBOUND, SeriesId::FullResult, &[1.0, 2.0, 3.0], 0)
            .unwrap_err();
        assert_eq!(err, WriteError::TooLarge { len: 3, max: 2 });
    }

    #[test]
    fn write_records_the_frame() {
        let bridge = FakeBridge::new(4);
        Bridge::write(&bridge, STREAM_OUTBOUND, SeriesId::UpdateResult, &[9.0], 55).unwrap();
        let writes = bridge.outbound_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].series_id, SeriesId::UpdateResult.to_raw());
        assert_eq!(writes[0].payload, vec![9.0]);
        assert_eq!(writes[0].timestamp, 55);
    }
}
