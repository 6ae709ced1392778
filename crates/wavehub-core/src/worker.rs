//! Channel worker: one drain-and-coalesce loop per channel, running on its
//! own thread, generic over the bridge so tests can swap in
//! `wavehub_bridge::fake::FakeBridge`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, error, info};
use wavehub_bridge::{Bridge, InboundFrame, STREAM_INBOUND, STREAM_OUTBOUND, SeriesId};
use wavehub_transform::Transform;

/// One inbound cycle's coalesced view: the latest META, the concatenated
/// FULL chunks (arrival order), and the latest UPDATE observed while
/// draining.
#[derive(Default)]
struct Coalesced {
    meta: Option<(Vec<f64>, i64)>,
    full: Option<(Vec<f64>, i64)>,
    update: Option<(Vec<f64>, i64)>,
    saw_any: bool,
}

impl Coalesced {
    fn absorb(&mut self, frame: InboundFrame) {
        self.saw_any = true;
        match frame.series_id {
            SeriesId::Meta => {
                self.meta = Some((frame.payload, frame.timestamp));
            }
            SeriesId::Full => {
                let entry = self.full.get_or_insert_with(|| (Vec::new(), frame.timestamp));
                entry.0.extend(frame.payload);
                entry.1 = frame.timestamp;
            }
            SeriesId::Update => {
                self.update = Some((frame.payload, frame.timestamp));
            }
            other => {
                debug!(?other, "ignoring frame with unrecognized series id");
            }
        }
    }
}

/// Counts since the last periodic traffic summary.
#[derive(Default)]
struct TrafficCounters {
    inbound_frames: u64,
    outbound_frames: u64,
}

pub struct ChannelWorker<B: Bridge> {
    name: String,
    bridge: B,
    transform: Box<dyn Transform>,
    idle_threshold: Duration,
    connected: bool,
    last_inbound_at: Instant,
    log_every_ms: Arc<AtomicU64>,
    last_summary_at: Instant,
    traffic: TrafficCounters,
}

impl<B: Bridge> ChannelWorker<B> {
    #[must_use]
    pub fn new(
        name: String,
        bridge: B,
        transform: Box<dyn Transform>,
        idle_threshold: Duration,
        log_every_ms: Arc<AtomicU64>,
    ) -> Self {
        Self {
            name,
            bridge,
            transform,
            idle_threshold,
            connected: true,
            last_inbound_at: Instant::now(),
            log_every_ms,
            last_summary_at: Instant::now(),
            traffic: TrafficCounters::default(),
        }
    }

    pub fn set_idle_threshold(&mut self, idle_threshold: Duration) {
        self.idle_threshold = idle_threshold;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Runs until `stop_flag` is set, finishing the in-progress drain cycle
    /// first (a cooperative stop, not a mid-cycle abort).
    pub fn run(mut self, stop_flag: &Arc<AtomicUsize>) {
        while stop_flag.load(Ordering::Relaxed) == 0 {
            self.run_one_cycle();
        }
        info!(channel = %self.name, "channel worker stopping");
    }

    /// Runs a single drain-and-coalesce cycle; exposed separately so tests
    /// can step the worker deterministically against a fake bridge.
    pub fn run_one_cycle(&mut self) {
        let mut cycle = Coalesced::default();
        while let Some(frame) = self.bridge.read_next(STREAM_INBOUND) {
            self.traffic.inbound_frames += 1;
            cycle.absorb(frame);
        }

        if !cycle.saw_any {
            if self.connected && self.last_inbound_at.elapsed() >= self.idle_threshold {
                self.connected = false;
                info!(channel = %self.name, "channel disconnected: no inbound frames within idle threshold");
            }
            self.maybe_log_summary();
            thread::sleep(Duration::from_millis(1));
            return;
        }

        self.last_inbound_at = Instant::now();
        if !self.connected {
            self.connected = true;
            info!(channel = %self.name, "channel reconnected");
        }

        if let Some((meta, ts)) = cycle.meta {
            self.apply_meta(&meta, ts);
        }

        // FULL supersedes a same-cycle UPDATE.
        if let Some((full, ts)) = cycle.full {
            self.apply_full(&full, ts);
        } else if let Some((update, ts)) = cycle.update {
            self.apply_update(&update, ts);
        }

        self.maybe_log_summary();
    }

    /// Emits a traffic summary (counts since the last one) once
    /// `log_every_ms` has elapsed, then resets the counters. A zero interval
    /// disables the summary entirely.
    fn maybe_log_summary(&mut self) {
        let interval_ms = self.log_every_ms.load(Ordering::Relaxed);
        if interval_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(interval_ms);
        if self.last_summary_at.elapsed() < interval {
            return;
        }
        info!(
            channel = %self.name,
            inbound_frames = self.traffic.inbound_frames,
            outbound_frames = self.traffic.outbound_frames,
            "traffic summary"
        );
        self.traffic = TrafficCounters::default();
        self.last_summary_at = Instant::now();
    }

    fn apply_meta(&mut self, payload: &[f64], ts: i64) {
        debug!(channel = %self.name, len = payload.len(), "processing inbound META frame");
        match self.transform.meta(payload, ts) {
            Ok(()) => {
                let ack = vec![payload.len() as f64];
                match self.bridge.write(STREAM_OUTBOUND, SeriesId::MetaAck, &ack, ts) {
                    Ok(_) => {
                        self.traffic.outbound_frames += 1;
                        debug!(channel = %self.name, len = payload.len(), "wrote META ack");
                    }
                    Err(err) => error!(channel = %self.name, %err, "failed to write META ack"),
                }
            }
            Err(err) => {
                error!(channel = %self.name, %err, "meta vector rejected, no ack emitted");
            }
        }
    }

    fn apply_full(&mut self, payload: &[f64], ts: i64) {
        debug!(channel = %self.name, len = payload.len(), "processing inbound FULL frame");
        let out = self.transform.full(payload, ts);
        if out.is_empty() {
            return;
        }
        match self.bridge.write(STREAM_OUTBOUND, SeriesId::FullResult, &out, ts) {
            Ok(_) => {
                self.traffic.outbound_frames += 1;
                debug!(channel = %self.name, len = out.len(), "wrote FULL result");
            }
            Err(err) => error!(channel = %self.name, %err, "failed to write FULL result"),
        }
    }

    fn apply_update(&mut self, payload: &[f64], ts: i64) {
        debug!(channel = %self.name, len = payload.len(), "processing inbound UPDATE frame");
        let out = self.transform.update(payload, ts);
        if out.is_empty() {
            return;
        }
        match self.bridge.write(STREAM_OUTBOUND, SeriesId::UpdateResult, &out, ts) {
            Ok(_) => {
                self.traffic.outbound_frames += 1;
                debug!(channel = %self.name, len = out.len(), "wrote UPDATE result");
            }
            Err(err) => error!(channel = %self.name, %err, "failed to write UPDATE result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavehub_bridge::fake::FakeBridge;
    use wavehub_transform::registry;

    fn worker(bridge: FakeBridge) -> ChannelWorker<FakeBridge> {
        let transform = registry::build(registry::ONLINE_RLS).unwrap();
        // 0 disables the periodic summary so tests see only the writes they triggered.
        ChannelWorker::new("test".into(), bridge, transform, Duration::from_millis(50), Arc::new(AtomicU64::new(0)))
    }

    #[test]
    fn full_write_length_matches_input() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame {
            series_id: SeriesId::Full,
            payload: vec![1.0, 2.0, 3.0, 4.0],
            timestamp: 10,
        });
        let mut w = worker(bridge);
        w.run_one_cycle();
        let writes = w.bridge.outbound_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].series_id, SeriesId::FullResult.to_raw());
        assert_eq!(writes[0].payload.len(), 4);
    }

    #[test]
    fn meta_acks_with_received_length_not_fields_consumed() {
        // online_rls only reads vec[1] (one field beyond the protocol slot),
        // but the ack must reflect the full received vector length.
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame {
            series_id: SeriesId::Meta,
            payload: vec![1.0, 2.0, 3.0, 4.0],
            timestamp: 5,
        });
        let mut w = worker(bridge);
        w.run_one_cycle();
        let writes = w.bridge.outbound_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].series_id, SeriesId::MetaAck.to_raw());
        assert_eq!(writes[0].payload, vec![4.0]);
    }

    #[test]
    fn meta_rejected_by_transform_emits_no_ack() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Meta, payload: vec![], timestamp: 5 });
        let mut w = worker(bridge);
        w.run_one_cycle();
        assert!(w.bridge.outbound_writes().is_empty());
    }

    #[test]
    fn full_wins_over_update_in_same_cycle() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![9.0], timestamp: 1 });
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: vec![1.0, 2.0], timestamp: 2 });
        let mut w = worker(bridge);
        w.run_one_cycle();
        let writes = w.bridge.outbound_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].series_id, SeriesId::FullResult.to_raw());
    }

    #[test]
    fn full_chunks_are_concatenated_in_arrival_order() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: vec![1.0, 2.0], timestamp: 1 });
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: vec![3.0, 4.0], timestamp: 1 });
        let mut w = worker(bridge);
        w.run_one_cycle();
        let writes = w.bridge.outbound_writes();
        assert_eq!(writes[0].payload.len(), 4);
    }

    #[test]
    fn empty_cycle_does_not_write() {
        let bridge = FakeBridge::new(1024);
        let mut w = worker(bridge);
        w.run_one_cycle();
        assert!(w.bridge.outbound_writes().is_empty());
    }

    #[test]
    fn traffic_summary_resets_counters_after_interval() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![1.0], timestamp: 1 });
        let mut w = ChannelWorker::new(
            "test".into(),
            bridge,
            registry::build(registry::ONLINE_RLS).unwrap(),
            Duration::from_millis(50),
            Arc::new(AtomicU64::new(1)),
        );
        std::thread::sleep(Duration::from_millis(5));
        w.run_one_cycle();
        assert_eq!(w.traffic.inbound_frames, 0);
        assert_eq!(w.traffic.outbound_frames, 0);
    }

    #[test]
    fn traffic_summary_disabled_by_zero_interval() {
        let bridge = FakeBridge::new(1024);
        bridge.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![1.0], timestamp: 1 });
        let mut w = worker(bridge);
        w.run_one_cycle();
        assert_eq!(w.traffic.inbound_frames, 1);
        assert_eq!(w.traffic.outbound_frames, 1);
    }

    #[test]
    fn idle_threshold_marks_disconnected() {
        let bridge = FakeBridge::new(1024);
        let mut w = worker(bridge);
        w.set_idle_threshold(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(5));
        w.run_one_cycle();
        assert!(!w.connected);
    }
}
