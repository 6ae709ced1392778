//! End-to-end channel-worker scenarios driven against `FakeBridge`: no real
//! shared memory or native library involved, only the
//! coalescing/tie-break/idle-transition contract a host would observe.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;

use wavehub_bridge::fake::FakeBridge;
use wavehub_bridge::{InboundFrame, SeriesId};
use wavehub_core::worker::ChannelWorker;
use wavehub_transform::registry;

fn worker(bridge: FakeBridge, transform_id: &str) -> ChannelWorker<FakeBridge> {
    let transform = registry::build(transform_id).unwrap();
    ChannelWorker::new("eurusd".into(), bridge, transform, Duration::from_millis(50), Arc::new(AtomicU64::new(0)))
}

fn sine_prices(n: usize, period: f64) -> Vec<f64> {
    (0..n).map(|i| 100.0 + 2.0 * (2.0 * std::f64::consts::PI * i as f64 / period).sin()).collect()
}

#[test]
fn smoke_full_then_update_round_trip() {
    let bridge = FakeBridge::new(4096);
    let handle = bridge.clone();
    let chronological = sine_prices(64, 5.0);
    let newest_first: Vec<f64> = chronological.iter().rev().copied().collect();
    handle.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: newest_first, timestamp: 1 });

    let mut w = worker(bridge, registry::DOMINANT_WAVE);
    w.run_one_cycle();
    let writes = handle.outbound_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].series_id, SeriesId::FullResult.to_raw());

    handle.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![101.0], timestamp: 2 });
    w.run_one_cycle();
    let writes = handle.outbound_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].series_id, SeriesId::UpdateResult.to_raw());
}

#[test]
fn multiple_metas_in_one_cycle_keep_only_the_latest() {
    let bridge = FakeBridge::new(1024);
    let handle = bridge.clone();
    handle.push_inbound(InboundFrame { series_id: SeriesId::Meta, payload: vec![1.0, 0.0, 0.0], timestamp: 1 });
    handle.push_inbound(InboundFrame { series_id: SeriesId::Meta, payload: vec![1.0, 0.0, 0.0], timestamp: 2 });

    let mut w = worker(bridge, registry::ONLINE_RLS);
    w.run_one_cycle();

    let writes = handle.outbound_writes();
    assert_eq!(writes.len(), 1, "only the latest META in the cycle should be acked");
    assert_eq!(writes[0].series_id, SeriesId::MetaAck.to_raw());
}

#[test]
fn update_does_not_repaint_prior_full_output() {
    let bridge = FakeBridge::new(4096);
    let handle = bridge.clone();
    let chronological = sine_prices(64, 5.0);
    let newest_first: Vec<f64> = chronological.iter().rev().copied().collect();
    handle.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: newest_first, timestamp: 1 });

    let mut w = worker(bridge, registry::DOMINANT_WAVE);
    w.run_one_cycle();
    let full_result = handle.outbound_writes()[0].payload.clone();

    handle.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![101.0], timestamp: 2 });
    w.run_one_cycle();
    let update_result = handle.outbound_writes()[1].payload.clone();

    // dominant_wave's default config returns a single value per UPDATE, not
    // a repainted window, so the prior FULL output is untouched in length.
    assert_eq!(update_result.len(), 1);
    assert_eq!(full_result.len(), 64);
}

#[test]
fn idle_then_reconnect_transition() {
    let bridge = FakeBridge::new(1024);
    let handle = bridge.clone();
    let mut w = worker(bridge, registry::ONLINE_RLS);
    w.set_idle_threshold(Duration::from_millis(1));

    std::thread::sleep(Duration::from_millis(5));
    w.run_one_cycle();
    assert!(!w.is_connected());

    handle.push_inbound(InboundFrame { series_id: SeriesId::Update, payload: vec![1.0], timestamp: 1 });
    w.run_one_cycle();
    assert!(w.is_connected());
}

#[test]
fn invalid_log_price_band_yields_no_outbound_write() {
    let bridge = FakeBridge::new(4096);
    // v2 META turning use_log_price on; non-positive prices are then
    // invalid, so the transform should emit nothing rather than writing a
    // bogus result (transform failures are swallowed at the worker
    // boundary). META and FULL in the same cycle apply META first.
    let meta = vec![
        2.0, 0.0, 0.0, 0.0, 0.0, // proto, in_sec, out_sec, out_bars, send_bars
        2.0, 7.0, // min/max_period_bars
        16.0, 8.0, 16.0, // nperseg, noverlap, nfft
        0.5, 2.0, 2.0, // ridge_penalty, score_harmonics, mask_max_harmonic
        1.0, 1.5, // sigma_bins_fund, sigma_bins_harm
        0.0, 96.0, 0.0, // baseline_enable, baseline_cutoff_period_bars, min_confidence
        0.0, 4.0, 32.0, 1e-3, // prediction_method, ar_order, ar_fit_len, ar_reg
        0.0, 0.0, // predict_wave_horizon, output_mode
        1.0, 0.0, 0.0, // use_log_price, detrend_linear, update_returns_full
    ];
    let handle = bridge.clone();
    handle.push_inbound(InboundFrame { series_id: SeriesId::Meta, payload: meta, timestamp: 0 });
    let newest_first = vec![-1.0; 32];
    handle.push_inbound(InboundFrame { series_id: SeriesId::Full, payload: newest_first, timestamp: 1 });

    let mut w = worker(bridge, registry::DOMINANT_WAVE);
    w.run_one_cycle();
    let writes = handle.outbound_writes();
    assert_eq!(writes.len(), 1, "only the META ack should be written, FULL result suppressed");
    assert_eq!(writes[0].series_id, SeriesId::MetaAck.to_raw());
}
