//! Streaming transforms over price windows, plugged into a channel worker.
//!
//! A [`Transform`] is a stateful, single-threaded object invoked only by its
//! owning worker: `meta` interprets a parameter vector,
//! `full` recomputes from scratch, `update` advances incrementally. `full`
//! and `update` never raise: on error they log via `tracing::error!` and
//! return an empty vector, which the worker treats as "no output this
//! cycle". `meta` is the one method that can raise: a rejected parameter
//! vector suppresses the acknowledgment entirely rather than emitting one
//! for unapplied parameters.

pub mod dominant_wave;
pub mod error;
pub mod fisher;
pub mod fft_waveform;
pub mod online_rls;
pub mod registry;
mod stft;
mod window;
pub mod vroc_fft_spike;

pub use error::TransformError;

/// A stateful streaming transform over a chronological price window.
///
/// Implementations own all history needed across calls (price buffers,
/// phase-continuity state); the worker passes only the current frame.
pub trait Transform: Send {
    /// Interpret a parameter vector (series id 900). Idempotent for
    /// identical inputs; may invalidate cached state. On success the worker
    /// acks the full received vector length on series 990; on error the
    /// worker logs and emits no ack at all.
    fn meta(&mut self, vec: &[f64], ts: i64) -> Result<(), TransformError>;

    /// Recompute from scratch over `series_newest_first`. The returned
    /// vector's length equals the input length, newest-first. Returns an
    /// empty vector on error (logged, not raised).
    fn full(&mut self, series_newest_first: &[f64], ts: i64) -> Vec<f64>;

    /// Incremental step. Returned length is 1 unless the transform declares
    /// a larger buffer count via [`Transform::update_buffer_count`].
    /// Returns an empty vector on error (logged, not raised).
    fn update(&mut self, series_newest_first: &[f64], ts: i64) -> Vec<f64>;

    /// Declared `update` output length when the transform is multi-buffer.
    /// Defaults to 1.
    fn update_buffer_count(&self) -> usize {
        1
    }
}
