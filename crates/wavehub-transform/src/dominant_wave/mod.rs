//! Dominant-wave STFT reference transform: isolates the
//! dominant cyclic component of a price window within a configured period
//! band and reconstructs a price-like series, without repainting history on
//! `update`.

pub mod config;
pub mod mask;
pub mod pipeline;
pub mod prediction;
pub mod ridge;
pub mod state;

use tracing::{error, warn};

use crate::{Transform, TransformError};
use config::DominantWaveConfig;
use state::DominantWaveState;

/// Input shorter than this many samples never reaches the STFT: `full`/
/// `update` return empty rather than running a pipeline that would pad the
/// window out to something numerically meaningless.
const MIN_INPUT_LEN: usize = 8;

pub struct DominantWaveTransform {
    config: DominantWaveConfig,
    state: DominantWaveState,
}

impl DominantWaveTransform {
    #[must_use]
    pub fn new(config: DominantWaveConfig) -> Self {
        Self { config, state: DominantWaveState::default() }
    }

    /// Enforces the pipeline's input-length boundaries before `pipeline::run`
    /// is invoked. Returns `Some(empty)` for a too-short window (silent) or
    /// for a window narrower than `nperseg` (logged as a NOLA/window
    /// violation); `None` when the pipeline should run.
    fn boundary_reject(&self, len: usize) -> Option<Vec<f64>> {
        if len < MIN_INPUT_LEN {
            return Some(Vec::new());
        }
        if self.config.nperseg > len {
            let err = TransformError::WindowLongerThanInput { nperseg: self.config.nperseg, len };
            error!(%err, "dominant_wave: window longer than available input");
            return Some(Vec::new());
        }
        None
    }
}

impl Default for DominantWaveTransform {
    fn default() -> Self {
        Self::new(DominantWaveConfig::default())
    }
}

impl Transform for DominantWaveTransform {
    fn meta(&mut self, vec: &[f64], _ts: i64) -> Result<(), TransformError> {
        self.config.apply_meta(vec)?;
        self.state.reset();
        Ok(())
    }

    fn full(&mut self, series_newest_first: &[f64], ts: i64) -> Vec<f64> {
        let chronological: Vec<f64> = series_newest_first.iter().rev().copied().collect();
        self.state.apply_full(&chronological, ts);
        let prices = self.state.prices.clone();

        if let Some(out) = self.boundary_reject(prices.len()) {
            return out;
        }

        match pipeline::run(&self.config, &mut self.state, &prices) {
            Some((out, diag)) => {
                if diag.confidence < self.config.min_confidence {
                    warn!(confidence = diag.confidence, "dominant_wave: ridge confidence below gate");
                }
                out.into_iter().rev().collect()
            }
            None => {
                error!("dominant_wave: full pipeline failed (invalid price or empty band)");
                Vec::new()
            }
        }
    }

    fn update(&mut self, series_newest_first: &[f64], ts: i64) -> Vec<f64> {
        if self.state.prices.is_empty() {
            return self.full(series_newest_first, ts);
        }
        let Some(&newest) = series_newest_first.first() else {
            return Vec::new();
        };
        self.state.apply_update(newest, ts, self.config.max_keep);
        let prices = self.state.prices.clone();

        if let Some(out) = self.boundary_reject(prices.len()) {
            return out;
        }

        match pipeline::run(&self.config, &mut self.state, &prices) {
            Some((out, _diag)) => {
                let chrono_out = out;
                if self.config.update_returns_full {
                    chrono_out.into_iter().rev().collect()
                } else {
                    vec![*chrono_out.last().unwrap_or(&0.0)]
                }
            }
            None => {
                error!("dominant_wave: update pipeline failed");
                Vec::new()
            }
        }
    }

    fn update_buffer_count(&self) -> usize {
        if self.config.update_returns_full { self.state.prices.len().max(1) } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> DominantWaveConfig {
        let mut c = DominantWaveConfig::default();
        c.nperseg = 16;
        c.noverlap = 8;
        c.nfft = 16;
        c.min_period_bars = 2.0;
        c.max_period_bars = 7.0;
        c.detrend_linear = false;
        c
    }

    fn sine_prices(n: usize, period: f64) -> Vec<f64> {
        (0..n).map(|i| 100.0 + 2.0 * (2.0 * std::f64::consts::PI * i as f64 / period).sin()).collect()
    }

    #[test]
    fn full_output_length_matches_input_length() {
        let mut t = DominantWaveTransform::new(small_config());
        let chronological = sine_prices(64, 5.0);
        let newest_first: Vec<f64> = chronological.iter().rev().copied().collect();
        let out = t.full(&newest_first, 0);
        assert_eq!(out.len(), newest_first.len());
    }

    #[test]
    fn update_without_prior_full_behaves_as_full() {
        let mut t = DominantWaveTransform::new(small_config());
        let chronological = sine_prices(64, 5.0);
        let newest_first: Vec<f64> = chronological.iter().rev().copied().collect();
        let out = t.update(&newest_first, 0);
        assert_eq!(out.len(), newest_first.len());
    }

    #[test]
    fn update_after_full_returns_single_value_by_default() {
        let mut t = DominantWaveTransform::new(small_config());
        let chronological = sine_prices(64, 5.0);
        let newest_first: Vec<f64> = chronological.iter().rev().copied().collect();
        t.full(&newest_first, 0);
        let out = t.update(&[101.0], 1);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn meta_v1_is_accepted_as_no_op() {
        let mut t = DominantWaveTransform::new(small_config());
        assert!(t.meta(&[1.0, 0.0, 0.0], 0).is_ok());
    }

    #[test]
    fn meta_rejects_invalid_vector() {
        let mut t = DominantWaveTransform::new(small_config());
        assert!(t.meta(&[], 0).is_err());
    }

    #[test]
    fn full_returns_empty_for_input_shorter_than_minimum() {
        let mut t = DominantWaveTransform::new(small_config());
        let newest_first = vec![100.0; 4];
        let out = t.full(&newest_first, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn full_returns_empty_when_nperseg_exceeds_input() {
        let mut config = small_config();
        config.nperseg = 32;
        config.noverlap = 16;
        config.nfft = 32;
        let mut t = DominantWaveTransform::new(config);
        let newest_first = vec![100.0; 10];
        let out = t.full(&newest_first, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn use_log_price_rejects_non_positive_prices() {
        let mut config = small_config();
        config.use_log_price = true;
        let mut t = DominantWaveTransform::new(config);
        let newest_first = vec![-1.0; 32];
        let out = t.full(&newest_first, 0);
        assert!(out.is_empty());
    }
}
