//! Rate-of-change spike detector over the FFT power spectrum's dominant bin
//! magnitude: a lightweight companion to the dominant-wave
//! ridge selection, reusing its band-selection logic.

use tracing::error;

use crate::{Transform, TransformError};
use crate::dominant_wave::config::DominantWaveConfig;
use crate::dominant_wave::ridge::band_bins;
use crate::stft::StftPlan;
use crate::window::WindowKind;

pub struct VrocFftSpikeConfig {
    pub fs: f64,
    pub window: WindowKind,
    pub nperseg: usize,
    pub nfft: usize,
    pub min_period_bars: f64,
    pub max_period_bars: f64,
    pub roc_lookback: usize,
}

impl Default for VrocFftSpikeConfig {
    fn default() -> Self {
        Self {
            fs: 1.0,
            window: WindowKind::Hann,
            nperseg: 64,
            nfft: 64,
            min_period_bars: 8.0,
            max_period_bars: 48.0,
            roc_lookback: 5,
        }
    }
}

pub struct VrocFftSpikeTransform {
    config: VrocFftSpikeConfig,
    prices: Vec<f64>,
    magnitude_history: Vec<f64>,
}

impl VrocFftSpikeTransform {
    #[must_use]
    pub fn new(config: VrocFftSpikeConfig) -> Self {
        Self { config, prices: Vec::new(), magnitude_history: Vec::new() }
    }

    fn dominant_bin_magnitude(&self, chronological: &[f64]) -> Option<f64> {
        let dummy_config = DominantWaveConfig {
            fs: self.config.fs,
            nfft: self.config.nfft,
            min_period_bars: self.config.min_period_bars,
            max_period_bars: self.config.max_period_bars,
            ..DominantWaveConfig::default()
        };
        let (lo, hi) = band_bins(&dummy_config)?;
        if chronological.len() < self.config.nperseg {
            return None;
        }

        let plan = StftPlan::new(self.config.window, self.config.nperseg, self.config.nperseg, self.config.nfft);
        let spec = plan.forward(chronological);
        let last = spec.last()?;
        (lo..=hi).map(|k| last[k].norm()).fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }
}

impl Default for VrocFftSpikeTransform {
    fn default() -> Self {
        Self::new(VrocFftSpikeConfig::default())
    }
}

impl Transform for VrocFftSpikeTransform {
    fn meta(&mut self, vec: &[f64], _ts: i64) -> Result<(), TransformError> {
        if vec.len() < 2 {
            return Err(TransformError::MetaTooShort { need: 2, got: vec.len() });
        }
        self.config.roc_lookback = (vec[1] as usize).max(1);
        Ok(())
    }

    fn full(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        self.prices = series_newest_first.iter().rev().copied().collect();
        self.magnitude_history.clear();

        let Some(mag) = self.dominant_bin_magnitude(&self.prices) else {
            error!("vroc_fft_spike: insufficient history or empty band");
            return vec![0.0; series_newest_first.len()];
        };
        self.magnitude_history.push(mag);
        let mut out = vec![0.0; series_newest_first.len()];
        *out.last_mut().unwrap() = 0.0;
        out
    }

    fn update(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        let Some(&newest) = series_newest_first.first() else { return Vec::new() };
        self.prices.push(newest);

        let Some(mag) = self.dominant_bin_magnitude(&self.prices) else {
            return vec![0.0];
        };
        self.magnitude_history.push(mag);
        if self.magnitude_history.len() > self.config.roc_lookback + 1 {
            self.magnitude_history.remove(0);
        }

        let spike = match self.magnitude_history.first() {
            Some(&base) if base > 1e-12 => (mag - base) / base,
            _ => 0.0,
        };
        vec![spike]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_zero_with_insufficient_history() {
        let mut t = VrocFftSpikeTransform::default();
        t.full(&vec![100.0; 8], 0);
        let out = t.update(&[101.0], 1);
        assert_eq!(out, vec![0.0]);
    }
}
