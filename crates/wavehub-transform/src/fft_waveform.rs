//! Single-pass FFT low/band-pass reconstruction: the dominant-wave
//! pipeline's STFT/mask/ISTFT building blocks with ridge tracking disabled,
//! reusing a single static band mask each call instead of a
//! causally-tracked one.

use tracing::error;

use crate::{Transform, TransformError};
use crate::dominant_wave::mask;
use crate::dominant_wave::ridge::band_bins;
use crate::stft::StftPlan;
use crate::window::WindowKind;

pub struct FftWaveformConfig {
    pub fs: f64,
    pub window: WindowKind,
    pub nperseg: usize,
    pub noverlap: usize,
    pub nfft: usize,
    pub min_period_bars: f64,
    pub max_period_bars: f64,
    pub sigma_bins: f64,
    pub mask_truncate: f64,
}

impl Default for FftWaveformConfig {
    fn default() -> Self {
        Self {
            fs: 1.0,
            window: WindowKind::Hann,
            nperseg: 64,
            noverlap: 48,
            nfft: 64,
            min_period_bars: 8.0,
            max_period_bars: 48.0,
            sigma_bins: 1.5,
            mask_truncate: 3.0,
        }
    }
}

pub struct FftWaveformTransform {
    config: FftWaveformConfig,
}

impl FftWaveformTransform {
    #[must_use]
    pub fn new(config: FftWaveformConfig) -> Self {
        Self { config }
    }
}

impl Default for FftWaveformTransform {
    fn default() -> Self {
        Self::new(FftWaveformConfig::default())
    }
}

impl Transform for FftWaveformTransform {
    fn meta(&mut self, vec: &[f64], _ts: i64) -> Result<(), TransformError> {
        if vec.len() < 3 {
            return Err(TransformError::MetaTooShort { need: 3, got: vec.len() });
        }
        self.config.min_period_bars = vec[1];
        self.config.max_period_bars = vec[2];
        Ok(())
    }

    fn full(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        let n = series_newest_first.len();
        let chronological: Vec<f64> = series_newest_first.iter().rev().copied().collect();
        let mean = chronological.iter().sum::<f64>() / n.max(1) as f64;
        let centered: Vec<f64> = chronological.iter().map(|v| v - mean).collect();

        let dummy_config = crate::dominant_wave::config::DominantWaveConfig {
            fs: self.config.fs,
            nfft: self.config.nfft,
            min_period_bars: self.config.min_period_bars,
            max_period_bars: self.config.max_period_bars,
            ..crate::dominant_wave::config::DominantWaveConfig::default()
        };
        let Some((lo, hi)) = band_bins(&dummy_config) else {
            error!("fft_waveform: band is empty for the configured period range");
            return Vec::new();
        };

        let hop = self.config.nperseg.saturating_sub(self.config.noverlap).max(1);
        let plan = StftPlan::new(self.config.window, self.config.nperseg, hop, self.config.nfft);
        let spec = plan.forward(&centered);
        if spec.is_empty() {
            return Vec::new();
        }

        let center_bin = (lo + hi) as f64 / 2.0;
        let half_bins = self.config.nfft / 2 + 1;
        let half_mask = mask::gaussian_mask(half_bins, center_bin, self.config.sigma_bins, self.config.mask_truncate);
        let mut band_mask = vec![0.0; self.config.nfft];
        for (k, &v) in half_mask.iter().enumerate() {
            band_mask[k] = v;
            let mirror = self.config.nfft - k;
            if mirror < self.config.nfft && mirror != k {
                band_mask[mirror] = v;
            }
        }
        let masked = mask::apply_mask(&spec, &band_mask);
        let recon = plan.inverse(&masked, n);

        recon.iter().map(|v| v + mean).rev().collect()
    }

    fn update(&mut self, series_newest_first: &[f64], ts: i64) -> Vec<f64> {
        let out = self.full(series_newest_first, ts);
        vec![*out.last().unwrap_or(&0.0)]
    }
}
