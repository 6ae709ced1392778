//! Dominant-wave configuration and meta vector parsing.

use crate::TransformError;
use crate::window::WindowKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionMethod {
    Phase,
    Ar,
    Hybrid,
    GbmMc,
}

impl PredictionMethod {
    #[must_use]
    pub fn from_tag(tag: i64) -> Self {
        match tag {
            1 => Self::Ar,
            2 => Self::Hybrid,
            3 => Self::GbmMc,
            _ => Self::Phase,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Cycle,
    PriceWave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMode {
    Spectrum,
    Psd,
}

#[derive(Debug, Clone)]
pub struct DominantWaveConfig {
    pub fs: f64,
    pub use_log_price: bool,
    pub detrend_linear: bool,

    pub window: WindowKind,
    pub nperseg: usize,
    pub noverlap: usize,
    pub nfft: usize,

    pub min_period_bars: f64,
    pub max_period_bars: f64,

    pub ridge_penalty: f64,
    pub score_harmonics: u8,

    pub sigma_bins_fund: f64,
    pub sigma_bins_harm: f64,
    pub mask_max_harmonic: u8,
    pub mask_truncate: f64,

    pub baseline_enable: bool,
    pub baseline_cutoff_period_bars: f64,

    pub prediction_method: PredictionMethod,
    pub ar_order: usize,
    pub ar_fit_len: usize,
    pub ar_reg: f64,
    pub mc_paths: usize,
    pub mc_seed: u64,
    pub predict_wave_horizon: usize,

    pub output_mode: OutputMode,
    pub scaling: ScalingMode,
    pub update_returns_full: bool,

    pub min_confidence: f64,

    /// Upper bound on the retained price buffer once a FULL window has
    /// seeded it; sustained UPDATE traffic without an intervening FULL
    /// trims the oldest bar rather than growing unbounded.
    pub max_keep: usize,
}

impl Default for DominantWaveConfig {
    fn default() -> Self {
        Self {
            fs: 1.0,
            use_log_price: false,
            detrend_linear: true,
            window: WindowKind::Hann,
            nperseg: 64,
            noverlap: 48,
            nfft: 64,
            min_period_bars: 8.0,
            max_period_bars: 48.0,
            ridge_penalty: 0.5,
            score_harmonics: 2,
            sigma_bins_fund: 1.0,
            sigma_bins_harm: 1.5,
            mask_max_harmonic: 2,
            mask_truncate: 3.0,
            baseline_enable: false,
            baseline_cutoff_period_bars: 96.0,
            prediction_method: PredictionMethod::Phase,
            ar_order: 4,
            ar_fit_len: 32,
            ar_reg: 1e-3,
            mc_paths: 64,
            mc_seed: 0xDEAD_BEEF,
            predict_wave_horizon: 0,
            output_mode: OutputMode::Cycle,
            scaling: ScalingMode::Spectrum,
            update_returns_full: false,
            min_confidence: 0.0,
            max_keep: 4_096,
        }
    }
}

impl DominantWaveConfig {
    #[must_use]
    pub fn hop(&self) -> usize {
        self.nperseg.saturating_sub(self.noverlap)
    }

    /// Validates the cross-field invariants required before a `meta`/`full`
    /// call may proceed.
    pub fn validate(&self) -> Result<(), TransformError> {
        let hop = self.hop();
        if hop == 0 {
            return Err(TransformError::InvalidParameter {
                name: "noverlap",
                reason: "hop = nperseg - noverlap must be positive".into(),
            });
        }
        if self.nfft < self.nperseg {
            return Err(TransformError::InvalidParameter {
                name: "nfft",
                reason: format!("nfft ({}) must be >= nperseg ({})", self.nfft, self.nperseg),
            });
        }
        if !(self.min_period_bars > 0.0 && self.min_period_bars < self.max_period_bars) {
            return Err(TransformError::InvalidParameter {
                name: "min_period_bars",
                reason: "must be positive and less than max_period_bars".into(),
            });
        }
        if self.baseline_enable && self.baseline_cutoff_period_bars <= self.max_period_bars {
            return Err(TransformError::InvalidParameter {
                name: "baseline_cutoff_period_bars",
                reason: "must exceed max_period_bars when baseline is enabled".into(),
            });
        }
        if !(1..=4).contains(&self.score_harmonics) {
            return Err(TransformError::InvalidParameter {
                name: "score_harmonics",
                reason: "must be in [1, 4]".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TransformError::InvalidParameter {
                name: "min_confidence",
                reason: "must be in [0, 1]".into(),
            });
        }
        let window_samples = self.window.samples(self.nperseg);
        if !crate::window::nola_ok(&window_samples, hop) {
            return Err(TransformError::NolaViolation { window: self.window.name(), hop });
        }
        Ok(())
    }

    /// Weight of the `m`-th harmonic in the ridge score
    /// (`w_m = 0.5/m` for `m >= 2`).
    #[must_use]
    pub fn harmonic_weight(m: u8) -> f64 {
        0.5 / f64::from(m)
    }

    /// Parses a META payload (series id 900). Index 0 is the protocol tag;
    /// v1 (length 3) is a legacy no-op accepted only for logging, v2
    /// (length >= 24) populates the full field table.
    /// Returns the number of doubles consumed.
    pub fn apply_meta(&mut self, vec: &[f64]) -> Result<usize, TransformError> {
        if vec.is_empty() {
            return Err(TransformError::MetaTooShort { need: 1, got: 0 });
        }
        let proto = vec[0] as i64;
        match proto {
            1 => {
                if vec.len() < 3 {
                    return Err(TransformError::MetaTooShort { need: 3, got: vec.len() });
                }
                Ok(3)
            }
            2 => {
                if vec.len() < 24 {
                    return Err(TransformError::MetaTooShort { need: 24, got: vec.len() });
                }
                self.min_period_bars = vec[5];
                self.max_period_bars = vec[6];
                self.nperseg = vec[7] as usize;
                self.noverlap = vec[8] as usize;
                self.nfft = vec[9] as usize;
                self.ridge_penalty = vec[10];
                self.score_harmonics = vec[11] as u8;
                self.mask_max_harmonic = vec[12] as u8;
                self.sigma_bins_fund = vec[13];
                self.sigma_bins_harm = vec[14];
                self.baseline_enable = vec[15] != 0.0;
                self.baseline_cutoff_period_bars = vec[16];
                self.min_confidence = vec[17];
                self.prediction_method = PredictionMethod::from_tag(vec[18] as i64);
                self.ar_order = vec[19] as usize;
                self.ar_fit_len = vec[20] as usize;
                self.ar_reg = vec[21];
                self.predict_wave_horizon = vec[22] as usize;
                self.output_mode = if vec[23] as i64 == 1 { OutputMode::PriceWave } else { OutputMode::Cycle };

                let mut consumed = 24;
                if vec.len() >= 27 {
                    self.use_log_price = vec[24] != 0.0;
                    self.detrend_linear = vec[25] != 0.0;
                    self.update_returns_full = vec[26] != 0.0;
                    consumed = 27;
                }
                self.validate()?;
                Ok(consumed)
            }
            other => Err(TransformError::UnsupportedProto(other)),
        }
    }
}
