//! Recursive least-squares adaptive linear predictor: the
//! streaming counterpart to the dominant-wave's closed-form OLS detrend,
//! updating its coefficients one sample at a time rather than refitting
//! over the whole window.

use crate::{Transform, TransformError};

pub struct OnlineRlsConfig {
    pub order: usize,
    pub forgetting_factor: f64,
    pub delta: f64,
}

impl Default for OnlineRlsConfig {
    fn default() -> Self {
        Self { order: 4, forgetting_factor: 0.99, delta: 100.0 }
    }
}

pub struct OnlineRlsTransform {
    config: OnlineRlsConfig,
    history: Vec<f64>,
    weights: Vec<f64>,
    /// Inverse correlation matrix `P`, row-major, `order x order`.
    p_inv: Vec<f64>,
}

impl OnlineRlsTransform {
    #[must_use]
    pub fn new(config: OnlineRlsConfig) -> Self {
        let order = config.order.max(1);
        let mut p_inv = vec![0.0; order * order];
        for i in 0..order {
            p_inv[i * order + i] = config.delta;
        }
        Self { config, history: Vec::new(), weights: vec![0.0; order], p_inv }
    }

    fn order(&self) -> usize {
        self.weights.len()
    }

    fn regressor(&self) -> Option<Vec<f64>> {
        let order = self.order();
        if self.history.len() < order {
            return None;
        }
        let n = self.history.len();
        Some((0..order).map(|k| self.history[n - 1 - k]).collect())
    }

    fn predict_next(&self) -> f64 {
        match self.regressor() {
            Some(phi) => self.weights.iter().zip(phi.iter()).map(|(w, x)| w * x).sum(),
            None => *self.history.last().unwrap_or(&0.0),
        }
    }

    /// One RLS update step given the realized target `y_t` and its
    /// regressor `phi` (the `order` most recent prior samples).
    fn rls_update(&mut self, phi: &[f64], y: f64) {
        let order = self.order();
        let lambda = self.config.forgetting_factor;

        // k = P*phi / (lambda + phi'*P*phi)
        let mut p_phi = vec![0.0; order];
        for i in 0..order {
            let mut sum = 0.0;
            for j in 0..order {
                sum += self.p_inv[i * order + j] * phi[j];
            }
            p_phi[i] = sum;
        }
        let denom = lambda + phi.iter().zip(p_phi.iter()).map(|(a, b)| a * b).sum::<f64>();
        if denom.abs() < 1e-12 {
            return;
        }
        let gain: Vec<f64> = p_phi.iter().map(|v| v / denom).collect();

        let pred: f64 = self.weights.iter().zip(phi.iter()).map(|(w, x)| w * x).sum();
        let err = y - pred;
        for i in 0..order {
            self.weights[i] += gain[i] * err;
        }

        let mut new_p = vec![0.0; order * order];
        for i in 0..order {
            for j in 0..order {
                new_p[i * order + j] = (self.p_inv[i * order + j] - gain[i] * p_phi[j]) / lambda;
            }
        }
        self.p_inv = new_p;
    }
}

impl Default for OnlineRlsTransform {
    fn default() -> Self {
        Self::new(OnlineRlsConfig::default())
    }
}

impl Transform for OnlineRlsTransform {
    fn meta(&mut self, vec: &[f64], _ts: i64) -> Result<(), TransformError> {
        if vec.len() < 2 {
            return Err(TransformError::MetaTooShort { need: 2, got: vec.len() });
        }
        let order = (vec[1] as usize).max(1);
        *self = Self::new(OnlineRlsConfig { order, ..OnlineRlsConfig::default() });
        Ok(())
    }

    fn full(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        self.history.clear();
        let order = self.order();
        self.weights = vec![0.0; order];
        let mut p_inv = vec![0.0; order * order];
        for i in 0..order {
            p_inv[i * order + i] = self.config.delta;
        }
        self.p_inv = p_inv;

        let chronological: Vec<f64> = series_newest_first.iter().rev().copied().collect();
        let mut out = Vec::with_capacity(chronological.len());
        for &price in &chronological {
            out.push(self.predict_next());
            if let Some(phi) = self.regressor() {
                self.rls_update(&phi, price);
            }
            self.history.push(price);
        }
        out.into_iter().rev().collect()
    }

    fn update(&mut self, series_newest_first: &[f64], _ts: i64) -> Vec<f64> {
        let Some(&newest) = series_newest_first.first() else { return Vec::new() };
        if let Some(phi) = self.regressor() {
            self.rls_update(&phi, newest);
        }
        self.history.push(newest);
        vec![self.predict_next()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_on_constant_series() {
        let mut t = OnlineRlsTransform::default();
        let newest_first = vec![50.0; 40];
        t.full(&newest_first, 0);
        let out = t.update(&[50.0], 1);
        assert!((out[0] - 50.0).abs() < 1.0, "expected prediction near 50.0, got {}", out[0]);
    }

    #[test]
    fn full_output_length_matches_input() {
        let mut t = OnlineRlsTransform::default();
        let newest_first: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 0.5).collect();
        let out = t.full(&newest_first, 0);
        assert_eq!(out.len(), newest_first.len());
    }
}
