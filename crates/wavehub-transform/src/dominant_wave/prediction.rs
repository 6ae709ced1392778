//! Future-sample extension methods: generate `n_future` synthetic samples
//! appended to the detrended signal so an end-centered STFT frame exists.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::dominant_wave::config::PredictionMethod;

/// Extends `detrended` (chronological, already log/detrend-transformed) by
/// `n_future` samples using the configured method. `ridge_freq`/`ridge_amp`/
/// `ridge_phase` are the last observed ridge estimate (angular frequency in
/// rad/sample, amplitude, phase), used by the `phase` and `hybrid` methods.
pub fn extend(
    method: PredictionMethod,
    detrended: &[f64],
    n_future: usize,
    ridge_freq: f64,
    ridge_amp: f64,
    ridge_phase: f64,
    ar_order: usize,
    ar_fit_len: usize,
    ar_reg: f64,
    mc_paths: usize,
    mc_seed: u64,
) -> Vec<f64> {
    if n_future == 0 {
        return Vec::new();
    }
    match method {
        PredictionMethod::Phase => extend_phase(n_future, ridge_freq, ridge_amp, ridge_phase),
        PredictionMethod::Ar => extend_ar(detrended, n_future, ar_order, ar_fit_len, ar_reg),
        PredictionMethod::Hybrid => {
            let phase = extend_phase(n_future, ridge_freq, ridge_amp, ridge_phase);
            let ar = extend_ar(detrended, n_future, ar_order, ar_fit_len, ar_reg);
            phase.iter().zip(ar.iter()).map(|(p, a)| 0.5 * (p + a)).collect()
        }
        PredictionMethod::GbmMc => {
            extend_gbm_mc(detrended, n_future, mc_paths, mc_seed)
        }
    }
}

/// Pure sinusoidal continuation at the last ridge's frequency/amplitude/phase.
fn extend_phase(n_future: usize, freq: f64, amp: f64, phase0: f64) -> Vec<f64> {
    (1..=n_future).map(|i| amp * (phase0 + freq * i as f64).sin()).collect()
}

/// Closed-form ridge-regularized least-squares AR(p) fit over the last
/// `fit_len` samples, then recursive forecast.
fn extend_ar(signal: &[f64], n_future: usize, order: usize, fit_len: usize, reg: f64) -> Vec<f64> {
    let order = order.max(1);
    if signal.len() <= order {
        return vec![*signal.last().unwrap_or(&0.0); n_future];
    }
    let fit_len = fit_len.min(signal.len()).max(order + 1);
    let tail = &signal[signal.len() - fit_len..];

    let n_eq = tail.len() - order;
    let mut xtx = vec![vec![0.0_f64; order]; order];
    let mut xty = vec![0.0_f64; order];
    for t in 0..n_eq {
        let target = tail[t + order];
        let lags: Vec<f64> = (0..order).map(|k| tail[t + order - 1 - k]).collect();
        for i in 0..order {
            xty[i] += lags[i] * target;
            for j in 0..order {
                xtx[i][j] += lags[i] * lags[j];
            }
        }
    }
    for i in 0..order {
        xtx[i][i] += reg;
    }

    let coeffs = solve_linear(&xtx, &xty).unwrap_or_else(|| vec![0.0; order]);

    let mut history: Vec<f64> = tail.to_vec();
    let mut out = Vec::with_capacity(n_future);
    for _ in 0..n_future {
        let n = history.len();
        let mut next = 0.0;
        for (k, c) in coeffs.iter().enumerate() {
            next += c * history[n - 1 - k];
        }
        history.push(next);
        out.push(next);
    }
    out
}

/// Gaussian-elimination solve of a small symmetric positive-(semi)definite
/// system, sized by AR order (typically single digits).
fn solve_linear(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut m: Vec<Vec<f64>> = a.iter().cloned().collect();
    let mut rhs = b.to_vec();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| m[r1][col].abs().partial_cmp(&m[r2][col].abs()).unwrap())?;
        m.swap(col, pivot_row);
        rhs.swap(col, pivot_row);
        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            return None;
        }
        for row in (col + 1)..n {
            let factor = m[row][col] / pivot;
            for c in col..n {
                m[row][c] -= factor * m[col][c];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0_f64; n];
    for row in (0..n).rev() {
        let mut sum = rhs[row];
        for c in (row + 1)..n {
            sum -= m[row][c] * x[c];
        }
        x[row] = sum / m[row][row];
    }
    Some(x)
}

/// Monte-Carlo geometric-Brownian-motion extension: estimates drift/vol from
/// log-returns of the tail, averages `mc_paths` simulated continuations
/// (deterministic per `mc_seed`, so `full`/`update` stay reproducible across
/// calls with identical inputs).
fn extend_gbm_mc(signal: &[f64], n_future: usize, mc_paths: usize, mc_seed: u64) -> Vec<f64> {
    if signal.len() < 2 {
        return vec![*signal.last().unwrap_or(&0.0); n_future];
    }
    let returns: Vec<f64> = signal.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len().max(1) as f64;
    let sigma = var.sqrt();

    let mut rng = StdRng::seed_from_u64(mc_seed);
    let paths = mc_paths.max(1);
    let mut accum = vec![0.0_f64; n_future];
    for _ in 0..paths {
        let mut last = *signal.last().unwrap();
        for slot in accum.iter_mut() {
            last += mean + sigma * standard_normal(&mut rng);
            *slot += last;
        }
    }
    accum.iter().map(|s| s / paths as f64).collect()
}

/// Standard-normal sample via Box-Muller over two uniform draws.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random_range(1e-12..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_extension_matches_sinusoid() {
        let out = extend_phase(4, 0.5, 2.0, 0.0);
        assert_eq!(out.len(), 4);
        assert!((out[0] - 2.0 * 0.5_f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn ar_extension_tracks_constant_signal() {
        let signal = vec![1.0; 40];
        let out = extend_ar(&signal, 5, 2, 16, 1e-3);
        for v in out {
            assert!((v - 1.0).abs() < 1e-2, "expected near-constant continuation, got {v}");
        }
    }

    #[test]
    fn gbm_mc_is_deterministic_for_fixed_seed() {
        let signal: Vec<f64> = (0..32).map(|i| i as f64 * 0.1).collect();
        let a = extend_gbm_mc(&signal, 8, 32, 7);
        let b = extend_gbm_mc(&signal, 8, 32, 7);
        assert_eq!(a, b);
    }
}
