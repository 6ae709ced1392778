//! The 14-step dominant-wave pipeline.

use std::f64::consts::PI;

use crate::dominant_wave::config::{DominantWaveConfig, OutputMode, ScalingMode};
use crate::dominant_wave::mask;
use crate::dominant_wave::prediction;
use crate::dominant_wave::ridge;
use crate::dominant_wave::state::DominantWaveState;
use crate::stft::StftPlan;

/// Everything diagnosable about the most recent `full`/`update` call,
/// carried so the worker (or a future observability surface) can inspect it
/// without re-deriving the pipeline.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    pub ridge_period_bars_end: f64,
    pub amp_end: f64,
    pub confidence: f64,
}

/// Runs the full pipeline over `chronological` prices and returns the
/// chronological output (before the newest-first reversal the `Transform`
/// boundary applies). Returns `None` on a structural failure (e.g. a
/// non-positive price under `use_log_price`, an empty band, or fewer than
/// 8 input samples) — the caller logs and returns the empty vector. The
/// caller is expected to check `config.nperseg > chronological.len()`
/// itself and fail with a distinct NOLA/window error before reaching here.
pub fn run(
    config: &DominantWaveConfig,
    state: &mut DominantWaveState,
    chronological: &[f64],
) -> Option<(Vec<f64>, DiagnosticsSnapshot)> {
    let n = chronological.len();
    if n < 8 {
        return None;
    }

    // Step 1: transform.
    let mut x = chronological.to_vec();
    if config.use_log_price {
        if x.iter().any(|&p| p <= 0.0) {
            return None;
        }
        for p in &mut x {
            *p = p.ln();
        }
    }
    let (detrended, trend) = if config.detrend_linear {
        linear_detrend(&x)
    } else {
        mean_detrend(&x)
    };

    let Some((lo, hi)) = ridge::band_bins(config) else { return None };

    let hop = config.hop();
    let plan = StftPlan::new(config.window, config.nperseg, hop, config.nfft);

    // Step 2: STFT pass 1.
    let spec1 = plan.forward(&detrended);
    if spec1.is_empty() {
        return None;
    }
    let log_p1 = ridge::log_power(&spec1);

    // Steps 4-5: harmonic score, causal ridge over pass 1.
    let scores1 = ridge::harmonic_score(&log_p1, lo, hi, config.score_harmonics);
    let ridge1 = ridge::track_ridge(&scores1, lo, config.ridge_penalty);

    // Step 6: phase-vocoder refinement.
    let (omega_inst, phi_cont) = phase_vocoder(&spec1, &ridge1, config.nfft, hop);

    // Step 7: end projection.
    let m_last = spec1.len() - 1;
    let center_last = plan.frame_center(m_last);
    let dt = (n as i64 - 1) - center_last;
    let k_ridge_last = ridge1[m_last];
    let phi_end0 = phi_cont[m_last] + omega_inst[m_last] * dt as f64;
    let raw_amp0 = scale_amplitude(config.scaling, spec1[m_last][k_ridge_last].norm(), &plan, config.fs);

    let band_power_sum: f64 = (lo..=hi).map(|k| spec1[m_last][k].norm_sqr()).sum();
    let ridge_power = spec1[m_last][k_ridge_last].norm_sqr();
    let confidence = if band_power_sum > 0.0 { ridge_power / band_power_sum } else { 0.0 };
    let amp0 = if confidence < config.min_confidence { 0.0 } else { raw_amp0 };
    let omega0 = if confidence < config.min_confidence { 0.0 } else { omega_inst[m_last] };

    // Step 8: future extension for end-centered symmetry.
    let l_need = config.nperseg / 2;
    let mut n_future = l_need;
    // padded=true is the only mode this core implements, so the "extend to
    // next multiple of hop" clause for padded=false never applies here;
    // kept as a documented no-op branch for fidelity.
    if n_future == 0 {
        n_future = hop;
    }
    let future = prediction::extend(
        config.prediction_method,
        &detrended,
        n_future,
        omega0,
        amp0,
        phi_end0,
        config.ar_order,
        config.ar_fit_len,
        config.ar_reg,
        config.mc_paths,
        config.mc_seed,
    );
    let mut extended = detrended.clone();
    extended.extend(future);

    // Step 9: STFT pass 2, recompute ridge.
    let spec2 = plan.forward(&extended);
    let log_p2 = ridge::log_power(&spec2);
    let scores2 = ridge::harmonic_score(&log_p2, lo, hi, config.score_harmonics);
    let ridge2 = ridge::track_ridge(&scores2, lo, config.ridge_penalty);

    // Step 10: Gaussian masks, tracked per frame.
    let fund_masks: Vec<Vec<f64>> = ridge2
        .iter()
        .map(|&k| mask::gaussian_mask(config.nfft / 2 + 1, k as f64, config.sigma_bins_fund, config.mask_truncate))
        .collect();
    let wave_masks: Vec<Vec<f64>> = ridge2
        .iter()
        .map(|&k| {
            mask::fundamental_and_harmonics_mask(
                config.nfft / 2 + 1,
                k as f64,
                config.sigma_bins_fund,
                config.sigma_bins_harm,
                config.mask_max_harmonic,
                config.mask_truncate,
            )
        })
        .collect();

    let full_bins = config.nfft;
    let fund_masks_full = mirror_masks(&fund_masks, full_bins);
    let wave_masks_full = mirror_masks(&wave_masks, full_bins);

    let z_fund = mask::apply_masks_per_frame(&spec2, &fund_masks_full);
    let z_wave = mask::apply_masks_per_frame(&spec2, &wave_masks_full);

    let z_base = if config.baseline_enable {
        let cutoff_bin = config.fs / config.baseline_cutoff_period_bars * config.nfft as f64 / config.fs;
        let base_mask = mask::baseline_mask(config.nfft / 2 + 1, cutoff_bin);
        let base_mask_full = mirror_mask(&base_mask, full_bins);
        Some(mask::apply_mask(&spec2, &base_mask_full))
    } else {
        None
    };

    // Step 11: ISTFT, truncate to N.
    let wave_rich_x = plan.inverse(&z_wave, n);
    let fund_x = plan.inverse(&z_fund, n);
    let baseline_x = z_base.map(|z| plan.inverse(&z, n)).unwrap_or_else(|| vec![0.0; n]);
    let _ = fund_x; // retained for future diagnostics surfaces; unused in the output formula below

    // Step 12: end-centered diagnostics via a direct end-centered FFT of the
    // extended signal, penalized against `k_prev` from the frame nearest
    // (but not past) `N-1`.
    let m_prev = ridge2.len().saturating_sub(2);
    let k_prev_diag = ridge2.get(m_prev).copied().unwrap_or(k_ridge_last);
    let k_end = scores2
        .last()
        .map(|last_scores| {
            last_scores
                .iter()
                .enumerate()
                .map(|(i, &s)| (lo + i, s - config.ridge_penalty * ((lo + i) as f64 - k_prev_diag as f64).powi(2)))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .map_or(k_prev_diag, |(k, _)| k)
        })
        .unwrap_or(k_prev_diag);
    let last_frame = spec2.last().cloned().unwrap_or_default();
    let amp_end = if last_frame.is_empty() {
        0.0
    } else {
        scale_amplitude(config.scaling, last_frame[k_end].norm(), &plan, config.fs)
    };
    let phi_end_raw = if last_frame.is_empty() { 0.0 } else { last_frame[k_end].arg() };

    // Step 13: cross-call phase continuity.
    state.advance_phase(amp_end, phi_end_raw);

    // Step 14: output.
    let out = match config.output_mode {
        OutputMode::Cycle => wave_rich_x,
        OutputMode::PriceWave => {
            let mut combined: Vec<f64> =
                (0..n).map(|i| trend[i] + baseline_x[i] + wave_rich_x[i]).collect();
            if config.use_log_price {
                for v in &mut combined {
                    *v = v.exp();
                }
            }
            combined
        }
    };

    let period_end = if k_end == 0 {
        f64::INFINITY
    } else {
        config.fs * config.nfft as f64 / k_end as f64
    };

    Some((
        out,
        DiagnosticsSnapshot { ridge_period_bars_end: period_end, amp_end, confidence },
    ))
}

/// OLS linear detrend: fit `x ~= a*i + b` in closed form, return the
/// residual and the per-sample trend line (for `price_wave` reconstruction).
fn linear_detrend(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = x.len() as f64;
    let idx: Vec<f64> = (0..x.len()).map(|i| i as f64).collect();
    let mean_i = idx.iter().sum::<f64>() / n;
    let mean_x = x.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, v) in idx.iter().zip(x.iter()) {
        num += (i - mean_i) * (v - mean_x);
        den += (i - mean_i).powi(2);
    }
    let a = if den.abs() > 1e-12 { num / den } else { 0.0 };
    let b = mean_x - a * mean_i;
    let trend: Vec<f64> = idx.iter().map(|i| a * i + b).collect();
    let detrended: Vec<f64> = x.iter().zip(trend.iter()).map(|(v, t)| v - t).collect();
    (detrended, trend)
}

fn mean_detrend(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mean = x.iter().sum::<f64>() / x.len().max(1) as f64;
    (x.iter().map(|v| v - mean).collect(), vec![mean; x.len()])
}

/// Wraps `x` into `(-pi, pi]`.
fn wrap_pi(x: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut y = (x + PI) % two_pi;
    if y < 0.0 {
        y += two_pi;
    }
    y - PI
}

/// Instantaneous angular frequency and cumulative phase per frame.
fn phase_vocoder(
    spectrogram: &[Vec<num_complex::Complex64>],
    ridge: &[usize],
    nfft: usize,
    hop: usize,
) -> (Vec<f64>, Vec<f64>) {
    let mut omega_inst = vec![0.0_f64; ridge.len()];
    let mut phi_cont = vec![0.0_f64; ridge.len()];
    let mut phi_obs_prev: Option<f64> = None;

    for t in 0..ridge.len() {
        let k = ridge[t];
        let phi_obs = spectrogram[t][k].arg();
        let omega_bin = 2.0 * PI * k as f64 / nfft as f64;

        let omega = match phi_obs_prev {
            Some(prev) => omega_bin + wrap_pi(phi_obs - prev - omega_bin * hop as f64) / hop as f64,
            None => omega_bin,
        };
        omega_inst[t] = omega;
        phi_cont[t] = if t == 0 { phi_obs } else { phi_cont[t - 1] + omega * hop as f64 };
        phi_obs_prev = Some(phi_obs);
    }
    (omega_inst, phi_cont)
}

fn scale_amplitude(mode: ScalingMode, coeff_mag: f64, plan: &StftPlan, fs: f64) -> f64 {
    match mode {
        ScalingMode::Spectrum => 2.0 * coeff_mag,
        ScalingMode::Psd => {
            let sum_w2: f64 = plan.window_samples.iter().map(|w| w * w).sum();
            let sum_w: f64 = plan.window_samples.iter().sum();
            if sum_w.abs() < 1e-12 {
                2.0 * coeff_mag
            } else {
                2.0 * coeff_mag * (fs * sum_w2).sqrt() / sum_w
            }
        }
    }
}

/// Mirrors a half-spectrum mask (`0..=nfft/2`) into a full `nfft`-length
/// mask using Hermitian symmetry, so it can be applied directly to the
/// full complex spectrogram `rustfft` produces.
fn mirror_mask(half: &[f64], full_bins: usize) -> Vec<f64> {
    let mut full = vec![0.0; full_bins];
    for (k, &v) in half.iter().enumerate() {
        full[k] = v;
        let mirror = full_bins - k;
        if mirror < full_bins && mirror != k {
            full[mirror] = v;
        }
    }
    full
}

fn mirror_masks(half_masks: &[Vec<f64>], full_bins: usize) -> Vec<Vec<f64>> {
    half_masks.iter().map(|m| mirror_mask(m, full_bins)).collect()
}
