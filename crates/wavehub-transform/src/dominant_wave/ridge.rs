//! Band selection, harmonic scoring, and causal ridge tracking.

use num_complex::Complex64;

use crate::dominant_wave::config::DominantWaveConfig;

/// Inclusive bin range `[lo, hi]` within the band `[fs/max_period,
/// fs/min_period]`, excluding the DC bin. `None` if the band is empty.
pub fn band_bins(config: &DominantWaveConfig) -> Option<(usize, usize)> {
    let df = config.fs / config.nfft as f64;
    let f_low = config.fs / config.max_period_bars;
    let f_high = config.fs / config.min_period_bars;
    let nyquist_bin = config.nfft / 2;

    let lo = (f_low / df).ceil().max(1.0) as usize;
    let hi = ((f_high / df).floor() as usize).min(nyquist_bin);
    if lo > hi {
        None
    } else {
        Some((lo, hi))
    }
}

/// `logP(k, t) = log(|Z(k,t)|^2 + eps)` for every bin/frame.
#[must_use]
pub fn log_power(spectrogram: &[Vec<Complex64>]) -> Vec<Vec<f64>> {
    const EPS: f64 = 1e-20;
    spectrogram.iter().map(|frame| frame.iter().map(|z| (z.norm_sqr() + EPS).ln()).collect()).collect()
}

/// Harmonic score at `(k, t)`: the fundamental's log-power plus a weighted
/// sum of harmonic log-powers, aliased (out-of-Nyquist) harmonics
/// contributing zero.
#[must_use]
pub fn harmonic_score(log_p: &[Vec<f64>], lo: usize, hi: usize, score_harmonics: u8) -> Vec<Vec<f64>> {
    let nyquist = log_p.first().map_or(0, Vec::len).saturating_sub(1);
    log_p
        .iter()
        .map(|frame| {
            (lo..=hi)
                .map(|k| {
                    let mut score = frame[k];
                    for m in 2..=score_harmonics.max(1) {
                        let harm_bin = (f64::from(m) * k as f64).round() as usize;
                        if harm_bin <= nyquist {
                            score += DominantWaveConfig::harmonic_weight(m) * frame[harm_bin];
                        }
                    }
                    score
                })
                .collect()
        })
        .collect()
}

/// Causal ridge: at `t=0` the arg-max bin over the band; for `t>0`, the
/// arg-max of `score - penalty*(k-k_prev)^2`, ties broken by lower `k`
/// Returns the selected bin index for every frame.
#[must_use]
pub fn track_ridge(scores: &[Vec<f64>], lo: usize, penalty: f64) -> Vec<usize> {
    let mut ridge = Vec::with_capacity(scores.len());
    let mut k_prev: Option<usize> = None;

    for frame_scores in scores {
        let mut best_k = lo;
        let mut best_val = f64::NEG_INFINITY;
        for (i, &s) in frame_scores.iter().enumerate() {
            let k = lo + i;
            let val = match k_prev {
                Some(prev) => s - penalty * ((k as f64) - (prev as f64)).powi(2),
                None => s,
            };
            if val > best_val + 1e-15 || ((val - best_val).abs() <= 1e-15 && k < best_k) {
                best_val = val;
                best_k = k;
            }
        }
        ridge.push(best_k);
        k_prev = Some(best_k);
    }
    ridge
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> DominantWaveConfig {
        let mut c = DominantWaveConfig::default();
        c.nfft = 64;
        c.fs = 1.0;
        c.min_period_bars = 4.0;
        c.max_period_bars = 32.0;
        c
    }

    #[test]
    fn band_bins_excludes_dc_and_respects_period_range() {
        let config = make_config();
        let (lo, hi) = band_bins(&config).unwrap();
        assert!(lo >= 1);
        assert!(hi <= config.nfft / 2);
        assert!(lo <= hi);
    }

    #[test]
    fn ridge_prefers_higher_score_and_penalizes_jumps() {
        let scores = vec![vec![0.0, 5.0, 0.0], vec![5.0, 0.0, 0.0]];
        let ridge = track_ridge(&scores, 1, 10.0);
        assert_eq!(ridge[0], 2);
        // heavy penalty keeps ridge near k_prev=2 despite frame 2's peak at k=1
        assert_eq!(ridge[1], 2);
    }
}
