//! Gaussian fundamental/harmonic/baseline masks.

use num_complex::Complex64;

/// Builds a per-bin Gaussian mask centered on `center_bin` with standard
/// deviation `sigma_bins`, truncated to zero beyond `truncate` sigmas.
#[must_use]
pub fn gaussian_mask(n_bins: usize, center_bin: f64, sigma_bins: f64, truncate: f64) -> Vec<f64> {
    if sigma_bins <= 0.0 {
        let mut m = vec![0.0; n_bins];
        let idx = center_bin.round().clamp(0.0, (n_bins.saturating_sub(1)) as f64) as usize;
        if idx < n_bins {
            m[idx] = 1.0;
        }
        return m;
    }
    (0..n_bins)
        .map(|k| {
            let d = (k as f64 - center_bin) / sigma_bins;
            if d.abs() > truncate { 0.0 } else { (-0.5 * d * d).exp() }
        })
        .collect()
}

/// Fundamental mask plus the max over harmonic masks up to
/// `mask_max_harmonic`, clamped away from Nyquist.
#[must_use]
pub fn fundamental_and_harmonics_mask(
    n_bins: usize,
    fund_bin: f64,
    sigma_fund: f64,
    sigma_harm: f64,
    max_harmonic: u8,
    truncate: f64,
) -> Vec<f64> {
    let mut mask = gaussian_mask(n_bins, fund_bin, sigma_fund, truncate);
    let nyquist = (n_bins.saturating_sub(1)) as f64;
    for m in 2..=max_harmonic.max(1) {
        let center = fund_bin * f64::from(m);
        if center > nyquist {
            continue;
        }
        let harm = gaussian_mask(n_bins, center, sigma_harm, truncate);
        for (a, b) in mask.iter_mut().zip(harm.iter()) {
            *a = a.max(*b);
        }
    }
    mask
}

/// Low-pass baseline mask: unity below the cutoff bin, zero above, with a
/// one-bin Gaussian taper at the edge to avoid a hard spectral cut.
#[must_use]
pub fn baseline_mask(n_bins: usize, cutoff_bin: f64) -> Vec<f64> {
    (0..n_bins)
        .map(|k| {
            if (k as f64) <= cutoff_bin {
                1.0
            } else {
                let d = k as f64 - cutoff_bin;
                (-0.5 * d * d).exp()
            }
        })
        .collect()
}

/// Applies a per-bin mask (broadcast across all frames) to a spectrogram.
#[must_use]
pub fn apply_mask(spectrogram: &[Vec<Complex64>], mask: &[f64]) -> Vec<Vec<Complex64>> {
    spectrogram
        .iter()
        .map(|frame| frame.iter().zip(mask.iter()).map(|(z, m)| z * m).collect())
        .collect()
}

/// Applies one mask per frame, tracking the ridge bin through time rather
/// than a single static mask (so the isolated band follows the ridge as it
/// drifts across the analysis window).
#[must_use]
pub fn apply_masks_per_frame(
    spectrogram: &[Vec<Complex64>],
    masks: &[Vec<f64>],
) -> Vec<Vec<Complex64>> {
    spectrogram
        .iter()
        .zip(masks.iter())
        .map(|(frame, mask)| frame.iter().zip(mask.iter()).map(|(z, m)| z * m).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_mask_peaks_at_center() {
        let mask = gaussian_mask(16, 5.0, 1.0, 3.0);
        let (peak_idx, _) =
            mask.iter().enumerate().max_by(|a, b| a.1.partial_cmp(b.1).unwrap()).unwrap();
        assert_eq!(peak_idx, 5);
    }

    #[test]
    fn harmonics_mask_covers_second_harmonic() {
        let mask = fundamental_and_harmonics_mask(32, 4.0, 1.0, 1.0, 2, 3.0);
        assert!(mask[8] > 0.1, "expected energy near the second harmonic bin");
    }

    #[test]
    fn baseline_mask_passes_low_bins() {
        let mask = baseline_mask(16, 4.0);
        assert!((mask[0] - 1.0).abs() < 1e-9);
        assert!(mask[15] < mask[0]);
    }
}
