//! Short-time Fourier transform / inverse, built on `rustfft`.
//!
//! Frames are centered (`boundary = zeros`, `padded = true`): the signal is
//! padded by `nperseg / 2` zeros on each side so the first and last frames
//! are centered on the first and last samples.

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::window::WindowKind;

pub struct StftPlan {
    pub window: WindowKind,
    pub window_samples: Vec<f64>,
    pub nperseg: usize,
    pub hop: usize,
    pub nfft: usize,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

impl StftPlan {
    #[must_use]
    pub fn new(window: WindowKind, nperseg: usize, hop: usize, nfft: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(nfft);
        let ifft = planner.plan_fft_inverse(nfft);
        Self { window, window_samples: window.samples(nperseg), nperseg, hop, nfft, fft, ifft }
    }

    /// Sample index (in the unpadded signal) that frame `m` is centered on.
    #[must_use]
    pub fn frame_center(&self, m: usize) -> i64 {
        (m * self.hop) as i64 - (self.nperseg / 2) as i64
    }

    /// Forward STFT. Returns `spectrogram[frame][bin]`, one column per hop
    /// across the zero-padded, centered signal.
    #[must_use]
    pub fn forward(&self, signal: &[f64]) -> Vec<Vec<Complex64>> {
        let pad = self.nperseg / 2;
        let mut padded = vec![0.0_f64; pad + signal.len() + pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let n_frames = if padded.len() >= self.nperseg {
            (padded.len() - self.nperseg) / self.hop + 1
        } else {
            0
        };

        let mut out = Vec::with_capacity(n_frames);
        for m in 0..n_frames {
            let start = m * self.hop;
            let mut buf = vec![Complex64::new(0.0, 0.0); self.nfft];
            for (i, &w) in self.window_samples.iter().enumerate() {
                buf[i] = Complex64::new(padded[start + i] * w, 0.0);
            }
            self.fft.process(&mut buf);
            out.push(buf);
        }
        out
    }

    /// Inverse STFT via overlap-add, matching the padding of [`forward`],
    /// truncated to `out_len` samples of the unpadded signal.
    #[must_use]
    pub fn inverse(&self, spectrogram: &[Vec<Complex64>], out_len: usize) -> Vec<f64> {
        let pad = self.nperseg / 2;
        let total_len = pad + out_len + pad + self.nperseg;
        let mut acc = vec![0.0_f64; total_len];
        let mut norm = vec![0.0_f64; total_len];

        for (m, frame) in spectrogram.iter().enumerate() {
            let mut buf = frame.clone();
            self.ifft.process(&mut buf);
            let scale = 1.0 / self.nfft as f64;
            let start = m * self.hop;
            for (i, &w) in self.window_samples.iter().enumerate() {
                let idx = start + i;
                if idx >= acc.len() {
                    break;
                }
                acc[idx] += buf[i].re * scale * w;
                norm[idx] += w * w;
            }
        }

        for (a, n) in acc.iter_mut().zip(norm.iter()) {
            if *n > 1e-12 {
                *a /= *n;
            }
        }

        let start = pad;
        let end = (start + out_len).min(acc.len());
        let mut result = acc[start..end].to_vec();
        result.resize(out_len, 0.0);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_reconstructs_signal() {
        let plan = StftPlan::new(WindowKind::Hann, 32, 16, 32);
        let signal: Vec<f64> = (0..256).map(|i| (i as f64 * 0.1).sin()).collect();
        let spec = plan.forward(&signal);
        let recon = plan.inverse(&spec, signal.len());
        let max_err = signal
            .iter()
            .zip(recon.iter())
            .skip(32)
            .take(signal.len() - 64)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_err < 1e-6, "max_err={max_err}");
    }
}
