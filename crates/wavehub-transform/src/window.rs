//! STFT analysis windows and the non-zero overlap-add (NOLA) check.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    Bartlett,
}

impl WindowKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rectangular => "rectangular",
            Self::Hann => "hann",
            Self::Hamming => "hamming",
            Self::Blackman => "blackman",
            Self::Bartlett => "bartlett",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rectangular" | "boxcar" => Some(Self::Rectangular),
            "hann" | "hanning" => Some(Self::Hann),
            "hamming" => Some(Self::Hamming),
            "blackman" => Some(Self::Blackman),
            "bartlett" | "triangular" => Some(Self::Bartlett),
            _ => None,
        }
    }

    /// Periodic (DFT-even) window of length `n`, matching the convention
    /// `scipy.signal.get_window(..., fftbins=True)` uses for STFT analysis.
    #[must_use]
    pub fn samples(self, n: usize) -> Vec<f64> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![1.0];
        }
        let nf = n as f64;
        (0..n)
            .map(|i| {
                let x = i as f64;
                match self {
                    Self::Rectangular => 1.0,
                    Self::Hann => 0.5 - 0.5 * (2.0 * PI * x / nf).cos(),
                    Self::Hamming => 0.54 - 0.46 * (2.0 * PI * x / nf).cos(),
                    Self::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x / nf).cos() + 0.08 * (4.0 * PI * x / nf).cos()
                    }
                    Self::Bartlett => 1.0 - ((x - (nf - 1.0) / 2.0) / (nf / 2.0)).abs(),
                }
            })
            .collect()
    }
}

/// Checks the non-zero overlap-add condition for `window` at `hop`: the sum
/// of shifted window copies must stay bounded away from zero everywhere, or
/// ISTFT reconstruction is ill-posed.
#[must_use]
pub fn nola_ok(window: &[f64], hop: usize) -> bool {
    if hop == 0 || hop > window.len() {
        return false;
    }
    let n = window.len();
    let mut sum = vec![0.0_f64; n];
    let mut shift = 0usize;
    loop {
        let mut any_overlap = false;
        for (i, &w) in window.iter().enumerate() {
            let j = i + shift;
            if j < n {
                sum[j] += w * w;
                any_overlap = true;
            }
        }
        if !any_overlap {
            break;
        }
        shift += hop;
    }
    // Also cover negative shifts by symmetry: the forward sweep above is
    // sufficient because the window fully overlaps itself at shift 0 and
    // NOLA only requires boundedness away from zero over one hop period.
    let min_in_period = sum[..hop.min(n)].iter().cloned().fold(f64::INFINITY, f64::min);
    min_in_period > 1e-10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_at_half_overlap_satisfies_nola() {
        let w = WindowKind::Hann.samples(64);
        assert!(nola_ok(&w, 32));
    }

    #[test]
    fn rectangular_satisfies_nola_at_any_hop() {
        let w = WindowKind::Rectangular.samples(32);
        assert!(nola_ok(&w, 16));
        assert!(nola_ok(&w, 32));
    }

    #[test]
    fn zero_hop_fails_nola() {
        let w = WindowKind::Hann.samples(32);
        assert!(!nola_ok(&w, 0));
    }

    #[test]
    fn parse_round_trips_name() {
        for kind in
            [WindowKind::Rectangular, WindowKind::Hann, WindowKind::Hamming, WindowKind::Blackman, WindowKind::Bartlett]
        {
            assert_eq!(WindowKind::parse(kind.name()), Some(kind));
        }
    }
}
