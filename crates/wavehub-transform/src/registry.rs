//! Built-in transform registry: resolves a channel's
//! `transform` id to a boxed [`Transform`] instance with default
//! configuration, subsequently refined by the channel's first META frame.

use crate::{
    Transform, TransformError,
    dominant_wave::DominantWaveTransform,
    fft_waveform::FftWaveformTransform,
    fisher::FisherTransform,
    online_rls::OnlineRlsTransform,
    vroc_fft_spike::VrocFftSpikeTransform,
};

pub const DOMINANT_WAVE: &str = "dominant_wave";
pub const FFT_WAVEFORM: &str = "fft_waveform";
pub const FISHER: &str = "fisher";
pub const VROC_FFT_SPIKE: &str = "vroc_fft_spike";
pub const ONLINE_RLS: &str = "online_rls";

pub const BUILTIN_IDS: &[&str] = &[DOMINANT_WAVE, FFT_WAVEFORM, FISHER, VROC_FFT_SPIKE, ONLINE_RLS];

/// Resolves `transform_spec` to a fresh built-in transform. A path-like spec
/// (containing `/` or `\`, or not matching a built-in id) is rejected:
/// user-supplied transform resolution is out of scope for this core.
pub fn build(transform_spec: &str) -> Result<Box<dyn Transform>, TransformError> {
    match transform_spec {
        DOMINANT_WAVE => Ok(Box::new(DominantWaveTransform::default())),
        FFT_WAVEFORM => Ok(Box::new(FftWaveformTransform::default())),
        FISHER => Ok(Box::new(FisherTransform::default())),
        VROC_FFT_SPIKE => Ok(Box::new(VrocFftSpikeTransform::default())),
        ONLINE_RLS => Ok(Box::new(OnlineRlsTransform::default())),
        other if other.contains('/') || other.contains('\\') => {
            Err(TransformError::UnresolvedUserTransform(other.to_string()))
        }
        other => Err(TransformError::UnknownTransform(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_id_resolves() {
        for id in BUILTIN_IDS {
            assert!(build(id).is_ok(), "expected {id} to resolve");
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(matches!(build("not_a_transform"), Err(TransformError::UnknownTransform(_))));
    }

    #[test]
    fn path_like_spec_is_reported_as_unresolved_user_transform() {
        assert!(matches!(
            build("./plugins/custom.so"),
            Err(TransformError::UnresolvedUserTransform(_))
        ));
    }
}
