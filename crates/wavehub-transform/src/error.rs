use thiserror::Error;

/// Configuration or structural failures raised from `Transform::meta` or the
/// registry. `full`/`update` never raise: they log and return
/// an empty vector instead, so this type only appears at construction time
/// and from `meta`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("unknown transform id {0:?}")]
    UnknownTransform(String),

    #[error("user-supplied transform paths are not resolved by this core: {0:?}")]
    UnresolvedUserTransform(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("window {window:?} and hop {hop} fail the non-zero overlap-add condition")]
    NolaViolation { window: &'static str, hop: usize },

    #[error("meta vector too short: need at least {need} doubles, got {got}")]
    MetaTooShort { need: usize, got: usize },

    #[error("window length {nperseg} exceeds input length {len}")]
    WindowLongerThanInput { nperseg: usize, len: usize },

    #[error("unsupported meta protocol tag {0}")]
    UnsupportedProto(i64),
}
