//! Error types.

use thiserror::Error;

/// A [`ControllerConfig`](crate::config::ControllerConfig) value that the
/// controller cannot work with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter is NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    /// A parameter that scales speed or force is negative.
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// The pitch clamp is outside `(0, 90]` degrees.
    #[error("`max_pitch` must be in (0, 90] degrees, got {0}")]
    PitchOutOfRange(f32),
}
