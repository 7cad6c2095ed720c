//! Error types for the gameplay layer.

/// A [`GameConfig`](crate::GameConfig) value that cannot produce a playable
/// session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A size, speed, radius or duration that must be strictly positive.
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A value that must stay inside a closed range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// The game needs at least one hider.
    #[error("hider count must be at least 1")]
    NoHiders,

    /// The jail is too small to hold a hider once its inset is applied.
    #[error("jail {width}x{height} leaves no room inside a {inset}px inset")]
    JailTooSmall { width: f32, height: f32, inset: f32 },

    /// The spawn margin swallows the whole world.
    #[error("spawn margin {margin} leaves no spawn area in a {width}x{height} world")]
    NoSpawnArea { margin: f32, width: f32, height: f32 },
}
