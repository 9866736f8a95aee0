//! Configuration errors
//!
//! Everything here is an authoring mistake caught while baking the
//! configuration at startup. Nothing on the per-frame or per-event path can
//! fail.

use derive_more::{Display, Error};

/// Invalid gradient or pixel-mapping configuration.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum ConfigError {
    /// A gradient needs at least two color stops to interpolate between.
    #[display("gradient needs at least 2 color stops, got {count}")]
    TooFewStops { count: usize },
    /// Stop position is not a finite value in `[0.0, 1.0]`.
    #[display("color stop {index} has position {position} outside [0.0, 1.0]")]
    StopOutOfRange { index: usize, position: f32 },
    /// Stop positions must be strictly increasing.
    #[display("color stop {index} does not come after the previous stop")]
    StopsNotIncreasing { index: usize },
    /// A palette must have at least one step.
    #[display("palette must have at least 1 step")]
    ZeroSteps,
    /// The logical to physical pixel mapping is not a permutation of `0..12`.
    #[display("pixel order entry {slot} maps to invalid or duplicate pixel {pixel}")]
    InvalidPixelOrder { slot: usize, pixel: usize },
}
