//! Cyclic color palettes built from sparse gradient stops
//!
//! A palette is baked once from a handful of `(position, color)` stops and
//! then only ever read. The animator cuts a 12-color window out of it on
//! every frame, wrapping around the end so the gradient cycles seamlessly.

use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::KEY_COUNT;

/// A single gradient control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position along the gradient, in `[0.0, 1.0]`
    pub position: f32,
    pub color: RGB8,
}

impl ColorStop {
    #[must_use]
    pub const fn new(position: f32, color: RGB8) -> Self {
        Self { position, color }
    }
}

/// Dense, immutable cyclic gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Box<[RGB8]>,
}

impl Palette {
    /// Number of discrete colors in the palette (always at least 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; construction rejects empty palettes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[must_use]
    pub fn colors(&self) -> &[RGB8] {
        &self.colors
    }

    /// Color at a cyclic offset.
    #[must_use]
    pub fn color(&self, offset: usize) -> RGB8 {
        self.colors[offset % self.colors.len()]
    }

    /// The 12 contiguous colors starting at `offset`, wrapping past the end.
    ///
    /// ```text
    ///   palette (N=50):  [c0 c1 ... c45 c46 c47 c48 c49]
    ///   offset 45:        c45 c46 c47 c48 c49 c0 c1 ... c6
    /// ```
    #[must_use]
    pub fn window(&self, offset: usize) -> [RGB8; KEY_COUNT] {
        let len = self.colors.len();
        let start = offset % len;
        core::array::from_fn(|i| self.colors[(start + i) % len])
    }
}

/// Expand sparse gradient stops into exactly `steps` colors.
///
/// Output index `i` samples the gradient at `i / steps`. Between two stops the
/// channels are interpolated linearly. Positions before the first stop or at
/// or past the last one fall into the wrap segment that runs from the last
/// stop to the first stop (shifted by one full cycle), so the palette loops
/// without a seam.
///
/// # Errors
/// Returns [`ConfigError`] when fewer than two stops are given, a position is
/// outside `[0.0, 1.0]`, positions are not strictly increasing, or `steps`
/// is zero.
#[allow(clippy::cast_precision_loss)]
pub fn build_palette(stops: &[ColorStop], steps: usize) -> Result<Palette, ConfigError> {
    validate_stops(stops)?;
    if steps == 0 {
        return Err(ConfigError::ZeroSteps);
    }

    let colors = (0..steps)
        .map(|i| sample_gradient(stops, i as f32 / steps as f32))
        .collect();
    Ok(Palette { colors })
}

fn validate_stops(stops: &[ColorStop]) -> Result<(), ConfigError> {
    if stops.len() < 2 {
        return Err(ConfigError::TooFewStops { count: stops.len() });
    }
    for (index, stop) in stops.iter().enumerate() {
        if !(0.0..=1.0).contains(&stop.position) {
            return Err(ConfigError::StopOutOfRange {
                index,
                position: stop.position,
            });
        }
        if index > 0 && stop.position <= stops[index - 1].position {
            return Err(ConfigError::StopsNotIncreasing { index });
        }
    }
    Ok(())
}

/// Sample validated stops at `pos` in `[0.0, 1.0)`.
fn sample_gradient(stops: &[ColorStop], pos: f32) -> RGB8 {
    let first = stops[0];
    let last = stops[stops.len() - 1];

    if pos < first.position || pos >= last.position {
        let span = first.position + 1.0 - last.position;
        if span <= 0.0 {
            return last.color;
        }
        let unwrapped = if pos < first.position { pos + 1.0 } else { pos };
        let t = ((unwrapped - last.position) / span).clamp(0.0, 1.0);
        return lerp_rgb(last.color, first.color, t);
    }

    // first.position <= pos < last.position, so an upper stop exists past index 0
    let upper = stops
        .iter()
        .position(|s| s.position > pos)
        .unwrap_or(stops.len() - 1)
        .max(1);
    let a = stops[upper - 1];
    let b = stops[upper];
    let t = ((pos - a.position) / (b.position - a.position)).clamp(0.0, 1.0);
    lerp_rgb(a.color, b.color, t)
}

fn lerp_rgb(a: RGB8, b: RGB8, t: f32) -> RGB8 {
    RGB8::new(lerp_u8(a.r, b.r, t), lerp_u8(a.g, b.g, t), lerp_u8(a.b, b.b, t))
}

/// Linear interpolation between two `u8` color channel values.
///
/// Computes `a + (b - a) * t` in floating point, then rounds back to `u8`.
#[inline]
fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    debug_assert!(
        (0.0..=1.0).contains(&t),
        "lerp_u8: t={t} outside [0.0, 1.0]"
    );
    let a_f = f32::from(a);
    let b_f = f32::from(b);
    // a, b in [0,255] and t in [0,1] keep the result in [0.0, 255.0]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let result = (a_f + (b_f - a_f) * t).round() as u8;
    result
}
