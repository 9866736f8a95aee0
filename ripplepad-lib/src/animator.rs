//! Frame composition
//!
//! Each admitted frame:
//!
//! 1. picks the muted or unmuted palette
//! 2. cuts the 12-color window at the current offset
//! 3. paints the ripple color over every key with nonzero emphasis
//! 4. reorders logical slots into physical pixel indices
//! 5. advances the offset by one, modulo the active palette length
//!
//! Ripple aging runs on a slower cadence than the offset. [`Frame::age_ripples`]
//! marks every `ripple_age_ratio`-th frame (starting with the first one) so a
//! polled caller can age the ripple history right after rendering.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::history::RippleHistory;
use crate::palette::Palette;
use crate::ripple::{press_ripple_frame, Emphasis};
use crate::{RGB8, KEY_COUNT};

/// Summed emphasis at which [`RippleStyle::Intensity`] reaches full color.
const FULL_INTENSITY: u8 = 4;

/// Logical slot to physical pixel permutation.
///
/// The board is held rotated, so the LED chain does not run in key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelMap([usize; KEY_COUNT]);

impl PixelMap {
    /// Physical index for each logical slot on the rotated board.
    pub const LANDSCAPE: [usize; KEY_COUNT] = [2, 5, 8, 11, 1, 4, 7, 10, 0, 3, 6, 9];

    /// # Errors
    /// Returns [`ConfigError::InvalidPixelOrder`] if `order` is not a
    /// permutation of `0..12`.
    pub fn new(order: [usize; KEY_COUNT]) -> Result<Self, ConfigError> {
        let mut seen = [false; KEY_COUNT];
        for (slot, &pixel) in order.iter().enumerate() {
            if pixel >= KEY_COUNT || seen[pixel] {
                return Err(ConfigError::InvalidPixelOrder { slot, pixel });
            }
            seen[pixel] = true;
        }
        Ok(Self(order))
    }

    /// Scatter logical colors into a physical pixel buffer.
    #[must_use]
    pub fn apply(&self, logical: &[RGB8; KEY_COUNT]) -> [RGB8; KEY_COUNT] {
        let mut physical = [RGB8::default(); KEY_COUNT];
        for (&color, &pixel) in logical.iter().zip(&self.0) {
            physical[pixel] = color;
        }
        physical
    }
}

impl Default for PixelMap {
    fn default() -> Self {
        Self(Self::LANDSCAPE)
    }
}

/// Where the ripple color comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RippleColor {
    /// One static color
    Fixed { color: RGB8 },
    /// Palette color at the current offset, each channel raised by `boost`
    Cycle { boost: u8 },
}

impl Default for RippleColor {
    fn default() -> Self {
        Self::Fixed {
            color: RGB8::new(82, 150, 14),
        }
    }
}

/// How ripple emphasis combines with the base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RippleStyle {
    /// Any nonzero emphasis replaces the base color outright
    #[default]
    Override,
    /// Ripple color scaled by emphasis, so crossing rings render brighter
    Intensity,
}

/// One rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Physical pixel buffer, before gamma and brightness
    pub pixels: [RGB8; KEY_COUNT],
    /// Zero-based frame counter
    pub index: u64,
    /// Ripple history is due to age after this frame
    pub age_ripples: bool,
}

/// Palette cycling state plus the static rendering setup.
#[derive(Debug, Clone)]
pub struct Animator {
    muted: Palette,
    unmuted: Palette,
    pixel_map: PixelMap,
    ripple_color: RippleColor,
    ripple_style: RippleStyle,
    ripple_age_ratio: u32,
    offset: usize,
    frames: u64,
}

impl Animator {
    #[must_use]
    pub fn new(muted: Palette, unmuted: Palette) -> Self {
        Self {
            muted,
            unmuted,
            pixel_map: PixelMap::default(),
            ripple_color: RippleColor::default(),
            ripple_style: RippleStyle::default(),
            ripple_age_ratio: 2,
            offset: 0,
            frames: 0,
        }
    }

    #[must_use]
    pub fn with_pixel_map(mut self, pixel_map: PixelMap) -> Self {
        self.pixel_map = pixel_map;
        self
    }

    #[must_use]
    pub fn with_ripple(mut self, color: RippleColor, style: RippleStyle) -> Self {
        self.ripple_color = color;
        self.ripple_style = style;
        self
    }

    /// Age ripples once every `ratio` frames. Zero is treated as one.
    #[must_use]
    pub fn with_ripple_age_ratio(mut self, ratio: u32) -> Self {
        self.ripple_age_ratio = ratio.max(1);
        self
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Frames rendered so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub const fn ripple_age_ratio(&self) -> u32 {
        self.ripple_age_ratio
    }

    #[must_use]
    pub const fn palette(&self, muted: bool) -> &Palette {
        if muted {
            &self.muted
        } else {
            &self.unmuted
        }
    }

    /// Compose the physical pixel buffer for the current offset.
    #[must_use]
    pub fn compose(&self, muted: bool, emphasis: &Emphasis) -> [RGB8; KEY_COUNT] {
        let palette = self.palette(muted);
        let mut logical = palette.window(self.offset);

        let ripple = match self.ripple_color {
            RippleColor::Fixed { color } => color,
            RippleColor::Cycle { boost } => {
                let base = palette.color(self.offset);
                RGB8::new(
                    base.r.saturating_add(boost),
                    base.g.saturating_add(boost),
                    base.b.saturating_add(boost),
                )
            }
        };

        for (slot, &level) in logical.iter_mut().zip(emphasis) {
            if level == 0 {
                continue;
            }
            *slot = match self.ripple_style {
                RippleStyle::Override => ripple,
                RippleStyle::Intensity => scale(ripple, level.min(FULL_INTENSITY)),
            };
        }

        self.pixel_map.apply(&logical)
    }

    /// Render one frame from the ripple history and advance the offset.
    pub fn render_frame(&mut self, muted: bool, ripples: &RippleHistory) -> Frame {
        let emphasis = press_ripple_frame(ripples);
        let pixels = self.compose(muted, &emphasis);

        let index = self.frames;
        self.frames += 1;
        self.offset = (self.offset + 1) % self.palette(muted).len();

        Frame {
            pixels,
            index,
            age_ripples: index % u64::from(self.ripple_age_ratio) == 0,
        }
    }
}

fn scale(color: RGB8, level: u8) -> RGB8 {
    let channel = |c: u8| {
        // level <= FULL_INTENSITY keeps the quotient within u8
        #[allow(clippy::cast_possible_truncation)]
        let scaled = (u16::from(c) * u16::from(level) / u16::from(FULL_INTENSITY)) as u8;
        scaled
    };
    RGB8::new(channel(color.r), channel(color.g), channel(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{EventTracker, KeyEvent};
    use crate::palette::{build_palette, ColorStop};

    const RIPPLE: RGB8 = RGB8::new(82, 150, 14);

    fn ramp(steps: usize, blue: u8) -> Palette {
        let stops = [
            ColorStop::new(0.0, RGB8::new(0, 0, blue)),
            ColorStop::new(1.0, RGB8::new(250, 0, blue)),
        ];
        build_palette(&stops, steps).unwrap()
    }

    fn identity() -> PixelMap {
        PixelMap::new(core::array::from_fn(|i| i)).unwrap()
    }

    fn animator() -> Animator {
        Animator::new(ramp(50, 1), ramp(40, 2)).with_pixel_map(identity())
    }

    #[test]
    fn test_compose_without_ripples_is_window() {
        let animator = animator();
        let pixels = animator.compose(true, &[0; KEY_COUNT]);
        assert_eq!(pixels, animator.palette(true).window(0));
    }

    #[test]
    fn test_palette_follows_mute_state() {
        let animator = animator();
        assert_eq!(animator.compose(false, &[0; KEY_COUNT])[0].b, 2);
        assert_eq!(animator.compose(true, &[0; KEY_COUNT])[0].b, 1);
    }

    #[test]
    fn test_override_replaces_any_emphasis() {
        let animator = animator();
        let mut emphasis = [0; KEY_COUNT];
        emphasis[3] = 1;
        emphasis[7] = 3;
        let pixels = animator.compose(true, &emphasis);
        assert_eq!(pixels[3], RIPPLE);
        assert_eq!(pixels[7], RIPPLE);
        assert_ne!(pixels[4], RIPPLE);
    }

    #[test]
    fn test_intensity_scales_with_emphasis() {
        let animator = animator().with_ripple(
            RippleColor::Fixed {
                color: RGB8::new(200, 100, 40),
            },
            RippleStyle::Intensity,
        );
        let mut emphasis = [0; KEY_COUNT];
        emphasis[0] = 1;
        emphasis[1] = 2;
        emphasis[2] = 9;
        let pixels = animator.compose(true, &emphasis);
        assert_eq!(pixels[0], RGB8::new(50, 25, 10));
        assert_eq!(pixels[1], RGB8::new(100, 50, 20));
        assert_eq!(pixels[2], RGB8::new(200, 100, 40));
    }

    #[test]
    fn test_cycle_color_brightens_current_palette_color() {
        let animator =
            animator().with_ripple(RippleColor::Cycle { boost: 10 }, RippleStyle::Override);
        let mut emphasis = [0; KEY_COUNT];
        emphasis[5] = 1;
        let base = animator.palette(true).color(0);
        let pixels = animator.compose(true, &emphasis);
        assert_eq!(pixels[5], RGB8::new(base.r + 10, 10, 11));
    }

    #[test]
    fn test_pixel_map_scatters_to_physical_order() {
        let animator = Animator::new(ramp(50, 1), ramp(50, 1));
        let logical = animator.palette(true).window(0);
        let physical = animator.compose(true, &[0; KEY_COUNT]);
        for (slot, &pixel) in PixelMap::LANDSCAPE.iter().enumerate() {
            assert_eq!(physical[pixel], logical[slot]);
        }
    }

    #[test]
    fn test_pixel_map_rejects_duplicates_and_out_of_range() {
        let mut order = PixelMap::LANDSCAPE;
        order[4] = 2;
        assert_eq!(
            PixelMap::new(order),
            Err(ConfigError::InvalidPixelOrder { slot: 4, pixel: 2 })
        );
        order[4] = 12;
        assert!(PixelMap::new(order).is_err());
    }

    #[test]
    fn test_offset_advances_modulo_active_palette() {
        let mut animator = animator();
        let tracker = EventTracker::new();
        for _ in 0..39 {
            animator.render_frame(false, tracker.ripples());
        }
        assert_eq!(animator.offset(), 39);
        animator.render_frame(false, tracker.ripples());
        assert_eq!(animator.offset(), 0);
        assert_eq!(animator.frames(), 40);
    }

    #[test]
    fn test_age_flag_every_ratio_frames() {
        let mut animator = animator().with_ripple_age_ratio(3);
        let tracker = EventTracker::new();
        let flags: Vec<bool> = (0..7)
            .map(|_| animator.render_frame(true, tracker.ripples()).age_ripples)
            .collect();
        assert_eq!(flags, [true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_zero_ratio_ages_every_frame() {
        let mut animator = animator().with_ripple_age_ratio(0);
        let tracker = EventTracker::new();
        assert!(animator.render_frame(true, tracker.ripples()).age_ripples);
        assert!(animator.render_frame(true, tracker.ripples()).age_ripples);
    }

    #[test]
    fn test_render_frame_draws_ripples() {
        let mut animator = animator();
        let mut tracker = EventTracker::new();
        tracker.observe(Some(KeyEvent::press(5)));
        let frame = animator.render_frame(true, tracker.ripples());
        for slot in [1, 4, 6, 9] {
            assert_eq!(frame.pixels[slot], RIPPLE);
        }
        assert_ne!(frame.pixels[5], RIPPLE);
        assert_eq!(frame.index, 0);
    }
}
