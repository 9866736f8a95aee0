//! Engine configuration
//!
//! [`PadConfig`] is the serializable form (JSON on the host). Every field has
//! a default matching the stock device, so an empty object is a valid config.
//! [`PadConfig::bake`] turns it into the ready-to-render [`BakedConfig`].

use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::animator::{Animator, PixelMap, RippleColor, RippleStyle};
use crate::error::ConfigError;
use crate::palette::{build_palette, ColorStop};
use crate::{RGB8, KEY_COUNT};

/// Configurable log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    #[must_use]
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
        }
    }
}

/// Task periods, shared by both scheduling disciplines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Palette advance period
    #[serde(default = "default_frame_period_ms")]
    pub frame_period_ms: u64,
    /// Frames per ripple aging step
    #[serde(default = "default_ripple_age_ratio")]
    pub ripple_age_ratio: u32,
    /// Key event poll period
    #[serde(default = "default_key_poll_ms")]
    pub key_poll_ms: u64,
    /// Encoder poll period
    #[serde(default = "default_dial_poll_ms")]
    pub dial_poll_ms: u64,
}

const fn default_frame_period_ms() -> u64 {
    100
}

const fn default_ripple_age_ratio() -> u32 {
    2
}

const fn default_key_poll_ms() -> u64 {
    10
}

const fn default_dial_poll_ms() -> u64 {
    500
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: default_frame_period_ms(),
            ripple_age_ratio: default_ripple_age_ratio(),
            key_poll_ms: default_key_poll_ms(),
            dial_poll_ms: default_dial_poll_ms(),
        }
    }
}

impl TimingConfig {
    /// Ripple aging period in the cooperative discipline.
    #[must_use]
    pub const fn ripple_age_period_ms(&self) -> u64 {
        self.frame_period_ms.saturating_mul(self.ripple_age_ratio as u64)
    }

    fn validate(&mut self) {
        if self.frame_period_ms == 0 {
            warn!("frame_period_ms is 0, resetting to {}", default_frame_period_ms());
            self.frame_period_ms = default_frame_period_ms();
        }
        if self.ripple_age_ratio == 0 {
            warn!("Clamping ripple_age_ratio from 0 to 1");
            self.ripple_age_ratio = 1;
        }
        if self.key_poll_ms == 0 {
            warn!("key_poll_ms is 0, resetting to {}", default_key_poll_ms());
            self.key_poll_ms = default_key_poll_ms();
        }
        if self.dial_poll_ms == 0 {
            warn!("dial_poll_ms is 0, resetting to {}", default_dial_poll_ms());
            self.dial_poll_ms = default_dial_poll_ms();
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Gradient stops while muted
    #[serde(default = "default_muted_gradient")]
    pub muted_gradient: Vec<ColorStop>,
    /// Gradient stops while unmuted
    #[serde(default = "default_unmuted_gradient")]
    pub unmuted_gradient: Vec<ColorStop>,
    /// Colors per palette. Longer palettes cycle more slowly.
    #[serde(default = "default_gradient_steps")]
    pub gradient_steps: usize,
    #[serde(default)]
    pub ripple_color: RippleColor,
    #[serde(default)]
    pub ripple_style: RippleStyle,
    /// Physical pixel index for each logical key slot
    #[serde(default = "default_pixel_order")]
    pub pixel_order: [usize; KEY_COUNT],
    #[serde(default)]
    pub timing: TimingConfig,
    /// Brightness change per encoder detent
    #[serde(default = "default_brightness_step")]
    pub brightness_step: f32,
}

fn default_muted_gradient() -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.6, RGB8::new(237, 42, 7)),
        ColorStop::new(0.8, RGB8::new(255, 61, 94)),
        ColorStop::new(0.9, RGB8::new(199, 152, 22)),
        ColorStop::new(1.0, RGB8::new(237, 42, 7)),
    ]
}

fn default_unmuted_gradient() -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.6, RGB8::new(0, 212, 123)),
        ColorStop::new(0.8, RGB8::new(64, 230, 81)),
        ColorStop::new(0.9, RGB8::new(31, 240, 222)),
        ColorStop::new(1.0, RGB8::new(0, 212, 123)),
    ]
}

const fn default_gradient_steps() -> usize {
    50
}

const fn default_pixel_order() -> [usize; KEY_COUNT] {
    PixelMap::LANDSCAPE
}

const fn default_brightness_step() -> f32 {
    0.01
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            muted_gradient: default_muted_gradient(),
            unmuted_gradient: default_unmuted_gradient(),
            gradient_steps: default_gradient_steps(),
            ripple_color: RippleColor::default(),
            ripple_style: RippleStyle::default(),
            pixel_order: default_pixel_order(),
            timing: TimingConfig::default(),
            brightness_step: default_brightness_step(),
        }
    }
}

/// Configuration with palettes built and the pixel map checked.
#[derive(Debug, Clone)]
pub struct BakedConfig {
    pub animator: Animator,
    pub timing: TimingConfig,
    pub brightness_step: f32,
}

impl PadConfig {
    /// Clamp values to valid ranges and fix invalid values
    pub fn validate(&mut self) {
        self.timing.validate();
        if !(self.brightness_step.is_finite() && self.brightness_step > 0.0) {
            warn!(
                "brightness_step {} is not a positive number, resetting to {}",
                self.brightness_step,
                default_brightness_step()
            );
            self.brightness_step = default_brightness_step();
        }
    }

    /// Build both palettes and the pixel map.
    ///
    /// Runs on a validated copy, so zero periods and a bad brightness step
    /// are reset to their defaults even if [`PadConfig::validate`] was never
    /// called.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for malformed gradients, zero `gradient_steps`
    /// or a `pixel_order` that is not a permutation of `0..12`.
    pub fn bake(&self) -> Result<BakedConfig, ConfigError> {
        let mut checked = self.clone();
        checked.validate();
        checked.bake_validated()
    }

    fn bake_validated(self) -> Result<BakedConfig, ConfigError> {
        let muted = build_palette(&self.muted_gradient, self.gradient_steps)?;
        let unmuted = build_palette(&self.unmuted_gradient, self.gradient_steps)?;
        let pixel_map = PixelMap::new(self.pixel_order)?;
        info!(
            "Baked config: {} palette steps, ripple {:?}/{:?}, frame every {} ms",
            self.gradient_steps, self.ripple_color, self.ripple_style, self.timing.frame_period_ms
        );

        let animator = Animator::new(muted, unmuted)
            .with_pixel_map(pixel_map)
            .with_ripple(self.ripple_color, self.ripple_style)
            .with_ripple_age_ratio(self.timing.ripple_age_ratio);
        Ok(BakedConfig {
            animator,
            timing: self.timing,
            brightness_step: self.brightness_step,
        })
    }
}
