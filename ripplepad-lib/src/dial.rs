//! Rotary encoder handling
//!
//! The dial is polled on its own cadence. Turning it either moves the mode
//! selection (menu open) or feeds the selected mode (menu closed). Pressing
//! the encoder button opens and closes the menu.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::command::{CommandSink, MuteController};
use crate::settings::SettingsStore;

/// Source of encoder position and button presses.
pub trait EncoderSource {
    /// Absolute encoder position at `now_ms`.
    fn position(&mut self, now_ms: u64) -> i32;

    /// `true` once per button press that happened since the last call.
    fn button_pressed(&mut self, now_ms: u64) -> bool;
}

/// What the dial adjusts while the menu is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialMode {
    #[default]
    Brightness,
    Volume,
    HourOffset,
}

impl DialMode {
    /// Mode for a persisted selector value, wrapping modulo 3.
    #[must_use]
    pub const fn from_selected(selected: u8) -> Self {
        match selected % 3 {
            0 => Self::Brightness,
            1 => Self::Volume,
            _ => Self::HourOffset,
        }
    }
}

/// Encoder state between polls.
#[derive(Debug, Clone)]
pub struct Dial {
    last_position: Option<i32>,
    menu_open: bool,
    brightness_step: f32,
}

impl Dial {
    #[must_use]
    pub const fn new(brightness_step: f32) -> Self {
        Self {
            last_position: None,
            menu_open: false,
            brightness_step,
        }
    }

    #[must_use]
    pub const fn menu_open(&self) -> bool {
        self.menu_open
    }

    /// Record the encoder position without acting on it.
    pub fn seed<E: EncoderSource>(&mut self, encoder: &mut E, now_ms: u64) {
        self.last_position = Some(encoder.position(now_ms));
    }

    /// Read the encoder once and apply any movement and button press.
    ///
    /// Returns the turn delta that was applied (`previous - current`).
    pub fn poll<E, S, C>(
        &mut self,
        now_ms: u64,
        encoder: &mut E,
        settings: &mut S,
        mute: &mut MuteController<C>,
    ) -> i32
    where
        E: EncoderSource,
        S: SettingsStore,
        C: CommandSink,
    {
        let position = encoder.position(now_ms);
        let delta = self
            .last_position
            .map_or(0, |last| last.wrapping_sub(position));
        self.last_position = Some(position);

        if delta != 0 {
            if self.menu_open {
                let selected = i32::from(settings.selected()) - delta;
                settings.set_selected(selected);
                debug!("Dial: selected {:?}", DialMode::from_selected(settings.selected()));
            } else {
                self.apply(delta, settings, mute);
            }
        }

        if encoder.button_pressed(now_ms) {
            self.menu_open = !self.menu_open;
            info!("Dial menu {}", if self.menu_open { "opened" } else { "closed" });
        }
        delta
    }

    fn apply<S, C>(&self, delta: i32, settings: &mut S, mute: &mut MuteController<C>)
    where
        S: SettingsStore,
        C: CommandSink,
    {
        match DialMode::from_selected(settings.selected()) {
            DialMode::Brightness => {
                // delta is a handful of detents, far inside f32 precision
                #[allow(clippy::cast_precision_loss)]
                let step = delta as f32 * self.brightness_step;
                settings.set_brightness(settings.brightness() + step);
                debug!("Dial: brightness {:.2}", settings.brightness());
            }
            DialMode::Volume => mute.change_volume(delta),
            DialMode::HourOffset => {
                settings.set_hour_offset(settings.hour_offset() + delta);
                debug!("Dial: hour offset {}", settings.hour_offset());
            }
        }
    }
}
