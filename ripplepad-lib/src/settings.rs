//! Persisted user settings
//!
//! The engine reads and writes three values through [`SettingsStore`] and
//! never looks at how they are stored. [`PackedSettings`] is the two-byte
//! non-volatile layout the device uses:
//!
//! ```text
//!   byte 0:  ---h hhss    ss  = dial mode selector (0..=2)
//!                         hhh = hour offset + 4   (0..=7)
//!   byte 1:  brightness x 255
//! ```

use log::debug;

/// Number of dial modes the selector cycles through.
pub const MODE_COUNT: u8 = 3;

/// Largest hour offset magnitude the clock accepts.
pub const MAX_HOUR_OFFSET: i32 = 4;

const SELECTED_MASK: u8 = 0b0000_0011;
const HOUR_MASK: u8 = 0b0001_1100;
const HOUR_SHIFT: u8 = 2;
const HOUR_FIELD_MAX: i32 = 7;

/// Getter/setter access to persisted settings.
///
/// Setters normalize their input: the selector wraps modulo
/// [`MODE_COUNT`], the hour offset clamps to `[-4, 4]` and brightness clamps
/// to `[0.0, 1.0]`.
pub trait SettingsStore {
    fn selected(&self) -> u8;
    fn set_selected(&mut self, value: i32);
    fn hour_offset(&self) -> i32;
    fn set_hour_offset(&mut self, value: i32);
    fn brightness(&self) -> f32;
    fn set_brightness(&mut self, value: f32);
}

/// Settings packed into two bytes of non-volatile memory.
///
/// The live hour offset and brightness are kept unquantized next to the
/// bytes. Only the packed copy saturates the hour field at +3 and rounds
/// brightness to 1/255, so small dial steps still accumulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedSettings {
    bytes: [u8; 2],
    hour_offset: i32,
    brightness: f32,
}

impl Default for PackedSettings {
    /// Brightness mode, no hour offset, full brightness.
    fn default() -> Self {
        Self::from_bytes([(4 << HOUR_SHIFT) & HOUR_MASK, u8::MAX])
    }
}

impl PackedSettings {
    /// Decode settings read back from non-volatile memory.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            bytes,
            hour_offset: i32::from((bytes[0] & HOUR_MASK) >> HOUR_SHIFT) - MAX_HOUR_OFFSET,
            brightness: f32::from(bytes[1]) / 255.0,
        }
    }

    /// Bytes to write back to non-volatile memory.
    #[must_use]
    pub const fn bytes(&self) -> [u8; 2] {
        self.bytes
    }
}

impl SettingsStore for PackedSettings {
    fn selected(&self) -> u8 {
        (self.bytes[0] & SELECTED_MASK) % MODE_COUNT
    }

    fn set_selected(&mut self, value: i32) {
        // rem_euclid keeps the result in 0..MODE_COUNT
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.rem_euclid(i32::from(MODE_COUNT)) as u8;
        self.bytes[0] = (self.bytes[0] & !SELECTED_MASK) | value;
        debug!("Settings: selected={value}");
    }

    fn hour_offset(&self) -> i32 {
        self.hour_offset
    }

    fn set_hour_offset(&mut self, value: i32) {
        let value = value.clamp(-MAX_HOUR_OFFSET, MAX_HOUR_OFFSET);
        self.hour_offset = value;
        // value + 4 is in 0..=8; the 3-bit field tops out at 7
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let field = (value + MAX_HOUR_OFFSET).min(HOUR_FIELD_MAX) as u8;
        self.bytes[0] = (self.bytes[0] & !HOUR_MASK) | (field << HOUR_SHIFT);
        debug!("Settings: hour_offset={value}");
    }

    fn brightness(&self) -> f32 {
        self.brightness
    }

    fn set_brightness(&mut self, value: f32) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        self.brightness = value;
        // value in [0, 1] keeps the product in [0, 255]
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = (value * 255.0).round() as u8;
        self.bytes[1] = byte;
        debug!("Settings: brightness={value:.3} ({byte}/255)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_decodes() {
        let settings = PackedSettings::default();
        assert_eq!(settings.selected(), 0);
        assert_eq!(settings.hour_offset(), 0);
        assert!((settings.brightness() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_zeroed_memory_reads_minimum_offset() {
        let settings = PackedSettings::from_bytes([0, 0]);
        assert_eq!(settings.hour_offset(), -4);
        assert_eq!(settings.brightness(), 0.0);
    }

    #[test]
    fn test_selected_wraps_both_ways() {
        let mut settings = PackedSettings::default();
        settings.set_selected(4);
        assert_eq!(settings.selected(), 1);
        settings.set_selected(-1);
        assert_eq!(settings.selected(), 2);
    }

    #[test]
    fn test_hour_offset_clamps() {
        let mut settings = PackedSettings::default();
        settings.set_hour_offset(9);
        assert_eq!(settings.hour_offset(), 4);
        settings.set_hour_offset(-9);
        assert_eq!(settings.hour_offset(), -4);
        settings.set_hour_offset(2);
        assert_eq!(settings.hour_offset(), 2);
    }

    #[test]
    fn test_fields_do_not_clobber_each_other() {
        let mut settings = PackedSettings::default();
        settings.set_selected(2);
        settings.set_hour_offset(-3);
        settings.set_brightness(0.5);
        assert_eq!(settings.selected(), 2);
        assert_eq!(settings.hour_offset(), -3);
        assert_eq!(settings.bytes(), [0b0000_0110, 128]);
    }

    #[test]
    fn test_brightness_clamps() {
        let mut settings = PackedSettings::default();
        settings.set_brightness(1.7);
        assert_eq!(settings.bytes()[1], 255);
        settings.set_brightness(-0.2);
        assert_eq!(settings.bytes()[1], 0);
        settings.set_brightness(f32::NAN);
        assert_eq!(settings.bytes()[1], 0);
    }

    #[test]
    fn test_max_hour_offset_is_live_but_saturates_when_packed() {
        let mut settings = PackedSettings::default();
        settings.set_hour_offset(4);
        assert_eq!(settings.hour_offset(), 4);
        assert_eq!(settings.bytes()[0] & HOUR_MASK, 7 << HOUR_SHIFT);
        // Reading the packed copy back after a reboot lands on +3
        assert_eq!(PackedSettings::from_bytes(settings.bytes()).hour_offset(), 3);
    }

    #[test]
    fn test_small_brightness_steps_accumulate() {
        let mut settings = PackedSettings::from_bytes([4 << 2, 128]);
        let start = settings.brightness();
        for _ in 0..20 {
            settings.set_brightness(settings.brightness() + 0.001);
        }
        assert!((settings.brightness() - (start + 0.02)).abs() < 1e-4);
        assert_eq!(settings.bytes()[1], 133);
    }
}
