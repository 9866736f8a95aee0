//! Gesture recognition and ripple animation engine for a 12-key macropad
//!
//! This library turns debounced key and encoder input into mute/volume
//! commands and renders a cycling gradient with press ripples onto the key
//! backlights. It is hardware-agnostic: keys, the encoder, the command
//! transport, persisted settings and the LED strip are all reached through
//! traits, so the whole engine runs and tests on the host.
//!
//! ```text
//!   KeySource ──► EventTracker ──► classify ──► MuteController ──► CommandSink
//!                      │
//!                      └──► press_ripple_frame ──► Animator ──► SmartLedsWrite
//!   EncoderSource ──► Dial ──► SettingsStore / MuteController
//! ```

pub mod animator;
pub mod command;
pub mod config;
pub mod dial;
pub mod error;
pub mod gesture;
pub mod history;
pub mod palette;
pub mod replay;
pub mod ripple;
pub mod scheduler;
pub mod settings;

pub use rgb::RGB8;

pub use animator::{Animator, Frame, PixelMap, RippleColor, RippleStyle};
pub use command::{Command, CommandSink, MuteController, RecordingSink};
pub use config::{BakedConfig, LogLevel, PadConfig, TimingConfig};
pub use dial::{Dial, DialMode, EncoderSource};
pub use error::ConfigError;
pub use gesture::{classify, Gesture};
pub use history::{EventTracker, KeyEvent, KeyId, KeySet};
pub use palette::{build_palette, ColorStop, Palette};
pub use replay::{FrameCapture, ReplayDial, ReplayKeys};
pub use ripple::press_ripple_frame;
pub use scheduler::{run_cooperative, KeySource, Macropad};
pub use settings::{PackedSettings, SettingsStore};

/// Number of backlit keys.
pub const KEY_COUNT: usize = 12;

/// Columns of the logical key grid (device held in landscape).
pub const GRID_COLS: usize = 4;

/// Rows of the logical key grid.
pub const GRID_ROWS: usize = 3;
