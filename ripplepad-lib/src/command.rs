//! Outbound commands and the mute/volume controller
//!
//! The engine never knows how commands travel (USB consumer control, a
//! serial console, a test recorder). It only hands abstract [`Command`]s to a
//! [`CommandSink`].

use derive_more::Display;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Abstract command sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Mute,
    Unmute,
    VolumeUp,
    VolumeDown,
}

impl Command {
    /// Wire code the host-side mixer listens for.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Mute => 200,
            Self::Unmute => 201,
            Self::VolumeUp => 202,
            Self::VolumeDown => 203,
        }
    }
}

/// Receiver of outbound commands.
pub trait CommandSink {
    fn send(&mut self, command: Command);
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, command: Command) {
        (**self).send(command);
    }
}

/// Sink that keeps every command it receives, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    commands: Vec<Command>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: Command) {
        self.commands.push(command);
    }
}

/// Owner of the mute state.
///
/// The device boots muted, so construction sends [`Command::Mute`] to bring
/// the host in line.
#[derive(Debug)]
pub struct MuteController<S> {
    sink: S,
    muted: bool,
}

impl<S: CommandSink> MuteController<S> {
    pub fn new(mut sink: S) -> Self {
        sink.send(Command::Mute);
        Self { sink, muted: true }
    }

    #[must_use]
    pub const fn muted(&self) -> bool {
        self.muted
    }

    /// Set the mute state, always telling the host even if nothing changed.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let command = if muted {
            Command::Mute
        } else {
            Command::Unmute
        };
        self.sink.send(command);
    }

    pub fn toggle(&mut self) {
        self.set_muted(!self.muted);
        info!("{}", if self.muted { "Muted" } else { "Unmuted" });
    }

    /// Send `|delta|` volume steps, up for positive and down for negative.
    pub fn change_volume(&mut self, delta: i32) {
        let command = match delta.signum() {
            1 => Command::VolumeUp,
            -1 => Command::VolumeDown,
            _ => return,
        };
        debug!("Volume {command} x{}", delta.unsigned_abs());
        for _ in 0..delta.unsigned_abs() {
            self.sink.send(command);
        }
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
