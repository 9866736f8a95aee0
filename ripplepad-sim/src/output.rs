//! Terminal stand-ins for the LED strip and the HID transport

use std::collections::HashMap;
use std::io::{self, Write};

use log::info;
use ripplepad_lib::{Command, CommandSink, RGB8};
use smart_leds::SmartLedsWrite;

/// Prints each written frame as a row of true-color blocks.
#[derive(Debug, Default)]
pub struct TerminalStrip {
    quiet: bool,
    frames: u64,
}

impl TerminalStrip {
    pub fn new(quiet: bool) -> Self {
        Self { quiet, frames: 0 }
    }

    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl SmartLedsWrite for TerminalStrip {
    type Error = io::Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let index = self.frames;
        self.frames += 1;
        if self.quiet {
            return Ok(());
        }

        let mut line = format!("frame {index:>5} ");
        for pixel in iterator {
            let c: RGB8 = pixel.into();
            line.push_str(&format!("\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b));
        }
        line.push_str("\x1b[0m\n");

        let mut stdout = io::stdout().lock();
        stdout.write_all(line.as_bytes())?;
        stdout.flush()
    }
}

/// Logs commands instead of sending them, and counts them.
#[derive(Debug, Default)]
pub struct LoggingSink {
    counts: HashMap<Command, usize>,
}

impl LoggingSink {
    pub fn count(&self, command: Command) -> usize {
        self.counts.get(&command).copied().unwrap_or(0)
    }
}

impl CommandSink for LoggingSink {
    fn send(&mut self, command: Command) {
        info!("HID send {command} ({})", command.code());
        *self.counts.entry(command).or_default() += 1;
    }
}
