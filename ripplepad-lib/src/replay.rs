//! Scripted input and captured output
//!
//! Stand-ins for the hardware collaborators: [`ReplayKeys`] and
//! [`ReplayDial`] release timestamped input once the clock reaches it, and
//! [`FrameCapture`] is an LED strip that remembers every frame written to it.
//! The simulator and the scheduler tests drive the engine with these.

use core::convert::Infallible;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smart_leds::SmartLedsWrite;

use crate::dial::EncoderSource;
use crate::history::{KeyEvent, KeyId};
use crate::scheduler::KeySource;
use crate::RGB8;

/// One timestamped input step.
///
/// Serialized untagged, so a script is a flat JSON list of
/// `{"at_ms", "key", "pressed"}`, `{"at_ms", "turn"}` and
/// `{"at_ms", "button"}` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Key { at_ms: u64, key: KeyId, pressed: bool },
    /// Move the encoder position by `turn` detents
    Turn { at_ms: u64, turn: i32 },
    /// Press the encoder button (`false` is ignored)
    Button { at_ms: u64, button: bool },
}

impl ScriptStep {
    #[must_use]
    pub const fn at_ms(&self) -> u64 {
        match *self {
            Self::Key { at_ms, .. } | Self::Turn { at_ms, .. } | Self::Button { at_ms, .. } => {
                at_ms
            }
        }
    }
}

/// Split a script into key and encoder replay sources.
#[must_use]
pub fn replay_script(steps: &[ScriptStep]) -> (ReplayKeys, ReplayDial) {
    let mut keys = Vec::new();
    let mut turns = Vec::new();
    let mut presses = Vec::new();
    for step in steps {
        match *step {
            ScriptStep::Key {
                at_ms,
                key,
                pressed,
            } => keys.push((at_ms, KeyEvent { key, pressed })),
            ScriptStep::Turn { at_ms, turn } => turns.push((at_ms, turn)),
            ScriptStep::Button { at_ms, button: true } => presses.push(at_ms),
            ScriptStep::Button { button: false, .. } => {}
        }
    }
    (ReplayKeys::new(keys), ReplayDial::new(0, turns, presses))
}

/// Key events released in timestamp order.
#[derive(Debug, Clone, Default)]
pub struct ReplayKeys {
    pending: VecDeque<(u64, KeyEvent)>,
}

impl ReplayKeys {
    /// Events with equal timestamps keep their relative order.
    #[must_use]
    pub fn new(mut events: Vec<(u64, KeyEvent)>) -> Self {
        events.sort_by_key(|&(at_ms, _)| at_ms);
        Self {
            pending: events.into(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl KeySource for ReplayKeys {
    fn next_event(&mut self, now_ms: u64) -> Option<KeyEvent> {
        match self.pending.front() {
            Some(&(at_ms, _)) if at_ms <= now_ms => {
                self.pending.pop_front().map(|(_, event)| event)
            }
            _ => None,
        }
    }
}

/// Encoder turns and button presses released in timestamp order.
#[derive(Debug, Clone, Default)]
pub struct ReplayDial {
    position: i32,
    turns: VecDeque<(u64, i32)>,
    presses: VecDeque<u64>,
}

impl ReplayDial {
    #[must_use]
    pub fn new(position: i32, mut turns: Vec<(u64, i32)>, mut presses: Vec<u64>) -> Self {
        turns.sort_by_key(|&(at_ms, _)| at_ms);
        presses.sort_unstable();
        Self {
            position,
            turns: turns.into(),
            presses: presses.into(),
        }
    }
}

impl EncoderSource for ReplayDial {
    fn position(&mut self, now_ms: u64) -> i32 {
        while let Some(&(at_ms, turn)) = self.turns.front() {
            if at_ms > now_ms {
                break;
            }
            self.position = self.position.wrapping_add(turn);
            self.turns.pop_front();
        }
        self.position
    }

    fn button_pressed(&mut self, now_ms: u64) -> bool {
        match self.presses.front() {
            Some(&at_ms) if at_ms <= now_ms => {
                self.presses.pop_front();
                true
            }
            _ => false,
        }
    }
}

/// LED strip that records each written frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCapture {
    frames: Vec<Vec<RGB8>>,
}

impl FrameCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frames(&self) -> &[Vec<RGB8>] {
        &self.frames
    }

    #[must_use]
    pub fn last(&self) -> Option<&[RGB8]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl SmartLedsWrite for FrameCapture {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.frames.push(iterator.into_iter().map(Into::into).collect());
        Ok(())
    }
}
