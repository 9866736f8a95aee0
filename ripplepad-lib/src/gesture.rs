//! Press/release pattern classification
//!
//! Runs once per observed event over the gesture history. Two patterns are
//! recognized:
//!
//! - **Rocker**: one key down, a second key down, first key up, second key up.
//!   Snapshot sizes read `0, 1, 2, 1, 0`, both single-key snapshots are
//!   proper subsets of the two-key snapshot, and the two singles differ.
//! - **Toggle**: the newest two snapshot sizes are `1, 0` (first key down from
//!   idle) or `0, 1` (last key up).
//!
//! The rocker check runs first and swallows the toggle that its final release
//! would otherwise produce. Anything else, such as a second key joining a
//! held one, is a gesture in progress and yields [`Gesture::None`].

use crate::history::GestureHistory;

/// Outcome of classifying a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    None,
    /// Mute/unmute boundary event
    Toggle,
    /// Completed two-key rocker swipe
    Rocker,
}

/// Classify the latest event from the gesture history.
#[must_use]
pub fn classify(history: &GestureHistory) -> Gesture {
    if recognize_rocker(history) {
        Gesture::Rocker
    } else if recognize_toggle(history) {
        Gesture::Toggle
    } else {
        Gesture::None
    }
}

fn recognize_rocker(history: &GestureHistory) -> bool {
    if history.sizes() != [0, 1, 2, 1, 0] {
        return false;
    }
    let new_state = history.get(1);
    let mid_state = history.get(2);
    let old_state = history.get(3);
    new_state.is_proper_subset(mid_state)
        && old_state.is_proper_subset(mid_state)
        && new_state != old_state
}

fn recognize_toggle(history: &GestureHistory) -> bool {
    history.gesture_started() || history.gesture_ended()
}
