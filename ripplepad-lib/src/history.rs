//! Key event history
//!
//! The tracker keeps three pieces of state, all fixed-size:
//!
//! - the set of currently held keys
//! - a 5-deep gesture history of pressed-set snapshots (newest first), pushed
//!   once per observed event and read by the gesture classifier
//! - a 4-deep ripple history of press buckets (newest first). Presses pile
//!   into bucket 0 until the animator ages the ring, so every press that lands
//!   between two aging steps ripples in lockstep.
//!
//! Only [`EventTracker`] mutates these. The classifier and the ripple mask
//! engine only read them.

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::KEY_COUNT;

/// Key identifier in `[0, 11]`, row-major on the 4x3 landscape grid.
pub type KeyId = u8;

/// Depth of the gesture history ring.
pub const GESTURE_DEPTH: usize = 5;

/// Depth of the ripple history ring (one stencil per level).
pub const RIPPLE_DEPTH: usize = 4;

/// Presses stored inline per ripple bucket before spilling to the heap
const BUCKET_INLINE: usize = KEY_COUNT;

/// A single debounced press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: KeyId,
    pub pressed: bool,
}

impl KeyEvent {
    #[must_use]
    pub const fn press(key: KeyId) -> Self {
        Self { key, pressed: true }
    }

    #[must_use]
    pub const fn release(key: KeyId) -> Self {
        Self { key, pressed: false }
    }
}

/// Set of held keys, one bit per [`KeyId`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeySet(u16);

impl KeySet {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, key: KeyId) -> bool {
        key < KEY_COUNT as KeyId && self.0 & (1 << key) != 0
    }

    /// `true` when every key in `self` is in `other` and `other` holds more.
    #[must_use]
    pub const fn is_proper_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0 && self.0 != other.0
    }

    fn insert(&mut self, key: KeyId) {
        self.0 |= 1 << key;
    }

    fn remove(&mut self, key: KeyId) {
        self.0 &= !(1 << key);
    }

    pub fn iter(self) -> impl Iterator<Item = KeyId> {
        (0..KEY_COUNT as KeyId).filter(move |&k| self.contains(k))
    }
}

impl FromIterator<KeyId> for KeySet {
    fn from_iter<I: IntoIterator<Item = KeyId>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for key in iter {
            if usize::from(key) < KEY_COUNT {
                set.insert(key);
            }
        }
        set
    }
}

/// Ring of pressed-set snapshots, newest first.
#[derive(Debug, Clone, Default)]
pub struct GestureHistory {
    slots: [KeySet; GESTURE_DEPTH],
    head: usize,
}

impl GestureHistory {
    /// Snapshot `age` steps back (0 = newest).
    #[must_use]
    pub fn get(&self, age: usize) -> KeySet {
        self.slots[(self.head + age) % GESTURE_DEPTH]
    }

    /// Snapshot sizes, newest first.
    #[must_use]
    pub fn sizes(&self) -> [usize; GESTURE_DEPTH] {
        core::array::from_fn(|age| self.get(age).len())
    }

    /// First key went down from idle.
    #[must_use]
    pub fn gesture_started(&self) -> bool {
        self.get(0).len() == 1 && self.get(1).is_empty()
    }

    /// Last key came up.
    #[must_use]
    pub fn gesture_ended(&self) -> bool {
        self.get(0).is_empty() && self.get(1).len() == 1
    }

    fn push(&mut self, snapshot: KeySet) {
        self.head = (self.head + GESTURE_DEPTH - 1) % GESTURE_DEPTH;
        self.slots[self.head] = snapshot;
    }
}

/// Presses collected between two aging steps.
pub type RippleBucket = SmallVec<[KeyId; BUCKET_INLINE]>;

/// Ring of press buckets, newest first.
#[derive(Debug, Clone, Default)]
pub struct RippleHistory {
    buckets: [RippleBucket; RIPPLE_DEPTH],
    head: usize,
}

impl RippleHistory {
    /// Bucket at aging `level` (0 = presses since the last aging step).
    #[must_use]
    pub fn level(&self, level: usize) -> &[KeyId] {
        &self.buckets[(self.head + level) % RIPPLE_DEPTH]
    }

    /// Buckets from newest to oldest.
    pub fn levels(&self) -> impl Iterator<Item = &[KeyId]> + '_ {
        (0..RIPPLE_DEPTH).map(move |level| self.level(level))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(SmallVec::is_empty)
    }

    fn record(&mut self, key: KeyId) {
        self.buckets[self.head].push(key);
    }

    fn age(&mut self) {
        // The oldest slot becomes the fresh bucket 0
        self.head = (self.head + RIPPLE_DEPTH - 1) % RIPPLE_DEPTH;
        self.buckets[self.head].clear();
    }
}

/// Owner of the pressed-key set and both histories.
#[derive(Debug, Clone, Default)]
pub struct EventTracker {
    pressed: KeySet,
    gestures: GestureHistory,
    ripples: RippleHistory,
}

impl EventTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one pending event (if any) into the histories and hand it back.
    ///
    /// Releasing a key that is not held is a no-op on the set but still
    /// pushes a snapshot. Events for keys outside the grid are dropped and
    /// yield `None`.
    pub fn observe(&mut self, event: Option<KeyEvent>) -> Option<KeyEvent> {
        let event = event?;
        if usize::from(event.key) >= KEY_COUNT {
            debug!("Ignoring event for out-of-range key {}", event.key);
            return None;
        }

        if event.pressed {
            self.pressed.insert(event.key);
            self.ripples.record(event.key);
        } else {
            self.pressed.remove(event.key);
        }
        self.gestures.push(self.pressed);

        debug!(
            "Key {} {}: held={:?}",
            event.key,
            if event.pressed { "down" } else { "up" },
            self.pressed.iter().collect::<SmallVec<[KeyId; KEY_COUNT]>>()
        );
        Some(event)
    }

    /// Shift the ripple ring one step older and open an empty bucket 0.
    ///
    /// Driven by the frame cadence, never by events.
    pub fn age_ripple_history(&mut self) {
        self.ripples.age();
    }

    #[must_use]
    pub fn pressed(&self) -> KeySet {
        self.pressed
    }

    #[must_use]
    pub fn gestures(&self) -> &GestureHistory {
        &self.gestures
    }

    #[must_use]
    pub fn ripples(&self) -> &RippleHistory {
        &self.ripples
    }
}
