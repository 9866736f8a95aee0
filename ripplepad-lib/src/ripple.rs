//! Ripple masks for key presses
//!
//! Instead of computing expanding radii per frame, each ripple level has a
//! hand-drawn 5x7 stencil whose center sits at row 2, column 3. Cropping a
//! 3x4 window out of it re-centers the ring on the pressed key: the key's
//! `(row, col)` picks which stencil rows and columns fall off the edges.
//!
//! ```text
//!    KeyId grid           (row, col)
//!   | 0  1  2  3 |     | 0,0 0,1 0,2 0,3 |
//!   | 4  5  6  7 |     | 1,0 1,1 1,2 1,3 |
//!   | 8  9 10 11 |     | 2,0 2,1 2,2 2,3 |
//!
//!   stencil rows    2-row .. 5-row
//!   stencil cols    3-col .. 7-col
//! ```
//!
//! Key 0 keeps stencil rows 2..5 and columns 3..7; key 11 keeps rows 0..3 and
//! columns 0..4. Every valid key stays inside the stencil.
//!
//! Cropped masks from every press at every level are summed, not OR'd, so
//! overlapping ripples report how many rings cross a key.

use num_integer::div_rem;

use crate::history::{KeyId, RippleHistory, RIPPLE_DEPTH};
use crate::{GRID_COLS, GRID_ROWS, KEY_COUNT};

const STENCIL_ROWS: usize = 5;
const STENCIL_COLS: usize = 7;

type Stencil = [[u8; STENCIL_COLS]; STENCIL_ROWS];

/// Per-key ripple emphasis, in KeyId order.
pub type Emphasis = [u8; KEY_COUNT];

/// One stencil per ripple level; rings grow as the press ages.
#[rustfmt::skip]
const STENCILS: [Stencil; RIPPLE_DEPTH] = [
    [
        [0, 0, 0, 0, 0, 0, 0],
        [0, 0, 0, 1, 0, 0, 0],
        [0, 0, 1, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0, 0],
        [0, 0, 0, 0, 0, 0, 0],
    ],
    [
        [0, 0, 0, 1, 0, 0, 0],
        [0, 0, 1, 0, 1, 0, 0],
        [0, 1, 0, 0, 0, 1, 0],
        [0, 0, 1, 0, 1, 0, 0],
        [0, 0, 0, 1, 0, 0, 0],
    ],
    [
        [0, 0, 1, 0, 1, 0, 0],
        [0, 1, 0, 0, 0, 1, 0],
        [1, 0, 0, 0, 0, 0, 1],
        [0, 1, 0, 0, 0, 1, 0],
        [0, 0, 1, 0, 1, 0, 0],
    ],
    [
        [0, 1, 0, 0, 0, 1, 0],
        [1, 0, 0, 0, 0, 0, 1],
        [0, 0, 0, 0, 0, 0, 0],
        [1, 0, 0, 0, 0, 0, 1],
        [0, 1, 0, 0, 0, 1, 0],
    ],
];

/// Sum the cropped stencils of every press in the ripple history.
///
/// Returns all zeros without touching any stencil when no presses are
/// recorded.
#[must_use]
pub fn press_ripple_frame(history: &RippleHistory) -> Emphasis {
    let mut emphasis = [0u8; KEY_COUNT];
    if history.is_empty() {
        return emphasis;
    }

    for (stencil, bucket) in STENCILS.iter().zip(history.levels()) {
        for &key in bucket {
            add_cropped(&mut emphasis, stencil, key);
        }
    }
    emphasis
}

/// Add the stencil window centered on `key` into `emphasis`.
fn add_cropped(emphasis: &mut Emphasis, stencil: &Stencil, key: KeyId) {
    let (row, col) = div_rem(usize::from(key), GRID_COLS);
    let row_start = 2 - row;
    let col_start = 3 - col;

    for grid_row in 0..GRID_ROWS {
        let source = &stencil[row_start + grid_row][col_start..col_start + GRID_COLS];
        let target = &mut emphasis[grid_row * GRID_COLS..(grid_row + 1) * GRID_COLS];
        for (slot, &value) in target.iter_mut().zip(source) {
            *slot = slot.saturating_add(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{EventTracker, KeyEvent};

    fn tracker_with_presses(keys: &[KeyId]) -> EventTracker {
        let mut tracker = EventTracker::new();
        for &key in keys {
            tracker.observe(Some(KeyEvent::press(key)));
            tracker.observe(Some(KeyEvent::release(key)));
        }
        tracker
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let tracker = EventTracker::new();
        assert_eq!(press_ripple_frame(tracker.ripples()), [0; KEY_COUNT]);
    }

    #[test]
    fn test_fresh_press_lights_direct_neighbors() {
        let tracker = tracker_with_presses(&[5]);
        let emphasis = press_ripple_frame(tracker.ripples());
        #[rustfmt::skip]
        let expected = [
            0, 1, 0, 0,
            1, 0, 1, 0,
            0, 1, 0, 0,
        ];
        assert_eq!(emphasis, expected);
    }

    #[test]
    fn test_corner_press_is_cropped() {
        let tracker = tracker_with_presses(&[0]);
        let emphasis = press_ripple_frame(tracker.ripples());
        #[rustfmt::skip]
        let expected = [
            0, 1, 0, 0,
            1, 0, 0, 0,
            0, 0, 0, 0,
        ];
        assert_eq!(emphasis, expected);
    }

    #[test]
    fn test_far_corner_press_is_cropped() {
        let tracker = tracker_with_presses(&[11]);
        let emphasis = press_ripple_frame(tracker.ripples());
        #[rustfmt::skip]
        let expected = [
            0, 0, 0, 0,
            0, 0, 0, 1,
            0, 0, 1, 0,
        ];
        assert_eq!(emphasis, expected);
    }

    #[test]
    fn test_ring_grows_with_age() {
        let mut tracker = tracker_with_presses(&[5]);
        tracker.age_ripple_history();
        let emphasis = press_ripple_frame(tracker.ripples());
        #[rustfmt::skip]
        let expected = [
            1, 0, 1, 0,
            0, 0, 0, 1,
            1, 0, 1, 0,
        ];
        assert_eq!(emphasis, expected);
    }

    #[test]
    fn test_overlapping_presses_sum() {
        // Key 0 and key 2 both ring key 1
        let tracker = tracker_with_presses(&[0, 2]);
        let emphasis = press_ripple_frame(tracker.ripples());
        assert_eq!(emphasis[1], 2);
        assert_eq!(emphasis[4], 1);
        assert_eq!(emphasis[3], 1);
        assert_eq!(emphasis[6], 1);
    }

    #[test]
    fn test_levels_accumulate_across_ages() {
        let mut tracker = tracker_with_presses(&[5]);
        tracker.age_ripple_history();
        tracker.observe(Some(KeyEvent::press(5)));
        let emphasis = press_ripple_frame(tracker.ripples());
        // Level 0 ring plus level 1 ring around the same key do not overlap
        assert_eq!(emphasis.iter().map(|&v| u32::from(v)).sum::<u32>(), 4 + 5);
    }

    #[test]
    fn test_every_key_crops_in_bounds() {
        for key in 0..KEY_COUNT as KeyId {
            let mut tracker = tracker_with_presses(&[key]);
            for _ in 0..RIPPLE_DEPTH {
                let _ = press_ripple_frame(tracker.ripples());
                tracker.age_ripple_history();
            }
        }
    }

    #[test]
    fn test_fully_aged_history_is_zero() {
        let mut tracker = tracker_with_presses(&[3, 7]);
        for _ in 0..RIPPLE_DEPTH {
            tracker.age_ripple_history();
        }
        assert_eq!(press_ripple_frame(tracker.ripples()), [0; KEY_COUNT]);
    }
}
