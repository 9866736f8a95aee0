use proptest::prelude::*;

use ripplepad_lib::command::{Command, RecordingSink};
use ripplepad_lib::settings::PackedSettings;
use ripplepad_lib::{Gesture, KeyEvent, Macropad, PadConfig};

fn pad() -> Macropad<RecordingSink, PackedSettings> {
    let baked = PadConfig::default().bake().unwrap();
    Macropad::new(baked, RecordingSink::new(), PackedSettings::default())
}

fn feed(
    pad: &mut Macropad<RecordingSink, PackedSettings>,
    events: &[KeyEvent],
) -> Vec<Gesture> {
    events.iter().map(|&e| pad.handle_event(Some(e))).collect()
}

#[test]
fn test_tap_sends_one_toggle_pair() {
    let mut pad = pad();
    feed(&mut pad, &[KeyEvent::press(7), KeyEvent::release(7)]);
    assert_eq!(
        pad.mute().sink().commands(),
        [Command::Mute, Command::Unmute, Command::Mute]
    );
}

#[test]
fn test_rocker_leaves_state_latched() {
    let mut pad = pad();
    let gestures = feed(
        &mut pad,
        &[
            KeyEvent::press(2),
            KeyEvent::press(3),
            KeyEvent::release(2),
            KeyEvent::release(3),
        ],
    );
    assert_eq!(gestures.last(), Some(&Gesture::Rocker));
    // Only the opening press toggled; the closing release was swallowed
    assert!(!pad.mute().muted());
    assert_eq!(pad.mute().sink().commands(), [Command::Mute, Command::Unmute]);
}

#[test]
fn test_held_chord_sends_nothing_until_released() {
    let mut pad = pad();
    feed(
        &mut pad,
        &[
            KeyEvent::press(0),
            KeyEvent::press(5),
            KeyEvent::press(10),
        ],
    );
    assert_eq!(pad.mute().sink().commands().len(), 2);
}

#[test]
fn test_duplicate_release_is_tolerated() {
    let mut pad = pad();
    let gestures = feed(
        &mut pad,
        &[
            KeyEvent::press(4),
            KeyEvent::release(4),
            KeyEvent::release(4),
        ],
    );
    assert_eq!(gestures, [Gesture::Toggle, Gesture::Toggle, Gesture::None]);
    assert!(pad.tracker().pressed().is_empty());
}

proptest! {
    #[test]
    fn prop_rocker_emits_single_toggle(a in 0u8..12, b in 0u8..12) {
        prop_assume!(a != b);
        let mut pad = pad();
        let gestures = feed(
            &mut pad,
            &[
                KeyEvent::press(a),
                KeyEvent::press(b),
                KeyEvent::release(a),
                KeyEvent::release(b),
            ],
        );
        prop_assert_eq!(
            gestures,
            vec![Gesture::Toggle, Gesture::None, Gesture::None, Gesture::Rocker]
        );
        prop_assert_eq!(pad.mute().sink().commands().len(), 2);
    }

    #[test]
    fn prop_tap_emits_toggle_pair(key in 0u8..12) {
        let mut pad = pad();
        let gestures = feed(&mut pad, &[KeyEvent::press(key), KeyEvent::release(key)]);
        prop_assert_eq!(gestures, vec![Gesture::Toggle, Gesture::Toggle]);
        prop_assert!(pad.mute().muted());
    }
}
