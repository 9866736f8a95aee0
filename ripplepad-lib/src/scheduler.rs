//! Engine context and the two scheduling disciplines
//!
//! [`Macropad`] owns every piece of engine state: the event tracker, the mute
//! controller, the animator, the dial and the settings store. It is driven
//! either way:
//!
//! - **polled**: an outer loop calls [`Macropad::tick_sync`] as often as it
//!   likes. Keys, dial and frames each sit behind a [`Cadence`] gate, so work
//!   only happens when its period has elapsed.
//! - **cooperative**: [`run_cooperative`] runs one async loop per concern on
//!   a single task, each paced by its own interval.
//!
//! Both use the same periods and the same ordering at coinciding instants
//! (input first, then the frame, then ripple aging), so the same timestamped
//! input yields the same commands and the same pixels.

use core::cell::RefCell;
use core::fmt::Debug;
use std::time::Duration;

use log::{debug, info, warn};
use smart_leds::{brightness, gamma, SmartLedsWrite};
use tokio::task::yield_now;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::animator::{Animator, Frame};
use crate::command::{CommandSink, MuteController};
use crate::config::{BakedConfig, TimingConfig};
use crate::dial::{Dial, EncoderSource};
use crate::gesture::{classify, Gesture};
use crate::history::{EventTracker, KeyEvent};
use crate::settings::SettingsStore;
use crate::RGB8;

/// Most stale events discarded before scheduling starts.
pub const STARTUP_DRAIN_CAP: usize = 64;

/// Source of debounced key events.
pub trait KeySource {
    /// Next pending event at `now_ms`, or `None` when the queue is empty.
    fn next_event(&mut self, now_ms: u64) -> Option<KeyEvent>;
}

impl<K: KeySource + ?Sized> KeySource for &mut K {
    fn next_event(&mut self, now_ms: u64) -> Option<KeyEvent> {
        (**self).next_event(now_ms)
    }
}

/// Elapsed-time gate for the polled discipline.
///
/// The first check always passes; after that a check passes once `period_ms`
/// has elapsed since the last pass.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    period_ms: u64,
    last: Option<u64>,
}

impl Cadence {
    #[must_use]
    pub const fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            last: None,
        }
    }

    pub fn admit(&mut self, now_ms: u64) -> bool {
        match self.last {
            Some(last) if now_ms.saturating_sub(last) < self.period_ms => false,
            _ => {
                self.last = Some(now_ms);
                true
            }
        }
    }
}

/// Engine state shared by all tasks.
#[derive(Debug)]
pub struct Macropad<C, S> {
    tracker: EventTracker,
    mute: MuteController<C>,
    animator: Animator,
    dial: Dial,
    settings: S,
    timing: TimingConfig,
    key_cadence: Cadence,
    dial_cadence: Cadence,
    frame_cadence: Cadence,
}

impl<C: CommandSink, S: SettingsStore> Macropad<C, S> {
    /// Build the engine. The mute controller announces the muted boot state
    /// on `sink` right away.
    pub fn new(baked: BakedConfig, sink: C, settings: S) -> Self {
        let BakedConfig {
            animator,
            timing,
            brightness_step,
        } = baked;
        Self {
            tracker: EventTracker::new(),
            mute: MuteController::new(sink),
            animator,
            dial: Dial::new(brightness_step),
            settings,
            key_cadence: Cadence::new(timing.key_poll_ms),
            dial_cadence: Cadence::new(timing.dial_poll_ms),
            frame_cadence: Cadence::new(timing.frame_period_ms),
            timing,
        }
    }

    /// Discard key events left over from boot and seed the encoder baseline.
    ///
    /// Returns the number of discarded events, at most
    /// [`STARTUP_DRAIN_CAP`].
    pub fn start<K, E>(&mut self, keys: &mut K, encoder: &mut E, now_ms: u64) -> usize
    where
        K: KeySource,
        E: EncoderSource,
    {
        let drained = core::iter::from_fn(|| keys.next_event(now_ms))
            .take(STARTUP_DRAIN_CAP)
            .count();
        if drained == STARTUP_DRAIN_CAP {
            warn!("Startup drain hit the cap of {STARTUP_DRAIN_CAP} events");
        } else if drained > 0 {
            debug!("Discarded {drained} stale key events");
        }
        self.dial.seed(encoder, now_ms);
        info!("Macropad started");
        drained
    }

    /// Track and classify one pending event, toggling mute when asked to.
    pub fn handle_event(&mut self, event: Option<KeyEvent>) -> Gesture {
        if self.tracker.observe(event).is_none() {
            return Gesture::None;
        }
        let gesture = classify(self.tracker.gestures());
        match gesture {
            Gesture::Toggle => self.mute.toggle(),
            Gesture::Rocker => debug!("Rocker gesture, toggle suppressed"),
            Gesture::None => {}
        }
        gesture
    }

    /// Pull at most one event from `keys` and handle it.
    pub fn poll_keys<K: KeySource>(&mut self, keys: &mut K, now_ms: u64) -> Gesture {
        self.handle_event(keys.next_event(now_ms))
    }

    /// Read the encoder once and apply it.
    pub fn poll_dial<E: EncoderSource>(&mut self, encoder: &mut E, now_ms: u64) -> i32 {
        self.dial.poll(now_ms, encoder, &mut self.settings, &mut self.mute)
    }

    /// Render one frame, write it to `strip` and advance the palette.
    ///
    /// Does not age ripples; see [`Frame::age_ripples`].
    pub fn render<W>(&mut self, strip: &mut W) -> Frame
    where
        W: SmartLedsWrite<Color = RGB8>,
        W::Error: Debug,
    {
        let frame = self
            .animator
            .render_frame(self.mute.muted(), self.tracker.ripples());
        let level = brightness_level(self.settings.brightness());
        // Apply gamma correction first, then brightness reduction
        if let Err(e) = strip.write(brightness(gamma(frame.pixels.iter().copied()), level)) {
            warn!("Failed to write LEDs: {e:?}");
        }
        frame
    }

    pub fn age_ripples(&mut self) {
        self.tracker.age_ripple_history();
    }

    /// One pass of the polled discipline.
    ///
    /// In order: at most one key event, the encoder, and a frame, each only
    /// if its period has elapsed. Ripples age right after every
    /// `ripple_age_ratio`-th frame.
    pub fn tick_sync<K, E, W>(
        &mut self,
        now_ms: u64,
        keys: &mut K,
        encoder: &mut E,
        strip: &mut W,
    ) where
        K: KeySource,
        E: EncoderSource,
        W: SmartLedsWrite<Color = RGB8>,
        W::Error: Debug,
    {
        if self.key_cadence.admit(now_ms) {
            self.poll_keys(keys, now_ms);
        }
        if self.dial_cadence.admit(now_ms) {
            self.poll_dial(encoder, now_ms);
        }
        if self.frame_cadence.admit(now_ms) && self.render(strip).age_ripples {
            self.age_ripples();
        }
    }

    #[must_use]
    pub const fn tracker(&self) -> &EventTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn mute(&self) -> &MuteController<C> {
        &self.mute
    }

    #[must_use]
    pub const fn animator(&self) -> &Animator {
        &self.animator
    }

    #[must_use]
    pub const fn dial(&self) -> &Dial {
        &self.dial
    }

    #[must_use]
    pub const fn settings(&self) -> &S {
        &self.settings
    }

    #[must_use]
    pub const fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}

/// Run the cooperative discipline until the returned future is dropped.
///
/// Four loops share one task: key polling, encoder polling, frame rendering
/// and ripple aging. `pad` is only borrowed between suspension points, so no
/// loop ever observes another one half way through an update.
///
/// `join!` polls its branches in rotating order, so loops due at the same
/// instant yield a fixed number of times to settle into key, dial, frame,
/// aging order. Each `yield_now` costs exactly one poll round.
pub async fn run_cooperative<C, S, K, E, W>(
    pad: &RefCell<Macropad<C, S>>,
    keys: &mut K,
    encoder: &mut E,
    strip: &mut W,
) where
    C: CommandSink,
    S: SettingsStore,
    K: KeySource,
    E: EncoderSource,
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: Debug,
{
    let timing = *pad.borrow().timing();
    let start = Instant::now();
    pad.borrow_mut().start(keys, encoder, 0);

    let key_loop = async {
        let mut ticker = paced_interval(start, timing.key_poll_ms);
        loop {
            let now_ms = elapsed_ms(start, ticker.tick().await);
            pad.borrow_mut().poll_keys(keys, now_ms);
        }
    };

    let dial_loop = async {
        let mut ticker = paced_interval(start, timing.dial_poll_ms);
        loop {
            let now_ms = elapsed_ms(start, ticker.tick().await);
            // Keys polled at this same instant go first
            yield_now().await;
            pad.borrow_mut().poll_dial(encoder, now_ms);
        }
    };

    let frame_loop = async {
        let mut ticker = paced_interval(start, timing.frame_period_ms);
        loop {
            ticker.tick().await;
            // Then the dial
            yield_now().await;
            yield_now().await;
            pad.borrow_mut().render(strip);
        }
    };

    let aging_loop = async {
        let mut ticker = paced_interval(start, timing.ripple_age_period_ms());
        loop {
            ticker.tick().await;
            // Then the frame
            for _ in 0..3 {
                yield_now().await;
            }
            pad.borrow_mut().age_ripples();
        }
    };

    tokio::join!(key_loop, dial_loop, frame_loop, aging_loop);
}

/// Interval starting at `start`. A zero period is raised to 1 ms, which
/// `interval_at` requires.
fn paced_interval(start: Instant, period_ms: u64) -> Interval {
    let mut ticker = interval_at(start, Duration::from_millis(period_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn elapsed_ms(start: Instant, tick: Instant) -> u64 {
    u64::try_from(tick.duration_since(start).as_millis()).unwrap_or(u64::MAX)
}

fn brightness_level(brightness: f32) -> u8 {
    let brightness = if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 1.0)
    };
    // brightness in [0, 1] keeps the product in [0, 255]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let level = (brightness * 255.0).round() as u8;
    level
}
