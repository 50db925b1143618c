//! Gesture state machine.
//!
//! Turns one [`FrameObservation`] per camera frame into at most one
//! [`Command`]. Steps run in a fixed priority order every tick:
//!
//! 1. two-hand enable/disable toggle (always evaluated, even when disabled)
//! 2. single-hand start/exit hold and navigation intent
//! 3. auto-slide repeat while pointing
//!
//! The engine never reads a clock. Every comparison uses the `now` passed to
//! [`GestureEngine::tick`], so tests can drive it with synthetic instants.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::classifier::{index_raised, is_open_palm};
use super::landmarks::Handedness;
use super::observation::{FrameObservation, ObservedHand};
use crate::command::{Command, SlideDirection};

// ============================================================================
// Timings
// ============================================================================

/// Timing windows used by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTimings {
    /// Repeat interval for auto next/prev.
    pub slide_interval: Duration,
    /// Minimum gap between start/exit actions.
    pub special_cooldown: Duration,
    /// Minimum gap between enable/disable toggles.
    pub toggle_cooldown: Duration,
    /// Single open-palm hold needed for start/exit.
    pub palm_hold_time: Duration,
    /// Two open-palm hold needed to toggle.
    pub two_hand_hold_time: Duration,
    /// Single-hand lockout after a toggle.
    pub post_toggle_delay: Duration,
    /// Single-hand lockout after any two-hand frame.
    pub two_hand_lock_time: Duration,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            slide_interval: Duration::from_millis(1000),
            special_cooldown: Duration::from_millis(1500),
            toggle_cooldown: Duration::from_millis(1500),
            palm_hold_time: Duration::from_millis(600),
            two_hand_hold_time: Duration::from_millis(1000),
            post_toggle_delay: Duration::from_millis(1200),
            two_hand_lock_time: Duration::from_millis(1000),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// State transitions worth logging. Separate from the dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Enabled,
    Disabled,
    Start,
    Exit,
    AutoNext,
    AutoPrev,
}

impl GestureEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "gestures enabled",
            Self::Disabled => "gestures disabled",
            Self::Start => "start slideshow",
            Self::Exit => "exit slideshow",
            Self::AutoNext => "auto next",
            Self::AutoPrev => "auto prev",
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tick {
    /// Command to dispatch this frame, if any.
    pub command: Option<Command>,
    /// Transitions that happened this frame.
    pub events: Vec<GestureEvent>,
}

impl Tick {
    /// Claim this tick's command slot. Returns false if a higher-priority
    /// step already emitted.
    fn emit(&mut self, command: Command, event: GestureEvent) -> bool {
        if let Some(existing) = self.command {
            debug!(suppressed = %command, kept = %existing, "command suppressed");
            return false;
        }
        self.command = Some(command);
        self.events.push(event);
        true
    }
}

// ============================================================================
// State
// ============================================================================

/// All mutable engine state. Timers are absent until first set.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    /// Global gate, flipped only by the two-hand hold.
    pub gestures_enabled: bool,
    /// Navigation intent from this frame's primary hand.
    pub active_mode: Option<SlideDirection>,
    pub last_slide_time: Option<Instant>,
    pub last_special_time: Option<Instant>,
    pub last_toggle_time: Option<Instant>,
    /// When the current single open-palm hold began.
    pub palm_start_time: Option<Instant>,
    /// Start/exit fired and the palm has not been lowered since.
    pub palm_awaiting_release: bool,
    /// When the current two open-palm hold began.
    pub two_hand_start_time: Option<Instant>,
    /// Single-hand gestures ignored until after this instant.
    pub gesture_resume_time: Option<Instant>,
    /// Single-hand gestures ignored until after this instant.
    pub two_hand_lock_until: Option<Instant>,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            gestures_enabled: true,
            active_mode: None,
            last_slide_time: None,
            last_special_time: None,
            last_toggle_time: None,
            palm_start_time: None,
            palm_awaiting_release: false,
            two_hand_start_time: None,
            gesture_resume_time: None,
            two_hand_lock_until: None,
        }
    }
}

/// `now - since`, saturating at zero.
fn elapsed(now: Instant, since: Instant) -> Duration {
    now.saturating_duration_since(since)
}

/// Strictly more than `cooldown` has passed since `last`, or it never happened.
fn cooldown_elapsed(last: Option<Instant>, now: Instant, cooldown: Duration) -> bool {
    last.is_none_or(|t| elapsed(now, t) > cooldown)
}

/// `now` is strictly past `until`, or there is no window.
fn window_passed(until: Option<Instant>, now: Instant) -> bool {
    until.is_none_or(|u| now > u)
}

/// `now + window`, saturating at the latest representable instant.
fn deadline(now: Instant, mut window: Duration) -> Instant {
    loop {
        if let Some(until) = now.checked_add(window) {
            return until;
        }
        window /= 2;
    }
}

/// Start a hold if none is running and report whether it has lasted `hold`.
fn hold_reached(start: &mut Option<Instant>, now: Instant, hold: Duration) -> bool {
    let began = *start.get_or_insert(now);
    elapsed(now, began) >= hold
}

// ============================================================================
// Engine
// ============================================================================

pub struct GestureEngine {
    timings: GestureTimings,
    state: GestureState,
}

impl GestureEngine {
    pub fn new(timings: GestureTimings) -> Self {
        Self::with_state(timings, GestureState::default())
    }

    pub fn with_state(timings: GestureTimings, state: GestureState) -> Self {
        Self { timings, state }
    }

    pub fn timings(&self) -> &GestureTimings {
        &self.timings
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn gestures_enabled(&self) -> bool {
        self.state.gestures_enabled
    }

    pub fn active_mode(&self) -> Option<SlideDirection> {
        self.state.active_mode
    }

    /// Advance the state machine by one frame.
    #[hotpath::measure]
    pub fn tick(&mut self, now: Instant, observation: &FrameObservation) -> Tick {
        let mut tick = Tick::default();

        self.handle_two_hands(now, observation, &mut tick);

        match observation.primary() {
            Some(hand) if self.single_hand_allowed(now) => {
                self.handle_single_hand(now, hand, &mut tick);
            }
            _ => {
                self.state.active_mode = None;
                self.state.palm_start_time = None;
                self.state.palm_awaiting_release = false;
            }
        }

        self.execute_auto_slide(now, &mut tick);

        tick
    }

    fn handle_two_hands(&mut self, now: Instant, observation: &FrameObservation, tick: &mut Tick) {
        let [first, second] = observation.hands() else {
            self.state.two_hand_start_time = None;
            return;
        };

        self.state.two_hand_lock_until = Some(deadline(now, self.timings.two_hand_lock_time));

        if !(is_open_palm(&first.pose) && is_open_palm(&second.pose)) {
            self.state.two_hand_start_time = None;
            return;
        }

        if self.state.two_hand_start_time.is_none() {
            debug!("two-hand hold started");
        }
        let held = hold_reached(
            &mut self.state.two_hand_start_time,
            now,
            self.timings.two_hand_hold_time,
        );
        if !held || !cooldown_elapsed(self.state.last_toggle_time, now, self.timings.toggle_cooldown)
        {
            return;
        }

        self.state.gestures_enabled = !self.state.gestures_enabled;
        let event = if self.state.gestures_enabled {
            info!("Gestures ENABLED");
            GestureEvent::Enabled
        } else {
            info!("Gestures DISABLED");
            GestureEvent::Disabled
        };

        self.state.gesture_resume_time = Some(deadline(now, self.timings.post_toggle_delay));
        self.state.active_mode = None;
        self.state.palm_start_time = None;
        self.state.last_toggle_time = Some(now);
        self.state.two_hand_start_time = None;

        tick.emit(Command::ToggleEnabled, event);
    }

    fn single_hand_allowed(&self, now: Instant) -> bool {
        self.state.gestures_enabled
            && window_passed(self.state.two_hand_lock_until, now)
            && window_passed(self.state.gesture_resume_time, now)
    }

    fn handle_single_hand(&mut self, now: Instant, hand: &ObservedHand, tick: &mut Tick) {
        // Start/exit, one shot per raised palm
        if !is_open_palm(&hand.pose) {
            self.state.palm_start_time = None;
            self.state.palm_awaiting_release = false;
        } else if !self.state.palm_awaiting_release {
            if self.state.palm_start_time.is_none() {
                debug!(hand = hand.handedness.as_str(), "palm hold started");
            }
            let held = hold_reached(
                &mut self.state.palm_start_time,
                now,
                self.timings.palm_hold_time,
            );
            if held
                && cooldown_elapsed(
                    self.state.last_special_time,
                    now,
                    self.timings.special_cooldown,
                )
            {
                let (command, event) = match hand.handedness {
                    Handedness::Right => (Command::Start, GestureEvent::Start),
                    Handedness::Left => (Command::Exit, GestureEvent::Exit),
                };
                if tick.emit(command, event) {
                    info!("{} SLIDESHOW", command);
                    self.state.last_special_time = Some(now);
                    self.state.palm_start_time = None;
                    self.state.palm_awaiting_release = true;
                }
            }
        }

        // Navigation
        self.state.active_mode = if index_raised(&hand.pose) {
            Some(match hand.handedness {
                Handedness::Right => SlideDirection::Next,
                Handedness::Left => SlideDirection::Prev,
            })
        } else {
            None
        };
    }

    fn execute_auto_slide(&mut self, now: Instant, tick: &mut Tick) {
        if !self.state.gestures_enabled {
            return;
        }
        let Some(direction) = self.state.active_mode else {
            return;
        };
        if !cooldown_elapsed(self.state.last_slide_time, now, self.timings.slide_interval) {
            return;
        }

        let event = match direction {
            SlideDirection::Next => GestureEvent::AutoNext,
            SlideDirection::Prev => GestureEvent::AutoPrev,
        };
        // A suppressed slide keeps its timer and fires on the next eligible frame
        if tick.emit(direction.command(), event) {
            info!("AUTO {}", direction.command());
            self.state.last_slide_time = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::test_poses::{fist, hand, open_palm, pointing};

    struct Harness {
        engine: GestureEngine,
        base: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_timings(GestureTimings::default())
        }

        fn with_timings(timings: GestureTimings) -> Self {
            Self {
                engine: GestureEngine::new(timings),
                base: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.base + Duration::from_millis(ms)
        }

        fn tick(&mut self, ms: u64, obs: &FrameObservation) -> Option<Command> {
            let now = self.at(ms);
            let tick = self.engine.tick(now, obs);
            assert!(tick.events.len() <= 1, "more than one event in a tick");
            if self.engine.state().two_hand_start_time.is_some() {
                assert_eq!(obs.hand_count(), 2);
            }
            tick.command
        }

        /// Tick every `step` ms over `[from, to]`, collecting (ms, command).
        fn run(&mut self, from: u64, to: u64, step: u64, obs: &FrameObservation) -> Vec<(u64, Command)> {
            let mut fired = Vec::new();
            let mut t = from;
            while t <= to {
                if let Some(cmd) = self.tick(t, obs) {
                    fired.push((t, cmd));
                }
                t += step;
            }
            fired
        }
    }

    fn two_palms() -> FrameObservation {
        FrameObservation::pair(
            hand(open_palm(), Handedness::Left),
            hand(open_palm(), Handedness::Right),
        )
    }

    fn right(pose: crate::gesture::HandPose) -> FrameObservation {
        FrameObservation::single(hand(pose, Handedness::Right))
    }

    fn left(pose: crate::gesture::HandPose) -> FrameObservation {
        FrameObservation::single(hand(pose, Handedness::Left))
    }

    #[test]
    fn test_no_hands_no_commands() {
        let mut h = Harness::new();
        for i in 0..5 {
            assert_eq!(h.tick(i * 33, &FrameObservation::empty()), None);
            assert_eq!(h.engine.active_mode(), None);
        }
        assert!(h.engine.gestures_enabled());
    }

    #[test]
    fn test_two_palms_toggle_once_at_hold_time() {
        let mut h = Harness::new();
        let fired = h.run(0, 1000, 100, &two_palms());
        assert_eq!(fired, vec![(1000, Command::ToggleEnabled)]);
        assert!(!h.engine.gestures_enabled());
        assert!(h.engine.state().two_hand_start_time.is_none());
    }

    #[test]
    fn test_toggle_needs_contiguous_hold() {
        let mut h = Harness::new();
        h.run(0, 600, 100, &two_palms());
        // One frame with a fist breaks the hold
        let broken = FrameObservation::pair(
            hand(open_palm(), Handedness::Left),
            hand(fist(), Handedness::Right),
        );
        assert_eq!(h.tick(700, &broken), None);
        assert!(h.engine.state().two_hand_start_time.is_none());

        let fired = h.run(800, 1800, 100, &two_palms());
        assert_eq!(fired, vec![(1800, Command::ToggleEnabled)]);
    }

    #[test]
    fn test_toggle_cooldown() {
        let mut h = Harness::new();
        assert_eq!(h.run(0, 1000, 100, &two_palms()), vec![(1000, Command::ToggleEnabled)]);
        // Hold restarts at 1100 and reaches 1s at 2100, but the cooldown
        // (strictly more than 1.5s after 1000) only passes at 2600
        let fired = h.run(1100, 3000, 100, &two_palms());
        assert_eq!(fired, vec![(2600, Command::ToggleEnabled)]);
        assert!(h.engine.gestures_enabled());
    }

    #[test]
    fn test_toggle_works_while_disabled() {
        let state = GestureState {
            gestures_enabled: false,
            ..GestureState::default()
        };
        let mut engine = GestureEngine::with_state(GestureTimings::default(), state);
        let base = Instant::now();
        let mut fired = None;
        for ms in (0..=1000).step_by(100) {
            if let Some(cmd) = engine.tick(base + Duration::from_millis(ms), &two_palms()).command {
                fired = Some(cmd);
            }
        }
        assert_eq!(fired, Some(Command::ToggleEnabled));
        assert!(engine.gestures_enabled());
    }

    #[test]
    fn test_fewer_than_two_hands_clears_two_hand_hold() {
        let mut h = Harness::new();
        h.tick(0, &two_palms());
        assert!(h.engine.state().two_hand_start_time.is_some());
        h.tick(33, &right(open_palm()));
        assert!(h.engine.state().two_hand_start_time.is_none());
        h.tick(66, &two_palms());
        h.tick(99, &FrameObservation::empty());
        assert!(h.engine.state().two_hand_start_time.is_none());
    }

    #[test]
    fn test_post_toggle_delay_blocks_single_hand() {
        let mut h = Harness::new();
        // Disable then re-enable so gestures are on after the second toggle
        h.run(0, 1000, 100, &two_palms());
        let fired = h.run(1100, 2600, 100, &two_palms());
        assert_eq!(fired, vec![(2600, Command::ToggleEnabled)]);
        assert!(h.engine.gestures_enabled());

        // Pointing through the resume window fires nothing up to T + 1.2s
        let fired = h.run(2650, 3800, 50, &right(pointing()));
        assert!(fired.is_empty(), "fired during resume window: {:?}", fired);

        // First frame after the window navigates
        assert_eq!(h.tick(3850, &right(pointing())), Some(Command::Next));
    }

    #[test]
    fn test_two_hand_lock_blocks_single_hand() {
        let mut h = Harness::new();
        let pair = FrameObservation::pair(
            hand(pointing(), Handedness::Right),
            hand(fist(), Handedness::Left),
        );
        assert_eq!(h.tick(0, &pair), None);
        assert_eq!(h.engine.active_mode(), None);
        // Locked until 1000 inclusive
        assert_eq!(h.tick(500, &right(pointing())), None);
        assert_eq!(h.tick(1000, &right(pointing())), None);
        assert_eq!(h.tick(1001, &right(pointing())), Some(Command::Next));
    }

    #[test]
    fn test_right_palm_fires_start_once() {
        let mut h = Harness::with_timings(GestureTimings {
            // Keep auto-slide out of the way
            slide_interval: Duration::from_secs(100),
            ..GestureTimings::default()
        });
        // Open palm also raises the index, so the first frame slides
        assert_eq!(h.tick(0, &right(open_palm())), Some(Command::Next));
        let fired = h.run(100, 5000, 100, &right(open_palm()));
        assert_eq!(fired, vec![(600, Command::Start)]);
    }

    #[test]
    fn test_start_refires_after_release_and_rehold() {
        let mut h = Harness::with_timings(GestureTimings {
            slide_interval: Duration::from_secs(100),
            ..GestureTimings::default()
        });
        h.tick(0, &right(fist()));
        let fired = h.run(100, 800, 100, &right(open_palm()));
        assert!(fired.contains(&(700, Command::Start)));

        h.tick(900, &right(fist()));
        assert!(h.engine.state().palm_start_time.is_none());

        // Re-hold from 2300; held 0.6s at 2900, cooldown passed long before
        let fired = h.run(2300, 3000, 100, &right(open_palm()));
        assert_eq!(fired, vec![(2900, Command::Start)]);
    }

    #[test]
    fn test_special_cooldown_delays_second_start() {
        let mut h = Harness::with_timings(GestureTimings {
            slide_interval: Duration::from_secs(100),
            ..GestureTimings::default()
        });
        h.tick(0, &right(fist()));
        assert_eq!(
            h.run(100, 700, 100, &right(open_palm())),
            vec![(100, Command::Next), (700, Command::Start)]
        );
        h.tick(800, &right(fist()));
        // Re-held from 900, reaches 0.6s at 1500, but the cooldown (strictly
        // more than 1.5s after 700) only passes at 2300
        let fired = h.run(900, 2400, 100, &right(open_palm()));
        assert_eq!(fired, vec![(2300, Command::Start)]);
    }

    #[test]
    fn test_left_palm_fires_exit_never_start() {
        let mut h = Harness::with_timings(GestureTimings {
            slide_interval: Duration::from_secs(100),
            ..GestureTimings::default()
        });
        h.tick(0, &left(fist()));
        let fired = h.run(100, 3000, 100, &left(open_palm()));
        assert!(fired.iter().any(|(_, c)| *c == Command::Exit));
        assert!(fired.iter().all(|(_, c)| *c != Command::Start));
    }

    #[test]
    fn test_pointing_repeats_every_interval() {
        let mut h = Harness::new();
        assert_eq!(h.tick(1100, &right(pointing())), Some(Command::Next));
        assert_eq!(h.tick(2200, &right(pointing())), Some(Command::Next));
        assert_eq!(h.tick(3300, &right(pointing())), Some(Command::Next));
    }

    #[test]
    fn test_pointing_interval_is_strict() {
        let mut h = Harness::new();
        assert_eq!(h.tick(0, &right(pointing())), Some(Command::Next));
        assert_eq!(h.tick(1000, &right(pointing())), None);
        assert_eq!(h.tick(1001, &right(pointing())), Some(Command::Next));
    }

    #[test]
    fn test_left_pointing_goes_back() {
        let mut h = Harness::new();
        assert_eq!(h.tick(0, &left(pointing())), Some(Command::Prev));
        assert_eq!(h.engine.active_mode(), Some(SlideDirection::Prev));
    }

    #[test]
    fn test_active_mode_not_sticky() {
        let mut h = Harness::new();
        h.tick(0, &right(pointing()));
        assert_eq!(h.engine.active_mode(), Some(SlideDirection::Next));
        h.tick(33, &right(fist()));
        assert_eq!(h.engine.active_mode(), None);
        h.tick(66, &right(pointing()));
        h.tick(99, &FrameObservation::empty());
        assert_eq!(h.engine.active_mode(), None);
        // Pointing again after the interval fires immediately
        assert_eq!(h.tick(1100, &right(pointing())), Some(Command::Next));
    }

    #[test]
    fn test_disabled_ignores_single_hand() {
        let mut h = Harness::new();
        h.run(0, 1000, 100, &two_palms());
        assert!(!h.engine.gestures_enabled());
        let fired = h.run(5000, 10000, 100, &right(pointing()));
        assert!(fired.is_empty());
        let fired = h.run(10100, 12000, 100, &left(open_palm()));
        assert!(fired.is_empty());
        assert!(h.engine.state().palm_start_time.is_none());
    }

    #[test]
    fn test_start_wins_over_auto_slide_in_same_tick() {
        let mut h = Harness::with_timings(GestureTimings {
            slide_interval: Duration::from_millis(500),
            palm_hold_time: Duration::from_millis(600),
            ..GestureTimings::default()
        });
        // Next at 0, then eligible again after 500; at 600 both start and
        // slide are due and start takes the tick
        assert_eq!(h.tick(0, &right(open_palm())), Some(Command::Next));
        let tick = h.engine.tick(h.at(600), &right(open_palm()));
        assert_eq!(tick.command, Some(Command::Start));
        assert_eq!(tick.events, vec![GestureEvent::Start]);
        // The suppressed slide did not consume its timer
        assert_eq!(h.tick(633, &right(open_palm())), Some(Command::Next));
    }

    #[test]
    fn test_zero_lock_toggle_still_blocks_single_hand_that_tick() {
        let timings = GestureTimings {
            two_hand_lock_time: Duration::ZERO,
            post_toggle_delay: Duration::ZERO,
            two_hand_hold_time: Duration::ZERO,
            ..GestureTimings::default()
        };
        let state = GestureState {
            gestures_enabled: false,
            ..GestureState::default()
        };
        let mut engine = GestureEngine::with_state(timings, state);
        let tick = engine.tick(Instant::now(), &two_palms());
        assert_eq!(tick.command, Some(Command::ToggleEnabled));
        assert_eq!(tick.events, vec![GestureEvent::Enabled]);
        assert_eq!(engine.active_mode(), None);
    }

    #[test]
    fn test_huge_windows_suppress_instead_of_expiring() {
        let state = GestureState {
            gestures_enabled: false,
            ..GestureState::default()
        };
        let mut h = Harness::with_timings(GestureTimings {
            post_toggle_delay: Duration::MAX,
            two_hand_lock_time: Duration::MAX,
            ..GestureTimings::default()
        });
        h.engine = GestureEngine::with_state(h.engine.timings().clone(), state);

        assert_eq!(h.run(0, 1000, 100, &two_palms()), vec![(1000, Command::ToggleEnabled)]);
        assert!(h.engine.gestures_enabled());
        assert!(h.engine.state().gesture_resume_time.is_some_and(|t| t > h.at(1000)));

        // Ten hours later single-hand gestures are still held off
        assert_eq!(h.tick(36_000_000, &right(pointing())), None);
        assert_eq!(h.engine.active_mode(), None);
    }

    #[test]
    fn test_continuous_palm_does_not_refire() {
        let mut h = Harness::with_timings(GestureTimings {
            slide_interval: Duration::from_secs(100),
            ..GestureTimings::default()
        });
        h.tick(0, &left(fist()));
        let fired = h.run(100, 6000, 100, &left(open_palm()));
        // Open palm raises the index too, so the first frame slides back once
        assert_eq!(fired, vec![(100, Command::Prev), (700, Command::Exit)]);
        assert!(h.engine.state().palm_awaiting_release);

        // Losing the hand counts as a release
        h.tick(6100, &FrameObservation::empty());
        assert!(!h.engine.state().palm_awaiting_release);
    }

    #[test]
    fn test_events_reported() {
        let mut engine = GestureEngine::new(GestureTimings::default());
        let base = Instant::now();
        let tick = engine.tick(base, &left(pointing()));
        assert_eq!(tick.events, vec![GestureEvent::AutoPrev]);
        let tick = engine.tick(base + Duration::from_millis(10), &FrameObservation::empty());
        assert!(tick.events.is_empty());
    }
}
