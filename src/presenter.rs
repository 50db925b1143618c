//! Presentation loop: feed frames through the engine and dispatch commands
//!
//! Live mode stamps frames as they arrive. Replay mode uses the timestamps
//! recorded in the feed, so the same file always yields the same commands.

use flume::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::dispatch::CommandDispatcher;
use crate::feed::FeedFrame;
use crate::gesture::{FrameObservation, GestureEngine};
use crate::hud::Hud;

/// Frame spacing assumed for replay lines without a timestamp (30 fps)
const DEFAULT_FRAME_SECS: f64 = 1.0 / 30.0;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Presenter<D: CommandDispatcher> {
    engine: GestureEngine,
    dispatcher: D,
    hud: Hud,
}

impl<D: CommandDispatcher> Presenter<D> {
    pub fn new(engine: GestureEngine, dispatcher: D, hud: Hud) -> Self {
        Self {
            engine,
            dispatcher,
            hud,
        }
    }

    pub fn engine(&self) -> &GestureEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn into_dispatcher(mut self) -> D {
        self.hud.clear();
        self.dispatcher
    }

    /// Run one frame: tick the engine and dispatch whatever it emitted
    pub fn step(&mut self, now: Instant, observation: &FrameObservation) -> Option<Command> {
        let tick = self.engine.tick(now, observation);

        if let Some(command) = tick.command {
            if let Err(e) = self.dispatcher.dispatch(command) {
                warn!("{} dispatch failed for {}: {}", self.dispatcher.name(), command, e);
            }
        }

        self.hud.update(self.engine.state());
        tick.command
    }
}

/// Process frames from `rx` until the feed ends or `running` is cleared.
///
/// Returns the number of frames processed.
pub fn run_live<D: CommandDispatcher>(
    presenter: &mut Presenter<D>,
    rx: &Receiver<FeedFrame>,
    running: &Arc<AtomicBool>,
) -> usize {
    let mut frames = 0;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(frame) => {
                presenter.step(Instant::now(), &frame.observation);
                frames += 1;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Landmark feed closed");
                break;
            }
        }
    }
    frames
}

/// A command produced during replay, with the feed time that triggered it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayEntry {
    pub at: f64,
    pub command: Command,
}

/// Drive the engine from recorded timestamps.
///
/// Missing timestamps advance by one frame at 30 fps; timestamps that go
/// backwards are clamped so time stays monotonic.
pub fn run_replay<D, I>(presenter: &mut Presenter<D>, frames: I) -> Vec<ReplayEntry>
where
    D: CommandDispatcher,
    I: IntoIterator<Item = FeedFrame>,
{
    let base = Instant::now();
    let mut last: Option<f64> = None;
    let mut entries = Vec::new();

    for frame in frames {
        let mut t = frame
            .timestamp
            .unwrap_or_else(|| last.map_or(0.0, |prev| prev + DEFAULT_FRAME_SECS));
        if let Some(prev) = last {
            if t < prev {
                debug!(t, prev, "timestamp went backwards, clamping");
                t = prev;
            }
        }

        let Some(now) = Duration::try_from_secs_f64(t)
            .ok()
            .and_then(|offset| base.checked_add(offset))
        else {
            warn!(t, "timestamp out of range, skipping frame");
            continue;
        };
        last = Some(t);

        if let Some(command) = presenter.step(now, &frame.observation) {
            entries.push(ReplayEntry { at: t, command });
        }
    }

    entries
}
