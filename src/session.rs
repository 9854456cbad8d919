//! One monitoring session: pull landmarks, classify, beep, react to keys.

use std::time::Instant;

use tracing::{debug, info};

use crate::alert::{AlertSink, Tone};
use crate::landmarks::{LandmarkFrame, LandmarkSource};
use crate::posture::{PostureMonitor, TickReport};

/// Keyboard commands understood by the monitor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Calibrate,
    Quit,
}

impl Command {
    /// Maps a raw key code (as returned by a GUI key poll) to a command.
    pub fn from_key(key: i32) -> Option<Self> {
        match u8::try_from(key & 0xFF).ok().map(char::from) {
            Some('c') | Some('C') => Some(Command::Calibrate),
            Some('q') | Some('Q') => Some(Command::Quit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Session<S, A> {
    source: S,
    sink: A,
    monitor: PostureMonitor,
    tone: Vec<f32>,
    sample_rate: u32,
    last_frame: Option<LandmarkFrame>,
    alerts_fired: u64,
}

impl<S: LandmarkSource, A: AlertSink> Session<S, A> {
    pub fn new(source: S, sink: A, monitor: PostureMonitor, tone: &Tone) -> Self {
        Self {
            source,
            sink,
            monitor,
            tone: tone.samples(),
            sample_rate: tone.sample_rate,
            last_frame: None,
            alerts_fired: 0,
        }
    }

    /// Runs one tick of the loop at time `now`.
    pub fn step(&mut self, now: Instant) -> TickReport {
        self.last_frame = self.source.next_frame();
        let report = self.monitor.tick(self.last_frame.as_ref(), now);

        if report.fire_alert {
            self.alerts_fired += 1;
            debug!(state = report.state.label(), "alert");
            self.sink.play_tone(&self.tone, self.sample_rate);
        }
        report
    }

    /// Applies a user command against the most recent frame.
    pub fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Calibrate => {
                self.monitor.calibrate(self.last_frame.as_ref());
                Flow::Continue
            }
            Command::Quit => {
                info!(alerts = self.alerts_fired, "quit requested");
                Flow::Stop
            }
        }
    }

    pub fn last_frame(&self) -> Option<&LandmarkFrame> {
        self.last_frame.as_ref()
    }

    pub fn monitor(&self) -> &PostureMonitor {
        &self.monitor
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn alerts_fired(&self) -> u64 {
        self.alerts_fired
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
