//! Alert debounce and the audible side of an alert.

use std::f32::consts::PI;
use std::io::Write;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::posture::PostureState;

/// Minimum-interval debounce measured from the last alert that actually fired.
#[derive(Debug, Clone)]
pub struct AlertTimer {
    last_alert: Option<Instant>,
    interval: Duration,
}

impl AlertTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_alert: None,
            interval,
        }
    }

    /// Decides whether `state` at `now` earns an alert, and if so records it.
    /// Suppressed alerts are dropped, never queued.
    pub fn should_fire(&mut self, state: PostureState, now: Instant) -> bool {
        if !state.is_violation() {
            return false;
        }

        let elapsed = match self.last_alert {
            Some(last) => now.saturating_duration_since(last) > self.interval,
            None => true,
        };
        if elapsed {
            self.last_alert = Some(now);
        }
        elapsed
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }
}

/// Sine beep played when the user drifts out of posture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration: Duration,
    pub sample_rate: u32,
    pub amplitude: f32,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            duration: Duration::from_secs(1),
            sample_rate: 44_100,
            amplitude: 0.5,
        }
    }
}

impl Tone {
    /// Mono samples covering `[0, duration)`.
    pub fn samples(&self) -> Vec<f32> {
        let count = (self.sample_rate as f64 * self.duration.as_secs_f64()) as usize;
        let rate = self.sample_rate as f32;

        (0..count)
            .map(|i| {
                let t = i as f32 / rate;
                self.amplitude * (2.0 * PI * self.frequency_hz * t).sin()
            })
            .collect()
    }
}

/// Where alert tones go. Implementations must return immediately; overlapping
/// calls are allowed.
pub trait AlertSink {
    fn play_tone(&self, samples: &[f32], sample_rate: u32);
}

impl<A: AlertSink + ?Sized> AlertSink for &A {
    fn play_tone(&self, samples: &[f32], sample_rate: u32) {
        (**self).play_tone(samples, sample_rate)
    }
}

/// Rings the terminal bell instead of synthesizing audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellSink;

impl AlertSink for BellSink {
    fn play_tone(&self, _samples: &[f32], _sample_rate: u32) {
        print!("\x07");
        if let Err(e) = std::io::stdout().flush() {
            warn!("terminal bell failed: {}", e);
        }
    }
}

#[cfg(feature = "audio")]
pub use speaker::SpeakerSink;

#[cfg(feature = "audio")]
mod speaker {
    use anyhow::{Context, Result};
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle};
    use tracing::warn;

    use super::AlertSink;

    /// Plays tones on the default output device. Each call mixes a new
    /// source into the stream, so beeps can overlap.
    pub struct SpeakerSink {
        _stream: OutputStream,
        handle: OutputStreamHandle,
    }

    impl SpeakerSink {
        pub fn open() -> Result<Self> {
            let (stream, handle) =
                OutputStream::try_default().context("Failed to open audio output")?;
            Ok(Self {
                _stream: stream,
                handle,
            })
        }
    }

    impl AlertSink for SpeakerSink {
        fn play_tone(&self, samples: &[f32], sample_rate: u32) {
            let source = SamplesBuffer::new(1, sample_rate, samples.to_vec());
            if let Err(e) = self.handle.play_raw(source) {
                warn!("alert tone dropped: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_violation_fires_immediately() {
        let mut timer = AlertTimer::new(Duration::from_secs(1));
        assert!(timer.should_fire(PostureState::LookingDown, Instant::now()));
    }

    #[test]
    fn good_posture_never_fires_or_touches_timer() {
        let mut timer = AlertTimer::new(Duration::from_secs(1));
        let now = Instant::now();
        for state in [PostureState::Good, PostureState::Uncalibrated] {
            assert!(!timer.should_fire(state, now));
        }
        assert!(timer.last_alert().is_none());
    }

    #[test]
    fn suppressed_inside_interval() {
        let mut timer = AlertTimer::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(timer.should_fire(PostureState::LookingUp, t0));
        assert!(!timer.should_fire(PostureState::LookingUp, t0 + Duration::from_millis(500)));
        assert!(timer.should_fire(PostureState::LookingUp, t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn exactly_one_interval_is_still_suppressed() {
        let mut timer = AlertTimer::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(timer.should_fire(PostureState::LookingUp, t0));
        assert!(!timer.should_fire(PostureState::LookingUp, t0 + Duration::from_secs(1)));
    }

    #[test]
    fn interval_counts_from_last_fired_alert() {
        let mut timer = AlertTimer::new(Duration::from_secs(1));
        let t0 = Instant::now();

        assert!(timer.should_fire(PostureState::LookingUp, t0));
        assert!(!timer.should_fire(PostureState::LookingUp, t0 + Duration::from_millis(900)));
        assert!(timer.should_fire(PostureState::LookingDown, t0 + Duration::from_millis(1001)));
        assert_eq!(timer.last_alert(), Some(t0 + Duration::from_millis(1001)));
        assert!(!timer.should_fire(PostureState::LookingDown, t0 + Duration::from_millis(1900)));
    }

    #[test]
    fn bell_sink_accepts_back_to_back_tones() {
        let samples = Tone::default().samples();
        BellSink.play_tone(&samples, 44_100);
        BellSink.play_tone(&samples, 44_100);
    }

    #[test]
    fn tone_has_one_second_of_samples() {
        let samples = Tone::default().samples();
        assert_eq!(samples.len(), 44_100);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    }

    #[test]
    fn tone_peaks_at_quarter_period() {
        let tone = Tone {
            frequency_hz: 1.0,
            duration: Duration::from_secs(1),
            sample_rate: 4,
            amplitude: 0.5,
        };
        let samples = tone.samples();
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert!((samples[3] + 0.5).abs() < 1e-6);
    }
}
