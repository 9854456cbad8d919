use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::alert::AlertTimer;
use crate::landmarks::LandmarkFrame;

/// Eye-line and nose heights captured while the user held a neutral pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationBaseline {
    pub ref_nose_y: f32,
    pub ref_eye_y: f32,
}

impl CalibrationBaseline {
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        Self {
            ref_nose_y: frame.nose.y,
            ref_eye_y: frame.eye_y(),
        }
    }

    /// Vertical eye-to-nose separation at calibration time.
    pub fn target_dist(&self) -> f32 {
        (self.ref_eye_y - self.ref_nose_y).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostureState {
    Uncalibrated,
    Good,
    LookingUp,
    LookingDown,
}

impl PostureState {
    pub fn is_violation(self) -> bool {
        matches!(self, PostureState::LookingUp | PostureState::LookingDown)
    }

    pub fn label(self) -> &'static str {
        match self {
            PostureState::Uncalibrated => "UNCALIBRATED",
            PostureState::Good => "GOOD",
            PostureState::LookingUp => "LOOKING UP",
            PostureState::LookingDown => "LOOKING DOWN",
        }
    }
}

/// Fractions of the calibrated separation that count as pitching away.
///
/// The two bounds are tuned separately: the eye-nose projection does not
/// shrink symmetrically for upward and downward pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub look_up: f32,
    pub look_down: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            look_up: 0.50,
            look_down: 0.60,
        }
    }
}

/// How far the current eye-nose separation has moved from the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub current_dist: f32,
    pub target_dist: f32,
    /// Positive when the face looks vertically compressed.
    pub diff: f32,
}

impl Deviation {
    pub fn measure(baseline: &CalibrationBaseline, frame: &LandmarkFrame) -> Self {
        let current_dist = (frame.eye_y() - frame.nose.y).abs();
        let target_dist = baseline.target_dist();

        Self {
            current_dist,
            target_dist,
            diff: target_dist - current_dist,
        }
    }

    pub fn classify(&self, sensitivity: &Sensitivity) -> PostureState {
        // A flat baseline carries no scale to compare against.
        if self.target_dist <= 0.0 {
            return PostureState::Good;
        }

        if self.diff > sensitivity.look_up * self.target_dist {
            PostureState::LookingUp
        } else if self.diff < -(sensitivity.look_down * self.target_dist) {
            PostureState::LookingDown
        } else {
            PostureState::Good
        }
    }
}

/// Posture for one frame given the current calibration. Pure: the same
/// inputs always give the same state.
pub fn classify(
    baseline: Option<&CalibrationBaseline>,
    frame: Option<&LandmarkFrame>,
    sensitivity: &Sensitivity,
) -> PostureState {
    match (baseline, frame) {
        (Some(baseline), Some(frame)) => Deviation::measure(baseline, frame).classify(sensitivity),
        _ => PostureState::Uncalibrated,
    }
}

/// What the monitor concluded for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub state: PostureState,
    pub deviation: Option<Deviation>,
    pub fire_alert: bool,
}

/// Calibration, classification and alert debounce for one camera.
#[derive(Debug, Clone)]
pub struct PostureMonitor {
    baseline: Option<CalibrationBaseline>,
    sensitivity: Sensitivity,
    timer: AlertTimer,
    last_state: Option<PostureState>,
}

impl PostureMonitor {
    pub fn new(sensitivity: Sensitivity, beep_interval: Duration) -> Self {
        Self {
            baseline: None,
            sensitivity,
            timer: AlertTimer::new(beep_interval),
            last_state: None,
        }
    }

    /// Captures a new baseline from `frame`. Without a face this does
    /// nothing and any previous baseline stays in place.
    pub fn calibrate(&mut self, frame: Option<&LandmarkFrame>) -> bool {
        let Some(frame) = frame else {
            debug!("calibration ignored, no face in view");
            return false;
        };

        let baseline = CalibrationBaseline::from_frame(frame);
        info!(
            ref_nose_y = baseline.ref_nose_y,
            ref_eye_y = baseline.ref_eye_y,
            "Calibrated."
        );
        self.baseline = Some(baseline);
        true
    }

    pub fn tick(&mut self, frame: Option<&LandmarkFrame>, now: Instant) -> TickReport {
        let deviation = match (self.baseline.as_ref(), frame) {
            (Some(baseline), Some(frame)) => Some(Deviation::measure(baseline, frame)),
            _ => None,
        };
        let state = deviation
            .map(|d| d.classify(&self.sensitivity))
            .unwrap_or(PostureState::Uncalibrated);
        let fire_alert = self.timer.should_fire(state, now);

        if self.last_state != Some(state) {
            debug!(state = state.label(), "posture changed");
            self.last_state = Some(state);
        }

        TickReport {
            state,
            deviation,
            fire_alert,
        }
    }

    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.baseline.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }
}
