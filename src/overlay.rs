use opencv::{
    core::{Mat, Point as CvPoint, Scalar},
    highgui, imgproc,
    prelude::*,
};
use anyhow::Result;

use crate::landmarks::{LandmarkFrame, Point};
use crate::posture::{PostureState, TickReport};
use crate::session::Command;

const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);

/// Preview window with landmark dots and the posture verdict.
pub struct Overlay {
    window: String,
}

impl Overlay {
    pub fn new(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            window: title.to_string(),
        })
    }

    pub fn render(&self, image: &Mat, frame: Option<&LandmarkFrame>, report: &TickReport) -> Result<()> {
        let mut canvas = image.try_clone()?;

        if let Some(frame) = frame {
            dot(&mut canvas, frame.nose, RED)?;
            dot(&mut canvas, frame.left_iris, YELLOW)?;
            dot(&mut canvas, frame.right_iris, YELLOW)?;

            let (text, color, scale, thickness) = match report.state {
                PostureState::Uncalibrated => ("Press 'C' to Calibrate", YELLOW, 0.8, 2),
                state if state.is_violation() => (state.label(), RED, 1.0, 3),
                state => (state.label(), GREEN, 1.0, 3),
            };
            imgproc::put_text(
                &mut canvas,
                text,
                CvPoint::new(20, 50),
                imgproc::FONT_HERSHEY_SIMPLEX,
                scale,
                scalar(color),
                thickness,
                imgproc::LINE_8,
                false,
            )?;
        }

        highgui::imshow(&self.window, &canvas)?;
        Ok(())
    }

    /// Pumps the GUI event loop and returns any command typed into the window.
    pub fn poll_command(&self) -> Result<Option<Command>> {
        let key = highgui::wait_key(5)?;
        Ok(Command::from_key(key))
    }

    pub fn close(self) -> Result<()> {
        highgui::destroy_all_windows()?;
        Ok(())
    }
}

fn dot(canvas: &mut Mat, at: Point, color: (f64, f64, f64)) -> Result<()> {
    imgproc::circle(
        canvas,
        CvPoint::new(at.x as i32, at.y as i32),
        3,
        scalar(color),
        -1,
        imgproc::LINE_8,
        0,
    )?;
    Ok(())
}

fn scalar((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}
