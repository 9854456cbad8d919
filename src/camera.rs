use opencv::{
    prelude::*,
    videoio::{self, VideoCapture},
};
use anyhow::{Context, Result};

pub struct Camera {
    capture: VideoCapture,
}

impl Camera {
    pub fn new(device_id: i32) -> Result<Self> {
        let capture = VideoCapture::new(device_id, videoio::CAP_ANY)
            .with_context(|| format!("Failed to create capture for camera {}", device_id))?;

        if !capture.is_opened()? {
            anyhow::bail!("Failed to open camera {}", device_id);
        }

        Ok(Self { capture })
    }

    /// Grabs the next frame. `Ok(None)` means the device had nothing for us
    /// this time around.
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let grabbed = self.capture.read(&mut frame)?;

        if !grabbed || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }

    pub fn is_opened(&self) -> bool {
        self.capture.is_opened().unwrap_or(false)
    }

    pub fn release(&mut self) -> Result<()> {
        self.capture.release()?;
        Ok(())
    }
}
