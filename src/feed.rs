use opencv::core::Mat;
use opencv::prelude::*;
use tracing::warn;

use crate::camera::Camera;
use crate::inference::FaceLandmarker;
use crate::landmarks::{LandmarkFrame, LandmarkSource};

/// Live camera + face landmarker behind the [`LandmarkSource`] contract.
pub struct CameraFeed {
    camera: Camera,
    landmarker: FaceLandmarker,
    image: Option<Mat>,
}

impl CameraFeed {
    pub fn new(camera: Camera, landmarker: FaceLandmarker) -> Self {
        Self {
            camera,
            landmarker,
            image: None,
        }
    }

    /// The image behind the most recent `next_frame` call, if one was captured.
    pub fn image(&self) -> Option<&Mat> {
        self.image.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.camera.is_opened()
    }

    pub fn release(&mut self) -> anyhow::Result<()> {
        self.image = None;
        self.camera.release()
    }
}

impl LandmarkSource for CameraFeed {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.image = match self.camera.read_frame() {
            Ok(image) => image,
            Err(e) => {
                warn!("camera read failed: {:#}", e);
                None
            }
        };
        let image = self.image.as_ref()?;

        let faces = match self.landmarker.detect(image) {
            Ok(faces) => faces,
            Err(e) => {
                warn!("landmark detection failed: {:#}", e);
                return None;
            }
        };

        let (width, height) = (image.cols() as f32, image.rows() as f32);
        faces
            .first()
            .and_then(|face| LandmarkFrame::from_normalized(face, width, height))
    }
}
