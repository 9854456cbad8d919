use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::core::{AlgorithmHint, Mat, Size};
use opencv::imgproc;
use opencv::prelude::*;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::config::Config;
use crate::landmarks::{decode_mesh, Landmark};

/// Face mesh regressor over the whole camera image.
///
/// The model takes an NHWC RGB tensor in [0, 1] and returns one flat list of
/// (x, y, z) triples in input pixels, plus an optional face-presence logit.
pub struct FaceLandmarker {
    session: Session,
    input_size: i32,
    input_name: String,
    landmarks_output: String,
    presence_output: Option<String>,
    min_presence: f32,
}

impl FaceLandmarker {
    pub fn new(config: &Config) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.model_path)
            .with_context(|| format!("Failed to load face landmark model {}", config.model_path))?;

        Ok(Self {
            session,
            input_size: config.model_input_size as i32,
            input_name: config.input_name.clone(),
            landmarks_output: config.landmarks_output.clone(),
            presence_output: config.presence_output.clone(),
            min_presence: config.min_face_presence,
        })
    }

    /// Returns one normalized mesh per detected face; empty when the model
    /// does not believe a face is present.
    pub fn detect(&mut self, frame: &Mat) -> Result<Vec<Vec<Landmark>>> {
        let input = self.preprocess(frame)?;
        let input_tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .context("Face landmark inference failed")?;

        if let Some(name) = &self.presence_output {
            let presence: ndarray::ArrayViewD<f32> = outputs
                .get(name.as_str())
                .with_context(|| format!("Model has no output named {}", name))?
                .try_extract_array()
                .context("Failed to extract face presence")?;
            let score = presence.iter().next().copied().map(sigmoid).unwrap_or(0.0);
            if score < self.min_presence {
                return Ok(Vec::new());
            }
        }

        let raw: ndarray::ArrayViewD<f32> = outputs
            .get(self.landmarks_output.as_str())
            .with_context(|| format!("Model has no output named {}", self.landmarks_output))?
            .try_extract_array()
            .context("Failed to extract landmarks")?;
        let raw: Vec<f32> = raw.iter().copied().collect();

        Ok(vec![decode_mesh(&raw, self.input_size as f32)])
    }

    fn preprocess(&self, frame: &Mat) -> Result<Array4<f32>> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            Size::new(self.input_size, self.input_size),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let size = self.input_size as usize;
        let data: Vec<f32> = resized
            .data_bytes()?
            .iter()
            .map(|&b| b as f32 / 255.0)
            .collect();

        Ok(Array4::from_shape_vec((1, size, size, 3), data)?)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
