//! Face landmarks as the posture monitor sees them.
//!
//! The detector speaks MediaPipe face-mesh numbering (478 points with iris
//! refinement). Only three of those points matter here, so each frame is
//! boiled down to a [`LandmarkFrame`] in image pixels.

/// Face mesh index of the nose tip.
pub const NOSE_TIP: usize = 1;
/// Face mesh index of the left iris center.
pub const LEFT_IRIS_CENTER: usize = 468;
/// Face mesh index of the right iris center.
pub const RIGHT_IRIS_CENTER: usize = 473;

/// Raw detector output for a single mesh point, normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Splits a flat `[x0, y0, z0, x1, ...]` detector output into landmarks,
/// dividing every coordinate by `input_size` so x and y land in [0, 1]. A trailing
/// partial triple is dropped.
pub fn decode_mesh(raw: &[f32], input_size: f32) -> Vec<Landmark> {
    raw.chunks_exact(3)
        .map(|xyz| Landmark::new(xyz[0] / input_size, xyz[1] / input_size, xyz[2] / input_size))
        .collect()
}

/// Point in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The three points of the dominant face for one video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkFrame {
    pub nose: Point,
    pub left_iris: Point,
    pub right_iris: Point,
}

impl LandmarkFrame {
    pub fn new(nose: Point, left_iris: Point, right_iris: Point) -> Self {
        Self {
            nose,
            left_iris,
            right_iris,
        }
    }

    /// Scales one face's normalized mesh into pixels of a `width` x `height`
    /// image. Returns `None` when the mesh lacks the iris points.
    pub fn from_normalized(face: &[Landmark], width: f32, height: f32) -> Option<Self> {
        let at = |idx: usize| {
            face.get(idx)
                .map(|lm| Point::new(lm.x * width, lm.y * height))
        };

        Some(Self {
            nose: at(NOSE_TIP)?,
            left_iris: at(LEFT_IRIS_CENTER)?,
            right_iris: at(RIGHT_IRIS_CENTER)?,
        })
    }

    /// Vertical position of the eye line.
    pub fn eye_y(&self) -> f32 {
        (self.left_iris.y + self.right_iris.y) / 2.0
    }
}

/// Anything that can hand the monitor one frame's landmarks per tick.
///
/// `None` covers both "no face in view" and "the camera gave us nothing";
/// callers simply try again on the next tick.
pub trait LandmarkSource {
    fn next_frame(&mut self) -> Option<LandmarkFrame>;
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for &mut S {
    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        (**self).next_frame()
    }
}
