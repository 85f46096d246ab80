use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;

/// A point in normalized image coordinates (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Named facial-muscle activation scores in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blendshapes(pub HashMap<String, f64>);

impl Blendshapes {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, score)| (name.to_string(), score))
                .collect(),
        )
    }

    /// Score of a single category, zero when the model did not report it.
    pub fn score(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    /// Mean of a left/right pair of categories.
    pub fn pair(&self, left: &str, right: &str) -> f64 {
        (self.score(left) + self.score(right)) / 2.0
    }

    pub fn brow_down(&self) -> f64 {
        self.pair("browDownLeft", "browDownRight")
    }

    pub fn smile(&self) -> f64 {
        self.pair("mouthSmileLeft", "mouthSmileRight")
    }

    pub fn look_down(&self) -> f64 {
        self.pair("eyeLookDownLeft", "eyeLookDownRight")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceResult {
    #[serde(default)]
    pub blendshapes: Blendshapes,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    pub landmarks: Vec<Landmark>,
}

/// The five pose joints the classifier reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpperBody {
    pub nose: Landmark,
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
}

impl PoseResult {
    pub fn upper_body(&self) -> Option<UpperBody> {
        let joint = |index: usize| self.landmarks.get(index).copied();
        Some(UpperBody {
            nose: joint(NOSE)?,
            left_shoulder: joint(LEFT_SHOULDER)?,
            right_shoulder: joint(RIGHT_SHOULDER)?,
            left_wrist: joint(LEFT_WRIST)?,
            right_wrist: joint(RIGHT_WRIST)?,
        })
    }
}

/// Output of both models for one frame; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    #[serde(default)]
    pub face: Option<FaceResult>,
    #[serde(default)]
    pub pose: Option<PoseResult>,
}

/// A decoded frame handed to the vision models.
#[derive(Debug, Clone, Default)]
pub struct VideoFrame {
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub rgba: Bytes,
}

impl VideoFrame {
    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp * 1000.0
    }
}
