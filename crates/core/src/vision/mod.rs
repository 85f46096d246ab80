//! Frame-by-frame behavioural analysis of a classroom video.
//!
//! The analyzer steps a seekable [`VideoSource`] at a fixed interval, runs a
//! face model and a pose model on every frame, and reduces the per-frame
//! signals into [`VideoFrameStats`](crate::types::VideoFrameStats), a
//! discrete event log and the rubric scores derived from them.

pub mod analyzer;
pub mod classifier;
pub mod landmarks;
pub mod rubric;
pub mod source;
pub mod track;

use std::time::Duration;

pub use analyzer::{AnalyzerState, FrameProgress, VideoFrameAnalyzer};
pub use classifier::{FrameClass, FrameClassifier};
pub use landmarks::{Blendshapes, FaceResult, FrameObservation, Landmark, PoseResult, VideoFrame};
pub use rubric::{compute_ratios, compute_rubric};
pub use source::{FaceLandmarker, PoseLandmarker, VideoSource, VisionModelLoader};
pub use track::{LandmarkTrack, TrackModels, TrackPlayer};

pub const STEP_SECONDS: f64 = 0.25;
pub const FRAMES_PER_SECOND: u32 = 4;
pub const SEEK_TIMEOUT: Duration = Duration::from_millis(300);

/// Frames a gesture stays active after its trigger stops holding.
pub const STICKY_FRAMES: u8 = 4;

pub const BROW_DOWN_THRESHOLD: f64 = 0.65;
pub const LOOK_DOWN_THRESHOLD: f64 = 0.75;
pub const SMILE_THRESHOLD: f64 = 0.5;
pub const POINTING_OFFSET: f64 = 0.25;
pub const CLOSED_POSTURE_SPAN: f64 = 0.2;
pub const STATIONARY_DISTANCE: f64 = 0.005;

pub const ANGER_FRAMES: u32 = 10 * FRAMES_PER_SECOND;
pub const STATIONARY_FRAMES: u32 = 30 * FRAMES_PER_SECOND;
pub const EVENT_BUCKET_SECONDS: i64 = 5;
