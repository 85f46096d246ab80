use async_trait::async_trait;

use crate::{
    error::Result,
    vision::landmarks::{FaceResult, PoseResult, VideoFrame},
};

/// A seekable video the analyzer can step through.
#[async_trait]
pub trait VideoSource: Send {
    /// Prepare the media and return its duration in seconds.
    async fn load(&mut self) -> Result<f64>;

    /// Move to `t` seconds. Resolves once the frame at `t` is presented.
    async fn seek(&mut self, t: f64) -> Result<()>;

    fn current_frame(&self) -> Result<VideoFrame>;
}

pub trait FaceLandmarker: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceResult>>;
}

pub trait PoseLandmarker: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<PoseResult>>;
}

#[async_trait]
pub trait VisionModelLoader: Send + Sync {
    async fn load_face(&self) -> Result<Box<dyn FaceLandmarker>>;
    async fn load_pose(&self) -> Result<Box<dyn PoseLandmarker>>;
}
