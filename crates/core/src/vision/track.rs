use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::{
    error::{CoreError, Result},
    vision::{
        STEP_SECONDS,
        landmarks::{FaceResult, FrameObservation, PoseResult, VideoFrame},
        source::{FaceLandmarker, PoseLandmarker, VideoSource, VisionModelLoader},
    },
};

#[derive(Debug, Clone, Deserialize)]
struct TrackLine {
    t: f64,
    #[serde(flatten)]
    observation: FrameObservation,
}

/// Pre-computed face and pose landmarks for a video, one NDJSON line per
/// timestamp:
///
/// ```json
/// {"t":0.25,"face":{"blendshapes":{"browDownLeft":0.1}},"pose":{"landmarks":[{"x":0.5,"y":0.2}]}}
/// ```
///
/// Replaying a track stands in for running the vision models on decoded frames.
#[derive(Debug, Clone)]
pub struct LandmarkTrack {
    frames: Vec<(f64, FrameObservation)>,
    duration: f64,
}

impl LandmarkTrack {
    pub fn parse(text: &str) -> Result<Self> {
        let mut frames = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed: TrackLine =
                serde_json::from_str(line).map_err(|e| CoreError::VideoLoadFailed {
                    reason: format!("landmark track line {}: {e}", number + 1),
                })?;
            frames.push((parsed.t, parsed.observation));
        }
        frames.sort_by(|a, b| a.0.total_cmp(&b.0));

        let duration = frames.last().map_or(0.0, |(t, _)| t + STEP_SECONDS);
        Ok(Self { frames, duration })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::VideoLoadFailed {
                reason: format!("{}: {e}", path.display()),
            })?;
        Self::parse(&text)
    }

    /// Override the duration derived from the last timestamp.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Observation recorded nearest to `t`, if one lies within half a step.
    pub fn observation_at(&self, t: f64) -> Option<&FrameObservation> {
        let index = self.frames.partition_point(|(ts, _)| *ts < t);
        [index.checked_sub(1), Some(index)]
            .into_iter()
            .flatten()
            .filter_map(|i| self.frames.get(i))
            .filter(|(ts, _)| (ts - t).abs() < STEP_SECONDS / 2.0)
            .min_by(|a, b| (a.0 - t).abs().total_cmp(&(b.0 - t).abs()))
            .map(|(_, observation)| observation)
    }
}

/// Plays a [`LandmarkTrack`] as a seekable video source.
#[derive(Debug, Clone)]
pub struct TrackPlayer {
    track: Arc<LandmarkTrack>,
    position: f64,
}

impl TrackPlayer {
    pub fn new(track: Arc<LandmarkTrack>) -> Self {
        Self {
            track,
            position: 0.0,
        }
    }
}

#[async_trait]
impl VideoSource for TrackPlayer {
    async fn load(&mut self) -> Result<f64> {
        if self.track.is_empty() {
            return Err(CoreError::VideoLoadFailed {
                reason: "landmark track has no frames".to_string(),
            });
        }
        Ok(self.track.duration())
    }

    async fn seek(&mut self, t: f64) -> Result<()> {
        self.position = t;
        Ok(())
    }

    fn current_frame(&self) -> Result<VideoFrame> {
        Ok(VideoFrame {
            timestamp: self.position,
            ..VideoFrame::default()
        })
    }
}

/// Model loader whose face and pose models read from a [`LandmarkTrack`].
#[derive(Debug, Clone)]
pub struct TrackModels {
    track: Arc<LandmarkTrack>,
}

impl TrackModels {
    pub fn new(track: Arc<LandmarkTrack>) -> Self {
        Self { track }
    }
}

struct TrackFace(Arc<LandmarkTrack>);
struct TrackPose(Arc<LandmarkTrack>);

impl FaceLandmarker for TrackFace {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<FaceResult>> {
        Ok(self
            .0
            .observation_at(frame.timestamp)
            .and_then(|observation| observation.face.clone()))
    }
}

impl PoseLandmarker for TrackPose {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<PoseResult>> {
        Ok(self
            .0
            .observation_at(frame.timestamp)
            .and_then(|observation| observation.pose.clone()))
    }
}

#[async_trait]
impl VisionModelLoader for TrackModels {
    async fn load_face(&self) -> Result<Box<dyn FaceLandmarker>> {
        Ok(Box::new(TrackFace(self.track.clone())))
    }

    async fn load_pose(&self) -> Result<Box<dyn PoseLandmarker>> {
        Ok(Box::new(TrackPose(self.track.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"
{"t":0.5,"face":{"blendshapes":{"mouthSmileLeft":0.9,"mouthSmileRight":0.9}}}
{"t":0.0,"pose":{"landmarks":[{"x":0.5,"y":0.2}]}}
{"t":0.25}
"#;

    #[test]
    fn parses_and_sorts_frames() {
        let track = LandmarkTrack::parse(TRACK).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.duration(), 0.75);

        let first = track.observation_at(0.0).unwrap();
        assert!(first.pose.is_some());
        assert!(track.observation_at(0.25).unwrap().face.is_none());
        assert!(track.observation_at(0.45).unwrap().face.is_some());
        assert!(track.observation_at(2.0).is_none());
    }

    #[test]
    fn bad_line_reports_its_number() {
        let err = LandmarkTrack::parse("{\"t\":0}\n{oops}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn empty_track_fails_to_load() {
        let mut player = TrackPlayer::new(Arc::new(LandmarkTrack::parse("").unwrap()));
        assert!(matches!(
            player.load().await,
            Err(CoreError::VideoLoadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn models_follow_player_position() {
        let track = Arc::new(LandmarkTrack::parse(TRACK).unwrap());
        let mut player = TrackPlayer::new(track.clone());
        let models = TrackModels::new(track);
        let mut face = models.load_face().await.unwrap();

        player.seek(0.5).await.unwrap();
        let frame = player.current_frame().unwrap();
        let result = face.detect(&frame).unwrap().unwrap();
        assert_eq!(result.blendshapes.smile(), 0.9);
    }
}
