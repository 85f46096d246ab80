use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    activity::ActivityLog,
    error::Result,
    slot::LatestSlot,
    vision::{
        STATIONARY_DISTANCE,
        landmarks::{FaceResult, Landmark, VideoFrame},
        source::FaceLandmarker,
    },
};

pub const INITIAL_SCORE: u8 = 50;
const EMOTION_THRESHOLD: f64 = 0.3;
const ANGER_ALERT: f64 = 0.6;
const LOOK_DOWN_LIVE: f64 = 0.6;
const HEAD_PITCH_READING: f64 = 1.0;

const HAPPY_REWARD_SECS: f64 = 60.0;
const NEUTRAL_PENALTY_SECS: f64 = 180.0;
const ANGER_PENALTY_SECS: f64 = 10.0;
const READING_PENALTY_SECS: f64 = 30.0;
const FOCUS_REWARD_SECS: f64 = 60.0;
const STATIC_PENALTY_SECS: f64 = 60.0;

// Face mesh indices.
const MESH_NOSE: usize = 1;
const MESH_CHIN: usize = 152;
const MESH_FOREHEAD: usize = 10;

/// Source of live frames, e.g. a webcam.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Next frame, or `None` once the device has no more to give.
    async fn next_frame(&mut self) -> Result<Option<VideoFrame>>;

    /// Give the underlying handle back to the system.
    async fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiveEmotion {
    Happy,
    Angry,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gaze {
    Reading,
    Focused,
}

impl Gaze {
    pub fn label(&self) -> &'static str {
        match self {
            Gaze::Reading => "Reading / Looking Down",
            Gaze::Focused => "Focused on Class",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub at: f64,
    pub score: u8,
    pub emotion: LiveEmotion,
    pub confidence: f64,
    pub anger_alert: bool,
    pub gaze: Gaze,
    pub head_pitch_ratio: f64,
    pub eye_look_down: f64,
    pub movement_intensity: f64,
    pub stationary: bool,
    pub static_secs: f64,
}

/// Interval timer: fires each time its condition has held for `period`,
/// then starts counting again. Resets whenever the condition breaks.
#[derive(Debug, Clone, Copy, Default)]
struct HeldFor {
    since: Option<f64>,
}

impl HeldFor {
    fn started_at(now: f64) -> Self {
        Self { since: Some(now) }
    }

    fn tick(&mut self, holds: bool, now: f64, period: f64) -> bool {
        if !holds {
            self.since = None;
            return false;
        }
        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(since) if now - since > period => {
                self.since = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

/// Time-based scoring of a live teacher feed.
///
/// Frame timestamps are in seconds and drive every timer.
#[derive(Debug, Clone)]
pub struct LiveScorer {
    score: u8,
    started: bool,
    happy: HeldFor,
    neutral: HeldFor,
    angry: HeldFor,
    reading: HeldFor,
    focus: HeldFor,
    static_since: f64,
    static_penalties: u32,
    last_nose: Landmark,
    movement_intensity: f64,
    log: ActivityLog,
}

impl LiveScorer {
    pub fn new(log: ActivityLog) -> Self {
        Self {
            score: INITIAL_SCORE,
            started: false,
            happy: HeldFor::default(),
            neutral: HeldFor::default(),
            angry: HeldFor::default(),
            reading: HeldFor::default(),
            focus: HeldFor::default(),
            static_since: 0.0,
            static_penalties: 0,
            last_nose: Landmark::new(0.5, 0.5),
            movement_intensity: 0.0,
            log,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    fn reward(&mut self, points: u8, reason: &str) {
        self.score = self.score.saturating_add(points).min(100);
        self.log.success(format!("Reward (+{points}): {reason}"));
    }

    fn penalize(&mut self, points: u8, reason: &str) {
        self.score = self.score.saturating_sub(points);
        self.log.warn(format!("Penalty (-{points}): {reason}"));
    }

    /// Score one frame. Frames without a usable face leave the state alone.
    pub fn observe(&mut self, now: f64, face: &FaceResult) -> Option<LiveSnapshot> {
        let landmarks = &face.landmarks;
        let (nose, chin, forehead) = (
            landmarks.get(MESH_NOSE)?,
            landmarks.get(MESH_CHIN)?,
            landmarks.get(MESH_FOREHEAD)?,
        );

        if !self.started {
            self.started = true;
            self.static_since = now;
            self.focus = HeldFor::started_at(now);
        }

        let shapes = &face.blendshapes;
        let happy_score = shapes.smile();
        let angry_score = (shapes.score("browDownLeft")
            + shapes.score("browDownRight")
            + shapes.score("jawForward"))
            / 3.0;

        let (emotion, confidence) =
            if happy_score > EMOTION_THRESHOLD && happy_score > angry_score {
                (LiveEmotion::Happy, happy_score)
            } else if angry_score > EMOTION_THRESHOLD && angry_score > happy_score {
                (LiveEmotion::Angry, angry_score)
            } else {
                (LiveEmotion::Neutral, 0.0)
            };

        if self
            .happy
            .tick(emotion == LiveEmotion::Happy, now, HAPPY_REWARD_SECS)
        {
            self.reward(1, "Happy for 1 min");
        }
        if self
            .neutral
            .tick(emotion == LiveEmotion::Neutral, now, NEUTRAL_PENALTY_SECS)
        {
            self.penalize(1, "Neutral for 3 mins");
        }
        if self
            .angry
            .tick(emotion == LiveEmotion::Angry, now, ANGER_PENALTY_SECS)
        {
            self.penalize(5, "Anger detected (10s)");
        }

        let nose_to_chin = (chin.y - nose.y).abs();
        let nose_to_forehead = (nose.y - forehead.y).abs();
        let head_pitch_ratio = nose_to_chin
            / if nose_to_forehead == 0.0 {
                1.0
            } else {
                nose_to_forehead
            };
        let eye_look_down = shapes.look_down();
        let gaze = if head_pitch_ratio < HEAD_PITCH_READING || eye_look_down > LOOK_DOWN_LIVE {
            Gaze::Reading
        } else {
            Gaze::Focused
        };

        if self
            .reading
            .tick(gaze == Gaze::Reading, now, READING_PENALTY_SECS)
        {
            self.penalize(2, "Reading for 30s");
        }
        if self
            .focus
            .tick(gaze == Gaze::Focused, now, FOCUS_REWARD_SECS)
        {
            self.reward(1, "Focused for 1 min");
        }

        let distance = nose.distance_2d(&self.last_nose);
        let normalized = (distance * 5000.0).min(100.0);
        self.movement_intensity = self.movement_intensity * 0.9 + normalized * 0.1;
        self.last_nose = *nose;

        let stationary = distance <= STATIONARY_DISTANCE;
        if !stationary {
            self.static_since = now;
            self.static_penalties = 0;
        }
        let static_secs = now - self.static_since;
        let due = (static_secs / STATIC_PENALTY_SECS).floor() as u32;
        if stationary && due > self.static_penalties {
            self.static_penalties = due;
            self.penalize(3, "Static for 1 min");
        }

        Some(LiveSnapshot {
            at: now,
            score: self.score,
            emotion,
            confidence,
            anger_alert: emotion == LiveEmotion::Angry && angry_score > ANGER_ALERT,
            gaze,
            head_pitch_ratio,
            eye_look_down,
            movement_intensity: self.movement_intensity,
            stationary,
            static_secs,
        })
    }
}

/// A running live-monitoring loop.
///
/// Dropping the session without calling [`stop`](Self::stop) cancels the
/// loop but does not wait for the device to be released.
pub struct CaptureSession {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    snapshots: Arc<LatestSlot<Option<LiveSnapshot>>>,
}

impl CaptureSession {
    pub fn start<D>(mut device: D, mut face: Box<dyn FaceLandmarker>, log: ActivityLog) -> Self
    where
        D: CaptureDevice + 'static,
    {
        let token = CancellationToken::new();
        let snapshots = Arc::new(LatestSlot::new(None));

        let loop_token = token.clone();
        let slot = snapshots.clone();
        let handle = tokio::spawn(async move {
            let mut scorer = LiveScorer::new(log.clone());
            log.success("Monitoring started.");

            loop {
                let frame = tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    frame = device.next_frame() => frame,
                };

                let frame = match frame {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        debug!("capture device exhausted");
                        break;
                    }
                    Err(e) => {
                        log.error(format!("Capture failed: {e}"));
                        break;
                    }
                };

                match face.detect(&frame) {
                    Ok(Some(result)) => {
                        if let Some(snapshot) = scorer.observe(frame.timestamp, &result) {
                            slot.set(Some(snapshot));
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "face detection failed"),
                }
            }

            device.release().await;
            log.info("Webcam stopped.");
        });

        Self {
            token,
            handle: Some(handle),
            snapshots,
        }
    }

    pub fn latest(&self) -> Option<LiveSnapshot> {
        self.snapshots.latest()
    }

    pub fn snapshots(&self) -> Arc<LatestSlot<Option<LiveSnapshot>>> {
        self.snapshots.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the loop and wait until the device is released.
    pub async fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "capture loop ended abnormally");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
