use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::schema::{AiReport, AudioInteractionReport};

/// Aggregate acoustic statistics for a whole recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub avg_pitch_hz: f64,
    pub avg_rms: f64,
    pub estimated_pace_bpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionLabel {
    #[serde(rename = "Happy/High Energy")]
    HappyHighEnergy,
    #[serde(rename = "High Energy")]
    HighEnergy,
    #[serde(rename = "Calm/Relaxed")]
    CalmRelaxed,
    #[serde(rename = "Sad/Bored")]
    SadBored,
    #[serde(rename = "Neutral")]
    Neutral,
}

impl EmotionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::HappyHighEnergy => "Happy/High Energy",
            EmotionLabel::HighEnergy => "High Energy",
            EmotionLabel::CalmRelaxed => "Calm/Relaxed",
            EmotionLabel::SadBored => "Sad/Bored",
            EmotionLabel::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimensional emotion scores as reported by the analysis server, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEmotion {
    pub arousal: f64,
    pub valence: f64,
    pub dominance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSegment {
    pub start: f64,
    pub end: f64,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub raw_emotion: RawEmotion,
    #[serde(default)]
    pub disturbances: Vec<String>,
}

/// A fixed 30 second window of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceBucket {
    pub start: f64,
    pub end: f64,
    pub has_disturbance: bool,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoFrameStats {
    pub total_time: f64,
    pub focused_sec: f64,
    pub reading_sec: f64,
    pub happy_sec: f64,
    pub neutral_sec: f64,
    pub angry_sec: f64,
    pub board_work_sec: f64,
    pub stationary_sec: f64,
    pub closed_posture_sec: f64,
    pub writing_count: f64,
    pub max_reading_streak: f64,
    pub current_reading_streak: f64,
    pub movement_scores: Vec<f64>,
    pub movement_intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoEventType {
    #[serde(rename = "Board Work")]
    BoardWork,
    Gesture,
    Emotion,
    Gaze,
    Engagement,
}

impl VideoEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoEventType::BoardWork => "Board Work",
            VideoEventType::Gesture => "Gesture",
            VideoEventType::Emotion => "Emotion",
            VideoEventType::Gaze => "Gaze",
            VideoEventType::Engagement => "Engagement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEvent {
    pub time: String,
    pub time_seconds: f64,
    #[serde(rename = "type")]
    pub event_type: VideoEventType,
    pub desc: String,
}

/// Share of total video time spent in each behavioural category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRatios {
    pub focus: f64,
    pub reading: f64,
    pub happy: f64,
    pub neutral: f64,
    pub angry: f64,
    pub board_work: f64,
    pub closed_posture: f64,
    pub stationary: f64,
    pub gestures_per_min: f64,
    pub max_reading_streak: f64,
    pub avg_movement: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub engagement: f64,
    pub delivery: f64,
    pub professionalism: f64,
    pub visual_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub duration: f64,
    pub stats: VideoFrameStats,
    pub ratios: VideoRatios,
    pub rubric: RubricScores,
    pub events: Vec<VideoEvent>,
}

/// Final combined artifact of one analysis run. Immutable once assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub created_at: SystemTime,
    pub media_name: String,
    pub duration_secs: f64,
    pub ai: Option<AiReport>,
    pub audio_report: Option<AudioInteractionReport>,
    pub signal: Option<SignalMetrics>,
    pub emotion_timeline: Vec<EmotionSegment>,
    pub disturbance_timeline: Vec<DisturbanceBucket>,
    pub video: Option<VideoAnalysis>,
    pub transcript: String,
}

/// Results visible while a run is still in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialResults {
    pub signal: Option<SignalMetrics>,
    pub emotion_timeline: Vec<EmotionSegment>,
    pub disturbance_timeline: Vec<DisturbanceBucket>,
}

#[derive(Debug, Clone)]
pub enum RunState {
    Idle,
    Partial(PartialResults),
    Complete(Box<AnalysisReport>),
    Failed(String),
}

