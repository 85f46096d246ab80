use std::{path::Path, time::SystemTime};

use tokio::fs;
use uuid::Uuid;

use crate::{
    emotion::disturbance::build_disturbance_timeline,
    error::Result,
    llm::schema::{AiReport, AudioInteractionReport},
    types::{AnalysisReport, EmotionSegment, SignalMetrics, VideoAnalysis},
};

/// Collects stage outputs as they finish and merges them into one report.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    media_name: String,
    duration_secs: f64,
    transcript: String,
    signal: Option<SignalMetrics>,
    emotion_timeline: Vec<EmotionSegment>,
    video: Option<VideoAnalysis>,
    ai: Option<AiReport>,
    audio_report: Option<AudioInteractionReport>,
}

impl ReportAssembler {
    pub fn new(media_name: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            media_name: media_name.into(),
            duration_secs,
            ..Self::default()
        }
    }

    pub fn transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = transcript.into();
        self
    }

    pub fn signal(mut self, signal: Option<SignalMetrics>) -> Self {
        self.signal = signal;
        self
    }

    pub fn emotions(mut self, emotions: Vec<EmotionSegment>) -> Self {
        self.emotion_timeline = emotions;
        self
    }

    pub fn video(mut self, video: Option<VideoAnalysis>) -> Self {
        self.video = video;
        self
    }

    pub fn ai(mut self, ai: Option<AiReport>) -> Self {
        self.ai = ai;
        self
    }

    pub fn audio_report(mut self, report: Option<AudioInteractionReport>) -> Self {
        self.audio_report = report;
        self
    }

    pub fn assemble(self) -> AnalysisReport {
        let disturbance_timeline =
            build_disturbance_timeline(self.duration_secs, &self.emotion_timeline);

        let mut ai = self.ai;
        if let (Some(ai), Some(video)) = (ai.as_mut(), self.video.as_ref()) {
            let visual = &mut ai.video_analysis;
            if visual.rubric_breakdown.trim().is_empty() {
                visual.rubric_breakdown = format!(
                    "Engagement: {:.0}/100, Delivery: {:.0}/100, Professionalism: {:.0}/100",
                    video.rubric.engagement, video.rubric.delivery, video.rubric.professionalism
                );
            }
            if visual.body_language_score <= 0.0 {
                visual.body_language_score = video.rubric.visual_score.round();
            }
        }

        AnalysisReport {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            media_name: self.media_name,
            duration_secs: self.duration_secs,
            ai,
            audio_report: self.audio_report,
            signal: self.signal,
            emotion_timeline: self.emotion_timeline,
            disturbance_timeline,
            video: self.video,
            transcript: self.transcript,
        }
    }
}

pub async fn save_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?).await?;
    Ok(())
}

pub async fn load_report(path: &Path) -> Result<AnalysisReport> {
    let json_content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json_content)?)
}
