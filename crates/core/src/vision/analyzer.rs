use tokio::time::timeout;
use tracing::{debug, instrument};

use crate::{
    activity::ActivityLog,
    error::{CoreError, Result},
    format::format_timestamp,
    types::VideoAnalysis,
    vision::{
        SEEK_TIMEOUT, STEP_SECONDS,
        classifier::{FrameClass, FrameClassifier},
        landmarks::FrameObservation,
        rubric::{compute_ratios, compute_rubric},
        source::{VideoSource, VisionModelLoader},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerState {
    Idle,
    LoadingModels,
    LoadingMedia,
    Analyzing { percent: u8 },
    Complete,
    Error(String),
}

/// Live feedback emitted once per analyzed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameProgress {
    pub time: String,
    pub class: FrameClass,
    pub status: &'static str,
    pub percent: u8,
}

pub struct VideoFrameAnalyzer<L> {
    loader: L,
    state: AnalyzerState,
    log: ActivityLog,
}

impl<L: VisionModelLoader> VideoFrameAnalyzer<L> {
    pub fn new(loader: L, log: ActivityLog) -> Self {
        Self {
            loader,
            state: AnalyzerState::Idle,
            log,
        }
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    /// Step through the whole video and reduce it to behavioural metrics.
    ///
    /// Any model-load, media or frame failure aborts the pass; nothing
    /// gathered before the failure is returned.
    #[instrument(skip_all)]
    pub async fn analyze<S, F>(&mut self, source: &mut S, on_progress: F) -> Result<VideoAnalysis>
    where
        S: VideoSource,
        F: FnMut(&FrameProgress),
    {
        match self.run(source, on_progress).await {
            Ok(analysis) => {
                self.state = AnalyzerState::Complete;
                self.log.success(format!(
                    "Video analysis complete: {} events over {}",
                    analysis.events.len(),
                    format_timestamp(analysis.duration)
                ));
                Ok(analysis)
            }
            Err(e) => {
                self.state = AnalyzerState::Error(e.to_string());
                self.log.error(format!("Video analysis error: {e}"));
                Err(e)
            }
        }
    }

    async fn run<S, F>(&mut self, source: &mut S, mut on_progress: F) -> Result<VideoAnalysis>
    where
        S: VideoSource,
        F: FnMut(&FrameProgress),
    {
        self.state = AnalyzerState::LoadingModels;
        self.log.info("Loading vision models...");
        let mut face = self.loader.load_face().await?;
        let mut pose = self.loader.load_pose().await?;

        self.state = AnalyzerState::LoadingMedia;
        self.log.info("Models ready. Loading video...");
        let duration = source.load().await?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CoreError::InvalidDuration { duration });
        }

        self.state = AnalyzerState::Analyzing { percent: 0 };
        let mut classifier = FrameClassifier::new(duration, STEP_SECONDS);

        let mut index = 0u64;
        loop {
            let t = index as f64 * STEP_SECONDS;
            if t >= duration {
                break;
            }
            index += 1;

            match timeout(SEEK_TIMEOUT, source.seek(t)).await {
                Ok(seeked) => seeked?,
                Err(_) => debug!(t, "seek timed out, reading current frame"),
            }

            let frame = source.current_frame()?;
            let observation = FrameObservation {
                face: face.detect(&frame)?,
                pose: pose.detect(&frame)?,
            };
            let class = classifier.observe(t, &observation);

            let percent = ((t / duration) * 100.0).round().clamp(0.0, 100.0) as u8;
            self.state = AnalyzerState::Analyzing { percent };
            on_progress(&FrameProgress {
                time: format_timestamp(t),
                class,
                status: class.status(),
                percent,
            });
        }

        let (stats, events) = classifier.finish();
        let ratios = compute_ratios(&stats);
        let rubric = compute_rubric(&ratios);

        Ok(VideoAnalysis {
            duration,
            stats,
            ratios,
            rubric,
            events,
        })
    }
}
