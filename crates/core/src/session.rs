use std::{path::PathBuf, sync::Arc};

use tokio::fs;
use tracing::{debug, info, instrument};

use crate::{
    activity::ActivityLog,
    audio::{PitchDetector, Yin, extract_signal_metrics},
    cache::{get_cache_dir, get_report_path},
    config::AnalyzerConfig,
    emotion::{EmotionStreamClient, disturbance::build_disturbance_timeline},
    error::Result,
    llm::{
        client::GenerativeClient,
        orchestrator::{EvaluationInput, LlmOrchestrator},
    },
    media::{DecodedAudio, MediaAsset, decode_audio},
    report::{ReportAssembler, save_report},
    slot::LatestSlot,
    store::{ReportStore, Reviewer, persist_report},
    types::{AnalysisReport, EmotionSegment, PartialResults, RunState, SignalMetrics, VideoAnalysis},
    vision::{
        analyzer::{FrameProgress, VideoFrameAnalyzer},
        track::{LandmarkTrack, TrackModels, TrackPlayer},
    },
};

/// One recording to analyze, plus who it is about and who asked.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub media_path: PathBuf,
    pub reference: Option<String>,
    pub reference_pdf: Option<Vec<u8>>,
    pub landmarks: Option<PathBuf>,
    pub teacher: Option<String>,
    pub reviewer: Reviewer,
}

impl AnalysisRequest {
    pub fn new(media_path: impl Into<PathBuf>) -> Self {
        Self {
            media_path: media_path.into(),
            ..Self::default()
        }
    }
}

/// Runs the whole pipeline for a recording and publishes progress through
/// a [`LatestSlot`] of [`RunState`].
pub struct AnalysisSession {
    config: AnalyzerConfig,
    log: ActivityLog,
    state: Arc<LatestSlot<RunState>>,
    store: Option<Arc<dyn ReportStore>>,
}

impl AnalysisSession {
    pub fn new(config: AnalyzerConfig, log: ActivityLog) -> Self {
        Self {
            config,
            log,
            state: Arc::new(LatestSlot::new(RunState::Idle)),
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> Arc<LatestSlot<RunState>> {
        self.state.clone()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    #[instrument(skip_all, fields(media = %request.media_path.display()))]
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        match self.run_inner(request).await {
            Ok(report) => {
                self.state.set(RunState::Complete(Box::new(report.clone())));
                Ok(report)
            }
            Err(e) => {
                self.log.error(format!("Analysis failed: {e}"));
                self.state.set(RunState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run_inner(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let asset = MediaAsset::open(&request.media_path).await?;
        let cache_dir = get_cache_dir(&self.config.cache_root, &asset.path, asset.size);
        fs::create_dir_all(&cache_dir).await?;

        self.log.info(format!("Decoding audio from {}...", asset.file_name()));
        let audio = decode_audio(&asset, &cache_dir).await?;
        let duration = audio.duration_secs();
        self.log
            .info(format!("Audio decoded: {duration:.1}s at {} Hz", audio.sample_rate()));
        self.state.set(RunState::Partial(PartialResults::default()));

        let orchestrator = self.config.provider.clone().map(|provider| {
            LlmOrchestrator::new(
                GenerativeClient::new(provider, self.log.clone()),
                &self.config,
                self.log.clone(),
            )
        });

        let (signal, video, emotions, transcript) = tokio::join!(
            self.signal_stage(&audio),
            self.video_stage(&asset, request),
            self.emotion_stage(&asset, duration),
            self.transcript_stage(orchestrator.as_ref(), &asset, &audio),
        );
        let video = video?;

        let disturbances = build_disturbance_timeline(duration, &emotions);
        let mut assembler = ReportAssembler::new(asset.file_name(), duration)
            .signal(signal)
            .video(video.clone())
            .transcript(transcript.clone());

        if let Some(orchestrator) = orchestrator.as_ref() {
            let input = EvaluationInput {
                transcript: &transcript,
                reference: request.reference.as_deref(),
                reference_pdf: request.reference_pdf.as_deref(),
                signal,
                emotions: &emotions,
                disturbances: &disturbances,
                video: video.as_ref(),
                duration_secs: duration,
            };
            let ai = orchestrator.evaluate(&asset, &audio, &input).await?;
            self.log.success(format!(
                "Evaluation complete: {} rated {:.1}/5",
                ai.subject, ai.overall_rating
            ));

            let audio_report = match orchestrator.audio_report(&audio, signal.as_ref()).await {
                Ok(report) => report,
                Err(e) => {
                    self.log
                        .warn(format!("Audio interaction report failed: {e}"));
                    None
                }
            };
            assembler = assembler.ai(Some(ai)).audio_report(audio_report);
        } else {
            self.log
                .warn("No API key configured, skipping model evaluation");
        }

        let report = assembler.emotions(emotions).assemble();

        let report_path = get_report_path(&cache_dir);
        if let Err(e) = save_report(&report_path, &report).await {
            self.log.warn(format!("Could not cache report: {e}"));
        } else {
            debug!(path = %report_path.display(), "report cached");
        }

        self.persist(request, &report).await;
        Ok(report)
    }

    async fn signal_stage(&self, audio: &DecodedAudio) -> Option<SignalMetrics> {
        let detector = Yin::new(audio.sample_rate());
        let signal = extract_signal_metrics(audio, Some(&detector as &dyn PitchDetector)).await;

        match signal {
            Some(metrics) => {
                self.log.success(format!(
                    "Voice metrics: {:.0} Hz, {:.0} bpm",
                    metrics.avg_pitch_hz, metrics.estimated_pace_bpm
                ));
                self.state.update(|state| match state {
                    RunState::Partial(partial) => RunState::Partial(PartialResults {
                        signal: Some(metrics),
                        ..partial.clone()
                    }),
                    other => other.clone(),
                });
            }
            None => self.log.warn("Pitch detection unavailable, voice metrics skipped"),
        }
        signal
    }

    async fn video_stage(
        &self,
        asset: &MediaAsset,
        request: &AnalysisRequest,
    ) -> Result<Option<VideoAnalysis>> {
        let Some(landmarks) = request.landmarks.as_ref() else {
            if asset.is_video() {
                self.log
                    .warn("No landmark track supplied, video analysis skipped");
            }
            return Ok(None);
        };

        let track = Arc::new(LandmarkTrack::load(landmarks).await?);
        let mut player = TrackPlayer::new(track.clone());
        let mut analyzer = VideoFrameAnalyzer::new(TrackModels::new(track), self.log.clone());

        let analysis = analyzer
            .analyze(&mut player, |progress: &FrameProgress| {
                debug!(
                    time = %progress.time,
                    status = progress.status,
                    percent = progress.percent,
                    "frame"
                );
            })
            .await?;
        Ok(Some(analysis))
    }

    async fn emotion_stage(&self, asset: &MediaAsset, duration: f64) -> Vec<EmotionSegment> {
        let Some(server_url) = self.config.server_url.as_deref() else {
            self.log
                .warn("No emotion server configured, emotion timeline skipped");
            return Vec::new();
        };

        let client = EmotionStreamClient::new(server_url, self.log.clone());
        client
            .analyze(asset, |segment: &EmotionSegment, all: &[EmotionSegment]| {
                debug!(start = segment.start, emotion = %segment.emotion, "emotion segment");
                self.state.update(|state| match state {
                    RunState::Partial(partial) => RunState::Partial(PartialResults {
                        signal: partial.signal,
                        emotion_timeline: all.to_vec(),
                        disturbance_timeline: build_disturbance_timeline(duration, all),
                    }),
                    other => other.clone(),
                });
            })
            .await
    }

    async fn transcript_stage(
        &self,
        orchestrator: Option<&LlmOrchestrator>,
        asset: &MediaAsset,
        audio: &DecodedAudio,
    ) -> String {
        let Some(orchestrator) = orchestrator else {
            return String::new();
        };

        self.log.info("Transcribing...");
        match orchestrator.transcribe(asset, audio).await {
            Ok(transcript) if !transcript.is_empty() => {
                self.log
                    .success(format!("Transcript ready ({} chars)", transcript.chars().count()));
                transcript
            }
            Ok(_) => {
                self.log.warn("Transcript is empty");
                String::new()
            }
            Err(e) => {
                self.log.warn(format!("Transcription failed: {e}"));
                String::new()
            }
        }
    }

    async fn persist(&self, request: &AnalysisRequest, report: &AnalysisReport) {
        let Some(teacher) = request.teacher.as_deref() else {
            self.log.info("No teacher specified, report not saved");
            return;
        };
        let Some(store) = self.store.as_ref() else {
            self.log.info("No report store configured, report not saved");
            return;
        };

        match persist_report(store.as_ref(), teacher, report, &request.reviewer).await {
            Ok(aggregate) => {
                info!(teacher, rating = aggregate.rating, "aggregate updated");
                self.log.success(format!(
                    "Saved report for {teacher}: {:.2}/5 over {} reports",
                    aggregate.rating, aggregate.rating_count
                ));
            }
            Err(e) => self.log.error(format!("Saving report failed: {e}")),
        }
    }
}
