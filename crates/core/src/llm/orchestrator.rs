use tracing::{debug, instrument};

use crate::{
    activity::ActivityLog,
    audio::{WAV_HEADER_LEN, encode_wav},
    config::AnalyzerConfig,
    error::Result,
    llm::{
        api::{GenerationConfig, Part},
        chunking::{ChunkWindow, SubmissionMode, plan_chunks, submission_mode},
        client::GenerativeClient,
        prompts,
        schema::{AiReport, AudioInteractionReport},
    },
    media::{DecodedAudio, MediaAsset},
    types::{DisturbanceBucket, EmotionSegment, SignalMetrics, VideoAnalysis},
};

const PDF_MIME: &str = "application/pdf";
const WAV_MIME: &str = "audio/wav";

/// Everything the model sees besides the media itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationInput<'a> {
    pub transcript: &'a str,
    pub reference: Option<&'a str>,
    pub reference_pdf: Option<&'a [u8]>,
    pub signal: Option<SignalMetrics>,
    pub emotions: &'a [EmotionSegment],
    pub disturbances: &'a [DisturbanceBucket],
    pub video: Option<&'a VideoAnalysis>,
    pub duration_secs: f64,
}

/// Drives every generative call of an analysis run.
#[derive(Debug, Clone)]
pub struct LlmOrchestrator {
    client: GenerativeClient,
    inline_limit_bytes: u64,
    chunk_duration_secs: f64,
    transcript_char_limit: usize,
    log: ActivityLog,
}

impl LlmOrchestrator {
    pub fn new(client: GenerativeClient, config: &AnalyzerConfig, log: ActivityLog) -> Self {
        Self {
            client,
            inline_limit_bytes: config.inline_limit_bytes,
            chunk_duration_secs: config.chunk_duration_secs,
            transcript_char_limit: config.transcript_char_limit,
            log,
        }
    }

    pub fn mode(&self, asset: &MediaAsset) -> SubmissionMode {
        submission_mode(asset.size, self.inline_limit_bytes)
    }

    fn windows(&self, audio: &DecodedAudio) -> Vec<ChunkWindow> {
        plan_chunks(
            audio.duration_secs(),
            self.chunk_duration_secs,
            audio.sample_rate(),
        )
    }

    /// Verbatim transcript of the recording.
    ///
    /// Large assets are transcribed window by window; windows that fail are
    /// skipped and the rest concatenated.
    #[instrument(skip_all, fields(media = %asset.file_name()))]
    pub async fn transcribe(&self, asset: &MediaAsset, audio: &DecodedAudio) -> Result<String> {
        let config = Some(GenerationConfig::plain_text());

        if self.mode(asset) == SubmissionMode::Standard {
            let bytes = asset.read_bytes().await?;
            let parts = vec![
                Part::text(prompts::TRANSCRIPTION_PROMPT),
                Part::inline(&bytes, asset.mime_type.as_str()),
            ];
            return self.client.generate(parts, config).await;
        }

        let windows = self.windows(audio);
        let mut pieces = Vec::with_capacity(windows.len());
        for window in &windows {
            let wav = encode_wav(audio, window.start_sample, window.end_sample);
            let parts = vec![
                Part::text(prompts::TRANSCRIPTION_PROMPT),
                Part::inline(&wav, WAV_MIME),
            ];
            match self.client.generate(parts, config.clone()).await {
                Ok(text) => pieces.push(text),
                Err(e) => self.log.warn(format!(
                    "Transcription of chunk {} failed: {e}",
                    window.index + 1
                )),
            }
        }
        Ok(pieces.join(" "))
    }

    /// Produce the structured report, inline or chunked depending on size.
    #[instrument(skip_all, fields(media = %asset.file_name()))]
    pub async fn evaluate(
        &self,
        asset: &MediaAsset,
        audio: &DecodedAudio,
        input: &EvaluationInput<'_>,
    ) -> Result<AiReport> {
        match self.mode(asset) {
            SubmissionMode::Standard => self.evaluate_inline(asset, input).await,
            SubmissionMode::Chunked => {
                self.log.info(format!(
                    "File is {:.1} MiB, switching to chunked analysis",
                    asset.size as f64 / (1024.0 * 1024.0)
                ));
                self.evaluate_chunked(audio, input).await
            }
        }
    }

    async fn evaluate_inline(
        &self,
        asset: &MediaAsset,
        input: &EvaluationInput<'_>,
    ) -> Result<AiReport> {
        let bytes = asset.read_bytes().await?;
        let mut parts = vec![
            Part::text(prompts::evaluation_prompt(input, self.transcript_char_limit)),
            Part::inline(&bytes, asset.mime_type.as_str()),
        ];
        if let Some(pdf) = input.reference_pdf {
            parts.push(Part::inline(pdf, PDF_MIME));
            parts.push(Part::text(prompts::PDF_REFERENCE_NOTE));
        }

        self.log.info("Requesting evaluation...");
        self.client
            .generate_json(parts, GenerationConfig::json().with_temperature(0.0))
            .await
    }

    async fn evaluate_chunked(
        &self,
        audio: &DecodedAudio,
        input: &EvaluationInput<'_>,
    ) -> Result<AiReport> {
        let windows = self.windows(audio);
        let total = windows.len();
        let mut summaries = Vec::with_capacity(total);

        for window in &windows {
            self.log
                .info(format!("Analyzing chunk {} of {total}...", window.index + 1));

            let emotions: Vec<EmotionSegment> = input
                .emotions
                .iter()
                .filter(|segment| window.contains(segment.start))
                .cloned()
                .collect();
            let disturbances: Vec<&DisturbanceBucket> = input
                .disturbances
                .iter()
                .filter(|bucket| bucket.has_disturbance && window.contains(bucket.start))
                .collect();

            let wav = encode_wav(audio, window.start_sample, window.end_sample);
            let parts = vec![
                Part::text(prompts::chunk_prompt(window, total, &emotions, &disturbances)),
                Part::inline(&wav, WAV_MIME),
            ];

            match self.client.generate(parts, None).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => self
                    .log
                    .warn(format!("Chunk {} failed, skipping: {e}", window.index + 1)),
            }
        }

        debug!(summaries = summaries.len(), total, "chunk pass finished");
        self.synthesize(&summaries, input).await
    }

    /// Final report from per-chunk summaries. No audio is attached.
    ///
    /// Runs even with no summaries so that the timelines and signal metrics
    /// still reach the model.
    pub async fn synthesize(
        &self,
        summaries: &[String],
        input: &EvaluationInput<'_>,
    ) -> Result<AiReport> {
        if summaries.is_empty() {
            self.log
                .warn("No chunk could be analyzed, synthesizing from metrics only");
        } else {
            self.log.info("Synthesizing final report...");
        }

        let prompt = prompts::synthesis_prompt(summaries, input, self.transcript_char_limit);
        self.client
            .generate_json(
                vec![Part::text(prompt)],
                GenerationConfig::json().with_temperature(0.0),
            )
            .await
    }

    /// Diarized interaction report over the whole audio.
    ///
    /// Returns `Ok(None)` when the re-encoded audio would not fit inline.
    #[instrument(skip_all)]
    pub async fn audio_report(
        &self,
        audio: &DecodedAudio,
        signal: Option<&SignalMetrics>,
    ) -> Result<Option<AudioInteractionReport>> {
        let encoded_len = (WAV_HEADER_LEN + audio.len() * 2) as u64;
        if encoded_len > self.inline_limit_bytes {
            self.log
                .info("Audio too long for an inline interaction report, skipping");
            return Ok(None);
        }

        let wav = encode_wav(audio, 0, audio.len());
        let parts = vec![
            Part::text(prompts::audio_report_prompt(audio.duration_secs(), signal)),
            Part::inline(&wav, WAV_MIME),
        ];
        let report = self
            .client
            .generate_json(parts, GenerationConfig::json())
            .await?;
        Ok(Some(report))
    }
}
