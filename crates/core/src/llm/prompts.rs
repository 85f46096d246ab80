use serde_json::json;

use crate::{
    llm::{chunking::ChunkWindow, orchestrator::EvaluationInput},
    types::{DisturbanceBucket, EmotionSegment, SignalMetrics},
    vision::rubric::teaching_score,
};

pub const TRANSCRIPTION_PROMPT: &str = "Generate a verbatim transcription of this audio. \
Output ONLY the raw text, no formatting, no timestamps, no speaker labels.";

pub const PDF_REFERENCE_NOTE: &str =
    "Use the attached PDF as the syllabus / reference material for comparison.";

const REPORT_SCHEMA: &str = r#"{
  "subject": "Inferred topic (1-3 words), strictly from the transcript",
  "overall_rating": (float 1-5),
  "improvement_percentage": (integer),
  "text_analysis": {
    "semantic_parsing": "Student doubts raised. If none, say 'No doubts raised'.",
    "syllabus_coverage": "Topics covered vs expected (if a reference is provided).",
    "suitable_examples": "Quality and relevance of the examples used.",
    "content_simplification": "How well complex topics were simplified.",
    "doubt_resolution_quality": "Review of the teacher's answers to doubts."
  },
  "metrics": {
    "clarity_score": (0-100),
    "example_quality": (0-100),
    "doubt_resolution": (0-100),
    "student_engagement": (0-100),
    "content_simplification": (0-100),
    "areas_to_improve": "Specific feedback",
    "way_to_improve": "Actionable tips"
  },
  "syllabus_coverage": {
    "covered_topics": ["topic"],
    "missing_topics": ["topic"],
    "score": (0-100),
    "summary": "Syllabus vs lecture in brief."
  },
  "video_analysis": {
    "body_language_score": (0-100),
    "visual_summary": "Pointwise: executive summary, timeline narrative, emotional analysis, multimodal use.",
    "rubric_breakdown": "RUBRIC_BREAKDOWN"
  },
  "timeline_narrative": "Story of the class.",
  "interaction_summary": "Summary of the teacher/student interaction.",
  "disturbance_conclusion": "How noise and interruptions affected the session.",
  "interaction_metrics": {
    "doubt_clarity_score": (1-10),
    "explanation_quality_score": (1-10),
    "interaction_understandability": (1-10)
  },
  "feedback": "Pedagogical critique and recommendations."
}"#;

/// At most `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn emotion_context(segments: &[EmotionSegment]) -> String {
    let entries: Vec<_> = segments
        .iter()
        .map(|segment| {
            json!({
                "t": format!("{}-{}s", segment.start.round(), segment.end.round()),
                "e": segment.emotion.as_str(),
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

pub fn disturbance_context<'a>(buckets: impl IntoIterator<Item = &'a DisturbanceBucket>) -> String {
    let entries: Vec<_> = buckets
        .into_iter()
        .map(|bucket| {
            json!({
                "t": format!("{}-{}s", bucket.start, bucket.end),
                "events": bucket.events,
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

fn signal_lines(signal: Option<&SignalMetrics>) -> String {
    match signal {
        Some(signal) => format!(
            "- Avg Pitch: {:.0}Hz\n- Pace: {:.0}bpm\n- Loudness (RMS): {:.3}",
            signal.avg_pitch_hz, signal.estimated_pace_bpm, signal.avg_rms
        ),
        None => "- Voice metrics unavailable".to_string(),
    }
}

fn visual_section(input: &EvaluationInput<'_>) -> (String, String) {
    let Some(video) = input.video else {
        return (
            "Video behaviour metrics unavailable for this session.".to_string(),
            "Not available".to_string(),
        );
    };

    let ratios = &video.ratios;
    let rubric = &video.rubric;
    let breakdown = format!(
        "Engagement: {:.0}/100, Delivery: {:.0}/100, Professionalism: {:.0}/100",
        rubric.engagement, rubric.delivery, rubric.professionalism
    );
    let events = serde_json::to_string(&video.events).unwrap_or_else(|_| "[]".to_string());

    let section = format!(
        "- Score: {:.0}/100\n\
         - Teaching Score (Focus+Board): {:.0}% (Target: >80%)\n\
         - Happiness/Smile: {:.0}% (Target: >10%)\n\
         - Reading Notes: {:.0}% (Target: <5%)\n\
         - Angry/Stern: {:.0}% (Target: 0%)\n\
         - Overall Engagement: {:.0}/100 (Gestures: {:.1}/min)\n\
         - Delivery: {:.0}/100\n\
         - Professionalism: {:.0}/100\n\n\
         ## TIMELINE\n{}",
        rubric.visual_score,
        teaching_score(ratios),
        ratios.happy * 100.0,
        ratios.reading * 100.0,
        ratios.angry * 100.0,
        rubric.engagement,
        ratios.gestures_per_min,
        rubric.delivery,
        rubric.professionalism,
        events
    );
    (section, breakdown)
}

/// Single-pass evaluation prompt; the media itself travels as an inline part.
pub fn evaluation_prompt(input: &EvaluationInput<'_>, transcript_limit: usize) -> String {
    let (visual, breakdown) = visual_section(input);
    let schema = REPORT_SCHEMA.replace("RUBRIC_BREAKDOWN", &breakdown);
    let disturbed = input.disturbances.iter().filter(|b| b.has_disturbance);

    format!(
        "You are \"Parikshak AI\", an expert and supportive pedagogical coach.\n\
         Analyze the teacher in the attached classroom recording ({duration:.0}s) using:\n\
         1. The lecture audio and transcript\n\
         2. Video behavioural metrics (body language, emotion)\n\
         3. Voice and classroom-noise signals\n\
         4. The reference syllabus, if provided\n\n\
         Do not discuss topics that are not present in the transcript.\n\n\
         ## METRICS (VISUAL ANALYSIS)\n{visual}\n\n\
         ## VOICE & CLASSROOM\n{signal}\n\
         - Emotion Timeline: {emotions}\n\
         - Disturbance Timeline: {disturbances}\n\n\
         ## CONTENT CONTEXT\n\
         TRANSCRIPT: {transcript}\n\
         REFERENCE: {reference}\n\n\
         Return strictly valid JSON matching this schema:\n{schema}",
        duration = input.duration_secs,
        signal = signal_lines(input.signal.as_ref()),
        emotions = emotion_context(input.emotions),
        disturbances = disturbance_context(disturbed),
        transcript = truncate_chars(input.transcript, transcript_limit),
        reference = input.reference.unwrap_or("None"),
    )
}

pub fn chunk_prompt(
    window: &ChunkWindow,
    total: usize,
    emotions: &[EmotionSegment],
    disturbances: &[&DisturbanceBucket],
) -> String {
    format!(
        "Analyze this PARTIAL AUDIO CHUNK ({index} of {total}).\n\
         Time Range: {start:.0}s to {end:.0}s.\n\n\
         Context data for this chunk:\n\
         - Emotions: {emotions}\n\
         - Disturbances: {disturbances}\n\n\
         Task: Briefly summarize the teaching interaction, student engagement and any \
         specific disturbances heard in this segment. Focus on clarity and pedagogical quality.\n\
         Output a short paragraph.",
        index = window.index + 1,
        start = window.start,
        end = window.end,
        emotions = emotion_context(emotions),
        disturbances = disturbance_context(disturbances.iter().copied()),
    )
}

/// Final report from per-chunk summaries; no media is attached.
/// Stands in for the chunk list when every chunk failed.
pub const NO_CHUNK_SUMMARIES: &str = "No chunk summaries are available; every audio chunk failed. \
     Base the report on the global metrics, timelines and transcript below.";

pub fn synthesis_prompt(
    summaries: &[String],
    input: &EvaluationInput<'_>,
    transcript_limit: usize,
) -> String {
    let (visual, breakdown) = visual_section(input);
    let schema = REPORT_SCHEMA.replace("RUBRIC_BREAKDOWN", &breakdown);
    let chunks = if summaries.is_empty() {
        NO_CHUNK_SUMMARIES.to_string()
    } else {
        summaries
            .iter()
            .enumerate()
            .map(|(i, summary)| format!("Chunk {}: {}", i + 1, summary))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let disturbed = input.disturbances.iter().filter(|b| b.has_disturbance);

    format!(
        "Generate a final pedagogical report from these sequential analysis summaries \
         of a long classroom recording ({duration:.0}s).\n\n\
         CHUNK SUMMARIES (chronological):\n{chunks}\n\n\
         GLOBAL METRICS:\n{signal}\n\
         - Total Emotions: {emotion_count} segments analyzed\n\
         - Disturbance Timeline: {disturbances}\n\n\
         ## METRICS (VISUAL ANALYSIS)\n{visual}\n\n\
         TRANSCRIPT: {transcript}\n\
         REFERENCE: {reference}\n\n\
         Return strictly valid JSON matching this schema:\n{schema}",
        duration = input.duration_secs,
        signal = signal_lines(input.signal.as_ref()),
        emotion_count = input.emotions.len(),
        disturbances = disturbance_context(disturbed),
        transcript = truncate_chars(input.transcript, transcript_limit),
        reference = input.reference.unwrap_or("None"),
    )
}

pub fn audio_report_prompt(duration: f64, signal: Option<&SignalMetrics>) -> String {
    format!(
        "You are an expert classroom pedagogical analyst.\n\
         Analyze this {duration:.0}s extract of a classroom session.\n\n\
         Signal Metrics:\n{signal}\n\n\
         TASKS:\n\
         1. Diarization: distinguish \"Teacher\" vs \"Student\".\n\
         2. Interaction timeline: for every emotion or speaker change, mark the exact start and end time.\n\
         3. Emotion analysis: name the specific emotion (Curious, Frustrated, Excited, Bored, Strict, ...).\n\
         4. Disturbances: identify loud noises or interruptions.\n\n\
         Output strictly this JSON:\n\
         {{\n\
           \"timeline\": [{{\"start\": 0, \"end\": 15, \"speaker\": \"Teacher\", \"emotion\": \"Energetic\", \"content\": \"Brief summary\"}}],\n\
           \"disturbances\": [{{\"start\": 0, \"end\": 2, \"type\": \"Door slam\"}}],\n\
           \"metrics\": {{\"teacher_clarity\": (1-10), \"student_engagement\": (1-10), \"interaction_quality\": (1-10)}},\n\
           \"summary\": \"Overview of the interaction.\",\n\
           \"feedback\": \"Actionable advice.\"\n\
         }}",
        signal = signal_lines(signal),
    )
}
