//! JSON shapes the generative model is asked to return.
//!
//! Only `subject` and `overall_rating` are mandatory; every other field falls
//! back to its default so that a terse but well-formed answer still parses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiReport {
    pub subject: String,
    pub overall_rating: f64,
    #[serde(default)]
    pub improvement_percentage: f64,
    #[serde(default)]
    pub text_analysis: TextAnalysis,
    #[serde(default)]
    pub metrics: TeachingMetrics,
    #[serde(default)]
    pub syllabus_coverage: SyllabusCoverage,
    #[serde(default)]
    pub video_analysis: VisualAssessment,
    #[serde(default)]
    pub timeline_narrative: String,
    #[serde(default)]
    pub interaction_summary: String,
    #[serde(default)]
    pub disturbance_conclusion: String,
    #[serde(default)]
    pub interaction_metrics: InteractionMetrics,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalysis {
    pub semantic_parsing: String,
    pub syllabus_coverage: String,
    pub suitable_examples: String,
    pub content_simplification: String,
    pub doubt_resolution_quality: String,
}

/// Per-axis scores on a 0-100 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeachingMetrics {
    pub clarity_score: f64,
    pub example_quality: f64,
    pub doubt_resolution: f64,
    pub student_engagement: f64,
    pub content_simplification: f64,
    #[serde(alias = "Areas to Improve")]
    pub areas_to_improve: String,
    #[serde(alias = "Way to improve")]
    pub way_to_improve: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyllabusCoverage {
    pub covered_topics: Vec<String>,
    pub missing_topics: Vec<String>,
    pub score: f64,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualAssessment {
    pub body_language_score: f64,
    pub visual_summary: String,
    pub rubric_breakdown: String,
}

/// Scores on a 1-10 scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionMetrics {
    pub doubt_clarity_score: f64,
    pub explanation_quality_score: f64,
    pub interaction_understandability: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioInteractionReport {
    pub timeline: Vec<SpeakerTurn>,
    pub disturbances: Vec<AudioDisturbance>,
    pub metrics: AudioMetrics,
    pub summary: String,
    pub feedback: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
    pub emotion: String,
    pub content: String,
}

impl SpeakerTurn {
    pub fn is_teacher(&self) -> bool {
        self.speaker.to_lowercase().contains("teacher")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioDisturbance {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioMetrics {
    pub teacher_clarity: f64,
    pub student_engagement: f64,
    pub interaction_quality: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_report_fills_defaults() {
        let report: AiReport =
            serde_json::from_str(r#"{"subject":"Recursion","overall_rating":4.2}"#).unwrap();
        assert_eq!(report.subject, "Recursion");
        assert_eq!(report.metrics, TeachingMetrics::default());
        assert!(report.syllabus_coverage.covered_topics.is_empty());
    }

    #[test]
    fn report_without_rating_is_rejected() {
        assert!(serde_json::from_str::<AiReport>(r#"{"subject":"Optics"}"#).is_err());
    }

    #[test]
    fn metrics_accept_spaced_keys() {
        let metrics: TeachingMetrics = serde_json::from_str(
            r#"{"clarity_score":80,"Areas to Improve":"Pace","Way to improve":"Pause more"}"#,
        )
        .unwrap();
        assert_eq!(metrics.clarity_score, 80.0);
        assert_eq!(metrics.areas_to_improve, "Pace");
        assert_eq!(metrics.way_to_improve, "Pause more");
    }
}
