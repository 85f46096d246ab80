//! Emotion data from the remote analysis server and the views derived from it.

pub mod disturbance;
pub mod stream;

use serde::Deserialize;

use crate::types::{EmotionLabel, EmotionSegment, RawEmotion};

pub use disturbance::{BUCKET_SECONDS, build_disturbance_timeline};
pub use stream::{EmotionStreamClient, LineBuffer, consume_ndjson};

/// Map the dimensional arousal/valence pair to a discrete label.
pub fn map_dimensions_to_label(arousal: f64, valence: f64) -> EmotionLabel {
    if arousal >= 0.5 && valence >= 0.5 {
        EmotionLabel::HappyHighEnergy
    } else if arousal >= 0.75 && valence < 0.5 {
        EmotionLabel::HighEnergy
    } else if arousal < 0.5 && valence >= 0.5 {
        EmotionLabel::CalmRelaxed
    } else if arousal < 0.5 && valence < 0.5 {
        EmotionLabel::SadBored
    } else {
        EmotionLabel::Neutral
    }
}

/// One NDJSON line as sent by the analysis server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerChunk {
    pub start: f64,
    pub end: f64,
    pub emotions: RawEmotion,
    #[serde(default)]
    pub disturbances: Option<Vec<String>>,
    #[serde(default)]
    pub noise_events: Option<Vec<String>>,
}

impl From<ServerChunk> for EmotionSegment {
    fn from(chunk: ServerChunk) -> Self {
        let raw = chunk.emotions;
        Self {
            start: chunk.start,
            end: chunk.end,
            emotion: map_dimensions_to_label(raw.arousal, raw.valence),
            confidence: (raw.arousal + raw.dominance) / 2.0,
            raw_emotion: raw,
            disturbances: chunk
                .disturbances
                .or(chunk.noise_events)
                .unwrap_or_default(),
        }
    }
}
