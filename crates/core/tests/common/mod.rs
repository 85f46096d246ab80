#![allow(dead_code)]

use std::path::{Path, PathBuf};

use parikshak_core::{Provider, config::AnalyzerConfig};
use serde_json::{Value, json};

pub const PRIMARY_PATH: &str = "/v1beta/models/primary:generateContent";
pub const FALLBACK_PATH: &str = "/v1beta/models/fallback:generateContent";

pub fn provider(base_url: &str) -> Provider {
    Provider::new("test-key")
        .with_base_url(base_url)
        .with_models("primary", "fallback")
}

pub fn config(base_url: &str, cache_root: &Path) -> AnalyzerConfig {
    AnalyzerConfig::default()
        .with_provider(provider(base_url))
        .with_cache_root(cache_root.to_path_buf())
}

/// A `generateContent` response carrying `text` as the only candidate part.
pub fn model_reply(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

pub fn report_json(subject: &str, rating: f64) -> String {
    json!({
        "subject": subject,
        "overall_rating": rating,
        "metrics": {"clarity_score": 80, "Areas to Improve": "Pace", "Way to improve": "Pause more"},
        "feedback": "Solid session."
    })
    .to_string()
}

/// Write a mono 16 kHz sine tone.
pub fn write_tone(dir: &Path, name: &str, seconds: f32, freq: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let total = (16_000.0 * seconds) as u32;
    for i in 0..total {
        let t = i as f32 / 16_000.0;
        let sample = (t * freq * std::f32::consts::TAU).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}
