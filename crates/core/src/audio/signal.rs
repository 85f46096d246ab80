use tracing::debug;

use crate::{audio::pitch::PitchDetector, media::DecodedAudio, types::SignalMetrics};

pub const WINDOW_SIZE: usize = 2048;
/// Only one window in every `WINDOW_STRIDE / WINDOW_SIZE` is analysed.
pub const WINDOW_STRIDE: usize = 8192;
pub const YIELD_EVERY: usize = 50;
pub const MIN_VOICE_HZ: f64 = 60.0;
pub const MAX_VOICE_HZ: f64 = 500.0;

/// Compute pitch, loudness and pace over sampled windows of the first channel.
///
/// Returns `None` when no pitch detector is available; callers treat that as
/// a degraded run rather than a failure.
pub async fn extract_signal_metrics(
    audio: &DecodedAudio,
    detector: Option<&dyn PitchDetector>,
) -> Option<SignalMetrics> {
    let detector = detector?;
    let data = audio.channel_data();

    let mut total_energy = 0.0f64;
    let mut pitch_sum = 0.0f64;
    let mut valid_pitches = 0usize;

    for (iteration, start) in (0..data.len()).step_by(WINDOW_STRIDE).enumerate() {
        let Some(window) = data.get(start..start + WINDOW_SIZE) else {
            break;
        };

        total_energy += window.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>();

        if let Some(pitch) = detector.detect(window)
            && (MIN_VOICE_HZ..MAX_VOICE_HZ).contains(&pitch)
        {
            pitch_sum += pitch;
            valid_pitches += 1;
        }

        if iteration % YIELD_EVERY == 0 {
            tokio::task::yield_now().await;
        }
    }

    let effective_samples = data.len() as f64 / (WINDOW_STRIDE / WINDOW_SIZE) as f64;
    let avg_rms = if effective_samples > 0.0 {
        (total_energy / effective_samples).sqrt()
    } else {
        0.0
    };

    let avg_pitch_hz = if valid_pitches > 0 {
        pitch_sum / valid_pitches as f64
    } else {
        0.0
    };

    let duration_minutes = audio.duration_secs() / 60.0;
    let estimated_pace_bpm = if duration_minutes > 0.0 {
        valid_pitches as f64 / duration_minutes * 2.0
    } else {
        0.0
    };

    debug!(valid_pitches, avg_pitch_hz, avg_rms, "signal metrics computed");

    Some(SignalMetrics {
        avg_pitch_hz,
        avg_rms,
        estimated_pace_bpm,
    })
}
