use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::{fs, process::Command};
use tracing::{debug, instrument};

use crate::{
    cache::get_audio_path,
    error::{CoreError, Result},
};

/// Sample rate every asset is decoded to before analysis.
pub const DECODE_SAMPLE_RATE: u32 = 16_000;

/// A recording selected for analysis.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub size: u64,
    pub mime_type: String,
}

impl MediaAsset {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| CoreError::MediaUnreadable {
                media_path: path.clone(),
                reason: e.to_string(),
            })?;
        if !metadata.is_file() {
            return Err(CoreError::MediaUnreadable {
                media_path: path,
                reason: "not a regular file".to_string(),
            });
        }

        let mime_type = mime_from_path(&path).to_string();
        Ok(Self {
            path,
            size: metadata.len(),
            mime_type,
        })
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path).await?)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string())
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Mono PCM decoded from a [`MediaAsset`]. Cheap to clone, never mutated.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    sample_rate: u32,
    samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples: samples.into(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_data(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Extract mono 16 kHz audio from any media file using ffmpeg
pub async fn extract_audio(media_path: &Path, audio_path: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(media_path)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(DECODE_SAMPLE_RATE.to_string())
        .arg("-ac")
        .arg("1")
        .arg(audio_path)
        .output()
        .await
        .map_err(|e| CoreError::DecodeFailed {
            media_path: media_path.to_path_buf(),
            reason: format!("could not run ffmpeg: {e}"),
        })?;

    if !output.status.success() {
        return Err(CoreError::DecodeFailed {
            media_path: media_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Read the first channel of a WAV file as floats in [-1, 1]
pub fn read_wav(path: &Path) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples = interleaved.into_iter().step_by(channels).collect();
    Ok(DecodedAudio::new(spec.sample_rate, samples))
}

/// Decode a media asset to mono PCM, reusing a previous extraction if cached.
///
/// WAV files hound can read are decoded directly without ffmpeg.
#[instrument(skip_all, fields(media = %asset.path.display()))]
pub async fn decode_audio(asset: &MediaAsset, cache_dir: &Path) -> Result<DecodedAudio> {
    if asset.mime_type == "audio/wav" {
        let path = asset.path.clone();
        match tokio::task::spawn_blocking(move || read_wav(&path)).await {
            Ok(Ok(audio)) => return Ok(audio),
            Ok(Err(e)) => debug!(error = %e, "direct WAV read failed, using ffmpeg"),
            Err(e) => debug!(error = %e, "direct WAV read panicked, using ffmpeg"),
        }
    }

    fs::create_dir_all(cache_dir).await?;
    let audio_path = get_audio_path(cache_dir);

    if fs::try_exists(&audio_path).await.unwrap_or(false) {
        debug!(path = %audio_path.display(), "reusing cached audio");
    } else {
        extract_audio(&asset.path, &audio_path).await?;
    }

    let media_path = asset.path.clone();
    tokio::task::spawn_blocking(move || read_wav(&audio_path))
        .await
        .map_err(|e| CoreError::DecodeFailed {
            media_path,
            reason: e.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_from_path(Path::new("class.MP4")), "video/mp4");
        assert_eq!(mime_from_path(Path::new("talk.mp3")), "audio/mpeg");
        assert_eq!(mime_from_path(Path::new("notes")), "application/octet-stream");
    }

    #[test]
    fn reads_first_channel_of_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for (left, right) in [(16384_i16, -1_i16), (-16384, -1), (0, -1)] {
            writer.write_sample(left).unwrap();
            writer.write_sample(right).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.sample_rate(), 8_000);
        assert_eq!(audio.channel_data(), &[0.5, -0.5, 0.0]);
    }

    #[tokio::test]
    async fn open_rejects_missing_file() {
        let err = MediaAsset::open("/definitely/not/here.mp4").await.unwrap_err();
        assert!(matches!(err, CoreError::MediaUnreadable { .. }));
    }
}
