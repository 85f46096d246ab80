use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Media not readable at {media_path}: {reason}")]
    MediaUnreadable { media_path: PathBuf, reason: String },

    #[error("Audio decode failed for {media_path}: {reason}")]
    DecodeFailed { media_path: PathBuf, reason: String },

    #[error("Vision model failed to load: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("Video failed to load: {reason}")]
    VideoLoadFailed { reason: String },

    #[error("Video has no usable duration ({duration})")]
    InvalidDuration { duration: f64 },

    #[error("Endpoint not found (404). Check server URL {url}")]
    EndpointNotFound { url: String },

    #[error("Bad gateway (502). The tunnel in front of {url} might be down")]
    BadGateway { url: String },

    #[error("Analysis server error {status}")]
    ServerStatus { status: u16 },

    #[error(
        "Model request failed: {primary} returned {primary_status}, {fallback} returned {fallback_status}"
    )]
    ModelFailed {
        primary: String,
        primary_status: u16,
        fallback: String,
        fallback_status: u16,
    },

    #[error("Model returned an unusable response: {reason}")]
    InvalidModelResponse { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("Report store failed: {reason}")]
    StoreFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
