use std::path::PathBuf;

use crate::{cache::get_root_cache_dir, provider::Provider};

pub const SERVER_URL_ENV: &str = "PARIKSHAK_SERVER_URL";

/// Inline payload ceiling for a single model request.
pub const MAX_INLINE_BYTES: u64 = 18 * 1024 * 1024;
pub const CHUNK_DURATION_SECS: f64 = 180.0;
pub const TRANSCRIPT_CHAR_LIMIT: usize = 15_000;

/// Runtime configuration for one analysis session.
///
/// A missing server URL or provider is not an error: the dependent stage is
/// skipped with a warning and the rest of the run proceeds.
#[derive(Clone, Debug)]
pub struct AnalyzerConfig {
    pub server_url: Option<String>,
    pub provider: Option<Provider>,
    pub inline_limit_bytes: u64,
    pub chunk_duration_secs: f64,
    pub transcript_char_limit: usize,
    pub cache_root: PathBuf,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            provider: None,
            inline_limit_bytes: MAX_INLINE_BYTES,
            chunk_duration_secs: CHUNK_DURATION_SECS,
            transcript_char_limit: TRANSCRIPT_CHAR_LIMIT,
            cache_root: get_root_cache_dir(),
        }
    }
}

impl AnalyzerConfig {
    pub fn from_env() -> Self {
        let server_url = std::env::var(SERVER_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            server_url,
            provider: Provider::from_env().ok(),
            ..Self::default()
        }
    }

    pub fn with_server_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.server_url = url;
        }
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_cache_root(mut self, root: PathBuf) -> Self {
        self.cache_root = root;
        self
    }
}
