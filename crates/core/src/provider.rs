use crate::error::{CoreError, Result};

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const PRIMARY_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const FALLBACK_MODEL: &str = "gemini-1.5-flash";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Which of the two configured models a request is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelTier {
    Primary,
    Fallback,
}

#[derive(Clone, Debug)]
pub struct Provider {
    base_url: String,
    primary_model: String,
    fallback_model: String,
    api_key: String,
}

impl Provider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_API_URL.to_string(),
            primary_model: PRIMARY_MODEL.to_string(),
            fallback_model: FALLBACK_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build a provider from the API key in the environment
    pub fn from_env() -> Result<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| CoreError::MissingApiKey {
                env_var: API_KEY_ENV.to_string(),
            })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_model = primary.into();
        self.fallback_model = fallback.into();
        self
    }

    pub fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Primary => &self.primary_model,
            ModelTier::Fallback => &self.fallback_model,
        }
    }

    pub fn endpoint(&self, tier: ModelTier) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model(tier)
        )
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_targets_model_tier() {
        let provider = Provider::new("key").with_base_url("http://localhost:9000/");
        assert_eq!(
            provider.endpoint(ModelTier::Primary),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash-preview-09-2025:generateContent"
        );
        assert_eq!(
            provider.endpoint(ModelTier::Fallback),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
