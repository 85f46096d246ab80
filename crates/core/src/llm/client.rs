use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{
    activity::ActivityLog,
    error::{CoreError, Result},
    llm::{
        api::{GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part},
        strip_code_fences,
    },
    provider::{ModelTier, Provider},
};

/// Client for the generative model, with a one-shot fallback model.
#[derive(Debug, Clone)]
pub struct GenerativeClient {
    http: reqwest::Client,
    provider: Provider,
    log: ActivityLog,
}

impl GenerativeClient {
    pub fn new(provider: Provider, log: ActivityLog) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider,
            log,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Send `parts` to the primary model, retrying once on the fallback model
    /// if the primary answers with a non-success status.
    ///
    /// Returns the first candidate's text with code fences stripped.
    #[instrument(skip_all, fields(parts = parts.len()))]
    pub async fn generate(
        &self,
        parts: Vec<Part>,
        config: Option<GenerationConfig>,
    ) -> Result<String> {
        let request = GenerateContentRequest::new(parts, config);

        let primary = self.send(ModelTier::Primary, &request).await?;
        let response = if primary.status().is_success() {
            primary
        } else {
            let primary_status = primary.status().as_u16();
            self.log.warn(format!(
                "Primary model failed ({primary_status}). Retrying with fallback..."
            ));

            let fallback = self.send(ModelTier::Fallback, &request).await?;
            if !fallback.status().is_success() {
                let fallback_status = fallback.status().as_u16();
                let body = fallback.text().await.unwrap_or_default();
                debug!(fallback_status, body, "fallback model failed");
                return Err(CoreError::ModelFailed {
                    primary: self.provider.model(ModelTier::Primary).to_string(),
                    primary_status,
                    fallback: self.provider.model(ModelTier::Fallback).to_string(),
                    fallback_status,
                });
            }
            fallback
        };

        let body: GenerateContentResponse = response.json().await?;
        let text = body
            .first_text()
            .ok_or_else(|| CoreError::InvalidModelResponse {
                reason: "response carried no candidate text".to_string(),
            })?;

        Ok(strip_code_fences(text))
    }

    /// Like [`generate`](Self::generate), parsing the text as JSON into `T`.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        parts: Vec<Part>,
        config: GenerationConfig,
    ) -> Result<T> {
        let text = self.generate(parts, Some(config)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send(
        &self,
        tier: ModelTier,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::Response> {
        debug!(model = self.provider.model(tier), "calling generative model");
        Ok(self
            .http
            .post(self.provider.endpoint(tier))
            .query(&[("key", self.provider.api_key())])
            .json(request)
            .send()
            .await?)
    }
}
