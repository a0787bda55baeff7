//! Gemini API client.
//!
//! One POST per call: no retry, no timeout, no backoff. The client
//! validates the response envelope and hands back the first candidate's
//! parts as displayable artifacts.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::Error;
use crate::settings::Settings;
use crate::transcript::{Artifact, ChatMessage, Role};
use crate::Result;

use super::config::{CallPurpose, RequestConfig};
use super::types::{
    ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse, Part,
};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client seam for the generation endpoint — swappable for tests.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Send one prompt (with prior sealed turns) and return the first
    /// candidate's artifacts in part order.
    async fn generate(
        &self,
        purpose: CallPurpose,
        history: &[ChatMessage],
        prompt: &str,
        settings: &Settings,
    ) -> Result<Vec<Artifact>>;
}

/// Gemini API client
#[derive(Clone, Default)]
pub struct GeminiClient {
    client: Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn build_url(purpose: CallPurpose, api_key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            API_BASE_URL,
            purpose.model(),
            api_key
        )
    }

    fn build_request(
        purpose: CallPurpose,
        history: &[ChatMessage],
        prompt: &str,
        settings: &Settings,
    ) -> GenerateContentRequest {
        let config = RequestConfig::build(purpose, settings);

        let mut contents = Self::convert_history(history);
        contents.push(Content::user_text(prompt));

        GenerateContentRequest {
            contents,
            generation_config: config.generation,
            system_instruction: config.system_instruction,
            safety_settings: config.safety_settings,
        }
    }

    fn convert_history(history: &[ChatMessage]) -> Vec<Content> {
        history
            .iter()
            .filter(|m| m.sealed)
            .filter_map(|m| {
                let text = m.text_content();
                if text.is_empty() {
                    return None;
                }
                Some(match m.role {
                    Role::User => Content::user_text(text),
                    Role::Model => Content::model_text(text),
                })
            })
            .collect()
    }

    /// Turn a non-success body into the error surfaced to the caller:
    /// the server's own message when the body carries one, else a
    /// generic status-code message.
    fn error_from_body(status: reqwest::StatusCode, body: &str) -> Error {
        match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(envelope) => Error::Api(envelope.error.message),
            Err(_) => Error::Api(format!("HTTP error: {}", status.as_u16())),
        }
    }

    /// Validate the envelope and collect the first candidate's parts.
    fn extract_artifacts(
        purpose: CallPurpose,
        response: &GenerateContentResponse,
    ) -> Result<Vec<Artifact>> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| Error::MalformedResponse("no candidates in response".to_string()))?;

        let parts = candidate
            .content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default();
        if parts.is_empty() {
            return Err(Error::MalformedResponse(
                "no content parts in candidate".to_string(),
            ));
        }

        let artifacts: Vec<Artifact> = parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => Artifact::text(text.clone()),
                Part::InlineData { inline_data } => {
                    Artifact::image(inline_data.data.clone(), inline_data.mime_type.clone())
                }
            })
            .collect();

        if purpose == CallPurpose::ImageGeneration && !artifacts.iter().any(Artifact::is_image) {
            return Err(Error::MalformedResponse(
                "no image data in response".to_string(),
            ));
        }

        Ok(artifacts)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(
        &self,
        purpose: CallPurpose,
        history: &[ChatMessage],
        prompt: &str,
        settings: &Settings,
    ) -> Result<Vec<Artifact>> {
        let api_key = settings.api_key()?;
        let request = Self::build_request(purpose, history, prompt, settings);

        info!(
            "Sending generateContent request to {} ({} turns)",
            purpose.model(),
            request.contents.len()
        );

        let response = self
            .client
            .post(Self::build_url(purpose, api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(Self::error_from_body(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Token usage: prompt={:?} candidates={:?} total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Self::extract_artifacts(purpose, &parsed)
    }
}

/// Fake client for testing — pops queued outcomes per call.
#[cfg(test)]
pub struct FakeClient {
    outcomes: std::sync::Mutex<std::collections::VecDeque<Result<Vec<Artifact>>>>,
}

#[cfg(test)]
impl FakeClient {
    pub fn with_outcomes(outcomes: Vec<Result<Vec<Artifact>>>) -> Self {
        Self {
            outcomes: std::sync::Mutex::new(outcomes.into()),
        }
    }

    /// A single text reply.
    pub fn text(reply: &str) -> Self {
        Self::with_outcomes(vec![Ok(vec![Artifact::text(reply)])])
    }

    /// A single image reply.
    pub fn image(data: &str, mime_type: &str) -> Self {
        Self::with_outcomes(vec![Ok(vec![Artifact::image(data, mime_type)])])
    }

    /// A single failure.
    pub fn failing(message: &str) -> Self {
        Self::with_outcomes(vec![Err(Error::Api(message.to_string()))])
    }
}

#[cfg(test)]
#[async_trait]
impl GenerativeClient for FakeClient {
    async fn generate(
        &self,
        _purpose: CallPurpose,
        _history: &[ChatMessage],
        _prompt: &str,
        _settings: &Settings,
    ) -> Result<Vec<Artifact>> {
        let mut outcomes = self.outcomes.lock().unwrap();
        outcomes
            .pop_front()
            .unwrap_or_else(|| Err(Error::Api("no more fake outcomes".to_string())))
    }
}
