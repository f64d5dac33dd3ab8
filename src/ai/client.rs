use super::params::ChatParams;
use super::provider::Provider;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatInput};
use super::ChatEngine;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat engine for any endpoint speaking the OpenAI chat completions API.
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    defaults: ChatParams,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        defaults: ChatParams,
    ) -> Result<Self> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self::new_with_client(
            api_key, base_url, model, defaults, client,
        ))
    }

    pub fn new_with_client(
        api_key: String,
        base_url: String,
        model: String,
        defaults: ChatParams,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            defaults,
        }
    }

    /// Build a client for `provider` with an explicit API key.
    pub fn for_provider(
        provider: Provider,
        api_key: String,
        model: &str,
        defaults: ChatParams,
    ) -> Result<Self> {
        tracing::info!("Chat provider: {} (model: {})", provider, model);
        Self::new(
            api_key,
            provider.base_url().to_string(),
            provider.resolve_model(model),
            defaults,
        )
    }

    /// Build a client for `provider`, reading its API key from the environment.
    ///
    /// Fails immediately when the key is absent or empty so no generation call
    /// is attempted.
    pub fn from_env(provider: Provider, model: &str, defaults: ChatParams) -> Result<Self> {
        Self::from_lookup(provider, model, defaults, |key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with the API key read through `lookup`.
    pub fn from_lookup<F>(
        provider: Provider,
        model: &str,
        defaults: ChatParams,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = provider.api_key_from(lookup)?;
        Self::for_provider(provider, api_key, model, defaults)
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH);
        tracing::debug!(
            "Sending chat completion request ({} messages) to {}",
            request.messages.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send chat completion request: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Chat API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Chat API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse chat response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse chat response: {}", e))
        })
    }
}

#[async_trait]
impl ChatEngine for OpenAiCompatibleClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completions(
        &self,
        input: ChatInput,
        model: Option<&str>,
        overrides: Option<&ChatParams>,
    ) -> Result<ChatCompletionResponse> {
        let params = match overrides {
            Some(overrides) => self.defaults.merged(overrides),
            None => self.defaults.clone(),
        };

        let request = ChatCompletionRequest {
            model: model.unwrap_or(&self.model).to_string(),
            messages: input.into_messages(),
            params,
        };

        self.post(&request).await
    }
}
