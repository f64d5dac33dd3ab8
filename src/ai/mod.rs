//! Chat completion engines
//!
//! [`ChatEngine`] is the seam between dialogue generation and the remote model.
//! [`OpenAiCompatibleClient`] talks to OpenAI, OpenRouter, and Fireworks;
//! [`MockChatEngine`] scripts replies for tests.

pub mod client;
pub mod mock;
pub mod params;
pub mod provider;
pub mod types;

pub use client::OpenAiCompatibleClient;
pub use mock::MockChatEngine;
pub use params::ChatParams;
pub use provider::Provider;
pub use types::{
    ChatCompletionResponse, ChatInput, ChatMessage, ChatMessageContent, MessagePart,
};

use crate::Result;
use async_trait::async_trait;
use futures_util::future::try_join_all;

#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Default model used when a call does not name one.
    fn model(&self) -> &str;

    /// Issue exactly one chat completion request.
    ///
    /// `overrides` are merged over the engine's default parameters for this
    /// call only. Vendor errors are returned as is, without retrying.
    async fn chat_completions(
        &self,
        input: ChatInput,
        model: Option<&str>,
        overrides: Option<&ChatParams>,
    ) -> Result<ChatCompletionResponse>;

    /// Run one request per message list concurrently.
    ///
    /// Responses line up with `batch`. The first error aborts the whole batch.
    async fn batch_chat_completions(
        &self,
        batch: Vec<Vec<ChatMessage>>,
        model: Option<&str>,
        overrides: Option<&ChatParams>,
    ) -> Result<Vec<ChatCompletionResponse>> {
        try_join_all(
            batch
                .into_iter()
                .map(|messages| self.chat_completions(messages.into(), model, overrides)),
        )
        .await
    }
}
