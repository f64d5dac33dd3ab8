use super::params::ChatParams;
use super::types::{ChatChoice, ChatCompletionResponse, ChatInput, ChatMessage};
use super::ChatEngine;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_MOCK_REPLY: &str = r#"Here is the session:
{"messages": [{"role": "user", "content": "What is in the picture?"}, {"role": "assistant", "content": "A mock image."}]}"#;

/// One request seen by [`MockChatEngine`].
#[derive(Debug, Clone)]
pub struct MockCall {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub overrides: Option<ChatParams>,
}

/// Scripted chat engine.
///
/// Replies, delays, and failures can be keyed on a substring of the
/// serialized request, so concurrent callers get deterministic answers.
/// Clones share recorded calls.
#[derive(Clone)]
pub struct MockChatEngine {
    model: String,
    replies: Arc<Mutex<Vec<String>>>,
    keyed_replies: Vec<(String, String)>,
    delays: Vec<(String, Duration)>,
    failures: Vec<String>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    completions: Arc<Mutex<Vec<usize>>>,
}

impl MockChatEngine {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            replies: Arc::new(Mutex::new(Vec::new())),
            keyed_replies: Vec::new(),
            delays: Vec::new(),
            failures: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            completions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply cycled through in call order when no keyed reply matches.
    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(reply.into());
        self
    }

    pub fn with_reply_for(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.keyed_replies.push((needle.into(), reply.into()));
        self
    }

    pub fn with_delay_for(mut self, needle: impl Into<String>, delay: Duration) -> Self {
        self.delays.push((needle.into(), delay));
        self
    }

    pub fn with_failure_for(mut self, needle: impl Into<String>) -> Self {
        self.failures.push(needle.into());
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Call indices in the order their replies were produced.
    pub fn completion_order(&self) -> Vec<usize> {
        self.completions.lock().unwrap().clone()
    }

    fn lookup<'a, T>(table: &'a [(String, T)], haystack: &str) -> Option<&'a T> {
        table
            .iter()
            .find(|(needle, _)| haystack.contains(needle.as_str()))
            .map(|(_, value)| value)
    }
}

impl Default for MockChatEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatEngine for MockChatEngine {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completions(
        &self,
        input: ChatInput,
        model: Option<&str>,
        overrides: Option<&ChatParams>,
    ) -> Result<ChatCompletionResponse> {
        let messages = input.into_messages();
        let haystack = serde_json::to_string(&messages)?;

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(MockCall {
                messages,
                model: model.unwrap_or(&self.model).to_string(),
                overrides: overrides.cloned(),
            });
            calls.len() - 1
        };

        if let Some(delay) = Self::lookup(self.delays.as_slice(), &haystack) {
            tokio::time::sleep(*delay).await;
        }

        self.completions.lock().unwrap().push(index);

        if self
            .failures
            .iter()
            .any(|needle| haystack.contains(needle.as_str()))
        {
            return Err(Error::AiProvider(format!("mock failure for call {}", index)));
        }

        let text = match Self::lookup(self.keyed_replies.as_slice(), &haystack) {
            Some(reply) => reply.clone(),
            None => {
                let replies = self.replies.lock().unwrap();
                if replies.is_empty() {
                    DEFAULT_MOCK_REPLY.to_string()
                } else {
                    replies[index % replies.len()].clone()
                }
            }
        };

        Ok(ChatCompletionResponse {
            choices: vec![ChatChoice {
                message: ChatMessage::assistant(text),
                finish_reason: Some("stop".to_string()),
            }],
            model: Some(self.model.clone()),
            usage: None,
        })
    }
}
