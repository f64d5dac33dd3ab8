//! Data models and configuration
//!
//! Defines dialogues, generation options, result records, and the
//! environment-driven configuration used by the binary.

use crate::ai::{ChatParams, Provider};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Decoded `"messages"` array exactly as the model wrote it.
///
/// Elements are usually `{"role": ..., "content": ...}` objects, but nothing
/// about their shape is enforced.
pub type Dialogue = Vec<serde_json::Value>;

/// Build a `{"role", "content"}` message value.
pub fn turn(role: &str, content: &str) -> serde_json::Value {
    serde_json::json!({ "role": role, "content": content })
}

/// Knobs for a single dialogue generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub min_turns: u32,
    pub max_turns: u32,
    pub question_independent: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            min_turns: 1,
            max_turns: 3,
            question_independent: false,
        }
    }
}

impl GenerationOptions {
    pub fn new(min_turns: u32, max_turns: u32) -> Self {
        Self {
            min_turns,
            max_turns,
            ..Self::default()
        }
    }

    pub fn independent(mut self, question_independent: bool) -> Self {
        self.question_independent = question_independent;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_turns == 0 {
            return Err(Error::InvalidArgument(
                "min_turns must be at least 1".to_string(),
            ));
        }
        if self.min_turns > self.max_turns {
            return Err(Error::InvalidArgument(format!(
                "min_turns={} must not exceed max_turns={}",
                self.min_turns, self.max_turns
            )));
        }
        Ok(())
    }
}

/// One image and what was generated for it, as written to the results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub image: String,
    pub messages: Option<Dialogue>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub chat_params: ChatParams,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env(provider_override: Option<Provider>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(provider_override, |key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(provider_override: Option<Provider>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match provider_override {
            Some(provider) => provider,
            None => lookup("QA_PROVIDER")
                .map(|value| value.parse::<Provider>())
                .transpose()?
                .unwrap_or(Provider::OpenAi),
        };

        let api_key = provider.api_key_from(&lookup)?;

        let model = lookup("QA_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let mut chat_params = ChatParams::defaults();
        if let Some(value) = lookup("QA_TEMPERATURE") {
            let temperature = value
                .parse::<f32>()
                .map_err(|_| Error::Config(format!("Invalid QA_TEMPERATURE '{}'", value)))?;
            chat_params = chat_params.with_temperature(temperature);
        }
        if let Some(value) = lookup("QA_MAX_TOKENS") {
            let max_tokens = value
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("Invalid QA_MAX_TOKENS '{}'", value)))?;
            chat_params = chat_params.with_max_tokens(max_tokens);
        }

        let output_dir = PathBuf::from(lookup("QA_OUTPUT_DIR").unwrap_or_else(|| "output".to_string()));

        Ok(Self {
            provider,
            model,
            api_key,
            chat_params,
            output_dir,
        })
    }
}
