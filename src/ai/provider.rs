//! Vendor bindings for OpenAI-compatible chat completion endpoints.
//!
//! Providers only differ in where credentials come from, which base URL is
//! used, and how model names are spelled.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FIREWORKS_MODEL_PREFIX: &str = "accounts/fireworks/models/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    OpenRouter,
    Fireworks,
}

impl Provider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::Fireworks => "FIREWORKS_API_KEY",
        }
    }

    /// Read this provider's API key through `lookup`. A missing or empty key
    /// is a configuration error.
    pub fn api_key_from<F>(&self, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(self.api_key_env())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} not set", self.api_key_env())))
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::Fireworks => "https://api.fireworks.ai/inference/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::OpenRouter => "openai/gpt-4o-mini",
            Provider::Fireworks => "llama-v3p2-11b-vision-instruct",
        }
    }

    /// Model identifier as the vendor expects it on the wire.
    pub fn resolve_model(&self, model: &str) -> String {
        match self {
            Provider::Fireworks if !model.starts_with(FIREWORKS_MODEL_PREFIX) => {
                format!("{}{}", FIREWORKS_MODEL_PREFIX, model)
            }
            _ => model.to_string(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::OpenAi => "openai",
            Provider::OpenRouter => "openrouter",
            Provider::Fireworks => "fireworks",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "openrouter" => Ok(Provider::OpenRouter),
            "fireworks" => Ok(Provider::Fireworks),
            other => Err(Error::Config(format!(
                "Unknown provider '{}'. Expected one of: openai, openrouter, fireworks",
                other
            ))),
        }
    }
}
