//! Backend AI provider selection.
//!
//! The backend routes each request to one of its configured chat models
//! based on the `ai-provider` header.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Header carrying the provider id on every backend request.
pub const AI_PROVIDER_HEADER: &str = "ai-provider";

/// Provider ids understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
    /// Backend default when no header is sent
    #[default]
    Ollama,
    Groq,
    Cohere,
    Mistral,
}

impl Provider {
    /// Returns all providers.
    pub fn all() -> &'static [Provider] {
        &[
            Provider::OpenAI,
            Provider::Gemini,
            Provider::Ollama,
            Provider::Groq,
            Provider::Cohere,
            Provider::Mistral,
        ]
    }

    /// Returns the id sent in the `ai-provider` header.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
            Provider::Ollama => "ollama",
            Provider::Groq => "groq",
            Provider::Cohere => "cohere",
            Provider::Mistral => "mistral",
        }
    }

    /// Returns the Provider for a given id string.
    pub fn from_id(id: &str) -> Option<Provider> {
        match id.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "gemini" | "google" => Some(Provider::Gemini),
            "ollama" => Some(Provider::Ollama),
            "groq" => Some(Provider::Groq),
            "cohere" => Some(Provider::Cohere),
            "mistral" => Some(Provider::Mistral),
            _ => None,
        }
    }

    /// Returns the human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Gemini",
            Provider::Ollama => "Ollama",
            Provider::Groq => "Groq",
            Provider::Cohere => "Cohere",
            Provider::Mistral => "Mistral",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Provider::from_id(value).ok_or_else(|| {
            let valid: Vec<&str> = Provider::all().iter().map(Provider::id).collect();
            format!(
                "Unknown provider '{}'. Valid options: {}",
                value.trim(),
                valid.join(", ")
            )
        })
    }
}
