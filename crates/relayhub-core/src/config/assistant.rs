//! Controller-side assistant configuration.

use serde::Deserialize;

/// Settings for the speech and intent collaborators used by the controller.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    /// Model used for intent extraction.
    #[serde(default = "default_model")]
    pub model: String,
    /// Conversation turns kept as context.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Timeout for a single model request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            ollama_host: default_ollama_host(),
            model: default_model(),
            max_history: default_max_history(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5".to_string()
}

fn default_max_history() -> usize {
    6
}

fn default_request_timeout() -> u64 {
    60
}
