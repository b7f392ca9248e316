//! Intent extraction through an Ollama chat model.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use relayhub_core::config::assistant::AssistantConfig;

use crate::error::AssistantError;
use crate::history::{ChatMessage, ChatRole, ConversationHistory};
use crate::intent::{Extraction, Intent, IntentExtractor};

const SYSTEM_PROMPT: &str = r#"You are a smart home assistant. Analyze the user's voice command and extract the intent.
Output ONLY a JSON object with this schema:
{
  "command": "klima_ac" | "klima_kapa" | "isik_ac" | "isik_kapa" | "kahve_ac" | "kahve_kapa" | "muzik_ac" | "muzik_kapa" | "televizyon_ac" | "televizyon_kapa" | "CHAT",
  "reply": "A short, natural Turkish response."
}

Rules:
- If the user wants to control a device, use the matching device_action command.
- If the user is chatting or asking a general question, use "CHAT" and answer naturally.
- For device commands, confirm the action in the reply.
- The "reply" MUST be in Turkish.

Examples:
- "Klimayı aç" -> {"command": "klima_ac", "reply": "Tamam, klimayı açıyorum."}
- "Işıkları kapat" -> {"command": "isik_kapa", "reply": "Işıkları kapattım."}
- "Merhaba, nasılsın?" -> {"command": "CHAT", "reply": "Merhaba! İyiyim, teşekkürler. Size nasıl yardımcı olabilirim?"}
- "Kahve yap" -> {"command": "kahve_ac", "reply": "Hemen kahvenizi hazırlıyorum."}

Output strictly JSON."#;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    format: &'static str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Calls `POST {host}/api/chat` with JSON output forced.
#[derive(Debug, Clone)]
pub struct OllamaIntentExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaIntentExtractor {
    /// Creates an extractor for the Ollama server at `host`.
    pub fn new(
        host: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistantError::Intent(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", host.trim_end_matches('/')),
            model: model.into(),
        })
    }

    /// Creates an extractor from assistant configuration.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, AssistantError> {
        Self::new(
            &config.ollama_host,
            config.model.clone(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn request<'a>(&'a self, history: &ConversationHistory) -> ChatRequest<'a> {
        let messages = std::iter::once(ChatMessage::new(ChatRole::System, SYSTEM_PROMPT))
            .chain(history.iter().cloned())
            .collect();

        ChatRequest {
            model: &self.model,
            messages,
            format: "json",
            stream: false,
        }
    }
}

#[async_trait]
impl IntentExtractor for OllamaIntentExtractor {
    async fn extract(
        &self,
        text: &str,
        history: &ConversationHistory,
    ) -> Result<Extraction, AssistantError> {
        debug!(model = %self.model, turns = history.len(), "Extracting intent");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request(history))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AssistantError::Intent(format!("model request failed: {e}")))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Intent(format!("unexpected model response: {e}")))?;

        let raw = body.message.content;
        let intent = serde_json::from_str::<Intent>(&raw).map_err(|e| {
            warn!(text = %text, content = %raw, "Model answered with invalid intent JSON");
            AssistantError::Intent(format!("invalid intent JSON: {e}"))
        })?;

        Ok(Extraction { intent, raw })
    }
}
