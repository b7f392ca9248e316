//! # relayhub-assistant
//!
//! Controller-side collaborators for RelayHub. Turns a spoken request into
//! a device command and a spoken reply:
//!
//! - Speech-to-text and text-to-speech contracts
//! - Intent extraction, with an Ollama chat implementation
//! - Bounded per-session conversation history
//! - A session that chains the three and degrades gracefully

pub mod error;
pub mod history;
pub mod intent;
pub mod ollama;
pub mod session;
pub mod speech;

pub use error::AssistantError;
pub use history::ConversationHistory;
pub use intent::{DeviceCommand, Extraction, Intent, IntentExtractor};
pub use ollama::OllamaIntentExtractor;
pub use session::{AssistantReply, AssistantSession};
pub use speech::{SpeechSynthesizer, Transcriber};
