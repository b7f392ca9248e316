//! Intent model and the extractor contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AssistantError;
use crate::history::ConversationHistory;

/// Command for small talk with no device action.
pub const CHAT_COMMAND: &str = "CHAT";
/// Command reported when extraction failed.
pub const UNKNOWN_COMMAND: &str = "UNKNOWN";
/// Reply spoken when extraction failed.
pub const FALLBACK_REPLY: &str = "Bir hata oluştu.";

/// Device keyword in a command name and the client id the device connects as.
const DEVICES: &[(&str, &str)] = &[
    ("klima", "air_conditioner_client"),
    ("isik", "all_house_lights"),
    ("kahve", "coffee_machine_client"),
    ("muzik", "speaker_group_client"),
    ("televizyon", "television_client"),
];

/// What the user asked for, and what to say back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// `<device>_ac`, `<device>_kapa`, `CHAT`, or `UNKNOWN`.
    pub command: String,
    /// Short spoken reply.
    #[serde(default)]
    pub reply: String,
}

impl Intent {
    /// The degraded intent used when extraction fails.
    pub fn unknown() -> Self {
        Self {
            command: UNKNOWN_COMMAND.to_string(),
            reply: FALLBACK_REPLY.to_string(),
        }
    }

    /// Relay command for a device intent; `None` for chat, unknown, or
    /// unrecognized commands.
    pub fn device_command(&self) -> Option<DeviceCommand> {
        let (device, action) = self.command.rsplit_once('_')?;
        let message = match action {
            "ac" => "1",
            "kapa" => "0",
            _ => return None,
        };
        let target = DEVICES
            .iter()
            .find(|(keyword, _)| *keyword == device)
            .map(|(_, client_id)| *client_id)?;

        Some(DeviceCommand {
            target: target.to_string(),
            message: message.to_string(),
        })
    }
}

/// A command the controller sends through the relay: `{"target", "message"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    /// Client id of the device.
    pub target: String,
    /// `"1"` to switch on, `"0"` to switch off.
    pub message: String,
}

impl DeviceCommand {
    /// The controller frame for this command.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A parsed intent together with the model output it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The parsed intent.
    pub intent: Intent,
    /// The model's answer as received, recorded as the assistant turn.
    pub raw: String,
}

/// Turns user text into an [`Intent`].
///
/// `history` already ends with the user's current turn.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    /// Classifies `text` in the context of `history`.
    async fn extract(
        &self,
        text: &str,
        history: &ConversationHistory,
    ) -> Result<Extraction, AssistantError>;
}
