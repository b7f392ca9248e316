//! One controller's assistant session: transcribe, extract, speak.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AssistantError;
use crate::history::ConversationHistory;
use crate::intent::{DeviceCommand, Extraction, Intent, IntentExtractor};
use crate::speech::{SpeechSynthesizer, Transcriber, accept_transcript, audio_extension};

/// Outcome of one spoken request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    /// What the user said.
    pub transcript: String,
    /// What the model made of it.
    pub intent: Intent,
    /// Relay command to send, for device intents.
    pub command: Option<DeviceCommand>,
    /// Spoken reply; `None` if synthesis failed.
    pub audio: Option<Vec<u8>>,
}

/// Owns the conversation history for a single controller session.
pub struct AssistantSession {
    transcriber: Arc<dyn Transcriber>,
    extractor: Arc<dyn IntentExtractor>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    history: ConversationHistory,
}

impl std::fmt::Debug for AssistantSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantSession")
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl AssistantSession {
    /// Creates a session with an empty history of `max_history` turns.
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        extractor: Arc<dyn IntentExtractor>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        max_history: usize,
    ) -> Self {
        Self {
            transcriber,
            extractor,
            synthesizer,
            history: ConversationHistory::new(max_history),
        }
    }

    /// Conversation so far.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Handles one recorded request end to end.
    ///
    /// Only transcription failures are errors. A failed extraction degrades
    /// to [`Intent::unknown`]; a failed synthesis leaves `audio` empty.
    pub async fn handle_voice(
        &mut self,
        audio: &[u8],
        file_name: &str,
    ) -> Result<AssistantReply, AssistantError> {
        info!(
            bytes = audio.len(),
            format = %audio_extension(file_name),
            "Voice command received"
        );

        let raw = self.transcriber.transcribe(audio, file_name).await?;
        let transcript = accept_transcript(&raw)?;

        Ok(self.handle_text(transcript).await)
    }

    /// Handles a request that is already text.
    pub async fn handle_text(&mut self, transcript: String) -> AssistantReply {
        let intent = self.understand(&transcript).await;
        let command = intent.device_command();
        let audio = self.synthesizer.synthesize(&intent.reply).await;

        if audio.is_none() {
            warn!("Speech synthesis produced no audio");
        }

        AssistantReply {
            transcript,
            intent,
            command,
            audio,
        }
    }

    async fn understand(&mut self, text: &str) -> Intent {
        self.history.push_user(text);

        match self.extractor.extract(text, &self.history).await {
            Ok(Extraction { intent, raw }) => {
                self.history.push_assistant(raw);
                info!(command = %intent.command, "Intent extracted");
                intent
            }
            Err(e) => {
                warn!(error = %e, "Intent extraction failed");
                self.history.pop_pending_user();
                Intent::unknown()
            }
        }
    }
}
