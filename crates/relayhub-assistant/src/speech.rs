//! Speech-to-text and text-to-speech contracts.

use async_trait::async_trait;

use crate::error::AssistantError;

/// Shortest transcript, in characters, worth acting on.
pub const MIN_TRANSCRIPT_CHARS: usize = 2;

/// Converts recorded audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Returns the raw transcript. `file_name` hints at the container format.
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> Result<String, AssistantError>;
}

/// Converts a reply into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// `None` when synthesis failed; the reply is then text only.
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>>;
}

/// Trims a transcript and rejects ones too short to act on.
pub fn accept_transcript(raw: &str) -> Result<String, AssistantError> {
    let text = raw.trim();
    if text.chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(AssistantError::NoSpeechDetected(text.to_string()));
    }
    Ok(text.to_string())
}

/// Lowercased audio file extension, `.webm` when there is none.
pub fn audio_extension(file_name: &str) -> String {
    match std::path::Path::new(file_name).extension() {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_string_lossy().to_lowercase()),
        _ => ".webm".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_transcripts_rejected() {
        assert!(matches!(
            accept_transcript("   "),
            Err(AssistantError::NoSpeechDetected(_))
        ));
        assert!(matches!(
            accept_transcript(" a "),
            Err(AssistantError::NoSpeechDetected(_))
        ));
        assert_eq!(accept_transcript("  aç ").unwrap(), "aç");
    }

    #[test]
    fn test_audio_extension() {
        assert_eq!(audio_extension("recording.WAV"), ".wav");
        assert_eq!(audio_extension("clip"), ".webm");
        assert_eq!(audio_extension(""), ".webm");
    }
}
