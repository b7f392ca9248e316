//! Assistant error types.

use relayhub_core::error::{AppError, ErrorKind};
use thiserror::Error;

/// Failures of the controller-side collaborators.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The transcript was empty or too short to act on.
    #[error("no speech detected in audio or text is too short: '{0}'")]
    NoSpeechDetected(String),
    /// The speech-to-text service failed.
    #[error("transcription failed: {0}")]
    Transcription(String),
    /// The intent model failed or answered with something unusable.
    #[error("intent extraction failed: {0}")]
    Intent(String),
    /// The text-to-speech service failed.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        let kind = match &err {
            AssistantError::NoSpeechDetected(_) => ErrorKind::Validation,
            _ => ErrorKind::ExternalService,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_to_app_error_kinds() {
        let err: AppError = AssistantError::NoSpeechDetected("a".to_string()).into();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err: AppError = AssistantError::Intent("offline".to_string()).into();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(err.message.contains("offline"));
    }
}
