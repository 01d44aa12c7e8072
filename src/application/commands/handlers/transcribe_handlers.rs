//! Transcription Command Handlers

use std::sync::Arc;

use crate::application::commands::TranscribeAudio;
use crate::application::error::{ApplicationError, WorkflowStep};
use crate::application::ports::{SpeechProviderPort, Transcript, TranscriptionRequest};
use crate::domain::normalize_language;

/// 转写默认参数
#[derive(Debug, Clone, Default)]
pub struct TranscribeSettings {
    pub diarize: bool,
    pub tag_audio_events: bool,
}

/// TranscribeAudio Handler
pub struct TranscribeAudioHandler {
    provider: Arc<dyn SpeechProviderPort>,
    settings: TranscribeSettings,
}

impl TranscribeAudioHandler {
    pub fn new(provider: Arc<dyn SpeechProviderPort>, settings: TranscribeSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn handle(&self, command: TranscribeAudio) -> Result<Transcript, ApplicationError> {
        if command.audio.is_empty() {
            return Err(ApplicationError::validation("Audio is empty"));
        }

        let request = TranscriptionRequest {
            language: normalize_language(command.language.as_deref()),
            file_name: command
                .file_name
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| "audio.wav".to_string()),
            diarize: command.diarize.unwrap_or(self.settings.diarize),
            tag_audio_events: command
                .tag_audio_events
                .unwrap_or(self.settings.tag_audio_events),
            audio: command.audio,
        };

        tracing::info!(
            file_name = %request.file_name,
            audio_size = request.audio.len(),
            language = ?request.language.as_ref().map(|l| l.as_str()),
            diarize = request.diarize,
            "Transcribing audio"
        );

        let transcript = self
            .provider
            .transcribe(request)
            .await
            .map_err(|e| ApplicationError::provider(WorkflowStep::Transcribe, e))?;

        tracing::info!(text_len = transcript.text.len(), "Transcription finished");

        Ok(transcript)
    }
}
