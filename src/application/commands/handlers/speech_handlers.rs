//! Speech Command Handlers - 预置音色合成

use std::sync::Arc;

use crate::application::commands::SynthesizeSpeech;
use crate::application::error::{ApplicationError, WorkflowStep};
use crate::application::ports::{SpeechProviderPort, SynthesisRequest};
use crate::domain::normalize_language;
use crate::domain::voice::SynthesisResult;

/// SynthesizeSpeech Handler
pub struct SynthesizeSpeechHandler {
    provider: Arc<dyn SpeechProviderPort>,
}

impl SynthesizeSpeechHandler {
    pub fn new(provider: Arc<dyn SpeechProviderPort>) -> Self {
        Self { provider }
    }

    pub async fn handle(&self, command: SynthesizeSpeech) -> Result<SynthesisResult, ApplicationError> {
        let voice_id = command.voice_id.trim();
        if voice_id.is_empty() {
            return Err(ApplicationError::validation("Voice ID is required"));
        }
        if command.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text is required"));
        }

        let request = SynthesisRequest {
            voice_id: voice_id.to_string(),
            language: normalize_language(command.language.as_deref()),
            text: command.text,
        };

        let result = self
            .provider
            .synthesize(request)
            .await
            .map_err(|e| ApplicationError::provider(WorkflowStep::Synthesize, e))?;

        tracing::info!(
            voice_id = %voice_id,
            audio_size = result.len(),
            "Speech synthesized"
        );

        Ok(result)
    }
}
