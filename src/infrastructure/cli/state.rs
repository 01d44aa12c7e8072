//! Application State
//!
//! 持有 provider 端口与所有 Command/Query Handlers

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CloneAndSpeakHandler, ImproveSpeechHandler, SynthesizeSpeechHandler, TranscribeAudioHandler,
    // Query handlers
    CheckProviderHealthHandler,
    // Ports
    SpeechImproverPort, SpeechProviderPort,
};
use crate::config::{AppConfig, ImproverKind, ProviderKind};
use crate::infrastructure::adapters::{ElevenLabsClient, FakeSpeechProvider, GeminiImprover};

use super::error::CliError;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub provider: Arc<dyn SpeechProviderPort>,

    // ========== Command Handlers ==========
    pub transcribe_handler: TranscribeAudioHandler,
    pub synthesize_handler: SynthesizeSpeechHandler,
    pub clone_and_speak_handler: CloneAndSpeakHandler,
    pub improve_handler: ImproveSpeechHandler,

    // ========== Query Handlers ==========
    pub health_handler: CheckProviderHealthHandler,
}

impl AppState {
    /// 根据配置选择 provider 并创建应用状态
    pub fn from_config(config: &AppConfig) -> Result<Self, CliError> {
        let provider: Arc<dyn SpeechProviderPort> = match config.provider.kind {
            ProviderKind::ElevenLabs => Arc::new(
                ElevenLabsClient::new(config.elevenlabs_client_config())
                    .map_err(CliError::ProviderInit)?,
            ),
            ProviderKind::Fake => Arc::new(FakeSpeechProvider::with_defaults()),
        };

        let improver: Option<Arc<dyn SpeechImproverPort>> = match config.improver.kind {
            ImproverKind::None => None,
            ImproverKind::Gemini => {
                let gemini = GeminiImprover::new(config.gemini_improver_config())
                    .map_err(CliError::ImproverInit)?;
                Some(Arc::new(gemini) as Arc<dyn SpeechImproverPort>)
            }
        };

        Ok(Self::new(provider, improver, config))
    }

    /// 创建应用状态
    pub fn new(
        provider: Arc<dyn SpeechProviderPort>,
        improver: Option<Arc<dyn SpeechImproverPort>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider: provider.clone(),

            // Command handlers
            transcribe_handler: TranscribeAudioHandler::new(
                provider.clone(),
                config.transcribe_settings(),
            ),
            synthesize_handler: SynthesizeSpeechHandler::new(provider.clone()),
            clone_and_speak_handler: CloneAndSpeakHandler::new(
                provider.clone(),
                config.clone_settings(),
            ),
            improve_handler: ImproveSpeechHandler::new(
                TranscribeAudioHandler::new(provider.clone(), config.transcribe_settings()),
                improver,
                CloneAndSpeakHandler::new(provider.clone(), config.clone_settings()),
            ),

            // Query handlers
            health_handler: CheckProviderHealthHandler::new(provider),
        }
    }
}
