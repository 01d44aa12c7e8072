//! Improve Command Handlers - 转写 -> 改写 -> 克隆朗读
//!
//! 串联已有的转写与克隆处理器；未配置改写服务时直接朗读原始转写。

use std::sync::Arc;

use serde::Serialize;

use crate::application::commands::handlers::{
    CloneAndSpeakHandler, CloneAndSpeakResponse, TranscribeAudioHandler,
};
use crate::application::commands::{CloneAndSpeak, ImproveSpeech, TranscribeAudio};
use crate::application::error::{ApplicationError, WorkflowStep};
use crate::application::ports::{
    ImprovedSpeech, ImprovementRequest, ProviderError, SpeechImproverPort, Transcript,
};

/// 改写并朗读响应
#[derive(Debug, Clone)]
pub struct ImproveSpeechResponse {
    pub original_transcript: Transcript,
    /// 未配置改写服务时为 None
    pub improvement: Option<ImprovedSpeech>,
    pub clone: CloneAndSpeakResponse,
}

impl ImproveSpeechResponse {
    /// 实际朗读的文本
    pub fn spoken_text(&self) -> &str {
        self.improvement
            .as_ref()
            .map(|i| i.improved_speech.as_str())
            .unwrap_or(&self.original_transcript.text)
    }

    /// `--json` 输出用的摘要，不含音频
    pub fn summary(&self) -> ImproveSpeechSummary<'_> {
        ImproveSpeechSummary {
            original_transcript: &self.original_transcript,
            improvement: self.improvement.as_ref(),
            workflow_id: self.clone.workflow_id.to_string(),
            voice_name: &self.clone.voice_name,
            audio_bytes: self.clone.audio.audio_data.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImproveSpeechSummary<'a> {
    pub original_transcript: &'a Transcript,
    pub improvement: Option<&'a ImprovedSpeech>,
    pub workflow_id: String,
    pub voice_name: &'a str,
    pub audio_bytes: usize,
}

/// ImproveSpeech Handler
pub struct ImproveSpeechHandler {
    transcribe: TranscribeAudioHandler,
    improver: Option<Arc<dyn SpeechImproverPort>>,
    clone_and_speak: CloneAndSpeakHandler,
}

impl ImproveSpeechHandler {
    pub fn new(
        transcribe: TranscribeAudioHandler,
        improver: Option<Arc<dyn SpeechImproverPort>>,
        clone_and_speak: CloneAndSpeakHandler,
    ) -> Self {
        Self {
            transcribe,
            improver,
            clone_and_speak,
        }
    }

    pub async fn handle(
        &self,
        command: ImproveSpeech,
    ) -> Result<ImproveSpeechResponse, ApplicationError> {
        // 样本不合格时不浪费一次转写
        self.clone_and_speak.check_sample_size(command.audio.len())?;

        let original_transcript = self
            .transcribe
            .handle(TranscribeAudio {
                audio: command.audio.clone(),
                file_name: command.file_name.clone(),
                language: command.language.clone(),
                diarize: command.diarize,
                tag_audio_events: command.tag_audio_events,
            })
            .await?;

        if original_transcript.text.trim().is_empty() {
            return Err(ApplicationError::validation(
                "Transcript is empty, nothing to improve",
            ));
        }

        let improvement = match &self.improver {
            Some(improver) => Some(
                self.improve(improver.as_ref(), &original_transcript, command.focus)
                    .await?,
            ),
            None => {
                tracing::info!("No speech improver configured, speaking original transcript");
                None
            }
        };

        let text = improvement
            .as_ref()
            .map(|i| i.improved_speech.clone())
            .unwrap_or_else(|| original_transcript.text.clone());

        let clone = self
            .clone_and_speak
            .handle(CloneAndSpeak {
                audio: command.audio,
                file_name: command.file_name,
                voice_name: command.voice_name,
                text,
                language: command.language,
            })
            .await?;

        Ok(ImproveSpeechResponse {
            original_transcript,
            improvement,
            clone,
        })
    }

    async fn improve(
        &self,
        improver: &dyn SpeechImproverPort,
        transcript: &Transcript,
        focus: Option<String>,
    ) -> Result<ImprovedSpeech, ApplicationError> {
        let request = ImprovementRequest {
            transcript: transcript.text.clone(),
            focus: focus.filter(|f| !f.trim().is_empty()),
        };

        tracing::info!(
            transcript_len = request.transcript.len(),
            focus = ?request.focus,
            "Improving speech"
        );

        let improved = improver
            .improve(request)
            .await
            .map_err(|e| ApplicationError::provider(WorkflowStep::Improve, e))?;

        if improved.improved_speech.trim().is_empty() {
            return Err(ApplicationError::provider(
                WorkflowStep::Improve,
                ProviderError::InvalidResponse("Improved speech is empty".to_string()),
            ));
        }

        tracing::info!(
            improved_len = improved.improved_speech.len(),
            key_changes = improved.key_changes.len(),
            "Speech improved"
        );

        Ok(improved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::handlers::{CloneSettings, TranscribeSettings};
    use crate::application::ports::KeyChange;
    use crate::domain::voice::CloneState;
    use crate::infrastructure::adapters::{
        FakeSpeechProvider, FakeSpeechProviderConfig, ProviderCall,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 固定返回结果并记录请求的改写服务
    struct StaticImprover {
        result: Result<ImprovedSpeech, ProviderError>,
        requests: Mutex<Vec<ImprovementRequest>>,
    }

    impl StaticImprover {
        fn returning(result: Result<ImprovedSpeech, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SpeechImproverPort for StaticImprover {
        async fn improve(
            &self,
            request: ImprovementRequest,
        ) -> Result<ImprovedSpeech, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.result.clone()
        }
    }

    fn improved(text: &str) -> ImprovedSpeech {
        ImprovedSpeech {
            improved_speech: text.to_string(),
            suggestions: vec!["Slow down".to_string()],
            key_changes: vec![KeyChange {
                change: "Removed filler words".to_string(),
                reason: "Clarity".to_string(),
            }],
            summary: "Tightened the opening".to_string(),
        }
    }

    fn handler(
        provider: Arc<FakeSpeechProvider>,
        improver: Option<Arc<dyn SpeechImproverPort>>,
    ) -> ImproveSpeechHandler {
        ImproveSpeechHandler::new(
            TranscribeAudioHandler::new(provider.clone(), TranscribeSettings::default()),
            improver,
            CloneAndSpeakHandler::new(provider, CloneSettings::default()),
        )
    }

    fn command() -> ImproveSpeech {
        ImproveSpeech {
            audio: vec![3u8; 48],
            file_name: Some("pitch.wav".to_string()),
            language: Some(" en ".to_string()),
            focus: Some("confidence".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_improved_text_is_spoken_in_cloned_voice() {
        let provider = Arc::new(FakeSpeechProvider::with_defaults());
        let improver = StaticImprover::returning(Ok(improved("A clearer pitch.")));

        let response = handler(provider.clone(), Some(improver.clone()))
            .handle(command())
            .await
            .unwrap();

        assert_eq!(response.original_transcript.text, "This is a fake transcript.");
        assert_eq!(response.spoken_text(), "A clearer pitch.");
        assert_eq!(response.clone.final_state, CloneState::CleanedUp);

        let requests = improver.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].transcript, "This is a fake transcript.");
        assert_eq!(requests[0].focus.as_deref(), Some("confidence"));

        let calls = provider.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(
            &calls[0],
            ProviderCall::Transcribe { language: Some(l), .. } if l == "en"
        ));
        assert!(matches!(calls[1], ProviderCall::CreateVoice { sample_size: 48, .. }));
        assert!(matches!(
            &calls[2],
            ProviderCall::Synthesize { text, language: Some(l), .. }
                if text == "A clearer pitch." && l == "en"
        ));
        assert!(matches!(calls[3], ProviderCall::DeleteVoice { .. }));
        assert!(provider.live_voices().is_empty());
    }

    #[tokio::test]
    async fn test_without_improver_speaks_original_transcript() {
        let provider = Arc::new(FakeSpeechProvider::with_defaults());

        let response = handler(provider.clone(), None)
            .handle(command())
            .await
            .unwrap();

        assert!(response.improvement.is_none());
        assert_eq!(response.spoken_text(), "This is a fake transcript.");
        assert!(matches!(
            &provider.calls()[2],
            ProviderCall::Synthesize { text, .. } if text == "This is a fake transcript."
        ));
    }

    #[tokio::test]
    async fn test_improver_failure_creates_no_voice() {
        let provider = Arc::new(FakeSpeechProvider::with_defaults());
        let improver =
            StaticImprover::returning(Err(ProviderError::QuotaExceeded("daily".to_string())));

        let err = handler(provider.clone(), Some(improver))
            .handle(command())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::ProviderError {
                step: WorkflowStep::Improve,
                source: ProviderError::QuotaExceeded(_),
            }
        ));
        assert!(!err.leaks_remote_voice());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_improvement_is_invalid_response() {
        let provider = Arc::new(FakeSpeechProvider::with_defaults());
        let improver = StaticImprover::returning(Ok(improved("  ")));

        let err = handler(provider.clone(), Some(improver))
            .handle(command())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::ProviderError {
                step: WorkflowStep::Improve,
                source: ProviderError::InvalidResponse(_),
            }
        ));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_transcript_stops_before_cloning() {
        let provider = Arc::new(FakeSpeechProvider::new(FakeSpeechProviderConfig {
            transcript_text: "   ".to_string(),
            ..Default::default()
        }));
        let improver = StaticImprover::returning(Ok(improved("unused")));

        let err = handler(provider.clone(), Some(improver.clone()))
            .handle(command())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(improver.requests.lock().unwrap().is_empty());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_audio_makes_no_remote_call() {
        let provider = Arc::new(FakeSpeechProvider::with_defaults());

        let err = handler(provider.clone(), None)
            .handle(ImproveSpeech::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert!(provider.calls().is_empty());
    }
}
