//! Clone Command Handlers - 克隆音色编排
//!
//! create_voice -> synthesize -> delete_voice
//!
//! 一旦 create_voice 成功，无论合成成功与否都会尝试删除远端音色。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::commands::CloneAndSpeak;
use crate::application::error::{ApplicationError, WorkflowStep};
use crate::application::ports::{ProviderError, SpeechProviderPort, SynthesisRequest};
use crate::domain::voice::{
    CloneState, CloneWorkflow, ClonedVoiceId, SynthesisResult, VoiceName, VoiceSample,
};
use crate::domain::{normalize_language, LanguageCode};

// ============================================================================
// Settings
// ============================================================================

/// 克隆流程参数
#[derive(Debug, Clone)]
pub struct CloneSettings {
    /// 未指定名称时使用的音色名
    pub default_voice_name: String,
    /// 单次 provider 调用的超时
    pub call_timeout: Duration,
    /// 参考音频最大字节数
    pub max_sample_bytes: usize,
}

impl Default for CloneSettings {
    fn default() -> Self {
        Self {
            default_voice_name: "User Cloned Voice".to_string(),
            call_timeout: Duration::from_secs(60),
            max_sample_bytes: 10 * 1024 * 1024,
        }
    }
}

// ============================================================================
// VoiceLease
// ============================================================================

/// 远端克隆音色的租约
///
/// `release` 在正常路径上删除音色；未释放就被 drop（panic、任务被取消）时，
/// 在当前 runtime 上补发一次删除。
struct VoiceLease {
    provider: Arc<dyn SpeechProviderPort>,
    voice_id: Option<ClonedVoiceId>,
}

impl VoiceLease {
    fn new(provider: Arc<dyn SpeechProviderPort>, voice_id: ClonedVoiceId) -> Self {
        Self {
            provider,
            voice_id: Some(voice_id),
        }
    }

    /// 删除远端音色；音色已不存在视为成功
    async fn release(mut self, call_timeout: Duration) -> Result<(), ProviderError> {
        let Some(voice_id) = self.voice_id.clone() else {
            return Ok(());
        };

        let result = bounded(call_timeout, self.provider.delete_voice(&voice_id)).await;

        // 删除请求已有结果，不再由 Drop 补发
        self.voice_id = None;

        match result {
            Ok(()) => Ok(()),
            Err(ProviderError::VoiceNotFound(_)) => {
                tracing::debug!(voice_id = %voice_id, "Cloned voice already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for VoiceLease {
    fn drop(&mut self) {
        let Some(voice_id) = self.voice_id.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    voice_id = %voice_id,
                    "Voice lease dropped without release, scheduling deletion"
                );
                let provider = self.provider.clone();
                handle.spawn(async move {
                    match provider.delete_voice(&voice_id).await {
                        Ok(()) | Err(ProviderError::VoiceNotFound(_)) => {
                            tracing::info!(voice_id = %voice_id, "Cloned voice deleted by lease guard");
                        }
                        Err(e) => {
                            tracing::error!(
                                voice_id = %voice_id,
                                error = %e,
                                "Failed to delete cloned voice, remote voice leaked"
                            );
                        }
                    }
                });
            }
            Err(_) => {
                tracing::error!(
                    voice_id = %voice_id,
                    "No async runtime to delete cloned voice, remote voice leaked"
                );
            }
        }
    }
}

/// 单次 provider 调用加超时
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout),
    }
}

// ============================================================================
// CloneAndSpeak
// ============================================================================

/// 克隆并合成响应
#[derive(Debug, Clone)]
pub struct CloneAndSpeakResponse {
    pub workflow_id: Uuid,
    pub voice_name: String,
    pub final_state: CloneState,
    pub audio: SynthesisResult,
}

/// CloneAndSpeak Handler
pub struct CloneAndSpeakHandler {
    provider: Arc<dyn SpeechProviderPort>,
    settings: CloneSettings,
}

impl CloneAndSpeakHandler {
    pub fn new(provider: Arc<dyn SpeechProviderPort>, settings: CloneSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn handle(
        &self,
        command: CloneAndSpeak,
    ) -> Result<CloneAndSpeakResponse, ApplicationError> {
        let language = normalize_language(command.language.as_deref());
        let (sample, text) = self.validate(command)?;

        // 流程跑在独立任务里：调用方放弃等待也不会中断清理
        let provider = self.provider.clone();
        let call_timeout = self.settings.call_timeout;
        let task = tokio::spawn(run_workflow(provider, call_timeout, sample, text, language));

        task.await
            .map_err(|e| ApplicationError::internal(format!("Clone workflow task failed: {}", e)))?
    }

    /// 参考音频大小校验
    pub fn check_sample_size(&self, size: usize) -> Result<(), ApplicationError> {
        if size == 0 {
            return Err(ApplicationError::validation("Voice sample is empty"));
        }
        if size > self.settings.max_sample_bytes {
            return Err(ApplicationError::validation(format!(
                "Voice sample too large: {} bytes (max {})",
                size, self.settings.max_sample_bytes
            )));
        }
        Ok(())
    }

    /// 本地校验，不发起任何远端调用
    fn validate(&self, command: CloneAndSpeak) -> Result<(VoiceSample, String), ApplicationError> {
        self.check_sample_size(command.audio.len())?;
        if command.text.trim().is_empty() {
            return Err(ApplicationError::validation("Text is required"));
        }

        let name = command
            .voice_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.settings.default_voice_name.as_str());
        let name = VoiceName::new(name)?;
        let sample = VoiceSample::new(name, command.file_name, command.audio)?;

        Ok((sample, command.text))
    }
}

async fn run_workflow(
    provider: Arc<dyn SpeechProviderPort>,
    call_timeout: Duration,
    sample: VoiceSample,
    text: String,
    language: Option<LanguageCode>,
) -> Result<CloneAndSpeakResponse, ApplicationError> {
    let mut workflow = CloneWorkflow::new();
    let workflow_id = workflow.id();
    let voice_name = sample.name().as_str().to_string();

    tracing::info!(
        workflow_id = %workflow_id,
        voice_name = %voice_name,
        sample_size = sample.len(),
        text_len = text.len(),
        language = ?language.as_ref().map(|l| l.as_str()),
        "Clone workflow started"
    );

    // Created -> VoiceReady
    let voice_id = match bounded(call_timeout, provider.create_voice(&sample)).await {
        Ok(voice_id) => voice_id,
        Err(ProviderError::Timeout) => {
            // 请求被放弃时 provider 可能已经建好音色，但拿不到 voice_id，无法删除
            workflow.fail()?;
            tracing::error!(
                workflow_id = %workflow_id,
                voice_name = %voice_name,
                "Voice creation timed out, a cloned voice with this name may exist at the provider"
            );
            return Err(ApplicationError::VoiceCreationUnconfirmed {
                voice_name,
                source: ProviderError::Timeout,
            });
        }
        Err(e) => {
            workflow.fail()?;
            tracing::warn!(workflow_id = %workflow_id, error = %e, "Voice creation failed");
            return Err(ApplicationError::provider(WorkflowStep::CreateVoice, e));
        }
    };
    drop(sample);

    let lease = VoiceLease::new(provider.clone(), voice_id.clone());
    workflow.voice_ready(voice_id.clone())?;

    // VoiceReady -> Spoken
    let request = SynthesisRequest {
        voice_id: voice_id.as_str().to_string(),
        text,
        language,
    };
    let synthesis = bounded(call_timeout, provider.synthesize(request)).await;
    match &synthesis {
        Ok(_) => workflow.spoken()?,
        Err(e) => {
            tracing::warn!(
                workflow_id = %workflow_id,
                voice_id = %voice_id,
                error = %e,
                "Synthesis with cloned voice failed, cleaning up"
            );
            workflow.fail()?;
        }
    }

    // -> CleanedUp
    let cleanup = if workflow.cleanup_required() {
        lease.release(call_timeout).await
    } else {
        Ok(())
    };
    match &cleanup {
        Ok(()) => workflow.mark_released()?,
        Err(e) => {
            tracing::error!(
                workflow_id = %workflow_id,
                voice_id = %voice_id,
                error = %e,
                "Failed to delete cloned voice, remote voice may be leaked"
            );
            if workflow.state() == CloneState::Spoken {
                workflow.fail()?;
            }
        }
    }

    match (synthesis, cleanup) {
        (Ok(audio), Ok(())) => {
            tracing::info!(
                workflow_id = %workflow_id,
                audio_size = audio.len(),
                "Clone workflow completed"
            );
            Ok(CloneAndSpeakResponse {
                workflow_id,
                voice_name,
                final_state: workflow.state(),
                audio,
            })
        }
        (Err(synthesis), Ok(())) => Err(ApplicationError::provider(
            WorkflowStep::Synthesize,
            synthesis,
        )),
        (Err(synthesis), Err(cleanup)) => Err(ApplicationError::CompositeError {
            voice_id: voice_id.to_string(),
            synthesis,
            cleanup,
        }),
        (Ok(_), Err(cleanup)) => Err(ApplicationError::CleanupError {
            voice_id: voice_id.to_string(),
            source: cleanup,
        }),
    }
}
