//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::ProviderError;
use crate::domain::voice::VoiceError;

/// 调用 provider 的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Transcribe,
    /// 改写讲稿
    Improve,
    CreateVoice,
    Synthesize,
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transcribe => "transcribe",
            Self::Improve => "improve",
            Self::CreateVoice => "create_voice",
            Self::Synthesize => "synthesize",
        };
        write!(f, "{}", s)
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（远端调用之前发现，不触发清理）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// provider 调用失败
    #[error("Provider error during {step}: {source}")]
    ProviderError {
        step: WorkflowStep,
        #[source]
        source: ProviderError,
    },

    /// 克隆音色删除失败，远端资源可能泄漏
    #[error("Cleanup of cloned voice {voice_id} failed, remote voice may be leaked: {source}")]
    CleanupError {
        voice_id: String,
        #[source]
        source: ProviderError,
    },

    /// 创建音色超时，请求已被放弃，但 provider 可能已经建好了音色
    #[error("Creation of voice \"{voice_name}\" did not complete ({source}), the provider may still have created it")]
    VoiceCreationUnconfirmed {
        voice_name: String,
        #[source]
        source: ProviderError,
    },

    /// 合成失败且清理也失败
    #[error(
        "Synthesis failed ({synthesis}) and cleanup of cloned voice {voice_id} also failed ({cleanup}), remote voice may be leaked"
    )]
    CompositeError {
        voice_id: String,
        synthesis: ProviderError,
        cleanup: ProviderError,
    },

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建 provider 错误
    pub fn provider(step: WorkflowStep, source: ProviderError) -> Self {
        Self::ProviderError { step, source }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 是否可能遗留了远端计费资源
    pub fn leaks_remote_voice(&self) -> bool {
        matches!(
            self,
            Self::CleanupError { .. }
                | Self::CompositeError { .. }
                | Self::VoiceCreationUnconfirmed { .. }
        )
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidName(msg) | VoiceError::InvalidSample(msg) => {
                Self::ValidationError(msg)
            }
            VoiceError::InvalidTransition { .. } => Self::InternalError(err.to_string()),
        }
    }
}
