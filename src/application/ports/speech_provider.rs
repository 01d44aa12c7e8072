//! Speech Provider Port - 外部语音服务抽象
//!
//! 转写、合成、克隆音色的唯一调用面。provider API 形态变化时只改对应 adapter。

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::voice::{ClonedVoiceId, SynthesisResult, VoiceSample};
use crate::domain::LanguageCode;

/// Provider 错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Plan does not permit this operation: {0}")]
    PlanRestricted(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 转写请求
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// 音频数据
    pub audio: Vec<u8>,
    /// 上传时使用的文件名
    pub file_name: String,
    /// 已规范化的语言代码，None 表示自动检测（请求中不带该字段）
    pub language: Option<LanguageCode>,
    /// 是否标注说话人
    pub diarize: bool,
    /// 是否标注笑声、掌声等音频事件
    pub tag_audio_events: bool,
}

/// 转写结果
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub text: String,
    /// provider 检测到的语言
    pub language_code: Option<String>,
    pub language_probability: Option<f32>,
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 预置音色或克隆音色的 ID
    pub voice_id: String,
    pub text: String,
    /// 已规范化的语言代码，None 表示自动检测
    pub language: Option<LanguageCode>,
}

/// Speech Provider Port
#[async_trait]
pub trait SpeechProviderPort: Send + Sync {
    /// 语音转文字
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript, ProviderError>;

    /// 从参考音频创建克隆音色（远端计费资源）
    ///
    /// 音色名称取自样本
    async fn create_voice(&self, sample: &VoiceSample) -> Result<ClonedVoiceId, ProviderError>;

    /// 文字转语音
    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResult, ProviderError>;

    /// 删除克隆音色
    ///
    /// 音色不存在时返回 `ProviderError::VoiceNotFound`，由调用方视为成功
    async fn delete_voice(&self, voice_id: &ClonedVoiceId) -> Result<(), ProviderError>;

    /// 检查 provider 是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
