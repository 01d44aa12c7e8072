//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::application::{CloneSettings, TranscribeSettings};
use crate::infrastructure::adapters::{ElevenLabsClientConfig, GeminiImproverConfig, VoiceSettings};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// provider 配置
    #[serde(default)]
    pub provider: ProviderConfig,

    /// 转写配置
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// 合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 克隆流程配置
    #[serde(default)]
    pub clone: CloneConfig,

    /// 讲稿改写配置
    #[serde(default)]
    pub improver: ImproverConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// ElevenLabs 客户端配置
    pub fn elevenlabs_client_config(&self) -> ElevenLabsClientConfig {
        ElevenLabsClientConfig {
            base_url: self.provider.base_url.clone(),
            api_key: self.provider.api_key.clone(),
            timeout_secs: self.provider.timeout_secs,
            stt_model_id: self.transcription.model_id.clone(),
            tts_model_id: self.synthesis.model_id.clone(),
            output_format: self.synthesis.output_format.clone(),
            voice_settings: self.synthesis.voice_settings.to_voice_settings(),
        }
    }

    pub fn transcribe_settings(&self) -> TranscribeSettings {
        TranscribeSettings {
            diarize: self.transcription.diarize,
            tag_audio_events: self.transcription.tag_audio_events,
        }
    }

    /// Gemini 改写客户端配置
    pub fn gemini_improver_config(&self) -> GeminiImproverConfig {
        GeminiImproverConfig {
            base_url: self.improver.base_url.clone(),
            api_key: self.improver.api_key.clone(),
            model: self.improver.model.clone(),
            timeout_secs: self.improver.timeout_secs,
        }
    }

    pub fn clone_settings(&self) -> CloneSettings {
        CloneSettings {
            default_voice_name: self.clone.default_voice_name.clone(),
            call_timeout: Duration::from_secs(self.clone.call_timeout_secs),
            max_sample_bytes: self.clone.max_sample_bytes,
        }
    }
}

/// provider 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    ElevenLabs,
    /// 离线 provider，不访问网络
    Fake,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElevenLabs => write!(f, "elevenlabs"),
            Self::Fake => write!(f, "fake"),
        }
    }
}

/// provider 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API Key
    #[serde(default)]
    pub api_key: String,

    /// HTTP 请求超时时间（秒）
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_provider_timeout() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl ProviderConfig {
    /// 日志中使用的脱敏 API Key
    pub fn masked_api_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "<unset>".to_string();
    }
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{}", visible)
}

/// 转写配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default = "default_stt_model")]
    pub model_id: String,

    /// 是否标注说话人
    #[serde(default)]
    pub diarize: bool,

    /// 是否标注音频事件
    #[serde(default)]
    pub tag_audio_events: bool,
}

fn default_stt_model() -> String {
    "scribe_v1".to_string()
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model_id: default_stt_model(),
            diarize: false,
            tag_audio_events: false,
        }
    }
}

/// 合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_tts_model")]
    pub model_id: String,

    /// 输出格式
    #[serde(default = "default_output_format")]
    pub output_format: String,

    #[serde(default)]
    pub voice_settings: VoiceSettingsConfig,
}

fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model_id: default_tts_model(),
            output_format: default_output_format(),
            voice_settings: VoiceSettingsConfig::default(),
        }
    }
}

/// 音色参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceSettingsConfig {
    /// 稳定性 (0.0 - 1.0)
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// 相似度 (0.0 - 1.0)
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    /// 风格强度 (0.0 - 1.0)
    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_speaker_boost() -> bool {
    true
}

impl Default for VoiceSettingsConfig {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: default_speaker_boost(),
        }
    }
}

impl VoiceSettingsConfig {
    pub fn to_voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: self.use_speaker_boost,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        for value in [self.stability, self.similarity_boost, self.style] {
            if !(0.0..=1.0).contains(&value) {
                return Err("voice_settings 的取值必须在 0.0 到 1.0 之间");
            }
        }
        Ok(())
    }
}

/// 克隆流程配置
#[derive(Debug, Clone, Deserialize)]
pub struct CloneConfig {
    /// 默认克隆音色名称
    #[serde(default = "default_voice_name")]
    pub default_voice_name: String,

    /// 单次 provider 调用超时（秒）
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// 参考音频最大字节数，默认 10MB
    #[serde(default = "default_max_sample_bytes")]
    pub max_sample_bytes: usize,
}

fn default_voice_name() -> String {
    "User Cloned Voice".to_string()
}

fn default_call_timeout() -> u64 {
    60
}

fn default_max_sample_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            default_voice_name: default_voice_name(),
            call_timeout_secs: default_call_timeout(),
            max_sample_bytes: default_max_sample_bytes(),
        }
    }
}

/// 改写服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImproverKind {
    /// 不改写，直接朗读原始转写
    #[default]
    None,
    Gemini,
}

impl std::fmt::Display for ImproverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

/// 讲稿改写配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImproverConfig {
    #[serde(default)]
    pub kind: ImproverKind,

    #[serde(default = "default_improver_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_improver_model")]
    pub model: String,

    /// HTTP 请求超时时间（秒）
    #[serde(default = "default_improver_timeout")]
    pub timeout_secs: u64,
}

fn default_improver_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_improver_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_improver_timeout() -> u64 {
    60
}

impl Default for ImproverConfig {
    fn default() -> Self {
        Self {
            kind: ImproverKind::default(),
            base_url: default_improver_base_url(),
            api_key: String::new(),
            model: default_improver_model(),
            timeout_secs: default_improver_timeout(),
        }
    }
}

impl ImproverConfig {
    pub fn masked_api_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
