//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（voxrelay.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ImproverKind, ProviderKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["voxrelay", "voxrelay.local"];

/// provider 惯用的 API Key 环境变量，`provider.api_key` 未设置时使用
const FALLBACK_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Gemini 惯用的 API Key 环境变量，`improver.api_key` 未设置时使用
const FALLBACK_IMPROVER_KEY_ENV: &str = "GOOGLE_AI_STUDIO_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXRELAY_`，层级分隔符 `__`）
/// 2. 配置文件（voxrelay.toml 或 voxrelay.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXRELAY_PROVIDER__API_KEY=sk_...`
/// - `VOXRELAY_PROVIDER__KIND=fake`
/// - `VOXRELAY_CLONE__CALL_TIMEOUT_SECS=30`
/// - `VOXRELAY_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("provider.kind", "elevenlabs")?
        .set_default("provider.base_url", "https://api.elevenlabs.io")?
        .set_default("provider.api_key", "")?
        .set_default("provider.timeout_secs", 120)?
        .set_default("transcription.model_id", "scribe_v1")?
        .set_default("transcription.diarize", false)?
        .set_default("transcription.tag_audio_events", false)?
        .set_default("synthesis.model_id", "eleven_multilingual_v2")?
        .set_default("synthesis.output_format", "mp3_44100_128")?
        .set_default("synthesis.voice_settings.stability", 0.5_f64)?
        .set_default("synthesis.voice_settings.similarity_boost", 0.75_f64)?
        .set_default("synthesis.voice_settings.style", 0.0_f64)?
        .set_default("synthesis.voice_settings.use_speaker_boost", true)?
        .set_default("clone.default_voice_name", "User Cloned Voice")?
        .set_default("clone.call_timeout_secs", 60)?
        .set_default("clone.max_sample_bytes", 10 * 1024 * 1024)?
        .set_default("improver.kind", "none")?
        .set_default("improver.base_url", "https://generativelanguage.googleapis.com")?
        .set_default("improver.api_key", "")?
        .set_default("improver.model", "gemini-2.0-flash")?
        .set_default("improver.timeout_secs", 60)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VOXRELAY_PROVIDER__BASE_URL=http://localhost:9000
    builder = builder.add_source(
        Environment::with_prefix("VOXRELAY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let mut app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    fill_from_env(&mut app_config.provider.api_key, FALLBACK_API_KEY_ENV);
    fill_from_env(&mut app_config.improver.api_key, FALLBACK_IMPROVER_KEY_ENV);

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 值为空时用环境变量补上
fn fill_from_env(value: &mut String, env_key: &str) {
    if value.trim().is_empty() {
        if let Ok(from_env) = std::env::var(env_key) {
            *value = from_env;
        }
    }
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.provider.kind == ProviderKind::ElevenLabs {
        if config.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Provider base URL cannot be empty".to_string(),
            ));
        }
        if config.provider.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Provider API key is required (set provider.api_key, VOXRELAY_PROVIDER__API_KEY or {})",
                FALLBACK_API_KEY_ENV
            )));
        }
    }

    if config.provider.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Provider timeout cannot be 0".to_string(),
        ));
    }

    if config.clone.call_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Clone call timeout cannot be 0".to_string(),
        ));
    }

    if config.clone.max_sample_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Clone max sample size cannot be 0".to_string(),
        ));
    }

    if config.improver.kind == ImproverKind::Gemini {
        if config.improver.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Improver API key is required (set improver.api_key, VOXRELAY_IMPROVER__API_KEY or {})",
                FALLBACK_IMPROVER_KEY_ENV
            )));
        }
        if config.improver.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Improver model cannot be empty".to_string(),
            ));
        }
        if config.improver.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Improver timeout cannot be 0".to_string(),
            ));
        }
    }

    config
        .synthesis
        .voice_settings
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Provider: {}", config.provider.kind);
    if config.provider.kind == ProviderKind::ElevenLabs {
        tracing::info!("Provider URL: {}", config.provider.base_url);
        tracing::info!("Provider API Key: {}", config.provider.masked_api_key());
    }
    tracing::info!("Provider Timeout: {}s", config.provider.timeout_secs);
    tracing::info!("Transcription Model: {}", config.transcription.model_id);
    tracing::info!("Synthesis Model: {}", config.synthesis.model_id);
    tracing::info!("Synthesis Output Format: {}", config.synthesis.output_format);
    tracing::info!("Clone Call Timeout: {}s", config.clone.call_timeout_secs);
    tracing::info!("Clone Max Sample Size: {} bytes", config.clone.max_sample_bytes);
    tracing::info!("Improver: {}", config.improver.kind);
    if config.improver.kind == ImproverKind::Gemini {
        tracing::info!("Improver Model: {}", config.improver.model);
        tracing::info!("Improver API Key: {}", config.improver.masked_api_key());
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
