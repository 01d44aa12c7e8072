//! Fake Speech Provider - 用于测试和离线运行的 provider
//!
//! 不访问网络：返回固定文本/音频，记录每一次调用，并可按步骤注入失败

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    ProviderError, SpeechProviderPort, SynthesisRequest, Transcript, TranscriptionRequest,
};
use crate::domain::voice::{ClonedVoiceId, SynthesisResult, VoiceSample};

/// 调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    Transcribe {
        file_name: String,
        language: Option<String>,
        diarize: bool,
        tag_audio_events: bool,
    },
    CreateVoice {
        name: String,
        sample_size: usize,
    },
    Synthesize {
        voice_id: String,
        text: String,
        language: Option<String>,
    },
    DeleteVoice {
        voice_id: String,
    },
}

/// Fake Provider 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechProviderConfig {
    /// 转写固定返回的文本
    pub transcript_text: String,
    /// 合成固定返回的音频
    pub audio_data: Vec<u8>,
    /// 每次调用的模拟延迟
    pub latency: Duration,
}

impl Default for FakeSpeechProviderConfig {
    fn default() -> Self {
        Self {
            transcript_text: "This is a fake transcript.".to_string(),
            audio_data: b"ID3fake-audio".to_vec(),
            latency: Duration::ZERO,
        }
    }
}

/// 各步骤的注入失败
#[derive(Debug, Clone, Default)]
struct FailurePlan {
    transcribe: Option<ProviderError>,
    create_voice: Option<ProviderError>,
    synthesize: Option<ProviderError>,
    delete_voice: Option<ProviderError>,
    create_voice_delay: Option<Duration>,
    synthesize_delay: Option<Duration>,
}

/// Fake Speech Provider
pub struct FakeSpeechProvider {
    config: FakeSpeechProviderConfig,
    failures: FailurePlan,
    calls: Mutex<Vec<ProviderCall>>,
    /// voice_id -> name，已创建未删除的音色
    voices: DashMap<String, String>,
    next_voice: AtomicU64,
}

impl FakeSpeechProvider {
    pub fn new(config: FakeSpeechProviderConfig) -> Self {
        tracing::info!(
            audio_size = config.audio_data.len(),
            "FakeSpeechProvider initialized"
        );
        Self {
            config,
            failures: FailurePlan::default(),
            calls: Mutex::new(Vec::new()),
            voices: DashMap::new(),
            next_voice: AtomicU64::new(1),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechProviderConfig::default())
    }

    pub fn fail_transcribe_with(mut self, error: ProviderError) -> Self {
        self.failures.transcribe = Some(error);
        self
    }

    pub fn fail_create_voice_with(mut self, error: ProviderError) -> Self {
        self.failures.create_voice = Some(error);
        self
    }

    pub fn fail_synthesize_with(mut self, error: ProviderError) -> Self {
        self.failures.synthesize = Some(error);
        self
    }

    pub fn fail_delete_voice_with(mut self, error: ProviderError) -> Self {
        self.failures.delete_voice = Some(error);
        self
    }

    /// 音色建好之后延迟返回（远端已建、响应未到）
    pub fn delay_create_voice(mut self, delay: Duration) -> Self {
        self.failures.create_voice_delay = Some(delay);
        self
    }

    /// 合成前额外等待（用于超时测试）
    pub fn delay_synthesize(mut self, delay: Duration) -> Self {
        self.failures.synthesize_delay = Some(delay);
        self
    }

    /// 按顺序返回所有调用记录
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// 已创建但尚未删除的音色 ID
    pub fn live_voices(&self) -> Vec<String> {
        self.voices.iter().map(|e| e.key().clone()).collect()
    }

    fn record(&self, call: ProviderCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }
}

#[async_trait]
impl SpeechProviderPort for FakeSpeechProvider {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript, ProviderError> {
        self.record(ProviderCall::Transcribe {
            file_name: request.file_name.clone(),
            language: request.language.as_ref().map(|l| l.as_str().to_string()),
            diarize: request.diarize,
            tag_audio_events: request.tag_audio_events,
        });
        self.simulate_latency().await;

        if let Some(error) = &self.failures.transcribe {
            return Err(error.clone());
        }

        Ok(Transcript {
            text: self.config.transcript_text.clone(),
            language_code: request
                .language
                .map(|l| l.as_str().to_string())
                .or_else(|| Some("eng".to_string())),
            language_probability: Some(1.0),
        })
    }

    async fn create_voice(&self, sample: &VoiceSample) -> Result<ClonedVoiceId, ProviderError> {
        let name = sample.name();
        self.record(ProviderCall::CreateVoice {
            name: name.as_str().to_string(),
            sample_size: sample.len(),
        });
        self.simulate_latency().await;

        if let Some(error) = &self.failures.create_voice {
            return Err(error.clone());
        }

        let voice_id = format!("fake-voice-{}", self.next_voice.fetch_add(1, Ordering::SeqCst));
        self.voices.insert(voice_id.clone(), name.as_str().to_string());
        tracing::debug!(voice_id = %voice_id, "FakeSpeechProvider: voice created");

        if let Some(delay) = self.failures.create_voice_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(ClonedVoiceId::new(voice_id))
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResult, ProviderError> {
        self.record(ProviderCall::Synthesize {
            voice_id: request.voice_id.clone(),
            text: request.text.clone(),
            language: request.language.as_ref().map(|l| l.as_str().to_string()),
        });
        self.simulate_latency().await;

        if let Some(delay) = self.failures.synthesize_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failures.synthesize {
            return Err(error.clone());
        }

        Ok(SynthesisResult::new(self.config.audio_data.clone(), "audio/mpeg"))
    }

    async fn delete_voice(&self, voice_id: &ClonedVoiceId) -> Result<(), ProviderError> {
        self.record(ProviderCall::DeleteVoice {
            voice_id: voice_id.as_str().to_string(),
        });
        self.simulate_latency().await;

        if let Some(error) = &self.failures.delete_voice {
            return Err(error.clone());
        }

        match self.voices.remove(voice_id.as_str()) {
            Some(_) => Ok(()),
            None => Err(ProviderError::VoiceNotFound(voice_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::VoiceName;

    fn sample() -> VoiceSample {
        VoiceSample::new(VoiceName::new("test").unwrap(), None, vec![1, 2, 3]).unwrap()
    }

    #[tokio::test]
    async fn test_voice_lifecycle() {
        let provider = FakeSpeechProvider::with_defaults();
        let sample = sample();

        let voice_id = provider.create_voice(&sample).await.unwrap();
        assert_eq!(provider.live_voices(), vec![voice_id.to_string()]);

        provider.delete_voice(&voice_id).await.unwrap();
        assert!(provider.live_voices().is_empty());

        // 再次删除 -> VoiceNotFound
        let err = provider.delete_voice(&voice_id).await.unwrap_err();
        assert!(matches!(err, ProviderError::VoiceNotFound(_)));
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let provider = FakeSpeechProvider::with_defaults()
            .fail_create_voice_with(ProviderError::PlanRestricted("free tier".to_string()));
        let sample = sample();

        let err = provider.create_voice(&sample).await.unwrap_err();
        assert_eq!(err, ProviderError::PlanRestricted("free tier".to_string()));
        assert!(provider.live_voices().is_empty());
    }
}
