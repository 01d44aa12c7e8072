//! ElevenLabs Client - 调用 ElevenLabs REST API
//!
//! 实现 SpeechProviderPort trait。provider 调用形态的全部细节只存在于本文件。
//!
//! 外部 API:
//! - POST   /v1/speech-to-text            multipart(file, model_id, diarize, tag_audio_events, [language_code])
//! - POST   /v1/voices/add                multipart(name, files)  -> {"voice_id": "..."}
//! - POST   /v1/text-to-speech/{voice_id} JSON(text, model_id, [language_code], voice_settings) -> audio
//! - DELETE /v1/voices/{voice_id}
//! - GET    /v1/user                      健康检查
//!
//! 鉴权 header: `xi-api-key`

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    ProviderError, SpeechProviderPort, SynthesisRequest, Transcript, TranscriptionRequest,
};
use crate::domain::voice::{AudioFormat, ClonedVoiceId, SynthesisResult, VoiceSample};

const API_KEY_HEADER: &str = "xi-api-key";

/// 合成时使用的音色参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// TTS 请求体 (JSON)
#[derive(Debug, Serialize)]
struct TextToSpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    /// 为 None 时整个字段不出现在请求里（provider 拒绝空字符串）
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    voice_settings: &'a VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct SpeechToTextBody {
    text: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    language_probability: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct AddVoiceBody {
    voice_id: String,
}

/// ElevenLabs 客户端配置
#[derive(Debug, Clone)]
pub struct ElevenLabsClientConfig {
    /// API 基础 URL
    pub base_url: String,
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 转写模型
    pub stt_model_id: String,
    /// 合成模型
    pub tts_model_id: String,
    /// 合成输出格式，如 mp3_44100_128
    pub output_format: String,
    pub voice_settings: VoiceSettings,
}

impl Default for ElevenLabsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            timeout_secs: 120,
            stt_model_id: "scribe_v1".to_string(),
            tts_model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

impl ElevenLabsClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// ElevenLabs 客户端
pub struct ElevenLabsClient {
    client: Client,
    base_url: Url,
    config: ElevenLabsClientConfig,
}

impl ElevenLabsClient {
    /// 创建新的客户端
    pub fn new(mut config: ElevenLabsClientConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ProviderError::NetworkError(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::NetworkError(format!(
                "Invalid base URL {}",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// 在 base URL 之后逐段追加路径，每段单独转义
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// voice_id 作为单个路径段使用
    fn voice_endpoint(&self, prefix: &[&str], voice_id: &str) -> Result<Url, ProviderError> {
        if matches!(voice_id.trim(), "" | "." | "..") {
            return Err(ProviderError::VoiceNotFound(format!(
                "Invalid voice ID: {:?}",
                voice_id
            )));
        }
        let mut segments = prefix.to_vec();
        segments.push(voice_id);
        Ok(self.endpoint(&segments))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, &self.config.api_key)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ProviderError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &error_text));
        }

        Ok(response)
    }
}

fn map_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::NetworkError(format!("Cannot connect to speech provider: {}", e))
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// 从错误响应中提取 `detail.status` 与可读消息
///
/// ElevenLabs 的错误体形如 `{"detail": {"status": "...", "message": "..."}}`，
/// 也可能是 `{"detail": "..."}` 或纯文本
fn parse_error_detail(body: &str) -> (Option<String>, String) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, body.to_string());
    };
    match value.get("detail") {
        Some(serde_json::Value::Object(detail)) => {
            let status = detail
                .get("status")
                .and_then(|s| s.as_str())
                .map(|s| s.to_string());
            let message = detail
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| body.to_string());
            (status, message)
        }
        Some(serde_json::Value::String(detail)) => (None, detail.clone()),
        _ => (None, body.to_string()),
    }
}

fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    let (detail_status, message) = parse_error_detail(body);
    let detail_status = detail_status.unwrap_or_default();

    if detail_status.contains("voice_cloning") || detail_status.contains("subscription") {
        return ProviderError::PlanRestricted(message);
    }
    if detail_status.contains("quota_exceeded") {
        return ProviderError::QuotaExceeded(message);
    }
    if detail_status.contains("voice_not_found") || detail_status.contains("voice_does_not_exist")
    {
        return ProviderError::VoiceNotFound(message);
    }

    match status {
        StatusCode::UNAUTHORIZED => ProviderError::Unauthorized(message),
        StatusCode::PAYMENT_REQUIRED | StatusCode::FORBIDDEN => {
            ProviderError::PlanRestricted(message)
        }
        StatusCode::NOT_FOUND => ProviderError::VoiceNotFound(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::QuotaExceeded(message),
        _ => ProviderError::ServiceError {
            status: status.as_u16(),
            message,
        },
    }
}

fn audio_part(
    audio: Vec<u8>,
    file_name: &str,
    format: Option<AudioFormat>,
) -> Result<Part, ProviderError> {
    let mime = format
        .map(|f| f.mime_type())
        .unwrap_or("application/octet-stream");
    Part::bytes(audio)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .map_err(|e| ProviderError::NetworkError(format!("Failed to set MIME type: {}", e)))
}

#[async_trait]
impl SpeechProviderPort for ElevenLabsClient {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<Transcript, ProviderError> {
        let audio_size = request.audio.len();
        let mut form = Form::new()
            .part(
                "file",
                audio_part(
                    request.audio,
                    &request.file_name,
                    AudioFormat::from_file_name(&request.file_name),
                )?,
            )
            .text("model_id", self.config.stt_model_id.clone())
            .text("diarize", request.diarize.to_string())
            .text("tag_audio_events", request.tag_audio_events.to_string());

        if let Some(language) = &request.language {
            form = form.text("language_code", language.as_str().to_string());
        }

        let url = self.endpoint(&["v1", "speech-to-text"]);
        tracing::debug!(
            url = %url,
            audio_size,
            language = ?request.language.as_ref().map(|l| l.as_str()),
            "Sending speech-to-text request"
        );

        let response = self
            .send(self.client.post(url).multipart(form))
            .await?;

        let body: SpeechToTextBody = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse transcript: {}", e)))?;

        tracing::info!(
            text_len = body.text.len(),
            detected_language = ?body.language_code,
            "Transcription completed"
        );

        Ok(Transcript {
            text: body.text,
            language_code: body.language_code,
            language_probability: body.language_probability,
        })
    }

    async fn create_voice(&self, sample: &VoiceSample) -> Result<ClonedVoiceId, ProviderError> {
        let name = sample.name();
        let form = Form::new()
            .text("name", name.as_str().to_string())
            .part(
                "files",
                audio_part(sample.audio().to_vec(), sample.file_name(), sample.format())?,
            );

        tracing::debug!(
            name = %name,
            sample_size = sample.len(),
            "Sending voice clone request"
        );

        let response = self
            .send(
                self.client
                    .post(self.endpoint(&["v1", "voices", "add"]))
                    .multipart(form),
            )
            .await?;

        let body: AddVoiceBody = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse voice: {}", e)))?;

        if body.voice_id.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Provider returned an empty voice_id".to_string(),
            ));
        }

        tracing::info!(voice_id = %body.voice_id, name = %name, "Cloned voice created");

        Ok(ClonedVoiceId::new(body.voice_id))
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<SynthesisResult, ProviderError> {
        let body = TextToSpeechBody {
            text: &request.text,
            model_id: &self.config.tts_model_id,
            language_code: request.language.as_ref().map(|l| l.as_str()),
            voice_settings: &self.config.voice_settings,
        };
        let url = self.voice_endpoint(&["v1", "text-to-speech"], &request.voice_id)?;

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            language = ?body.language_code,
            "Sending text-to-speech request"
        );

        let response = self
            .send(
                self.client
                    .post(url)
                    .query(&[("output_format", self.config.output_format.as_str())])
                    .header(reqwest::header::ACCEPT, "audio/mpeg")
                    .json(&body),
            )
            .await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Provider returned empty audio".to_string(),
            ));
        }

        tracing::info!(
            voice_id = %request.voice_id,
            audio_size = audio_data.len(),
            "Speech synthesis completed"
        );

        Ok(SynthesisResult::new(audio_data, content_type))
    }

    async fn delete_voice(&self, voice_id: &ClonedVoiceId) -> Result<(), ProviderError> {
        let url = self.voice_endpoint(&["v1", "voices"], voice_id.as_str())?;
        tracing::debug!(url = %url, "Sending delete voice request");

        self.send(self.client.delete(url)).await?;

        tracing::info!(voice_id = %voice_id, "Cloned voice deleted");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self
            .authorized(self.client.get(self.endpoint(&["v1", "user"])))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize_language;
    use crate::domain::voice::VoiceName;
    use axum::extract::{Multipart, Path, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    /// 本地模拟 provider 记录下的请求
    #[derive(Default)]
    struct Captured {
        stt_fields: Vec<(String, String)>,
        tts_bodies: Vec<serde_json::Value>,
        api_keys: Vec<String>,
        deleted: Vec<String>,
    }

    type Shared = Arc<Mutex<Captured>>;

    async fn stt(
        State(captured): State<Shared>,
        headers: axum::http::HeaderMap,
        mut multipart: Multipart,
    ) -> Json<serde_json::Value> {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let value = if name == "file" {
                format!("{} bytes", field.bytes().await.unwrap().len())
            } else {
                field.text().await.unwrap()
            };
            fields.push((name, value));
        }
        let mut captured = captured.lock().unwrap();
        captured.stt_fields = fields;
        if let Some(key) = headers.get(API_KEY_HEADER) {
            captured.api_keys.push(key.to_str().unwrap().to_string());
        }
        Json(serde_json::json!({
            "text": "hello world",
            "language_code": "eng",
            "language_probability": 0.98
        }))
    }

    async fn add_voice(mut multipart: Multipart) -> Json<serde_json::Value> {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let _ = field.bytes().await.unwrap();
        }
        Json(serde_json::json!({ "voice_id": "cloned-123" }))
    }

    async fn tts(
        State(captured): State<Shared>,
        Path(voice_id): Path<String>,
        Json(body): Json<serde_json::Value>,
    ) -> Result<Vec<u8>, (AxumStatus, String)> {
        if voice_id == "restricted" {
            return Err((
                AxumStatus::UNAUTHORIZED,
                r#"{"detail":{"status":"can_not_use_instant_voice_cloning","message":"upgrade plan"}}"#
                    .to_string(),
            ));
        }
        captured.lock().unwrap().tts_bodies.push(body);
        Ok(b"ID3audio".to_vec())
    }

    async fn remove_voice(
        State(captured): State<Shared>,
        Path(voice_id): Path<String>,
    ) -> (AxumStatus, String) {
        captured.lock().unwrap().deleted.push(voice_id.clone());
        if voice_id == "cloned-123" {
            (AxumStatus::OK, r#"{"status":"ok"}"#.to_string())
        } else {
            (
                AxumStatus::NOT_FOUND,
                r#"{"detail":{"status":"voice_not_found","message":"gone"}}"#.to_string(),
            )
        }
    }

    async fn user() -> &'static str {
        "{}"
    }

    async fn spawn_provider() -> (ElevenLabsClient, Shared) {
        let captured: Shared = Arc::new(Mutex::new(Captured::default()));
        let app = Router::new()
            .route("/v1/speech-to-text", post(stt))
            .route("/v1/voices/add", post(add_voice))
            .route("/v1/text-to-speech/:voice_id", post(tts))
            .route("/v1/voices/:voice_id", delete(remove_voice))
            .route("/v1/user", get(user))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ElevenLabsClientConfig::new(format!("http://{}/", addr), "test-key")
            .with_timeout(5);
        (ElevenLabsClient::new(config).unwrap(), captured)
    }

    fn transcription(language: Option<&str>) -> TranscriptionRequest {
        TranscriptionRequest {
            audio: vec![0u8; 16],
            file_name: "clip.wav".to_string(),
            language: normalize_language(language),
            diarize: false,
            tag_audio_events: true,
        }
    }

    #[test]
    fn test_config_default() {
        let config = ElevenLabsClientConfig::default();
        assert_eq!(config.base_url, "https://api.elevenlabs.io");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.stt_model_id, "scribe_v1");
        assert_eq!(config.tts_model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn test_config_builder() {
        let config = ElevenLabsClientConfig::new("http://example.com:9000", "k").with_timeout(60);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status_error(StatusCode::UNAUTHORIZED, "bad key"),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status_error(
                StatusCode::UNAUTHORIZED,
                r#"{"detail":{"status":"can_not_use_instant_voice_cloning","message":"no"}}"#
            ),
            ProviderError::PlanRestricted(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::BAD_REQUEST, r#"{"detail":{"status":"quota_exceeded"}}"#),
            ProviderError::QuotaExceeded(_)
        ));
        assert!(matches!(
            map_status_error(StatusCode::NOT_FOUND, ""),
            ProviderError::VoiceNotFound(_)
        ));
        assert_eq!(
            map_status_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"bad language"}"#),
            ProviderError::ServiceError {
                status: 422,
                message: "bad language".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_transcribe_omits_blank_language() {
        let (client, captured) = spawn_provider().await;

        let transcript = client.transcribe(transcription(Some(""))).await.unwrap();
        assert_eq!(transcript.text, "hello world");
        assert_eq!(transcript.language_code.as_deref(), Some("eng"));

        let captured = captured.lock().unwrap();
        assert!(captured
            .stt_fields
            .iter()
            .all(|(name, _)| name != "language_code"));
        assert!(captured
            .stt_fields
            .contains(&("model_id".to_string(), "scribe_v1".to_string())));
        assert!(captured
            .stt_fields
            .contains(&("tag_audio_events".to_string(), "true".to_string())));
        assert_eq!(captured.api_keys, vec!["test-key".to_string()]);
    }

    #[tokio::test]
    async fn test_transcribe_sends_trimmed_language() {
        let (client, captured) = spawn_provider().await;

        client.transcribe(transcription(Some("  spa "))).await.unwrap();

        let captured = captured.lock().unwrap();
        assert!(captured
            .stt_fields
            .contains(&("language_code".to_string(), "spa".to_string())));
    }

    #[tokio::test]
    async fn test_clone_synthesize_delete_roundtrip() {
        let (client, captured) = spawn_provider().await;
        let name = VoiceName::new("Me").unwrap();
        let sample = VoiceSample::new(name, Some("me.wav".to_string()), vec![1; 32]).unwrap();

        let voice_id = client.create_voice(&sample).await.unwrap();
        assert_eq!(voice_id.as_str(), "cloned-123");

        let audio = client
            .synthesize(SynthesisRequest {
                voice_id: voice_id.to_string(),
                text: "Hi".to_string(),
                language: None,
            })
            .await
            .unwrap();
        assert_eq!(audio.audio_data, b"ID3audio".to_vec());

        client.delete_voice(&voice_id).await.unwrap();
        let err = client
            .delete_voice(&ClonedVoiceId::new("unknown"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::VoiceNotFound(_)));

        let captured = captured.lock().unwrap();
        let body = &captured.tts_bodies[0];
        assert!(body.get("language_code").is_none());
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        assert_eq!(body["voice_settings"]["use_speaker_boost"], true);
    }

    #[tokio::test]
    async fn test_voice_id_stays_one_path_segment() {
        let (client, captured) = spawn_provider().await;

        let err = client
            .delete_voice(&ClonedVoiceId::new("a/b?x=1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::VoiceNotFound(_)));

        let err = client
            .delete_voice(&ClonedVoiceId::new(".."))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::VoiceNotFound(_)));

        let err = client
            .delete_voice(&ClonedVoiceId::new("../../user"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::VoiceNotFound(_)));

        let captured = captured.lock().unwrap();
        assert_eq!(
            captured.deleted,
            vec!["a/b?x=1".to_string(), "../../user".to_string()]
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ElevenLabsClient::new(ElevenLabsClientConfig::new(
            "http://localhost:9000/proxy/",
            "k",
        ))
        .unwrap();
        assert_eq!(
            client.endpoint(&["v1", "user"]).as_str(),
            "http://localhost:9000/proxy/v1/user"
        );
        assert_eq!(
            client
                .voice_endpoint(&["v1", "voices"], "a b/c")
                .unwrap()
                .as_str(),
            "http://localhost:9000/proxy/v1/voices/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_synthesize_plan_restriction() {
        let (client, _) = spawn_provider().await;

        let err = client
            .synthesize(SynthesisRequest {
                voice_id: "restricted".to_string(),
                text: "Hi".to_string(),
                language: normalize_language(Some("eng")),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::PlanRestricted("upgrade plan".to_string()));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (client, _) = spawn_provider().await;
        assert!(client.health_check().await);

        let offline = ElevenLabsClient::new(
            ElevenLabsClientConfig::new("http://127.0.0.1:1", "k").with_timeout(1),
        )
        .unwrap();
        assert!(!offline.health_check().await);
    }
}
