//! Gemini Improver - 调用 Gemini generateContent 改写讲稿
//!
//! 外部 API:
//! - POST {base_url}/v1beta/models/{model}:generateContent
//!
//! 鉴权 header: `x-goog-api-key`

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{
    ImprovedSpeech, ImprovementRequest, ProviderError, SpeechImproverPort,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini 客户端配置
#[derive(Debug, Clone)]
pub struct GeminiImproverConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for GeminiImproverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini 改写客户端
pub struct GeminiImprover {
    client: Client,
    url: Url,
    api_key: String,
}

impl GeminiImprover {
    pub fn new(config: GeminiImproverConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let base = config.base_url.trim_end_matches('/');
        let mut url = Url::parse(base).map_err(|e| {
            ProviderError::NetworkError(format!("Invalid base URL {}: {}", base, e))
        })?;
        let model_call = format!("{}:generateContent", config.model.trim());
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty()
                    .extend(&["v1beta", "models", model_call.as_str()]);
            }
            Err(()) => {
                return Err(ProviderError::NetworkError(format!(
                    "Invalid base URL {}",
                    base
                )))
            }
        }

        tracing::info!(url = %url, "GeminiImprover initialized");

        Ok(Self {
            client,
            url,
            api_key: config.api_key,
        })
    }
}

/// 改写提示词，要求模型只返回 JSON
fn build_prompt(request: &ImprovementRequest) -> String {
    let focus = request
        .focus
        .as_deref()
        .map(|f| format!("\nFocus areas: {}\n", f))
        .unwrap_or_default();

    format!(
        r#"You are a professional speech coach. Analyze and improve the following speech transcription.

Original Speech:
{}
{}
Please provide:
1. An improved version of the speech with better structure, clarity, and impact
2. Specific suggestions for improvement
3. Key changes made and why

Return only JSON in the following format:
{{
    "improved_speech": "The improved version of the speech",
    "suggestions": ["Suggestion 1", "Suggestion 2"],
    "key_changes": [{{"change": "Description of change", "reason": "Why this change improves the speech"}}],
    "summary": "Brief summary of the improvements made"
}}"#,
        request.transcript, focus
    )
}

/// 去掉模型有时包裹在 JSON 外的 markdown 代码块
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::QuotaExceeded(message),
        _ => ProviderError::ServiceError {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl SpeechImproverPort for GeminiImprover {
    async fn improve(&self, request: ImprovementRequest) -> Result<ImprovedSpeech, ProviderError> {
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(&request) }]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        tracing::debug!(
            url = %self.url,
            transcript_len = request.transcript.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::NetworkError(format!("Cannot connect to Gemini: {}", e))
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &error_text));
        }

        let body: GenerateContentBody = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "Gemini returned no text".to_string(),
            ));
        }

        let improved: ImprovedSpeech = serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| {
                ProviderError::InvalidResponse(format!("Improvement is not valid JSON: {}", e))
            })?;

        tracing::info!(
            improved_len = improved.improved_speech.len(),
            suggestions = improved.suggestions.len(),
            "Speech improvement completed"
        );

        Ok(improved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Captured {
        calls: Vec<String>,
        api_keys: Vec<String>,
        prompts: Vec<String>,
    }

    type Shared = Arc<Mutex<Captured>>;

    /// 按模型名返回不同结果
    async fn generate(
        State(captured): State<Shared>,
        Path(call): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (AxumStatus, String) {
        {
            let mut captured = captured.lock().unwrap();
            captured.calls.push(call.clone());
            if let Some(key) = headers.get(API_KEY_HEADER) {
                captured.api_keys.push(key.to_str().unwrap().to_string());
            }
            if let Some(prompt) = body.pointer("/contents/0/parts/0/text") {
                captured.prompts.push(prompt.as_str().unwrap().to_string());
            }
        }

        let answer = |text: &str| {
            serde_json::json!({
                "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
            })
            .to_string()
        };

        match call.as_str() {
            "good:generateContent" => (
                AxumStatus::OK,
                answer(
                    r#"{"improved_speech":"Better talk.","suggestions":["Pause more"],"key_changes":[{"change":"Shorter intro","reason":"Focus"}],"summary":"Tighter"}"#,
                ),
            ),
            "fenced:generateContent" => (
                AxumStatus::OK,
                answer("```json\n{\"improved_speech\":\"Fenced talk.\"}\n```"),
            ),
            "prose:generateContent" => (AxumStatus::OK, answer("Sure, here is a better speech!")),
            "empty:generateContent" => (AxumStatus::OK, r#"{"candidates":[]}"#.to_string()),
            "limited:generateContent" => (
                AxumStatus::TOO_MANY_REQUESTS,
                r#"{"error":{"code":429,"message":"Resource exhausted"}}"#.to_string(),
            ),
            _ => (
                AxumStatus::FORBIDDEN,
                r#"{"error":{"code":403,"message":"API key not valid"}}"#.to_string(),
            ),
        }
    }

    async fn spawn_gemini() -> (String, Shared) {
        let captured: Shared = Arc::new(Mutex::new(Captured::default()));
        let app = Router::new()
            .route("/v1beta/models/:call", post(generate))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/", addr), captured)
    }

    fn improver(base_url: &str, model: &str) -> GeminiImprover {
        GeminiImprover::new(GeminiImproverConfig {
            base_url: base_url.to_string(),
            api_key: "gm-key".to_string(),
            model: model.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn request(focus: Option<&str>) -> ImprovementRequest {
        ImprovementRequest {
            transcript: "um so our product is good".to_string(),
            focus: focus.map(|f| f.to_string()),
        }
    }

    #[tokio::test]
    async fn test_improve_parses_structured_answer() {
        let (base_url, captured) = spawn_gemini().await;

        let improved = improver(&base_url, "good")
            .improve(request(Some("persuasiveness")))
            .await
            .unwrap();

        assert_eq!(improved.improved_speech, "Better talk.");
        assert_eq!(improved.suggestions, vec!["Pause more".to_string()]);
        assert_eq!(improved.key_changes[0].reason, "Focus");
        assert_eq!(improved.summary, "Tighter");

        let captured = captured.lock().unwrap();
        assert_eq!(captured.calls, vec!["good:generateContent".to_string()]);
        assert_eq!(captured.api_keys, vec!["gm-key".to_string()]);
        assert!(captured.prompts[0].contains("um so our product is good"));
        assert!(captured.prompts[0].contains("Focus areas: persuasiveness"));
    }

    #[tokio::test]
    async fn test_code_fence_is_stripped() {
        let (base_url, _) = spawn_gemini().await;

        let improved = improver(&base_url, "fenced").improve(request(None)).await.unwrap();
        assert_eq!(improved.improved_speech, "Fenced talk.");
        assert!(improved.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_unusable_answers_are_invalid_responses() {
        let (base_url, _) = spawn_gemini().await;

        for model in ["prose", "empty"] {
            let err = improver(&base_url, model).improve(request(None)).await.unwrap_err();
            assert!(
                matches!(err, ProviderError::InvalidResponse(_)),
                "{}: {:?}",
                model,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_status_errors_are_mapped() {
        let (base_url, _) = spawn_gemini().await;

        let err = improver(&base_url, "limited").improve(request(None)).await.unwrap_err();
        assert_eq!(err, ProviderError::QuotaExceeded("Resource exhausted".to_string()));

        let err = improver(&base_url, "other").improve(request(None)).await.unwrap_err();
        assert_eq!(err, ProviderError::Unauthorized("API key not valid".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let err = improver("http://127.0.0.1:1", "good")
            .improve(request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NetworkError(_)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
    }
}
