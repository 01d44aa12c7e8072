//! Speech Improver Port - 讲稿改写接口
//!
//! 由外部 LLM 服务实现，把转写出的讲稿改写成结构更清晰的版本

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ProviderError;

/// 改写请求
#[derive(Debug, Clone)]
pub struct ImprovementRequest {
    /// 原始转写文本
    pub transcript: String,
    /// 改写侧重点，如 "clarity"、"persuasiveness"
    pub focus: Option<String>,
}

/// 单条修改说明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    pub change: String,
    #[serde(default)]
    pub reason: String,
}

/// 改写结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovedSpeech {
    /// 改写后的讲稿，用于合成
    pub improved_speech: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub key_changes: Vec<KeyChange>,
    #[serde(default)]
    pub summary: String,
}

/// Speech Improver Port
#[async_trait]
pub trait SpeechImproverPort: Send + Sync {
    /// 改写讲稿
    async fn improve(&self, request: ImprovementRequest) -> Result<ImprovedSpeech, ProviderError>;
}
