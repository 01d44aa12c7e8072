//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechProviderPort、SpeechImproverPort）
//! - commands: 转写、合成、克隆并合成、改写并朗读
//! - queries: provider 健康检查
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    CloneAndSpeak,
    ImproveSpeech,
    SynthesizeSpeech,
    TranscribeAudio,
    // Handlers
    handlers::{
        CloneAndSpeakHandler, CloneAndSpeakResponse, CloneSettings, ImproveSpeechHandler,
        ImproveSpeechResponse, ImproveSpeechSummary, SynthesizeSpeechHandler,
        TranscribeAudioHandler, TranscribeSettings,
    },
};

pub use error::{ApplicationError, WorkflowStep};

pub use ports::{
    ImprovedSpeech, ImprovementRequest, KeyChange, ProviderError, SpeechImproverPort,
    SpeechProviderPort, SynthesisRequest, Transcript, TranscriptionRequest,
};

pub use queries::{
    CheckProviderHealth,
    handlers::{CheckProviderHealthHandler, ProviderHealth},
};
