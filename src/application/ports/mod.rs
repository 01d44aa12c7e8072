//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod speech_improver;
mod speech_provider;

pub use speech_improver::{ImprovedSpeech, ImprovementRequest, KeyChange, SpeechImproverPort};
pub use speech_provider::{
    ProviderError, SpeechProviderPort, SynthesisRequest, Transcript, TranscriptionRequest,
};
