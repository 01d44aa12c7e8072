//! Provider Adapter - 外部语音服务客户端实现

mod elevenlabs_client;
mod fake_provider;

pub use elevenlabs_client::{ElevenLabsClient, ElevenLabsClientConfig, VoiceSettings};
pub use fake_provider::{FakeSpeechProvider, FakeSpeechProviderConfig, ProviderCall};
