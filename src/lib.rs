//! Voxrelay - 语音转写、合成与临时音色克隆
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Language: 语言代码规范化
//! - Voice: 音色样本、合成结果、克隆流程状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechProviderPort、SpeechImproverPort）
//! - Commands: 转写、合成、克隆并合成、改写并朗读
//! - Queries: provider 健康检查
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: ElevenLabs 客户端、Gemini 改写客户端、Fake provider
//! - CLI: 命令行入口

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
