//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Language Context: 语言代码规范化
//! - Voice Context: 音色克隆流程

pub mod language;
pub mod voice;

pub use language::{normalize_language, LanguageCode};
