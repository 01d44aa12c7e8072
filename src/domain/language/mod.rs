//! Language Context - 语言代码上下文
//!
//! 职责:
//! - 将用户传入的语言提示规范化为合法的语言代码或“自动检测”
//! - 所有接受语言参数的入口共享同一个规范化函数

mod normalizer;

pub use normalizer::{normalize_language, LanguageCode};
