//! Improver Adapter - 讲稿改写服务客户端实现

mod gemini_improver;

pub use gemini_improver::{GeminiImprover, GeminiImproverConfig};
