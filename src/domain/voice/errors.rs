//! Voice Context - Errors

use thiserror::Error;

use super::CloneState;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("无效的音色名称: {0}")]
    InvalidName(String),

    #[error("无效的参考音频: {0}")]
    InvalidSample(String),

    #[error("非法的流程状态迁移: {from} -> {to}")]
    InvalidTransition { from: CloneState, to: CloneState },
}
