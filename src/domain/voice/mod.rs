//! Voice Context - 音色克隆上下文
//!
//! 职责:
//! - 参考音频样本（VoiceSample）
//! - provider 侧克隆音色标识（ClonedVoiceId）
//! - 克隆流程状态机（CloneWorkflow）

mod errors;
mod value_objects;
mod workflow;

pub use errors::VoiceError;
pub use value_objects::{AudioFormat, ClonedVoiceId, SynthesisResult, VoiceName, VoiceSample};
pub use workflow::{CloneState, CloneWorkflow};
