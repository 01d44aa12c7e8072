//! Voice Context - Clone Workflow 状态机

use serde::Serialize;
use uuid::Uuid;

use super::{ClonedVoiceId, VoiceError};

/// 克隆流程状态
///
/// ```text
/// Created -> VoiceReady -> Spoken -> CleanedUp
///    \           \            \
///     +-----------+------------+--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneState {
    Created,
    VoiceReady,
    Spoken,
    CleanedUp,
    Failed,
}

impl CloneState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CleanedUp | Self::Failed)
    }
}

impl std::fmt::Display for CloneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::VoiceReady => "voice_ready",
            Self::Spoken => "spoken",
            Self::CleanedUp => "cleaned_up",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// 克隆流程
///
/// 不变量:
/// - 只有拿到 voice_id 之后才需要清理
/// - 一旦拿到 voice_id，直到 `mark_released` 之前 `cleanup_required` 恒为 true
/// - Failed 之后不能再回到任何非终止状态
#[derive(Debug, Clone)]
pub struct CloneWorkflow {
    id: Uuid,
    state: CloneState,
    voice_id: Option<ClonedVoiceId>,
    released: bool,
}

impl CloneWorkflow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CloneState::Created,
            voice_id: None,
            released: false,
        }
    }

    /// Created -> VoiceReady
    pub fn voice_ready(&mut self, voice_id: ClonedVoiceId) -> Result<(), VoiceError> {
        self.transition(CloneState::VoiceReady)?;
        self.voice_id = Some(voice_id);
        Ok(())
    }

    /// VoiceReady -> Spoken
    pub fn spoken(&mut self) -> Result<(), VoiceError> {
        self.transition(CloneState::Spoken)
    }

    /// 任意非终止状态 -> Failed
    pub fn fail(&mut self) -> Result<(), VoiceError> {
        self.transition(CloneState::Failed)
    }

    /// 记录远端音色已删除
    ///
    /// Spoken 时推进到 CleanedUp；Failed 时保持 Failed，只记录释放
    pub fn mark_released(&mut self) -> Result<(), VoiceError> {
        if self.voice_id.is_none() || self.released {
            return Err(VoiceError::InvalidTransition {
                from: self.state,
                to: CloneState::CleanedUp,
            });
        }
        match self.state {
            CloneState::Spoken => self.state = CloneState::CleanedUp,
            CloneState::Failed => {}
            from => {
                return Err(VoiceError::InvalidTransition {
                    from,
                    to: CloneState::CleanedUp,
                })
            }
        }
        self.released = true;
        Ok(())
    }

    fn transition(&mut self, to: CloneState) -> Result<(), VoiceError> {
        let allowed = !self.state.is_terminal()
            && match to {
                CloneState::VoiceReady => self.state == CloneState::Created,
                CloneState::Spoken => self.state == CloneState::VoiceReady,
                CloneState::Failed => true,
                CloneState::Created | CloneState::CleanedUp => false,
            };
        if !allowed {
            return Err(VoiceError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(workflow_id = %self.id, from = %self.state, to = %to, "Clone workflow transition");
        self.state = to;
        Ok(())
    }

    // Getters
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CloneState {
        self.state
    }

    pub fn cleanup_required(&self) -> bool {
        self.voice_id.is_some() && !self.released
    }
}

impl Default for CloneWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
