//! Speech Commands - 使用预置音色合成

/// 合成语音命令
#[derive(Debug, Clone)]
pub struct SynthesizeSpeech {
    /// provider 上已存在的音色 ID
    pub voice_id: String,
    pub text: String,
    /// 原始语言提示
    pub language: Option<String>,
}
