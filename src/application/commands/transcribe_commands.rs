//! Transcription Commands

/// 转写音频命令
#[derive(Debug, Clone, Default)]
pub struct TranscribeAudio {
    pub audio: Vec<u8>,
    pub file_name: Option<String>,
    /// 原始语言提示（可缺失、为空或纯空白）
    pub language: Option<String>,
    /// 未指定时使用配置默认值
    pub diarize: Option<bool>,
    pub tag_audio_events: Option<bool>,
}
