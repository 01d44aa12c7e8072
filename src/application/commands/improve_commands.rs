//! Improve Commands - 转写、改写并用本人音色重新朗读

/// 改写讲稿并用克隆音色朗读
///
/// 同一段音频既用于转写，也作为克隆音色的参考样本
#[derive(Clone, Default)]
pub struct ImproveSpeech {
    pub audio: Vec<u8>,
    pub file_name: Option<String>,
    /// 原始语言提示，转写与合成共用
    pub language: Option<String>,
    /// 改写侧重点
    pub focus: Option<String>,
    /// 克隆音色名称，未指定时使用配置默认值
    pub voice_name: Option<String>,
    pub diarize: Option<bool>,
    pub tag_audio_events: Option<bool>,
}

impl std::fmt::Debug for ImproveSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImproveSpeech")
            .field("audio_size", &self.audio.len())
            .field("file_name", &self.file_name)
            .field("language", &self.language)
            .field("focus", &self.focus)
            .field("voice_name", &self.voice_name)
            .finish()
    }
}
