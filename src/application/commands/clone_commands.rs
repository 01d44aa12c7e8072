//! Clone Commands - 克隆音色并合成

/// 克隆并合成命令
///
/// 样本在流程结束后丢弃，不落盘
#[derive(Clone)]
pub struct CloneAndSpeak {
    /// 参考音频
    pub audio: Vec<u8>,
    pub file_name: Option<String>,
    /// 克隆音色名称，未指定时使用配置默认值
    pub voice_name: Option<String>,
    /// 要合成的文本
    pub text: String,
    /// 原始语言提示
    pub language: Option<String>,
}

impl std::fmt::Debug for CloneAndSpeak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneAndSpeak")
            .field("audio_size", &self.audio.len())
            .field("file_name", &self.file_name)
            .field("voice_name", &self.voice_name)
            .field("text_len", &self.text.len())
            .field("language", &self.language)
            .finish()
    }
}
