//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

/// 音色名称（provider 侧展示名）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceName(String);

impl VoiceName {
    pub fn new(name: impl Into<String>) -> Result<Self, VoiceError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(VoiceError::InvalidName("音色名称不能为空".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(VoiceError::InvalidName(
                "音色名称长度不能超过100字符".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音频格式（仅用于上传时的文件名与 MIME，不做编解码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    M4a,
    Webm,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "m4a" => Some(Self::M4a),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    /// 从文件名推断格式
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Flac => "audio/flac",
            Self::Ogg => "audio/ogg",
            Self::M4a => "audio/mp4",
            Self::Webm => "audio/webm",
        }
    }
}

/// 参考音频样本
///
/// 不变量:
/// - 音频数据非空
///
/// 只在一次克隆流程内存在，不落盘
#[derive(Clone)]
pub struct VoiceSample {
    name: VoiceName,
    file_name: String,
    audio: Vec<u8>,
}

impl VoiceSample {
    pub fn new(
        name: VoiceName,
        file_name: Option<String>,
        audio: Vec<u8>,
    ) -> Result<Self, VoiceError> {
        if audio.is_empty() {
            return Err(VoiceError::InvalidSample("参考音频不能为空".to_string()));
        }
        let file_name = file_name
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| "sample.wav".to_string());
        Ok(Self {
            name,
            file_name,
            audio,
        })
    }

    pub fn name(&self) -> &VoiceName {
        &self.name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> Option<AudioFormat> {
        AudioFormat::from_file_name(&self.file_name)
    }

    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

impl std::fmt::Debug for VoiceSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSample")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("audio_size", &self.audio.len())
            .finish()
    }
}

/// provider 分配的克隆音色 ID（计费资源）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClonedVoiceId(String);

impl ClonedVoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClonedVoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// 音频数据
    pub audio_data: Vec<u8>,
    /// Content-Type（如 audio/mpeg）
    pub content_type: String,
}

impl SynthesisResult {
    pub fn new(audio_data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            audio_data,
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.audio_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio_data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_name_validation() {
        assert!(VoiceName::new("").is_err());
        assert!(VoiceName::new("   ").is_err());
        assert!(VoiceName::new("x".repeat(101)).is_err());
        assert_eq!(VoiceName::new(" Narrator ").unwrap().as_str(), "Narrator");
    }

    #[test]
    fn test_empty_sample_rejected() {
        let name = VoiceName::new("test").unwrap();
        assert!(VoiceSample::new(name, None, Vec::new()).is_err());
    }

    #[test]
    fn test_sample_default_file_name() {
        let name = VoiceName::new("test").unwrap();
        let sample = VoiceSample::new(name.clone(), Some("  ".to_string()), vec![1, 2, 3]).unwrap();
        assert_eq!(sample.file_name(), "sample.wav");
        assert_eq!(sample.format(), Some(AudioFormat::Wav));

        let sample = VoiceSample::new(name, Some("me.MP3".to_string()), vec![1]).unwrap();
        assert_eq!(sample.format(), Some(AudioFormat::Mp3));
        assert_eq!(sample.format().unwrap().mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_sample_debug_hides_audio() {
        let name = VoiceName::new("test").unwrap();
        let sample = VoiceSample::new(name, None, vec![0; 4096]).unwrap();
        let debug = format!("{:?}", sample);
        assert!(debug.contains("audio_size: 4096"));
    }
}
