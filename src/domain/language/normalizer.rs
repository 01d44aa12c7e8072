//! Language Code Normalizer
//!
//! 外部 provider 拒绝显式的空字符串语言代码，但接受完全不传该参数（自动检测）。
//! 因此空值、空串、纯空白都被映射为 `None`。

use serde::{Deserialize, Serialize};

/// 语言代码
///
/// 不变量:
/// - 非空
/// - 首尾无空白
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// 从任意字符串构造，空白输入返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or("语言代码不能为空")
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

/// 规范化语言提示
///
/// - 缺失 / 空串 / 纯空白 → `None`（自动检测）
/// - 其他 → 去除首尾空白，保留大小写
pub fn normalize_language(hint: Option<&str>) -> Option<LanguageCode> {
    hint.and_then(LanguageCode::parse)
}
