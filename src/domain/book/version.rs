//! Book Context - Content Version
//!
//! 同一本书的不同内容变体（原版、精简版、风格改编、译本）

use serde::{Deserialize, Serialize};

/// 内容版本标签
///
/// 始终存在有效的默认值 `Original`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentVersion {
    /// 原版
    #[default]
    Original,
    /// 精简版
    Shortened,
    /// 风格改编
    GenreRemix,
    /// 译本
    Translated,
}

impl ContentVersion {
    pub const ALL: [ContentVersion; 4] = [
        ContentVersion::Original,
        ContentVersion::Shortened,
        ContentVersion::GenreRemix,
        ContentVersion::Translated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentVersion::Original => "original",
            ContentVersion::Shortened => "shortened",
            ContentVersion::GenreRemix => "genre-remix",
            ContentVersion::Translated => "translated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" => Some(ContentVersion::Original),
            "shortened" => Some(ContentVersion::Shortened),
            "genre-remix" | "genre_remix" => Some(ContentVersion::GenreRemix),
            "translated" => Some(ContentVersion::Translated),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
