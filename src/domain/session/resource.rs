//! Session Context - Playable Resources
//!
//! 输出设备上可挂载的两类资源：广告素材与书籍音频

use serde::{Deserialize, Serialize};

use crate::domain::book::{BookId, ContentVersion};

/// 资源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Ad,
    Book,
}

/// 可播放的音频资源引用
///
/// 对编排器而言是不透明的 URL/句柄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioResourceRef {
    pub url: String,
    pub kind: ResourceKind,
    /// 已知时长（秒），设备上报 duration 之前用作提示
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hint: Option<f64>,
}

impl AudioResourceRef {
    pub fn ad(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ResourceKind::Ad,
            duration_hint: None,
        }
    }

    pub fn book(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ResourceKind::Book,
            duration_hint: None,
        }
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_hint = Some(secs);
        self
    }
}

/// 广告展示元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdDisplayMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertiser: Option<String>,
}

/// 广告素材
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdAsset {
    pub id: String,
    pub audio: AudioResourceRef,
    pub display: AdDisplayMeta,
}

/// 已解析的书籍音频，记录实际挂载的版本（可能是回退后的默认版本）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookResource {
    pub book_id: BookId,
    pub version: ContentVersion,
    pub audio: AudioResourceRef,
}
