//! Session Context - Transport & Playback Mode

use serde::{Deserialize, Serialize};

use super::{AdAsset, BookResource};

/// 面向用户的播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    #[default]
    Idle,
    AdPlaying,
    BookPlaying,
    Paused,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::Idle => "idle",
            TransportState::AdPlaying => "ad_playing",
            TransportState::BookPlaying => "book_playing",
            TransportState::Paused => "paused",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::AdPlaying | TransportState::BookPlaying)
    }
}

/// 当前挂载在输出设备上的资源
///
/// 与 `TransportState` 分离：切换版本后可以是 Paused + None
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackMode {
    #[default]
    None,
    Ad(AdAsset),
    Book(BookResource),
}

impl PlaybackMode {
    pub fn kind(&self) -> PlaybackModeKind {
        match self {
            PlaybackMode::None => PlaybackModeKind::None,
            PlaybackMode::Ad(_) => PlaybackModeKind::Ad,
            PlaybackMode::Book(_) => PlaybackModeKind::Book,
        }
    }

    pub fn is_book(&self) -> bool {
        matches!(self, PlaybackMode::Book(_))
    }

    pub fn is_ad(&self) -> bool {
        matches!(self, PlaybackMode::Ad(_))
    }
}

/// `PlaybackMode` 的无负载标签（用于 UI 快照）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackModeKind {
    None,
    Ad,
    Book,
}
