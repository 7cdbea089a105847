//! Transport Intents - UI 意图
//!
//! UI 调用的所有意图方法的统一表示，由会话 worker 串行投递给控制器

use serde::{Deserialize, Serialize};

use crate::domain::book::{Book, ContentVersion};
use crate::domain::session::Origin;

/// 用户意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    Play {
        #[serde(default)]
        origin: Origin,
    },
    Pause {
        #[serde(default)]
        origin: Origin,
    },
    Seek {
        position: f64,
        #[serde(default)]
        origin: Origin,
    },
    /// 为空时使用配置的默认步长
    SkipForward {
        #[serde(default)]
        seconds: Option<f64>,
        #[serde(default)]
        origin: Origin,
    },
    SkipBackward {
        #[serde(default)]
        seconds: Option<f64>,
        #[serde(default)]
        origin: Origin,
    },
    SetVersion {
        version: ContentVersion,
        #[serde(default)]
        autoplay: bool,
        #[serde(default)]
        origin: Origin,
    },
    SetBook {
        book: Option<Book>,
        #[serde(default)]
        autoplay: bool,
        #[serde(default)]
        origin: Origin,
    },
    SetVolume {
        volume: f32,
    },
    /// 真实用户手势（点击、按键），解锁自动播放
    Gesture,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Play { .. } => "play",
            Intent::Pause { .. } => "pause",
            Intent::Seek { .. } => "seek",
            Intent::SkipForward { .. } => "skip_forward",
            Intent::SkipBackward { .. } => "skip_backward",
            Intent::SetVersion { .. } => "set_version",
            Intent::SetBook { .. } => "set_book",
            Intent::SetVolume { .. } => "set_volume",
            Intent::Gesture => "gesture",
        }
    }
}
