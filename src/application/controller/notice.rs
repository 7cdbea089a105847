//! Notices - 需要呈现给 UI 的提示

use serde::{Deserialize, Serialize};

/// 控制器产生的提示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", content = "message", rename_all = "snake_case")]
pub enum Notice {
    /// 可恢复的问题（例如版本回退）
    Warning(String),
    /// 播放失败，需要用户重新发起播放
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Warning(msg) | Notice::Error(msg) => msg,
        }
    }
}
