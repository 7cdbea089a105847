//! Session Commands - 会话相关命令
//!
//! 收听界面挂载/卸载，以及投递播放意图

use chrono::{DateTime, Utc};

use crate::application::controller::Intent;
use crate::domain::book::{Book, ContentVersion};
use crate::domain::session::SessionSnapshot;

/// 挂载会话命令 - 创建会话、启动 worker，可带初始书籍与版本
#[derive(Debug, Clone, Default)]
pub struct MountSessionCommand {
    pub book: Option<Book>,
    pub version: Option<ContentVersion>,
    /// 初始书籍是否自动播放（程序触发，需用户交互后才会真正出声）
    pub autoplay: bool,
}

/// 挂载会话响应
#[derive(Debug, Clone)]
pub struct MountSessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

/// 投递意图命令
#[derive(Debug, Clone)]
pub struct DispatchIntentCommand {
    pub session_id: String,
    pub intent: Intent,
}

/// 投递意图响应（意图处理后的快照）
#[derive(Debug, Clone)]
pub struct DispatchIntentResponse {
    pub session_id: String,
    pub intent: &'static str,
    pub snapshot: SessionSnapshot,
}

/// 卸载会话命令
#[derive(Debug, Clone)]
pub struct UnmountSessionCommand {
    pub session_id: String,
    pub reason: String,
}

impl UnmountSessionCommand {
    pub fn client_close(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            reason: "client_close".to_string(),
        }
    }

    pub fn idle_timeout(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            reason: "idle_timeout".to_string(),
        }
    }

    pub fn server_shutdown(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            reason: "server_shutdown".to_string(),
        }
    }
}

/// 卸载会话响应
#[derive(Debug, Clone)]
pub struct UnmountSessionResponse {
    pub session_id: String,
}
