//! Session Manager Port - 会话生命周期管理
//!
//! 收听界面挂载时创建会话，卸载时销毁。具体实现在 infrastructure/memory 层。

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::application::controller::Intent;
use crate::domain::session::SessionSnapshot;

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    #[error("Session closed: {0}")]
    Closed(String),
}

/// 投递给会话 worker 的请求
#[derive(Debug)]
pub enum SessionRequest {
    Intent(Intent),
    /// 按队列顺序回传快照，此前投递的意图都已处理
    Sync(oneshot::Sender<SessionSnapshot>),
    Close,
}

/// 会话句柄（in-memory）
///
/// 控制器本身由会话 worker 独占，这里只持有请求通道和快照订阅
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub requests: mpsc::Sender<SessionRequest>,
    pub snapshot: watch::Receiver<SessionSnapshot>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(
        requests: mpsc::Sender<SessionRequest>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), requests, snapshot)
    }

    pub fn with_id(
        id: String,
        requests: mpsc::Sender<SessionRequest>,
        snapshot: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            requests,
            snapshot,
            created_at: now,
            last_activity: now,
        }
    }

    /// 当前状态快照
    pub fn current(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }
}

/// Session Manager Port
///
/// 管理收听会话的生命周期，所有状态存储在内存中
pub trait SessionManagerPort: Send + Sync {
    /// 注册新会话
    fn create(&self, session: Session) -> Result<String, SessionError>;

    /// 获取会话
    fn get(&self, id: &str) -> Result<Session, SessionError>;

    /// 检查会话是否有效
    fn is_valid(&self, id: &str) -> bool;

    /// 移除会话并返回其句柄
    fn close(&self, id: &str) -> Result<Session, SessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取所有过期会话的 ID
    fn get_expired_sessions(&self, idle_timeout_secs: u64) -> Vec<String>;

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;
}
