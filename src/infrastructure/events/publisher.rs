//! Event Publisher Implementation
//!
//! 会话事件推送（WebSocket 订阅端）

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::controller::Notice;
use crate::domain::session::SessionSnapshot;

const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// 会话事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SessionEvent {
    /// 会话状态变更
    StateChanged {
        session_id: String,
        snapshot: SessionSnapshot,
    },
    /// 可恢复的警告（例如版本回退）
    Warning {
        session_id: String,
        message: String,
    },
    /// 播放错误
    Error {
        session_id: String,
        message: String,
    },
    /// 会话关闭
    SessionClosed {
        session_id: String,
        reason: String,
    },
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<String, broadcast::Sender<SessionEvent>>,
    capacity: usize,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            session_channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<SessionEvent> {
        if let Some(sender) = self.session_channels.get(session_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(self.capacity);
        self.session_channels.insert(session_id.to_string(), tx);
        rx
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    /// 获取会话的事件接收器
    pub fn subscribe(&self, session_id: &str) -> Option<broadcast::Receiver<SessionEvent>> {
        self.session_channels.get(session_id).map(|s| s.subscribe())
    }

    /// 发布状态变更事件
    pub fn publish_state(&self, session_id: &str, snapshot: SessionSnapshot) {
        self.publish_to_session(
            session_id,
            SessionEvent::StateChanged {
                session_id: session_id.to_string(),
                snapshot,
            },
        );
    }

    /// 发布控制器提示
    pub fn publish_notice(&self, session_id: &str, notice: Notice) {
        let event = match notice {
            Notice::Warning(message) => SessionEvent::Warning {
                session_id: session_id.to_string(),
                message,
            },
            Notice::Error(message) => SessionEvent::Error {
                session_id: session_id.to_string(),
                message,
            },
        };
        self.publish_to_session(session_id, event);
    }

    /// 发布会话关闭事件
    pub fn publish_session_closed(&self, session_id: &str, reason: &str) {
        self.publish_to_session(
            session_id,
            SessionEvent::SessionClosed {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            },
        );
    }

    /// 发布事件到指定会话
    fn publish_to_session(&self, session_id: &str, event: SessionEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::trace!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
