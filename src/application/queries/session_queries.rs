//! Session Queries - 会话查询

use chrono::{DateTime, Utc};

use crate::domain::session::{SessionSnapshot, TransportState};

/// 获取会话状态查询
#[derive(Debug, Clone)]
pub struct GetSessionStateQuery {
    pub session_id: String,
}

/// 会话状态响应
#[derive(Debug, Clone)]
pub struct SessionStateResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub snapshot: SessionSnapshot,
}

/// 列出会话查询
#[derive(Debug, Clone, Default)]
pub struct ListSessionsQuery;

/// 会话摘要
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub transport_state: TransportState,
    pub book_title: Option<String>,
    pub last_activity: DateTime<Utc>,
}
