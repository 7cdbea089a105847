//! Session Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::SessionManagerPort;
use crate::application::queries::session_queries::*;

/// GetSessionState Handler - 读取 worker 最近发布的快照
pub struct GetSessionStateHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl GetSessionStateHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(
        &self,
        query: GetSessionStateQuery,
    ) -> Result<SessionStateResponse, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;

        Ok(SessionStateResponse {
            snapshot: session.current(),
            session_id: session.id,
            created_at: session.created_at,
            last_activity: session.last_activity,
        })
    }
}

/// ListSessions Handler
pub struct ListSessionsHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl ListSessionsHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(
        &self,
        _query: ListSessionsQuery,
    ) -> Result<Vec<SessionSummary>, ApplicationError> {
        let mut sessions: Vec<SessionSummary> = self
            .session_manager
            .list_all()
            .into_iter()
            // 列举与读取之间会话可能已被关闭
            .filter_map(|id| self.session_manager.get(&id).ok())
            .map(|session| {
                let snapshot = session.current();
                SessionSummary {
                    session_id: session.id,
                    transport_state: snapshot.transport_state,
                    book_title: snapshot
                        .active_book
                        .map(|b| b.title().as_str().to_string()),
                    last_activity: session.last_activity,
                }
            })
            .collect();

        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(sessions)
    }
}
