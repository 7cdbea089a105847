//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    DispatchIntentHandler, MountSessionHandler, UnmountSessionHandler,
    // Query handlers
    GetSessionStateHandler, ListSessionsHandler,
    // Ports
    AdSourcePort, ContentResolverPort, OutputDriverFactoryPort, SessionManagerPort,
};
use crate::domain::book::ContentVersion;
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::PlaybackWorkerConfig;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub event_publisher: Arc<EventPublisher>,
    /// 无法识别的版本标签回退到此版本
    pub default_version: ContentVersion,

    // ========== Command Handlers ==========
    pub mount_session_handler: MountSessionHandler,
    pub dispatch_intent_handler: DispatchIntentHandler,
    pub unmount_session_handler: Arc<UnmountSessionHandler>,

    // ========== Query Handlers ==========
    pub get_session_state_handler: GetSessionStateHandler,
    pub list_sessions_handler: ListSessionsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        driver_factory: Arc<dyn OutputDriverFactoryPort>,
        ad_source: Arc<dyn AdSourcePort>,
        resolver: Arc<dyn ContentResolverPort>,
        event_publisher: Arc<EventPublisher>,
        worker_config: PlaybackWorkerConfig,
    ) -> Self {
        Self {
            // Ports
            session_manager: session_manager.clone(),
            event_publisher: event_publisher.clone(),
            default_version: worker_config.settings.default_version,

            // Command handlers
            mount_session_handler: MountSessionHandler::new(
                session_manager.clone(),
                driver_factory,
                ad_source,
                resolver,
                event_publisher.clone(),
                worker_config,
            ),
            dispatch_intent_handler: DispatchIntentHandler::new(session_manager.clone()),
            unmount_session_handler: Arc::new(UnmountSessionHandler::new(
                session_manager.clone(),
                event_publisher,
            )),

            // Query handlers
            get_session_state_handler: GetSessionStateHandler::new(session_manager.clone()),
            list_sessions_handler: ListSessionsHandler::new(session_manager),
        }
    }
}
