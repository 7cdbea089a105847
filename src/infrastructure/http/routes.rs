//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/session/mount     POST  挂载收听会话（可带初始书籍与版本）
//! - /api/session/unmount   POST  卸载会话
//! - /api/session/state     POST  读取会话快照
//! - /api/session/list      GET   列出会话
//! - /api/session/play      POST  播放
//! - /api/session/pause     POST  暂停
//! - /api/session/seek      POST  跳转
//! - /api/session/skip      POST  快进/快退
//! - /api/session/version   POST  切换内容版本
//! - /api/session/book      POST  切换书籍
//! - /api/session/volume    POST  设置音量
//! - /api/session/gesture   POST  上报用户手势
//! - /ws/session/{id}       WS    会话事件推送

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/session/:session_id", get(handlers::websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/session", session_routes())
}

/// Session 路由
fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/mount", post(handlers::mount_session))
        .route("/unmount", post(handlers::unmount_session))
        .route("/state", post(handlers::get_session_state))
        .route("/list", get(handlers::list_sessions))
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/seek", post(handlers::seek))
        .route("/skip", post(handlers::skip))
        .route("/version", post(handlers::set_version))
        .route("/book", post(handlers::set_book))
        .route("/volume", post(handlers::set_volume))
        .route("/gesture", post(handlers::gesture))
}
