//! HTTP Server
//!
//! Axum HTTP 服务器启动、关闭，以及关闭时回收仍在运行的收听会话

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::application::UnmountSessionCommand;
use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    pub(crate) fn build_router(&self) -> Router {
        // 收听界面可能由其他来源托管
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(Duration::from_secs(3600));

        create_routes()
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    ///
    /// 停止接收请求后卸载所有会话，等待各自的 worker 释放播放设备
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        let drained = self.drain_sessions().await;
        info!(drained, "Listening sessions closed");

        Ok(())
    }

    /// 卸载所有会话并等待 worker 退出，返回卸载的会话数
    pub async fn drain_sessions(&self) -> usize {
        let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        let mut drained = 0;

        for session_id in self.state.session_manager.list_all() {
            let Ok(mut session) = self.state.session_manager.get(&session_id) else {
                continue;
            };

            if let Err(e) = self
                .state
                .unmount_session_handler
                .handle(UnmountSessionCommand::server_shutdown(&session_id))
                .await
            {
                warn!(session_id = %session_id, error = %e, "Failed to unmount session on shutdown");
                continue;
            }
            drained += 1;

            // worker 退出时快照发送端随之释放
            let stopped = tokio::time::timeout(timeout, async {
                while session.snapshot.changed().await.is_ok() {}
            })
            .await;
            if stopped.is_err() {
                warn!(session_id = %session_id, "Session worker did not stop in time");
            }
        }

        drained
    }
}
