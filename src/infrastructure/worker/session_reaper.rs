//! Session Reaper - 空闲会话回收

use std::sync::Arc;
use std::time::Duration;

use crate::application::commands::handlers::UnmountSessionHandler;
use crate::application::commands::UnmountSessionCommand;
use crate::application::ports::SessionManagerPort;

/// 回收配置
#[derive(Debug, Clone)]
pub struct SessionReaperConfig {
    /// 扫描间隔
    pub interval: Duration,
    /// 空闲多久视为过期（秒）
    pub session_expire_secs: u64,
}

impl Default for SessionReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            session_expire_secs: 1800,
        }
    }
}

/// 空闲会话回收器
pub struct SessionReaper {
    config: SessionReaperConfig,
    session_manager: Arc<dyn SessionManagerPort>,
    unmount: Arc<UnmountSessionHandler>,
}

impl SessionReaper {
    pub fn new(
        config: SessionReaperConfig,
        session_manager: Arc<dyn SessionManagerPort>,
        unmount: Arc<UnmountSessionHandler>,
    ) -> Self {
        Self {
            config,
            session_manager,
            unmount,
        }
    }

    /// 启动回收循环
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            session_expire_secs = self.config.session_expire_secs,
            "SessionReaper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// 回收一轮，返回关闭的会话数
    pub async fn sweep(&self) -> usize {
        let expired = self
            .session_manager
            .get_expired_sessions(self.config.session_expire_secs);

        let mut closed = 0;
        for session_id in expired {
            // 正在播放的会话不算空闲
            if self.is_playing(&session_id) {
                self.session_manager.touch(&session_id);
                tracing::debug!(session_id = %session_id, "Session still playing, not reaped");
                continue;
            }

            match self
                .unmount
                .handle(UnmountSessionCommand::idle_timeout(&session_id))
                .await
            {
                Ok(_) => closed += 1,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Failed to reap session")
                }
            }
        }

        if closed > 0 {
            tracing::info!(closed, "Idle sessions reaped");
        }
        closed
    }

    fn is_playing(&self, session_id: &str) -> bool {
        self.session_manager
            .get(session_id)
            .map(|session| {
                let snapshot = session.current();
                snapshot.transport_state.is_playing() || snapshot.pending_play
            })
            .unwrap_or(false)
    }
}
