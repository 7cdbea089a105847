//! Playback Worker - 会话串行执行器
//!
//! 每个会话一个 tokio 任务：串行处理 UI 意图与设备事件，控制器与设备只在这里被访问

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::application::controller::{PlaybackController, PlaybackSettings};
use crate::application::ports::{
    AdSourcePort, ContentResolverPort, DriverEventReceiver, OutputDriverPort, Session,
    SessionRequest,
};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct PlaybackWorkerConfig {
    /// 控制器设置（含会话 ID）
    pub settings: PlaybackSettings,
    /// 意图队列容量
    pub queue_capacity: usize,
}

impl Default for PlaybackWorkerConfig {
    fn default() -> Self {
        Self {
            settings: PlaybackSettings::default(),
            queue_capacity: 64,
        }
    }
}

/// 播放 Worker
pub struct PlaybackWorker {
    session_id: String,
    controller: PlaybackController,
    requests: mpsc::Receiver<SessionRequest>,
    driver_events: DriverEventReceiver,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    event_publisher: Arc<EventPublisher>,
}

impl PlaybackWorker {
    /// 创建 worker 及其会话句柄
    pub fn new(
        config: PlaybackWorkerConfig,
        mut driver: Box<dyn OutputDriverPort>,
        ad_source: Arc<dyn AdSourcePort>,
        resolver: Arc<dyn ContentResolverPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> (Self, Session) {
        let session_id = config.settings.session_id.clone();
        let driver_events = driver.subscribe();
        let controller = PlaybackController::new(config.settings, driver, ad_source, resolver);

        let (request_tx, request_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let session = Session::with_id(session_id.clone(), request_tx, snapshot_rx);

        let worker = Self {
            session_id,
            controller,
            requests: request_rx,
            driver_events,
            snapshot_tx,
            event_publisher,
        };
        (worker, session)
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "PlaybackWorker started");

        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(SessionRequest::Intent(intent)) => self.controller.dispatch(intent),
                    Some(SessionRequest::Sync(reply)) => {
                        let _ = reply.send(self.controller.snapshot());
                    }
                    Some(SessionRequest::Close) | None => break,
                },
                Some(event) = self.driver_events.recv() => {
                    self.controller.handle_event(event);
                }
            }
            self.publish();
        }

        self.controller.close();
        self.publish();

        tracing::info!(session_id = %self.session_id, "PlaybackWorker stopped");
    }

    /// 把提示和变化后的快照推给订阅端
    fn publish(&mut self) {
        for notice in self.controller.drain_notices() {
            self.event_publisher.publish_notice(&self.session_id, notice);
        }

        let snapshot = self.controller.snapshot();
        let changed = self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot.clone();
            true
        });
        if changed {
            self.event_publisher.publish_state(&self.session_id, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::testing::{book, FixedAdSource, MapResolver, RecordingDriver};
    use crate::application::controller::Intent;
    use crate::application::ports::{DriverEvent, DriverEventKind};
    use crate::domain::session::{Origin, TransportState};
    use crate::infrastructure::events::SessionEvent;
    use std::time::Duration;

    fn spawn_worker() -> (Session, RecordingDriver, Arc<EventPublisher>, tokio::task::JoinHandle<()>) {
        let driver = RecordingDriver::new();
        let publisher = Arc::new(EventPublisher::new());
        let config = PlaybackWorkerConfig {
            settings: PlaybackSettings {
                session_id: "worker-test".to_string(),
                ..PlaybackSettings::default()
            },
            queue_capacity: 8,
        };
        publisher.register_session("worker-test");
        let (worker, session) = PlaybackWorker::new(
            config,
            Box::new(driver.clone()),
            Arc::new(FixedAdSource::new()),
            Arc::new(MapResolver::all_versions()),
            publisher.clone(),
        );
        let handle = tokio::spawn(worker.run());
        (session, driver, publisher, handle)
    }

    async fn wait_for<F>(session: &mut Session, predicate: F)
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if predicate(&session.snapshot.borrow_and_update()) {
                    return;
                }
                session.snapshot.changed().await.unwrap();
            }
        })
        .await
        .expect("snapshot condition not reached");
    }

    #[tokio::test]
    async fn test_worker_runs_preroll_then_book() {
        let (mut session, driver, _publisher, handle) = spawn_worker();

        session
            .requests
            .send(SessionRequest::Intent(Intent::SetBook {
                book: Some(book("B1")),
                autoplay: false,
                origin: Origin::Gesture,
            }))
            .await
            .unwrap();
        session
            .requests
            .send(SessionRequest::Intent(Intent::Play {
                origin: Origin::Gesture,
            }))
            .await
            .unwrap();

        wait_for(&mut session, |s| s.transport_state == TransportState::AdPlaying).await;

        driver.emit(DriverEvent::new(driver.last_generation(), DriverEventKind::Finished));
        wait_for(&mut session, |s| s.transport_state == TransportState::BookPlaying).await;
        assert!(session.current().ad_played_for_session);

        session.requests.send(SessionRequest::Close).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_publishes_notices_and_state() {
        let (session, _driver, publisher, handle) = spawn_worker();
        let mut events = publisher.subscribe("worker-test").unwrap();

        session
            .requests
            .send(SessionRequest::Intent(Intent::Play {
                origin: Origin::Gesture,
            }))
            .await
            .unwrap();

        let mut saw_warning = false;
        let mut saw_state = false;
        while !(saw_warning && saw_state) {
            let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
                .await
                .expect("no event")
                .unwrap();
            match event {
                SessionEvent::Warning { .. } => saw_warning = true,
                SessionEvent::StateChanged { .. } => saw_state = true,
                _ => {}
            }
        }

        drop(session);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_reflects_preceding_intents() {
        let (session, _driver, _publisher, handle) = spawn_worker();

        session
            .requests
            .send(SessionRequest::Intent(Intent::SetVolume { volume: 0.25 }))
            .await
            .unwrap();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        session
            .requests
            .send(SessionRequest::Sync(reply_tx))
            .await
            .unwrap();

        let snapshot = reply_rx.await.unwrap();
        assert!((snapshot.volume - 0.25).abs() < f32::EPSILON);

        session.requests.send(SessionRequest::Close).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_releases_driver_on_close() {
        let (session, driver, _publisher, handle) = spawn_worker();
        session.requests.send(SessionRequest::Close).await.unwrap();
        handle.await.unwrap();

        assert_eq!(
            driver.commands().last(),
            Some(&crate::application::controller::testing::DriverCommand::Release)
        );
    }
}
