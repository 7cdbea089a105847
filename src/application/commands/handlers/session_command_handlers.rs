//! Session Command Handlers

use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::application::commands::session_commands::*;
use crate::application::controller::Intent;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AdSourcePort, ContentResolverPort, OutputDriverFactoryPort, Session, SessionError,
    SessionManagerPort, SessionRequest,
};
use crate::domain::session::{Origin, SessionSnapshot};
use crate::infrastructure::events::EventPublisher;
use crate::infrastructure::worker::{PlaybackWorker, PlaybackWorkerConfig};

/// 投递请求，worker 已退出时视为会话关闭
async fn send_request(session: &Session, request: SessionRequest) -> Result<(), ApplicationError> {
    session
        .requests
        .send(request)
        .await
        .map_err(|_| SessionError::Closed(session.id.clone()).into())
}

/// 等待 worker 处理完此前投递的所有请求，返回最新快照
async fn sync_snapshot(session: &Session) -> Result<SessionSnapshot, ApplicationError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    send_request(session, SessionRequest::Sync(reply_tx)).await?;
    reply_rx
        .await
        .map_err(|_| SessionError::Closed(session.id.clone()).into())
}

/// MountSession Handler - 创建会话并启动 worker
pub struct MountSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    driver_factory: Arc<dyn OutputDriverFactoryPort>,
    ad_source: Arc<dyn AdSourcePort>,
    resolver: Arc<dyn ContentResolverPort>,
    event_publisher: Arc<EventPublisher>,
    worker_config: PlaybackWorkerConfig,
}

impl MountSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        driver_factory: Arc<dyn OutputDriverFactoryPort>,
        ad_source: Arc<dyn AdSourcePort>,
        resolver: Arc<dyn ContentResolverPort>,
        event_publisher: Arc<EventPublisher>,
        worker_config: PlaybackWorkerConfig,
    ) -> Self {
        Self {
            session_manager,
            driver_factory,
            ad_source,
            resolver,
            event_publisher,
            worker_config,
        }
    }

    pub async fn handle(
        &self,
        cmd: MountSessionCommand,
    ) -> Result<MountSessionResponse, ApplicationError> {
        let mut config = self.worker_config.clone();
        config.settings.session_id = Uuid::new_v4().to_string();
        let session_id = config.settings.session_id.clone();

        // 先注册事件通道，worker 的第一条状态推送不会丢
        self.event_publisher.register_session(&session_id);

        let (worker, session) = PlaybackWorker::new(
            config,
            self.driver_factory.create(),
            self.ad_source.clone(),
            self.resolver.clone(),
            self.event_publisher.clone(),
        );

        if let Err(e) = self.session_manager.create(session.clone()) {
            self.event_publisher.unregister_session(&session_id);
            return Err(e.into());
        }

        tokio::spawn(worker.run());

        if let Some(version) = cmd.version {
            send_request(
                &session,
                SessionRequest::Intent(Intent::SetVersion {
                    version,
                    autoplay: false,
                    origin: Origin::Programmatic,
                }),
            )
            .await?;
        }
        if cmd.book.is_some() {
            send_request(
                &session,
                SessionRequest::Intent(Intent::SetBook {
                    book: cmd.book,
                    autoplay: cmd.autoplay,
                    origin: Origin::Programmatic,
                }),
            )
            .await?;
        }

        let snapshot = sync_snapshot(&session).await?;

        tracing::info!(
            session_id = %session_id,
            active_book = ?snapshot.active_book.as_ref().map(|b| b.id()),
            active_version = %snapshot.active_version,
            "Listening session mounted"
        );

        Ok(MountSessionResponse {
            session_id,
            created_at: session.created_at,
            snapshot,
        })
    }
}

/// DispatchIntent Handler - 把意图投递给会话 worker
pub struct DispatchIntentHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl DispatchIntentHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub async fn handle(
        &self,
        cmd: DispatchIntentCommand,
    ) -> Result<DispatchIntentResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        self.session_manager.touch(&cmd.session_id);

        let intent = cmd.intent.name();
        tracing::debug!(session_id = %cmd.session_id, intent, "Dispatching intent");

        send_request(&session, SessionRequest::Intent(cmd.intent)).await?;
        let snapshot = sync_snapshot(&session).await?;

        Ok(DispatchIntentResponse {
            session_id: cmd.session_id,
            intent,
            snapshot,
        })
    }
}

/// UnmountSession Handler - 关闭会话并释放设备
pub struct UnmountSessionHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    event_publisher: Arc<EventPublisher>,
}

impl UnmountSessionHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            session_manager,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: UnmountSessionCommand,
    ) -> Result<UnmountSessionResponse, ApplicationError> {
        let session = self.session_manager.close(&cmd.session_id)?;

        // worker 可能已经退出，此时设备已随控制器释放
        if session.requests.send(SessionRequest::Close).await.is_err() {
            tracing::debug!(session_id = %cmd.session_id, "Worker already stopped");
        }

        // 发布会话关闭事件
        self.event_publisher
            .publish_session_closed(&cmd.session_id, &cmd.reason);

        // 取消注册事件通道
        self.event_publisher.unregister_session(&cmd.session_id);

        tracing::info!(
            session_id = %cmd.session_id,
            reason = %cmd.reason,
            "Listening session unmounted"
        );

        Ok(UnmountSessionResponse {
            session_id: cmd.session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::testing::{
        book, DriverCommand, FixedAdSource, MapResolver, RecordingDriverFactory,
    };
    use crate::domain::book::ContentVersion;
    use crate::domain::session::TransportState;
    use crate::infrastructure::memory::InMemorySessionManager;

    struct Fixture {
        session_manager: Arc<InMemorySessionManager>,
        factory: RecordingDriverFactory,
        publisher: Arc<EventPublisher>,
        mount: MountSessionHandler,
        dispatch: DispatchIntentHandler,
        unmount: UnmountSessionHandler,
    }

    fn fixture(resolver: MapResolver) -> Fixture {
        let session_manager = Arc::new(InMemorySessionManager::new());
        let factory = RecordingDriverFactory::new();
        let publisher = Arc::new(EventPublisher::new());
        let mount = MountSessionHandler::new(
            session_manager.clone(),
            Arc::new(factory.clone()),
            Arc::new(FixedAdSource::new()),
            Arc::new(resolver),
            publisher.clone(),
            PlaybackWorkerConfig::default(),
        );
        Fixture {
            dispatch: DispatchIntentHandler::new(session_manager.clone()),
            unmount: UnmountSessionHandler::new(session_manager.clone(), publisher.clone()),
            session_manager,
            factory,
            publisher,
            mount,
        }
    }

    #[tokio::test]
    async fn test_mount_applies_initial_book_without_sound() {
        let f = fixture(MapResolver::all_versions());
        let b = book("B1");

        let resp = f
            .mount
            .handle(MountSessionCommand {
                book: Some(b.clone()),
                version: Some(ContentVersion::Shortened),
                autoplay: true,
            })
            .await
            .unwrap();

        assert!(f.session_manager.is_valid(&resp.session_id));
        assert_eq!(resp.snapshot.active_book.as_ref(), Some(&b));
        assert_eq!(resp.snapshot.active_version, ContentVersion::Shortened);
        // 程序触发的自动播放在用户交互前只会被延迟
        assert!(resp.snapshot.deferred_play);
        assert_ne!(resp.snapshot.transport_state, TransportState::AdPlaying);
        let driver = &f.factory.created()[0];
        assert!(!driver.commands().contains(&DriverCommand::Play));
    }

    #[tokio::test]
    async fn test_dispatch_returns_processed_snapshot() {
        let f = fixture(MapResolver::all_versions());
        let resp = f
            .mount
            .handle(MountSessionCommand {
                book: Some(book("B1")),
                ..MountSessionCommand::default()
            })
            .await
            .unwrap();

        let dispatched = f
            .dispatch
            .handle(DispatchIntentCommand {
                session_id: resp.session_id.clone(),
                intent: Intent::Play {
                    origin: Origin::Gesture,
                },
            })
            .await
            .unwrap();

        assert_eq!(dispatched.intent, "play");
        assert_eq!(dispatched.snapshot.transport_state, TransportState::AdPlaying);
        assert!(dispatched.snapshot.has_user_interacted);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_session() {
        let f = fixture(MapResolver::all_versions());
        let err = f
            .dispatch
            .handle(DispatchIntentCommand {
                session_id: "missing".to_string(),
                intent: Intent::Gesture,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unmount_releases_device_and_notifies() {
        let f = fixture(MapResolver::all_versions());
        let resp = f
            .mount
            .handle(MountSessionCommand::default())
            .await
            .unwrap();
        let mut events = f.publisher.subscribe(&resp.session_id).unwrap();

        f.unmount
            .handle(UnmountSessionCommand::client_close(&resp.session_id))
            .await
            .unwrap();

        assert!(!f.session_manager.is_valid(&resp.session_id));
        assert!(f.publisher.subscribe(&resp.session_id).is_none());

        let mut closed = false;
        while let Ok(event) = events.try_recv() {
            if let crate::infrastructure::events::SessionEvent::SessionClosed { reason, .. } = event {
                assert_eq!(reason, "client_close");
                closed = true;
            }
        }
        assert!(closed);

        let driver = f.factory.created()[0].clone();
        tokio::time::timeout(std::time::Duration::from_secs(2), async move {
            while driver.commands().last() != Some(&DriverCommand::Release) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("driver not released");

        let err = f
            .unmount
            .handle(UnmountSessionCommand::client_close(&resp.session_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }
}
