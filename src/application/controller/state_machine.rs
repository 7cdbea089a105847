//! Playback Controller - 播放状态机
//!
//! 把用户意图与设备生命周期事件串行化到同一个输出设备上：
//! 前贴片广告 -> 书籍内容 -> 版本切换 -> 暂停/跳转

use std::sync::Arc;

use super::{Intent, Notice};
use crate::application::ports::{
    AdContext, AdSourcePort, ContentResolverPort, DriverEvent, DriverEventKind, DriverFailure,
    Generation, OutputDriverPort, ResolveError,
};
use crate::domain::book::{Book, ContentVersion};
use crate::domain::session::{
    AudioResourceRef, BookResource, EpochId, Origin, PendingIntent, PlaybackMode, PlaybackModeKind,
    SessionSnapshot, SessionState, TransportState,
};

/// 控制器设置
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// 所属会话 ID（日志与广告上下文）
    pub session_id: String,
    /// 版本不可用时的回退版本
    pub default_version: ContentVersion,
    /// 快进/快退默认步长（秒）
    pub skip_seconds: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            default_version: ContentVersion::default(),
            skip_seconds: 15.0,
        }
    }
}

/// 播放控制器
///
/// 独占设备句柄。所有方法都是同步的，异步结果以 `DriverEvent` 形式回到 `handle_event`。
pub struct PlaybackController {
    settings: PlaybackSettings,
    state: SessionState,
    driver: Box<dyn OutputDriverPort>,
    ad_source: Arc<dyn AdSourcePort>,
    resolver: Arc<dyn ContentResolverPort>,
    /// 当前有效的命令代数
    generation: Generation,
    /// 设备上是否挂载了资源
    loaded: bool,
    /// 已发出 stop、尚未收到 Emptied 的代数
    teardown: Option<Generation>,
    notices: Vec<Notice>,
}

impl PlaybackController {
    pub fn new(
        settings: PlaybackSettings,
        driver: Box<dyn OutputDriverPort>,
        ad_source: Arc<dyn AdSourcePort>,
        resolver: Arc<dyn ContentResolverPort>,
    ) -> Self {
        let state = SessionState::new(settings.default_version);
        Self {
            settings,
            state,
            driver,
            ad_source,
            resolver,
            generation: Generation::default(),
            loaded: false,
            teardown: None,
            notices: Vec::new(),
        }
    }

    /// 统一入口
    pub fn dispatch(&mut self, intent: Intent) {
        tracing::debug!(
            session_id = %self.settings.session_id,
            intent = intent.name(),
            transport = self.state.transport().as_str(),
            "Dispatching intent"
        );

        match intent {
            Intent::Play { origin } => self.play(origin),
            Intent::Pause { origin } => self.pause(origin),
            Intent::Seek { position, origin } => self.seek(position, origin),
            Intent::SkipForward { seconds, origin } => {
                let seconds = seconds.unwrap_or(self.settings.skip_seconds);
                self.skip_forward(seconds, origin)
            }
            Intent::SkipBackward { seconds, origin } => {
                let seconds = seconds.unwrap_or(self.settings.skip_seconds);
                self.skip_backward(seconds, origin)
            }
            Intent::SetVersion {
                version,
                autoplay,
                origin,
            } => {
                if autoplay {
                    self.set_version_and_play(version, origin);
                } else {
                    self.note_origin(origin);
                    self.set_version(version);
                }
            }
            Intent::SetBook {
                book,
                autoplay,
                origin,
            } => {
                if autoplay {
                    self.set_book_and_play(book, origin);
                } else {
                    self.note_origin(origin);
                    self.set_book(book);
                }
            }
            Intent::SetVolume { volume } => self.set_volume(volume),
            Intent::Gesture => self.notify_gesture(),
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn play(&mut self, origin: Origin) {
        self.note_origin(origin);

        if self.state.active_book().is_none() {
            self.warn("No book selected");
            return;
        }

        if self.state.transport().is_playing() {
            return;
        }

        // 自动播放策略：交互之前不向设备发出任何命令
        if !self.state.has_user_interacted() {
            self.state.set_deferred_play(true);
            tracing::info!(
                session_id = %self.settings.session_id,
                "Play deferred until first user gesture"
            );
            return;
        }
        self.state.set_deferred_play(false);

        // 上一次切换的卸载尚未完成，等 Emptied 后再播放
        if self.teardown.is_some() {
            let intent = self.current_intent();
            self.state.set_pending_intent(Some(intent));
            tracing::debug!(
                session_id = %self.settings.session_id,
                epoch = intent.epoch.value(),
                "Play queued behind device teardown"
            );
            return;
        }

        match self.state.mode().kind() {
            PlaybackModeKind::Ad => {
                self.state.resume();
                self.driver.play();
            }
            PlaybackModeKind::Book => {
                let at_end = matches!(
                    self.state.duration(),
                    Some(duration) if duration > 0.0 && self.state.current_time() >= duration
                );
                if at_end {
                    self.driver.seek(0.0);
                    self.state.set_current_time(0.0);
                }
                self.state.resume();
                self.driver.play();
            }
            PlaybackModeKind::None => {
                if self.state.ad_played_for_session() {
                    self.start_book();
                } else {
                    self.start_ad();
                }
            }
        }
    }

    pub fn pause(&mut self, origin: Origin) {
        self.note_origin(origin);
        self.state.set_deferred_play(false);
        self.state.set_pending_intent(None);

        if self.loaded && self.state.transport().is_playing() {
            self.driver.pause();
        }
        self.state.pause();

        tracing::debug!(session_id = %self.settings.session_id, "Paused");
    }

    pub fn seek(&mut self, position: f64, origin: Origin) {
        self.note_origin(origin);

        if !self.state.mode().is_book() {
            tracing::debug!(
                session_id = %self.settings.session_id,
                mode = ?self.state.mode().kind(),
                "Seek ignored, no book mounted"
            );
            return;
        }

        let target = self.state.clamp_position(position);
        self.driver.seek(target);
        self.state.set_current_time(target);
    }

    pub fn skip_forward(&mut self, seconds: f64, origin: Origin) {
        let target = self.state.current_time() + seconds.abs();
        self.seek(target, origin);
    }

    pub fn skip_backward(&mut self, seconds: f64, origin: Origin) {
        let target = self.state.current_time() - seconds.abs();
        self.seek(target, origin);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let volume = self.state.set_volume(volume);
        if self.loaded {
            self.driver.set_volume(volume);
        }
    }

    /// 真实用户手势：解锁自动播放并重放被拦截的播放请求
    pub fn notify_gesture(&mut self) {
        self.note_origin(Origin::Gesture);
        if self.state.deferred_play() {
            self.state.set_deferred_play(false);
            tracing::info!(
                session_id = %self.settings.session_id,
                "Replaying deferred play after gesture"
            );
            self.play(Origin::Gesture);
        }
    }

    // ========================================================================
    // Epoch switching
    // ========================================================================

    pub fn set_version(&mut self, version: ContentVersion) -> EpochId {
        let book = self.state.active_book().cloned();
        self.switch_epoch(book, version)
    }

    pub fn set_book(&mut self, book: Option<Book>) -> EpochId {
        let version = self.state.active_version();
        self.switch_epoch(book.map(Arc::new), version)
    }

    pub fn set_version_and_play(&mut self, version: ContentVersion, origin: Origin) {
        self.note_origin(origin);
        self.set_version(version);
        self.request_play_after_switch();
    }

    pub fn set_book_and_play(&mut self, book: Option<Book>, origin: Origin) {
        self.note_origin(origin);
        self.set_book(book);
        self.request_play_after_switch();
    }

    // ========================================================================
    // Device events
    // ========================================================================

    pub fn handle_event(&mut self, event: DriverEvent) {
        if event.kind == DriverEventKind::Emptied {
            if self.teardown == Some(event.generation) {
                self.teardown = None;
                self.settle_pending();
            } else {
                tracing::trace!(generation = %event.generation, "Stale emptied event");
            }
            return;
        }

        if !self.loaded || event.generation != self.generation {
            tracing::trace!(
                session_id = %self.settings.session_id,
                event_generation = %event.generation,
                current_generation = %self.generation,
                "Discarding stale device event"
            );
            return;
        }

        match event.kind {
            DriverEventKind::Ready => {
                tracing::debug!(session_id = %self.settings.session_id, "Resource ready");
            }
            DriverEventKind::TimeUpdate(position) => {
                if self.state.mode().is_book() {
                    self.state.set_current_time(position);
                }
            }
            DriverEventKind::DurationKnown(duration) => {
                if self.state.mode().is_book() {
                    self.state.set_duration(duration);
                }
            }
            DriverEventKind::Finished => match self.state.mode().kind() {
                PlaybackModeKind::Ad => self.on_ad_finished(),
                PlaybackModeKind::Book => {
                    self.state.complete_book();
                    tracing::info!(session_id = %self.settings.session_id, "Book finished");
                }
                PlaybackModeKind::None => {}
            },
            DriverEventKind::Failed(DriverFailure::NotAllowed) => {
                // 策略拦截不是错误：回滚乐观状态，等下一次手势
                self.state.roll_back_play();
                self.state.set_deferred_play(true);
                tracing::info!(
                    session_id = %self.settings.session_id,
                    "Device blocked playback, waiting for a user gesture"
                );
            }
            DriverEventKind::Failed(failure) => {
                let message = format!("Playback failed: {}", failure);
                tracing::warn!(
                    session_id = %self.settings.session_id,
                    mode = ?self.state.mode().kind(),
                    error = %failure,
                    "Device playback error"
                );
                self.state.fail(message.clone());
                self.state.set_pending_intent(None);
                self.notices.push(Notice::Error(message));
            }
            DriverEventKind::Emptied => {}
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// 会话销毁：停止并释放设备
    pub fn close(&mut self) {
        if self.loaded {
            self.generation = self.generation.next();
            self.driver.stop(self.generation);
            self.loaded = false;
        }
        self.teardown = None;
        self.driver.release();
        tracing::debug!(session_id = %self.settings.session_id, "Output device released");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn note_origin(&mut self, origin: Origin) {
        if origin == Origin::Gesture && self.state.mark_interacted() {
            tracing::info!(session_id = %self.settings.session_id, "First user gesture recorded");
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(session_id = %self.settings.session_id, warning = %message, "Playback warning");
        self.state.set_warning(Some(message.clone()));
        self.notices.push(Notice::Warning(message));
    }

    fn current_intent(&self) -> PendingIntent {
        PendingIntent {
            epoch: self.state.epoch(),
            book_id: self.state.active_book().map(|b| b.id()),
            version: self.state.active_version(),
        }
    }

    fn switch_epoch(&mut self, book: Option<Arc<Book>>, version: ContentVersion) -> EpochId {
        let (version, fallback_warning) = self.validate_version(book.as_deref(), version);

        let epoch = self.state.begin_epoch(book, version);
        if self.loaded {
            self.generation = self.generation.next();
            self.driver.stop(self.generation);
            self.teardown = Some(self.generation);
            self.loaded = false;
        }

        if let Some(message) = fallback_warning {
            self.warn(message);
        }

        tracing::info!(
            session_id = %self.settings.session_id,
            epoch = epoch.value(),
            book_id = ?self.state.active_book().map(|b| b.id()),
            version = %self.state.active_version(),
            transport = self.state.transport().as_str(),
            "Epoch switched"
        );
        epoch
    }

    /// 请求的版本对该书不可解析时替换为默认版本
    fn validate_version(
        &self,
        book: Option<&Book>,
        version: ContentVersion,
    ) -> (ContentVersion, Option<String>) {
        let Some(book) = book else {
            return (version, None);
        };
        let default = self.settings.default_version;
        if version == default || self.resolver.supports(book, version) {
            return (version, None);
        }
        let message = format!(
            "Version '{}' is not available for '{}', using '{}'",
            version,
            book.title(),
            default
        );
        (default, Some(message))
    }

    fn request_play_after_switch(&mut self) {
        let intent = self.current_intent();
        self.state.set_pending_intent(Some(intent));
        self.settle_pending();
    }

    /// 卸载完成后执行挂起的播放意图
    fn settle_pending(&mut self) {
        if self.teardown.is_some() {
            return;
        }
        let Some(intent) = self.state.take_pending_intent() else {
            return;
        };
        if intent.epoch != self.state.epoch() {
            tracing::debug!(
                session_id = %self.settings.session_id,
                intent_epoch = intent.epoch.value(),
                current_epoch = self.state.epoch().value(),
                "Pending play superseded"
            );
            return;
        }
        self.play(Origin::Programmatic);
    }

    fn mount(&mut self, resource: &AudioResourceRef) -> Generation {
        if self.loaded {
            self.driver.pause();
        }
        self.generation = self.generation.next();
        self.driver.load(resource, self.generation);
        self.driver.set_volume(self.state.volume());
        self.loaded = true;
        self.generation
    }

    fn start_ad(&mut self) {
        let Some(book) = self.state.active_book().cloned() else {
            return;
        };
        let context = AdContext {
            session_id: self.settings.session_id.clone(),
            book_id: book.id(),
            version: self.state.active_version(),
        };
        let asset = self.ad_source.next_ad(&context);
        let generation = self.mount(&asset.audio);

        tracing::info!(
            session_id = %self.settings.session_id,
            ad_id = %asset.id,
            generation = %generation,
            "Starting pre-roll"
        );

        self.state.start_ad(PlaybackMode::Ad(asset));
        self.driver.play();
    }

    fn start_book(&mut self) {
        let Some(book) = self.state.active_book().cloned() else {
            return;
        };

        let resource = match self.resolve_with_fallback(&book, self.state.active_version()) {
            Ok(resource) => resource,
            Err(e) => {
                let message = format!("Cannot play '{}': {}", book.title(), e);
                tracing::error!(session_id = %self.settings.session_id, error = %e, "Resolution failed");
                self.state.fail(message.clone());
                self.notices.push(Notice::Error(message));
                return;
            }
        };

        let generation = self.mount(&resource.audio);
        tracing::info!(
            session_id = %self.settings.session_id,
            book_id = %resource.book_id,
            version = %resource.version,
            generation = %generation,
            url = %resource.audio.url,
            "Starting book playback"
        );

        self.state.start_book(PlaybackMode::Book(resource));
        self.driver.play();
    }

    fn resolve_with_fallback(
        &mut self,
        book: &Book,
        version: ContentVersion,
    ) -> Result<BookResource, ResolveError> {
        match self.resolver.resolve(book, version) {
            Ok(audio) => Ok(BookResource {
                book_id: book.id(),
                version,
                audio,
            }),
            Err(e) if version != self.settings.default_version => {
                let default = self.settings.default_version;
                let audio = self.resolver.resolve(book, default)?;
                self.warn(format!("{}, falling back to '{}'", e, default));
                Ok(BookResource {
                    book_id: book.id(),
                    version: default,
                    audio,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn on_ad_finished(&mut self) {
        let was_playing = self.state.transport() == TransportState::AdPlaying;
        self.state.complete_ad();

        tracing::info!(
            session_id = %self.settings.session_id,
            epoch = self.state.epoch().value(),
            "Pre-roll completed"
        );

        if !was_playing {
            return;
        }

        if self.state.has_user_interacted() && self.state.active_book().is_some() {
            self.start_book();
        } else {
            self.state.set_transport(TransportState::Idle);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if self.loaded {
            self.driver.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::controller::testing::{
        book, DriverCommand, FixedAdSource, MapResolver, RecordingDriver,
    };

    struct Harness {
        controller: PlaybackController,
        driver: RecordingDriver,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_resolver(MapResolver::all_versions())
        }

        fn with_resolver(resolver: MapResolver) -> Self {
            let driver = RecordingDriver::new();
            let controller = PlaybackController::new(
                PlaybackSettings {
                    session_id: "test".to_string(),
                    default_version: ContentVersion::Original,
                    skip_seconds: 15.0,
                },
                Box::new(driver.clone()),
                Arc::new(FixedAdSource::new()),
                Arc::new(resolver),
            );
            Self { controller, driver }
        }

        fn emit(&mut self, kind: DriverEventKind) {
            let generation = self.driver.last_generation();
            self.controller.handle_event(DriverEvent::new(generation, kind));
        }

        fn empty_last_stop(&mut self) {
            let generation = self.driver.last_stop_generation().expect("no stop issued");
            self.controller
                .handle_event(DriverEvent::new(generation, DriverEventKind::Emptied));
        }

        /// B1 选中、用户已交互、前贴片结束、书籍正在播放
        fn playing_book(duration: f64) -> Self {
            let mut h = Self::new();
            h.controller.set_book(Some(book("B1")));
            h.controller.play(Origin::Gesture);
            h.emit(DriverEventKind::Finished);
            h.emit(DriverEventKind::DurationKnown(duration));
            h.driver.clear();
            h
        }
    }

    #[test]
    fn test_scenario_a_preroll_then_book() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.set_version(ContentVersion::Original);
        h.controller.play(Origin::Gesture);

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::AdPlaying);
        assert_eq!(snapshot.playback_mode, PlaybackModeKind::Ad);
        assert!(snapshot.ad_playing);
        assert_eq!(h.driver.loads(), vec!["http://ads/house.mp3".to_string()]);
        assert!(h.driver.commands().contains(&DriverCommand::Play));

        h.emit(DriverEventKind::Finished);

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::BookPlaying);
        assert_eq!(snapshot.playback_mode, PlaybackModeKind::Book);
        assert!(snapshot.ad_played_for_session);
        assert_eq!(
            h.driver.loads(),
            vec![
                "http://ads/house.mp3".to_string(),
                "http://books/B1/original.mp3".to_string()
            ]
        );
    }

    #[test]
    fn test_book_load_issued_exactly_once_after_ad() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        let ad_generation = h.driver.last_generation();

        h.emit(DriverEventKind::Finished);
        // 同一广告的重复 finished 已经过期
        h.controller
            .handle_event(DriverEvent::new(ad_generation, DriverEventKind::Finished));

        let book_loads = h
            .driver
            .loads()
            .into_iter()
            .filter(|url| url.contains("/books/"))
            .count();
        assert_eq!(book_loads, 1);
    }

    #[test]
    fn test_scenario_b_version_switch_replays_ad() {
        let mut h = Harness::playing_book(600.0);
        h.controller.set_version(ContentVersion::Shortened);

        let snapshot = h.controller.snapshot();
        assert!(!snapshot.ad_played_for_session);
        assert_eq!(snapshot.playback_mode, PlaybackModeKind::None);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert!(matches!(h.driver.commands()[0], DriverCommand::Stop(_)));

        h.empty_last_stop();
        h.controller.play(Origin::Gesture);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::AdPlaying);

        h.emit(DriverEventKind::Finished);
        assert_eq!(
            h.driver.loads(),
            vec![
                "http://ads/house.mp3".to_string(),
                "http://books/B1/shortened.mp3".to_string()
            ]
        );
    }

    #[test]
    fn test_scenario_c_play_before_gesture_is_deferred() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Programmatic);

        let snapshot = h.controller.snapshot();
        assert!(!snapshot.has_user_interacted);
        assert!(snapshot.deferred_play);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert!(h.driver.commands().is_empty());

        h.controller.play(Origin::Gesture);
        let snapshot = h.controller.snapshot();
        assert!(snapshot.has_user_interacted);
        assert!(!snapshot.deferred_play);
        assert_eq!(snapshot.transport_state, TransportState::AdPlaying);
    }

    #[test]
    fn test_gesture_replays_deferred_play() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Programmatic);
        h.controller.notify_gesture();

        assert_eq!(h.controller.snapshot().transport_state, TransportState::AdPlaying);
        assert_eq!(h.driver.loads().len(), 1);
    }

    #[test]
    fn test_device_policy_rejection_is_deferred_not_error() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        h.emit(DriverEventKind::Failed(DriverFailure::NotAllowed));

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert!(snapshot.deferred_play);
        assert!(snapshot.error.is_none());
        assert!(h.controller.drain_notices().is_empty());

        h.driver.clear();
        h.controller.notify_gesture();
        // 广告仍挂载：直接恢复，不重新加载
        assert_eq!(h.driver.commands(), vec![DriverCommand::Play]);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::AdPlaying);
    }

    #[test]
    fn test_scenario_d_device_failure_during_book() {
        let mut h = Harness::playing_book(600.0);
        h.emit(DriverEventKind::Failed(DriverFailure::Network("reset".to_string())));

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::Idle);
        assert_eq!(snapshot.playback_mode, PlaybackModeKind::None);
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.active_book.map(|b| b.title().to_string()), Some("B1".to_string()));
        assert!(matches!(h.controller.drain_notices().as_slice(), [Notice::Error(_)]));

        // 重试：前贴片已完成，直接加载书籍
        h.controller.play(Origin::Gesture);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::BookPlaying);
        assert_eq!(h.driver.loads(), vec!["http://books/B1/original.mp3".to_string()]);
    }

    #[test]
    fn test_device_failure_during_ad_skips_book_load() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        h.driver.clear();

        h.emit(DriverEventKind::Failed(DriverFailure::Decode("bad frame".to_string())));

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::Idle);
        assert_eq!(snapshot.playback_mode, PlaybackModeKind::None);
        assert!(!snapshot.ad_playing);
        assert!(!snapshot.ad_played_for_session);
        assert!(snapshot.error.is_some());
        assert!(matches!(h.controller.drain_notices().as_slice(), [Notice::Error(_)]));
        assert!(h.driver.loads().is_empty());

        // 前贴片没有播完，重试时重新播放广告
        h.controller.play(Origin::Gesture);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::AdPlaying);
        assert_eq!(h.driver.loads(), vec!["http://ads/house.mp3".to_string()]);
    }

    #[test]
    fn test_stale_failure_from_superseded_generation_is_ignored() {
        let mut h = Harness::playing_book(600.0);
        let book_generation = h.driver.last_generation();

        h.controller.set_version(ContentVersion::Shortened);
        h.empty_last_stop();
        h.controller.play(Origin::Gesture);
        h.controller.drain_notices();
        let before = h.controller.snapshot();
        assert_eq!(before.transport_state, TransportState::AdPlaying);

        h.controller.handle_event(DriverEvent::new(
            book_generation,
            DriverEventKind::Failed(DriverFailure::Network("reset".to_string())),
        ));

        assert_eq!(h.controller.snapshot(), before);
        assert!(h.controller.drain_notices().is_empty());
    }

    #[test]
    fn test_book_load_follows_pause_of_finished_ad() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        h.driver.clear();

        h.emit(DriverEventKind::Finished);

        let commands = h.driver.commands();
        let load = commands
            .iter()
            .position(|c| matches!(c, DriverCommand::Load(url, _) if url.contains("/books/")))
            .expect("book not loaded");
        assert!(load > 0);
        assert_eq!(commands[load - 1], DriverCommand::Pause);
    }

    #[test]
    fn test_seek_and_skip_are_noops_during_ad() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        h.driver.clear();
        let before = h.controller.snapshot();

        h.controller.seek(30.0, Origin::Gesture);
        h.controller.skip_forward(15.0, Origin::Gesture);
        h.controller.skip_backward(15.0, Origin::Gesture);

        assert_eq!(h.controller.snapshot(), before);
        assert!(h.driver.commands().is_empty());
    }

    #[test]
    fn test_infinite_seek_lands_on_end() {
        let mut h = Harness::playing_book(100.0);
        h.emit(DriverEventKind::TimeUpdate(10.0));

        h.controller.skip_forward(f64::INFINITY, Origin::Gesture);
        assert_eq!(h.controller.snapshot().current_time, 100.0);

        h.controller.seek(f64::INFINITY, Origin::Gesture);
        assert_eq!(h.controller.snapshot().current_time, 100.0);
        assert_eq!(
            h.driver.commands(),
            vec![DriverCommand::Seek(100.0), DriverCommand::Seek(100.0)]
        );
    }

    #[test]
    fn test_skip_clamps_to_bounds() {
        let mut h = Harness::playing_book(100.0);
        h.emit(DriverEventKind::TimeUpdate(95.0));

        h.controller.skip_forward(15.0, Origin::Gesture);
        assert_eq!(h.controller.snapshot().current_time, 100.0);
        assert_eq!(h.driver.commands(), vec![DriverCommand::Seek(100.0)]);

        h.controller.seek(5.0, Origin::Gesture);
        h.controller.skip_backward(15.0, Origin::Gesture);
        assert_eq!(h.controller.snapshot().current_time, 0.0);
    }

    #[test]
    fn test_pause_preserves_selection() {
        let mut h = Harness::playing_book(100.0);
        let before = h.controller.snapshot();
        h.controller.pause(Origin::Gesture);

        let after = h.controller.snapshot();
        assert_eq!(after.transport_state, TransportState::Paused);
        assert_eq!(after.active_book, before.active_book);
        assert_eq!(after.active_version, before.active_version);
        assert_eq!(h.driver.commands(), vec![DriverCommand::Pause]);

        // 空闲状态也进入 Paused
        let mut idle = Harness::new();
        idle.controller.pause(Origin::Gesture);
        assert_eq!(idle.controller.snapshot().transport_state, TransportState::Paused);
        assert!(idle.driver.commands().is_empty());
    }

    #[test]
    fn test_resume_paused_book_without_reload() {
        let mut h = Harness::playing_book(100.0);
        h.emit(DriverEventKind::TimeUpdate(40.0));
        h.controller.pause(Origin::Gesture);
        h.controller.play(Origin::Gesture);

        assert_eq!(
            h.driver.commands(),
            vec![DriverCommand::Pause, DriverCommand::Play]
        );
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::BookPlaying);
        assert_eq!(snapshot.current_time, 40.0);
    }

    #[test]
    fn test_switches_always_reset_preroll() {
        let mut h = Harness::playing_book(100.0);
        assert!(h.controller.snapshot().ad_played_for_session);

        h.controller.set_book(Some(book("B2")));
        assert!(!h.controller.snapshot().ad_played_for_session);
        h.controller.set_version(ContentVersion::Translated);
        assert!(!h.controller.snapshot().ad_played_for_session);
        h.controller.set_version(ContentVersion::Translated);
        assert!(!h.controller.snapshot().ad_played_for_session);

        h.controller.set_book(None);
        let snapshot = h.controller.snapshot();
        assert!(!snapshot.ad_played_for_session);
        assert_eq!(snapshot.transport_state, TransportState::Idle);
    }

    #[test]
    fn test_stale_ad_finished_after_switch_is_discarded() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        let ad_generation = h.driver.last_generation();

        h.controller.set_version(ContentVersion::Shortened);
        h.controller
            .handle_event(DriverEvent::new(ad_generation, DriverEventKind::Finished));

        let snapshot = h.controller.snapshot();
        assert!(!snapshot.ad_played_for_session);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert_eq!(h.driver.loads().len(), 1);
    }

    #[test]
    fn test_set_version_and_play_waits_for_teardown() {
        let mut h = Harness::playing_book(100.0);
        h.controller
            .set_version_and_play(ContentVersion::GenreRemix, Origin::Gesture);

        let snapshot = h.controller.snapshot();
        assert!(snapshot.pending_play);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert!(h.driver.loads().is_empty());

        h.empty_last_stop();
        let snapshot = h.controller.snapshot();
        assert!(!snapshot.pending_play);
        assert_eq!(snapshot.transport_state, TransportState::AdPlaying);
        assert_eq!(snapshot.active_version, ContentVersion::GenreRemix);
    }

    #[test]
    fn test_set_book_and_play_without_loaded_device_plays_immediately() {
        let mut h = Harness::new();
        h.controller.set_book_and_play(Some(book("B1")), Origin::Gesture);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::AdPlaying);
    }

    #[test]
    fn test_pending_play_superseded_by_newer_switch() {
        let mut h = Harness::playing_book(100.0);
        h.controller
            .set_version_and_play(ContentVersion::Shortened, Origin::Gesture);
        let first_stop = h.driver.last_stop_generation().unwrap();
        h.controller.set_version(ContentVersion::Translated);

        h.controller
            .handle_event(DriverEvent::new(first_stop, DriverEventKind::Emptied));
        let snapshot = h.controller.snapshot();
        assert!(!snapshot.pending_play);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert!(h.driver.loads().is_empty());
    }

    #[test]
    fn test_unsupported_version_falls_back_with_warning() {
        let mut h = Harness::with_resolver(MapResolver::only(&[ContentVersion::Original]));
        h.controller.set_book(Some(book("B1")));
        h.controller.set_version(ContentVersion::Translated);

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.active_version, ContentVersion::Original);
        assert!(snapshot.warning.is_some());
        assert!(matches!(h.controller.drain_notices().as_slice(), [Notice::Warning(_)]));
    }

    #[test]
    fn test_resolution_failure_at_load_falls_back() {
        let resolver = MapResolver::all_versions();
        let toggle = resolver.clone();
        let mut h = Harness::with_resolver(resolver);
        h.controller.set_book(Some(book("B1")));
        h.controller.set_version(ContentVersion::Shortened);
        h.controller.play(Origin::Gesture);

        toggle.disable(ContentVersion::Shortened);
        h.emit(DriverEventKind::Finished);

        assert_eq!(h.controller.snapshot().transport_state, TransportState::BookPlaying);
        assert_eq!(
            h.driver.loads().last().map(String::as_str),
            Some("http://books/B1/original.mp3")
        );
        assert!(matches!(h.controller.drain_notices().as_slice(), [Notice::Warning(_)]));
    }

    #[test]
    fn test_resolution_failure_without_fallback_surfaces_error() {
        let resolver = MapResolver::all_versions();
        let toggle = resolver.clone();
        let mut h = Harness::with_resolver(resolver);
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);

        toggle.disable(ContentVersion::Original);
        h.emit(DriverEventKind::Finished);

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::Idle);
        assert!(snapshot.error.is_some());
        assert!(snapshot.ad_played_for_session);
    }

    #[test]
    fn test_ad_finished_while_paused_does_not_autostart_book() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        h.controller.pause(Origin::Gesture);
        h.emit(DriverEventKind::Finished);

        let snapshot = h.controller.snapshot();
        assert!(snapshot.ad_played_for_session);
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert_eq!(h.driver.loads().len(), 1);
    }

    #[test]
    fn test_book_finished_then_play_restarts() {
        let mut h = Harness::playing_book(50.0);
        h.emit(DriverEventKind::Finished);
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.transport_state, TransportState::Paused);
        assert_eq!(snapshot.current_time, 50.0);

        h.controller.play(Origin::Gesture);
        assert_eq!(
            h.driver.commands(),
            vec![DriverCommand::Seek(0.0), DriverCommand::Play]
        );
    }

    #[test]
    fn test_play_without_book_warns() {
        let mut h = Harness::new();
        h.controller.play(Origin::Gesture);
        assert_eq!(h.controller.snapshot().transport_state, TransportState::Idle);
        assert!(h.driver.commands().is_empty());
        assert!(matches!(h.controller.drain_notices().as_slice(), [Notice::Warning(_)]));
    }

    #[test]
    fn test_volume_applied_only_once_loaded() {
        let mut h = Harness::new();
        h.controller.set_volume(0.4);
        assert!(h.driver.commands().is_empty());

        h.controller.set_book(Some(book("B1")));
        h.controller.play(Origin::Gesture);
        assert!(h.driver.commands().contains(&DriverCommand::SetVolume(0.4)));
    }

    #[test]
    fn test_no_device_command_before_interaction() {
        let mut h = Harness::new();
        h.controller.set_book(Some(book("B1")));
        h.controller.set_version(ContentVersion::Shortened);
        h.controller.set_volume(0.2);
        h.controller.play(Origin::Programmatic);
        h.controller
            .set_version_and_play(ContentVersion::Original, Origin::Programmatic);
        h.controller.pause(Origin::Programmatic);

        assert!(!h.controller.snapshot().has_user_interacted);
        assert!(h.driver.commands().is_empty());
    }

    #[test]
    fn test_dispatch_skip_uses_default_step() {
        let mut h = Harness::playing_book(100.0);
        h.emit(DriverEventKind::TimeUpdate(10.0));
        h.controller.dispatch(Intent::SkipForward {
            seconds: None,
            origin: Origin::Gesture,
        });
        assert_eq!(h.controller.snapshot().current_time, 25.0);
    }

    #[test]
    fn test_close_releases_device() {
        let mut h = Harness::playing_book(100.0);
        h.controller.close();
        let commands = h.driver.commands();
        assert!(matches!(commands[0], DriverCommand::Stop(_)));
        assert_eq!(commands.last(), Some(&DriverCommand::Release));
    }
}
