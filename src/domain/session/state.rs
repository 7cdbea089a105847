//! Session Context - Session State
//!
//! 一个收听会话的权威状态记录。UI 只读取由此生成的快照。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{PlaybackMode, PlaybackModeKind, TransportState};
use crate::domain::book::{Book, BookId, ContentVersion};

/// Epoch 标识
///
/// (book, version) 每次被替换都会递增，用于判断异步回调是否过期
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EpochId(u64);

impl EpochId {
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// 命令来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// 真实用户手势（点击、按键）
    #[default]
    Gesture,
    /// 程序触发（自动播放、切换后的续播）
    Programmatic,
}

/// "切换完成后立即播放" 请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingIntent {
    pub epoch: EpochId,
    pub book_id: Option<BookId>,
    pub version: ContentVersion,
}

/// 会话状态
///
/// 不变量:
/// - 任一时刻只处于一个 `TransportState`
/// - 切换书籍/版本必然清除 `ad_played_for_session` 并卸载资源
/// - `current_time` 不超过已知的 `duration`
/// - `has_user_interacted` 只会被置位一次
#[derive(Debug, Clone)]
pub struct SessionState {
    active_book: Option<Arc<Book>>,
    active_version: ContentVersion,
    transport: TransportState,
    mode: PlaybackMode,
    current_time: f64,
    duration: Option<f64>,
    volume: f32,
    ad_played_for_session: bool,
    has_user_interacted: bool,
    pending_intent: Option<PendingIntent>,
    deferred_play: bool,
    epoch: EpochId,
    last_error: Option<String>,
    last_warning: Option<String>,
}

impl SessionState {
    pub fn new(default_version: ContentVersion) -> Self {
        Self {
            active_book: None,
            active_version: default_version,
            transport: TransportState::Idle,
            mode: PlaybackMode::None,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            ad_played_for_session: false,
            has_user_interacted: false,
            pending_intent: None,
            deferred_play: false,
            epoch: EpochId::default(),
            last_error: None,
            last_warning: None,
        }
    }

    /// 进入新的 epoch（替换书籍或版本）
    ///
    /// 前贴片需要重新播放，资源被卸载，待执行的意图全部作废
    pub fn begin_epoch(&mut self, book: Option<Arc<Book>>, version: ContentVersion) -> EpochId {
        self.active_book = book;
        self.active_version = version;
        self.epoch = self.epoch.next();
        self.ad_played_for_session = false;
        self.mode = PlaybackMode::None;
        self.transport = if self.active_book.is_some() {
            TransportState::Paused
        } else {
            TransportState::Idle
        };
        self.current_time = 0.0;
        self.duration = None;
        self.pending_intent = None;
        self.deferred_play = false;
        self.last_error = None;
        self.last_warning = None;
        self.epoch
    }

    /// 标记用户已交互，仅第一次返回 true
    pub fn mark_interacted(&mut self) -> bool {
        if self.has_user_interacted {
            return false;
        }
        self.has_user_interacted = true;
        true
    }

    pub fn start_ad(&mut self, mode: PlaybackMode) {
        debug_assert!(mode.is_ad());
        self.mode = mode;
        self.transport = TransportState::AdPlaying;
        self.current_time = 0.0;
        self.duration = None;
        self.last_error = None;
    }

    pub fn start_book(&mut self, mode: PlaybackMode) {
        debug_assert!(mode.is_book());
        self.duration = match &mode {
            PlaybackMode::Book(resource) => resource.audio.duration_hint,
            _ => None,
        };
        self.mode = mode;
        self.transport = TransportState::BookPlaying;
        self.current_time = 0.0;
        self.last_error = None;
    }

    /// 恢复已挂载资源的播放
    pub fn resume(&mut self) {
        self.transport = match self.mode {
            PlaybackMode::Ad(_) => TransportState::AdPlaying,
            PlaybackMode::Book(_) => TransportState::BookPlaying,
            PlaybackMode::None => self.transport,
        };
        self.last_error = None;
    }

    pub fn pause(&mut self) {
        self.transport = TransportState::Paused;
    }

    /// 前贴片播放完成
    pub fn complete_ad(&mut self) {
        self.ad_played_for_session = true;
        self.mode = PlaybackMode::None;
        self.current_time = 0.0;
        self.duration = None;
    }

    /// 书籍播放到结尾
    pub fn complete_book(&mut self) {
        if let Some(duration) = self.duration {
            self.current_time = duration;
        }
        self.transport = TransportState::Paused;
    }

    /// 设备错误：回到 Idle，保留书籍以便重试
    pub fn fail(&mut self, message: impl Into<String>) {
        self.transport = TransportState::Idle;
        self.mode = PlaybackMode::None;
        self.current_time = 0.0;
        self.duration = None;
        self.last_error = Some(message.into());
    }

    /// 乐观更新的回滚（播放被策略拒绝）
    pub fn roll_back_play(&mut self) {
        self.transport = if self.mode == PlaybackMode::None && self.active_book.is_none() {
            TransportState::Idle
        } else {
            TransportState::Paused
        };
    }

    pub fn set_transport(&mut self, transport: TransportState) {
        self.transport = transport;
    }

    /// 把位置限制在 `[0, duration]`
    ///
    /// 正无穷指向末尾；时长未知时保持当前位置。NaN 视为 0
    pub fn clamp_position(&self, position: f64) -> f64 {
        if position.is_nan() {
            return 0.0;
        }
        match self.duration {
            Some(duration) => position.clamp(0.0, duration),
            None if position == f64::INFINITY => self.current_time,
            None => position.max(0.0),
        }
    }

    pub fn set_current_time(&mut self, position: f64) {
        self.current_time = self.clamp_position(position);
    }

    pub fn set_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration < 0.0 {
            return;
        }
        self.duration = Some(duration);
        self.current_time = self.clamp_position(self.current_time);
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { self.volume };
        self.volume
    }

    pub fn set_pending_intent(&mut self, intent: Option<PendingIntent>) {
        self.pending_intent = intent;
    }

    pub fn take_pending_intent(&mut self) -> Option<PendingIntent> {
        self.pending_intent.take()
    }

    pub fn set_deferred_play(&mut self, deferred: bool) {
        self.deferred_play = deferred;
    }

    pub fn set_warning(&mut self, message: Option<String>) {
        self.last_warning = message;
    }

    // Getters
    pub fn active_book(&self) -> Option<&Arc<Book>> {
        self.active_book.as_ref()
    }

    pub fn active_version(&self) -> ContentVersion {
        self.active_version
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn mode(&self) -> &PlaybackMode {
        &self.mode
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn ad_played_for_session(&self) -> bool {
        self.ad_played_for_session
    }

    pub fn has_user_interacted(&self) -> bool {
        self.has_user_interacted
    }

    pub fn deferred_play(&self) -> bool {
        self.deferred_play
    }

    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_warning(&self) -> Option<&str> {
        self.last_warning.as_deref()
    }

    /// 生成 UI 快照
    ///
    /// 时间字段只在挂载书籍时有效，其余情况报告 0
    pub fn snapshot(&self) -> SessionSnapshot {
        let (current_time, duration) = if self.mode.is_book() {
            (self.current_time, self.duration.unwrap_or(0.0))
        } else {
            (0.0, 0.0)
        };

        SessionSnapshot {
            epoch: self.epoch.value(),
            transport_state: self.transport,
            playback_mode: self.mode.kind(),
            ad_playing: self.mode.is_ad(),
            ad_played_for_session: self.ad_played_for_session,
            current_time,
            duration,
            volume: self.volume,
            active_book: self.active_book.as_deref().cloned(),
            active_version: self.active_version,
            has_user_interacted: self.has_user_interacted,
            pending_play: self.pending_intent.is_some(),
            deferred_play: self.deferred_play,
            error: self.last_error.clone(),
            warning: self.last_warning.clone(),
        }
    }
}

/// 会话快照（UI 只读视图）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub transport_state: TransportState,
    pub playback_mode: PlaybackModeKind,
    pub ad_playing: bool,
    pub ad_played_for_session: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f32,
    pub active_book: Option<Book>,
    pub active_version: ContentVersion,
    pub has_user_interacted: bool,
    pub pending_play: bool,
    pub deferred_play: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionState::new(ContentVersion::default()).snapshot()
    }
}
