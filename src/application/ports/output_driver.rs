//! Output Driver Port - 音频输出设备抽象
//!
//! 会话独占一个设备句柄。命令是即发即忘的，结果通过带 generation 的事件回传。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::session::AudioResourceRef;

/// 命令代数
///
/// 每次 load 递增。事件携带产生它的 load 的代数，用于丢弃过期事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 设备侧失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "snake_case")]
pub enum DriverFailure {
    /// 平台自动播放策略拒绝
    #[error("playback not allowed before a user gesture")]
    NotAllowed,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("network error: {0}")]
    Network(String),
}

/// 设备生命周期事件类型
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEventKind {
    /// 资源可以开始播放
    Ready,
    /// 播放位置推进（秒）
    TimeUpdate(f64),
    /// 时长已知（秒）
    DurationKnown(f64),
    /// 播放到结尾
    Finished,
    /// 加载或播放失败
    Failed(DriverFailure),
    /// stop 之后资源已卸载
    Emptied,
}

/// 设备事件
#[derive(Debug, Clone, PartialEq)]
pub struct DriverEvent {
    pub generation: Generation,
    pub kind: DriverEventKind,
}

impl DriverEvent {
    pub fn new(generation: Generation, kind: DriverEventKind) -> Self {
        Self { generation, kind }
    }
}

pub type DriverEventSender = mpsc::UnboundedSender<DriverEvent>;
pub type DriverEventReceiver = mpsc::UnboundedReceiver<DriverEvent>;

/// Output Driver Port
///
/// 约束:
/// - 命令不会同步失败，所有失败都以 `Failed` 事件回传
/// - 未挂载资源时 `current_time()` 与 `duration()` 返回 0
/// - 同一句柄在广告/书籍/版本切换之间复用
pub trait OutputDriverPort: Send {
    /// 订阅事件流，重复订阅会替换之前的接收端
    fn subscribe(&mut self) -> DriverEventReceiver;

    /// 挂载资源（隐式取消当前操作），之后的事件都带上 `generation`
    fn load(&mut self, resource: &AudioResourceRef, generation: Generation);

    /// 开始/恢复播放，结果通过事件回传
    fn play(&mut self);

    fn pause(&mut self);

    /// 暂停、回到 0 并卸载资源，完成后发出 `Emptied`
    fn stop(&mut self, generation: Generation);

    fn seek(&mut self, position: f64);

    fn set_volume(&mut self, volume: f32);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    /// 释放设备句柄（会话销毁）
    fn release(&mut self);
}

/// Output Driver 工厂
///
/// 每个会话创建一个设备句柄
pub trait OutputDriverFactoryPort: Send + Sync {
    fn create(&self) -> Box<dyn OutputDriverPort>;
}
