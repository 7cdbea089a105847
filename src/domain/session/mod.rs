//! Session Context - 收听会话限界上下文
//!
//! 职责:
//! - 会话状态记录（书籍、版本、播放状态、前贴片进度）
//! - 可挂载资源（广告 / 书籍音频）

mod resource;
mod state;
mod transport;

pub use resource::{AdAsset, AdDisplayMeta, AudioResourceRef, BookResource, ResourceKind};
pub use state::{EpochId, Origin, PendingIntent, SessionSnapshot, SessionState};
pub use transport::{PlaybackMode, PlaybackModeKind, TransportState};
