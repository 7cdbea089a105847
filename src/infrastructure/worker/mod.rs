//! Worker Layer - Background Task Processing
//!
//! - PlaybackWorker: 每个会话一个，串行驱动播放控制器
//! - SessionReaper: 定期回收空闲会话

mod playback_worker;
mod session_reaper;

pub use playback_worker::{PlaybackWorker, PlaybackWorkerConfig};
pub use session_reaper::{SessionReaper, SessionReaperConfig};
