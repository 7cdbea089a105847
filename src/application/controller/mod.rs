//! Transition Controller - 播放编排状态机
//!
//! - intent: UI 意图
//! - notice: 呈现给 UI 的警告/错误
//! - state_machine: 状态机本体

mod state_machine;
mod intent;
mod notice;

#[cfg(test)]
pub(crate) mod testing;

pub use state_machine::{PlaybackController, PlaybackSettings};
pub use intent::Intent;
pub use notice::Notice;
