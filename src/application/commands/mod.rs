//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：会话挂载、意图投递、会话卸载

mod session_commands;

pub mod handlers;

pub use session_commands::*;
