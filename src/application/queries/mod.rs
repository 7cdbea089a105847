//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：会话快照与会话列表

mod session_queries;

pub mod handlers;

pub use session_queries::*;
