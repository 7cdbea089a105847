//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Book Context: 书籍与内容版本
//! - Session Context: 收听会话状态

pub mod book;
pub mod session;
