//! Memory Layer - In-Memory State Management
//!
//! 管理收听会话句柄的内存状态

mod session_manager;

pub use session_manager::InMemorySessionManager;
