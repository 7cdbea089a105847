//! Bookcast - 有声书播放编排系统
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 书籍与内容版本
//! - Session Context: 收听会话状态（传输状态、播放模式、前贴片标记）
//!
//! 应用层 (application/):
//! - Controller: 播放编排状态机
//! - Ports: 端口定义（OutputDriver, AdSource, ContentResolver, SessionManager）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager 内存实现
//! - Worker: 会话 PlaybackWorker、空闲会话回收
//! - Adapters: 虚拟播放设备、静态广告源、目录解析器
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
