//! 应用层 - 用例编排
//!
//! 包含：
//! - controller: 播放编排状态机（广告前贴片、切换、自动播放门控）
//! - ports: 六边形架构端口定义（OutputDriver、AdSource、ContentResolver、SessionManager）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod controller;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    DispatchIntentCommand,
    DispatchIntentResponse,
    MountSessionCommand,
    MountSessionResponse,
    UnmountSessionCommand,
    UnmountSessionResponse,
    // Handlers
    handlers::{DispatchIntentHandler, MountSessionHandler, UnmountSessionHandler},
};

pub use controller::{Intent, Notice, PlaybackController, PlaybackSettings};

pub use error::ApplicationError;

pub use ports::{
    // Ad source
    AdContext,
    AdSourcePort,
    // Content resolver
    ContentResolverPort,
    ResolveError,
    // Output driver
    DriverEvent,
    DriverEventKind,
    DriverFailure,
    Generation,
    OutputDriverFactoryPort,
    OutputDriverPort,
    // Session manager
    Session,
    SessionError,
    SessionManagerPort,
    SessionRequest,
};

pub use queries::{
    GetSessionStateQuery,
    ListSessionsQuery,
    SessionStateResponse,
    SessionSummary,
    // Handlers
    handlers::{GetSessionStateHandler, ListSessionsHandler},
};
