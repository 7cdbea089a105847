//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod ad_source;
mod content_resolver;
mod output_driver;
mod session_manager;

pub use ad_source::{AdContext, AdSourcePort};
pub use content_resolver::{ContentResolverPort, ResolveError};
pub use output_driver::{
    DriverEvent, DriverEventKind, DriverEventReceiver, DriverEventSender, DriverFailure,
    Generation, OutputDriverFactoryPort, OutputDriverPort,
};
pub use session_manager::{Session, SessionError, SessionManagerPort, SessionRequest};
