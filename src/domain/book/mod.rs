//! Book Context - 书籍限界上下文
//!
//! 职责:
//! - 书籍标识与展示元数据
//! - 内容版本标签

mod entities;
mod errors;
mod value_objects;
mod version;

pub use entities::Book;
pub use errors::BookError;
pub use value_objects::{BookId, Title};
pub use version::ContentVersion;
