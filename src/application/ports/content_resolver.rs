//! Content Resolver Port - 书籍音频解析
//!
//! 把 (book, version) 映射为可播放的资源地址，语音合成由外部服务完成

use thiserror::Error;

use crate::domain::book::{Book, BookId, ContentVersion};
use crate::domain::session::AudioResourceRef;

/// 解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Version {version} unavailable for book {book_id}")]
    VersionUnavailable {
        book_id: BookId,
        version: ContentVersion,
    },

    #[error("Book unavailable: {0}")]
    BookUnavailable(BookId),
}

/// Content Resolver Port
pub trait ContentResolverPort: Send + Sync {
    fn resolve(&self, book: &Book, version: ContentVersion) -> Result<AudioResourceRef, ResolveError>;

    /// 判断版本是否可解析
    fn supports(&self, book: &Book, version: ContentVersion) -> bool {
        self.resolve(book, version).is_ok()
    }
}
