//! Book Context - Entities

use serde::{Deserialize, Serialize};

use super::{BookError, BookId, Title};

/// 书籍
///
/// 标识 + 展示用元数据。会话中以 `Arc<Book>` 整体替换，不原地修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: Title,
    author: Option<String>,
    cover_url: Option<String>,
}

impl Book {
    pub fn new(id: BookId, title: Title) -> Self {
        Self {
            id,
            title,
            author: None,
            cover_url: None,
        }
    }

    /// 从原始输入构建（用于 HTTP 层）
    pub fn from_parts(
        id: BookId,
        title: impl Into<String>,
        author: Option<String>,
        cover_url: Option<String>,
    ) -> Result<Self, BookError> {
        let title = Title::new(title).map_err(|e| BookError::InvalidTitle(e.to_string()))?;
        if let Some(url) = cover_url.as_deref() {
            if url.trim().is_empty() {
                return Err(BookError::InvalidCover("封面地址不能为空".to_string()));
            }
        }
        Ok(Self {
            id,
            title,
            author: author.filter(|a| !a.trim().is_empty()),
            cover_url,
        })
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover_url.as_deref()
    }
}
