//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::book::{Book, BookError, BookId, ContentVersion};
use crate::domain::session::{SessionSnapshot, TransportState};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

/// 书籍描述，id 缺省时生成新 id
#[derive(Debug, Clone, Deserialize)]
pub struct BookDto {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl BookDto {
    pub fn into_book(self) -> Result<Book, BookError> {
        let id = self.id.map(BookId::from_uuid).unwrap_or_default();
        Book::from_parts(id, self.title, self.author, self.cover_url)
    }
}

/// 解析版本标签
///
/// 无法识别的标签回退到默认版本，并返回提示文本
pub fn parse_version(raw: &str, default: ContentVersion) -> (ContentVersion, Option<String>) {
    match ContentVersion::from_str(raw) {
        Some(version) => (version, None),
        None => (
            default,
            Some(format!(
                "Unknown version '{}', falling back to {}",
                raw, default
            )),
        ),
    }
}

// ============================================================================
// Session DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionStateDto {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// 请求层面的提示（例如版本标签回退）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub state: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct SessionSummaryDto {
    pub session_id: String,
    pub transport_state: TransportState,
    pub book_title: Option<String>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionListDto {
    pub total: usize,
    pub sessions: Vec<SessionSummaryDto>,
}
