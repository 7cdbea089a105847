//! Catalog Content Resolver - 按目录构造书籍音频地址
//!
//! 地址格式：`{base_url}/books/{book_id}/{version}.{ext}`

use std::collections::{HashMap, HashSet};

use crate::application::ports::{ContentResolverPort, ResolveError};
use crate::domain::book::{Book, BookId, ContentVersion};
use crate::domain::session::AudioResourceRef;

/// 解析器配置
#[derive(Debug, Clone)]
pub struct CatalogResolverConfig {
    pub base_url: String,
    pub extension: String,
    /// 不在目录中的书只提供该版本
    pub default_version: ContentVersion,
    /// 每本书可用的版本
    pub catalog: HashMap<BookId, HashSet<ContentVersion>>,
    /// 下架的书籍
    pub unavailable: HashSet<BookId>,
}

impl Default for CatalogResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5070/audio".to_string(),
            extension: "mp3".to_string(),
            default_version: ContentVersion::default(),
            catalog: HashMap::new(),
            unavailable: HashSet::new(),
        }
    }
}

/// 目录解析器
pub struct CatalogContentResolver {
    config: CatalogResolverConfig,
}

impl CatalogContentResolver {
    pub fn new(mut config: CatalogResolverConfig) -> Self {
        let trimmed = config.base_url.trim_end_matches('/').len();
        config.base_url.truncate(trimmed);
        tracing::info!(
            base_url = %config.base_url,
            books = config.catalog.len(),
            "CatalogContentResolver initialized"
        );
        Self { config }
    }

    /// 某本书可用的版本
    pub fn versions_for(&self, book_id: BookId) -> Vec<ContentVersion> {
        match self.config.catalog.get(&book_id) {
            Some(versions) => ContentVersion::ALL
                .into_iter()
                .filter(|v| versions.contains(v))
                .collect(),
            None => vec![self.config.default_version],
        }
    }

    fn is_available(&self, book_id: BookId, version: ContentVersion) -> bool {
        match self.config.catalog.get(&book_id) {
            Some(versions) => versions.contains(&version),
            None => version == self.config.default_version,
        }
    }
}

impl ContentResolverPort for CatalogContentResolver {
    fn resolve(&self, book: &Book, version: ContentVersion) -> Result<AudioResourceRef, ResolveError> {
        let book_id = book.id();
        if self.config.unavailable.contains(&book_id) {
            return Err(ResolveError::BookUnavailable(book_id));
        }
        if !self.is_available(book_id, version) {
            return Err(ResolveError::VersionUnavailable { book_id, version });
        }

        Ok(AudioResourceRef::book(format!(
            "{}/books/{}/{}.{}",
            self.config.base_url,
            book_id,
            version.as_str(),
            self.config.extension
        )))
    }
}
