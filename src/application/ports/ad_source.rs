//! Ad Source Port - 前贴片广告来源
//!
//! 广告选择逻辑不在本系统内，编排器只把返回的素材当作不透明资源播放

use crate::domain::book::{BookId, ContentVersion};
use crate::domain::session::AdAsset;

/// 选择广告时的上下文
#[derive(Debug, Clone)]
pub struct AdContext {
    pub session_id: String,
    pub book_id: BookId,
    pub version: ContentVersion,
}

/// Ad Source Port
pub trait AdSourcePort: Send + Sync {
    /// 返回下一条广告素材
    fn next_ad(&self, context: &AdContext) -> AdAsset;
}
