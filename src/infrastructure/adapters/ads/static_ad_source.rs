//! Static Ad Source - 轮播配置中的广告素材

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{AdContext, AdSourcePort};
use crate::domain::session::{AdAsset, AdDisplayMeta, AudioResourceRef};

/// 静态广告源
///
/// 按顺序轮播，所有会话共享同一个游标
pub struct StaticAdSource {
    ads: Vec<AdAsset>,
    cursor: AtomicUsize,
}

impl StaticAdSource {
    /// 列表为空时退回内置的站内广告
    pub fn new(ads: Vec<AdAsset>) -> Self {
        let ads = if ads.is_empty() {
            tracing::warn!("No ads configured, using built-in house ad");
            vec![Self::house_ad()]
        } else {
            ads
        };
        tracing::info!(count = ads.len(), "StaticAdSource initialized");
        Self {
            ads,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn house_ad() -> AdAsset {
        AdAsset {
            id: "house".to_string(),
            audio: AudioResourceRef::ad("sim://ads/house").with_duration(5.0),
            display: AdDisplayMeta {
                title: "Thanks for listening".to_string(),
                advertiser: None,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }
}

impl AdSourcePort for StaticAdSource {
    fn next_ad(&self, context: &AdContext) -> AdAsset {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.ads.len();
        let ad = self.ads[index].clone();
        tracing::debug!(
            session_id = %context.session_id,
            book_id = %context.book_id,
            ad_id = %ad.id,
            "Ad selected"
        );
        ad
    }
}
