//! Ad Source Adapters

mod static_ad_source;

pub use static_ad_source::StaticAdSource;
