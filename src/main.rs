//! Bookcast - 有声书播放编排系统
//!
//! - Domain: book/, session/
//! - Application: controller, commands, queries, ports
//! - Infrastructure: http, memory, worker, adapters, events

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use bookcast::application::PlaybackSettings;
use bookcast::config::{load_config, print_config, AppConfig};
use bookcast::domain::book::{BookId, ContentVersion};
use bookcast::domain::session::{AdAsset, AdDisplayMeta, AudioResourceRef};
use bookcast::infrastructure::adapters::{
    CatalogContentResolver, CatalogResolverConfig, SimulatedDriverConfig, SimulatedDriverFactory,
    StaticAdSource,
};
use bookcast::infrastructure::events::EventPublisher;
use bookcast::infrastructure::http::{AppState, HttpServer};
use bookcast::infrastructure::memory::InMemorySessionManager;
use bookcast::infrastructure::worker::{PlaybackWorkerConfig, SessionReaper, SessionReaperConfig};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},bookcast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_ads(config: &AppConfig) -> Vec<AdAsset> {
    config
        .ads
        .assets
        .iter()
        .map(|ad| {
            let audio = AudioResourceRef::ad(&ad.url);
            AdAsset {
                id: ad.id.clone(),
                audio: match ad.duration_secs {
                    Some(secs) => audio.with_duration(secs),
                    None => audio,
                },
                display: AdDisplayMeta {
                    title: ad.title.clone(),
                    advertiser: ad.advertiser.clone(),
                },
            }
        })
        .collect()
}

fn build_resolver_config(config: &AppConfig) -> CatalogResolverConfig {
    let mut catalog: HashMap<BookId, HashSet<ContentVersion>> = HashMap::new();
    let mut unavailable = HashSet::new();
    for entry in &config.content.catalog {
        let book_id = BookId::from_uuid(entry.book_id);
        if entry.unavailable {
            unavailable.insert(book_id);
        }
        catalog.insert(book_id, entry.versions.iter().copied().collect());
    }

    CatalogResolverConfig {
        base_url: config.content.base_url.clone(),
        extension: config.content.extension.clone(),
        default_version: config.playback.default_version,
        catalog,
        unavailable,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    init_tracing(&config);

    tracing::info!("Bookcast - 有声书播放编排系统");
    print_config(&config);

    // 创建适配器
    let ad_source = Arc::new(StaticAdSource::new(build_ads(&config)));
    let resolver = Arc::new(CatalogContentResolver::new(build_resolver_config(&config)));
    let driver_factory = Arc::new(SimulatedDriverFactory::new(SimulatedDriverConfig {
        load_latency: Duration::from_millis(config.driver.load_latency_ms),
        tick: Duration::from_millis(config.driver.tick_ms),
        time_scale: config.driver.time_scale,
        default_duration_secs: config.driver.default_duration_secs,
        autoplay_locked: config.driver.autoplay_locked,
        ..SimulatedDriverConfig::default()
    }));

    // 创建事件发布器
    let event_publisher = Arc::new(EventPublisher::with_capacity(config.playback.event_buffer));

    // 创建内存 Session 管理器
    let session_manager = Arc::new(InMemorySessionManager::new());

    let worker_config = PlaybackWorkerConfig {
        settings: PlaybackSettings {
            session_id: String::new(),
            default_version: config.playback.default_version,
            skip_seconds: config.playback.skip_seconds,
        },
        queue_capacity: config.playback.intent_queue,
    };

    let state = AppState::new(
        session_manager.clone(),
        driver_factory,
        ad_source,
        resolver,
        event_publisher,
        worker_config,
    );

    // 启动空闲会话回收
    if config.gc.enabled {
        let reaper = SessionReaper::new(
            SessionReaperConfig {
                interval: Duration::from_secs(config.gc.interval_secs),
                session_expire_secs: config.gc.session_expire_secs,
            },
            session_manager,
            state.unmount_session_handler.clone(),
        );
        tokio::spawn(reaper.run());
    }

    // 创建 HTTP 服务器
    let server = HttpServer::new(config.server.clone(), state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
