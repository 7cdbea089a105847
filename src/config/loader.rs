//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `BOOKCAST_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `BOOKCAST_SERVER__PORT=8080`
/// - `BOOKCAST_PLAYBACK__DEFAULT_VERSION=shortened`
/// - `BOOKCAST_CONTENT__BASE_URL=https://cdn.example.com/audio`
/// - `BOOKCAST_DRIVER__AUTOPLAY_LOCKED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("server.max_body_bytes", 64 * 1024)?
        .set_default("server.shutdown_timeout_ms", 2000)?
        .set_default("playback.default_version", "original")?
        .set_default("playback.skip_seconds", 15.0)?
        .set_default("playback.intent_queue", 64)?
        .set_default("playback.event_buffer", 100)?
        .set_default("content.base_url", "http://localhost:5070/audio")?
        .set_default("content.extension", "mp3")?
        .set_default("driver.load_latency_ms", 50)?
        .set_default("driver.tick_ms", 250)?
        .set_default("driver.time_scale", 1.0)?
        .set_default("driver.default_duration_secs", 600.0)?
        .set_default("driver.autoplay_locked", false)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 60)?
        .set_default("gc.session_expire_secs", 1800)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("BOOKCAST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.server.max_body_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_body_bytes must be greater than 0".to_string(),
        ));
    }

    if !config.playback.skip_seconds.is_finite() || config.playback.skip_seconds <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Skip step must be a positive number of seconds".to_string(),
        ));
    }

    if config.playback.intent_queue == 0 || config.playback.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "Intent queue and event buffer must be non-zero".to_string(),
        ));
    }

    if config.content.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Content base URL cannot be empty".to_string(),
        ));
    }

    // 目录中列出的书至少要提供默认版本，否则回退无处可退
    for entry in &config.content.catalog {
        if !entry.unavailable && !entry.versions.contains(&config.playback.default_version) {
            return Err(ConfigError::ValidationError(format!(
                "Catalog entry {} does not provide default version {}",
                entry.book_id, config.playback.default_version
            )));
        }
    }

    for ad in &config.ads.assets {
        if ad.id.is_empty() || ad.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "Ad assets need an id and a url".to_string(),
            ));
        }
    }

    if config.driver.tick_ms == 0 || config.driver.time_scale <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Driver tick and time scale must be positive".to_string(),
        ));
    }

    // 验证 GC 配置
    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Default Version: {}", config.playback.default_version);
    tracing::info!("Skip Step: {}s", config.playback.skip_seconds);
    tracing::info!("Ad Assets: {}", config.ads.assets.len());
    tracing::info!("Content Base URL: {}", config.content.base_url);
    tracing::info!("Catalog Entries: {}", config.content.catalog.len());
    tracing::info!(
        "Simulated Device: latency={}ms tick={}ms scale={} autoplay_locked={}",
        config.driver.load_latency_ms,
        config.driver.tick_ms,
        config.driver.time_scale,
        config.driver.autoplay_locked
    );
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Session Expire: {}s", config.gc.session_expire_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
