//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::book::ContentVersion;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 播放编排配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 前贴片广告素材
    #[serde(default)]
    pub ads: AdsConfig,

    /// 书籍音频地址配置
    #[serde(default)]
    pub content: ContentConfig,

    /// 虚拟播放设备配置
    #[serde(default)]
    pub driver: DriverConfig,

    /// GC 配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体上限（字节），接口只收小 JSON
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// 关闭时等待会话 worker 退出的时长（毫秒）
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_shutdown_timeout_ms() -> u64 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 播放编排配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 版本不可用时回退的版本
    #[serde(default)]
    pub default_version: ContentVersion,

    /// 快进/快退默认步长（秒）
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: f64,

    /// 每个会话的意图队列容量
    #[serde(default = "default_intent_queue")]
    pub intent_queue: usize,

    /// 每个会话的事件广播缓冲
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_skip_seconds() -> f64 {
    15.0
}

fn default_intent_queue() -> usize {
    64
}

fn default_event_buffer() -> usize {
    100
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_version: ContentVersion::default(),
            skip_seconds: default_skip_seconds(),
            intent_queue: default_intent_queue(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// 广告配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdsConfig {
    /// 轮播的广告素材，为空时使用内置站内广告
    #[serde(default)]
    pub assets: Vec<AdAssetConfig>,
}

/// 单条广告素材
#[derive(Debug, Clone, Deserialize)]
pub struct AdAssetConfig {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub advertiser: Option<String>,
    /// 时长（秒），未知时由设备上报
    #[serde(default)]
    pub duration_secs: Option<f64>,
}

/// 书籍音频地址配置
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// 音频服务根地址
    #[serde(default = "default_content_base_url")]
    pub base_url: String,

    /// 文件扩展名
    #[serde(default = "default_content_extension")]
    pub extension: String,

    /// 每本书可用的版本，未列出的书只有默认版本
    #[serde(default)]
    pub catalog: Vec<CatalogEntryConfig>,
}

/// 目录条目
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntryConfig {
    pub book_id: Uuid,
    #[serde(default)]
    pub versions: Vec<ContentVersion>,
    /// 整本下架
    #[serde(default)]
    pub unavailable: bool,
}

fn default_content_base_url() -> String {
    "http://localhost:5070/audio".to_string()
}

fn default_content_extension() -> String {
    "mp3".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: default_content_base_url(),
            extension: default_content_extension(),
            catalog: Vec::new(),
        }
    }
}

/// 虚拟播放设备配置
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// load 到 Ready 的延迟（毫秒）
    #[serde(default = "default_load_latency")]
    pub load_latency_ms: u64,

    /// 时间推进间隔（毫秒）
    #[serde(default = "default_tick")]
    pub tick_ms: u64,

    /// 播放倍速（仅模拟用）
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// 资源没有时长提示时使用的时长（秒）
    #[serde(default = "default_duration")]
    pub default_duration_secs: f64,

    /// 模拟浏览器自动播放策略：拒绝每个设备的第一次 play
    #[serde(default)]
    pub autoplay_locked: bool,
}

fn default_load_latency() -> u64 {
    50
}

fn default_tick() -> u64 {
    250
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_duration() -> f64 {
    600.0
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            load_latency_ms: default_load_latency(),
            tick_ms: default_tick(),
            time_scale: default_time_scale(),
            default_duration_secs: default_duration(),
            autoplay_locked: false,
        }
    }
}

/// GC（空闲会话回收）配置
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用自动 GC
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// GC 间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,

    /// Session 过期时间（秒）
    #[serde(default = "default_session_expire")]
    pub session_expire_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    60
}

fn default_session_expire() -> u64 {
    1800 // 30 分钟
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            session_expire_secs: default_session_expire(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
