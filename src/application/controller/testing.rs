//! 控制器测试替身：记录命令的设备、固定广告、可开关的解析器

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    AdContext, AdSourcePort, ContentResolverPort, DriverEvent, DriverEventReceiver,
    DriverEventSender, Generation, OutputDriverFactoryPort, OutputDriverPort, ResolveError,
};
use crate::domain::book::{Book, BookId, ContentVersion, Title};
use crate::domain::session::{AdAsset, AdDisplayMeta, AudioResourceRef};

pub fn book(title: &str) -> Book {
    Book::new(BookId::new(), Title::new(title).unwrap())
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCommand {
    Load(String, Generation),
    Play,
    Pause,
    Stop(Generation),
    Seek(f64),
    SetVolume(f32),
    Release,
}

#[derive(Default)]
struct Recorded {
    commands: Vec<DriverCommand>,
    last_load: Generation,
    last_stop: Option<Generation>,
    sender: Option<DriverEventSender>,
}

/// 记录所有命令的设备替身，克隆共享同一份记录
#[derive(Clone, Default)]
pub struct RecordingDriver {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<DriverCommand> {
        self.inner.lock().commands.clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.inner
            .lock()
            .commands
            .iter()
            .filter_map(|c| match c {
                DriverCommand::Load(url, _) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.inner.lock().commands.clear();
    }

    pub fn last_generation(&self) -> Generation {
        self.inner.lock().last_load
    }

    pub fn last_stop_generation(&self) -> Option<Generation> {
        self.inner.lock().last_stop
    }

    /// 通过订阅通道发出事件（worker 测试用）
    pub fn emit(&self, event: DriverEvent) {
        if let Some(sender) = self.inner.lock().sender.as_ref() {
            let _ = sender.send(event);
        }
    }

    fn record(&self, command: DriverCommand) {
        self.inner.lock().commands.push(command);
    }
}

impl OutputDriverPort for RecordingDriver {
    fn subscribe(&mut self) -> DriverEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().sender = Some(tx);
        rx
    }

    fn load(&mut self, resource: &AudioResourceRef, generation: Generation) {
        let mut inner = self.inner.lock();
        inner.last_load = generation;
        inner
            .commands
            .push(DriverCommand::Load(resource.url.clone(), generation));
    }

    fn play(&mut self) {
        self.record(DriverCommand::Play);
    }

    fn pause(&mut self) {
        self.record(DriverCommand::Pause);
    }

    fn stop(&mut self, generation: Generation) {
        let mut inner = self.inner.lock();
        inner.last_stop = Some(generation);
        inner.commands.push(DriverCommand::Stop(generation));
    }

    fn seek(&mut self, position: f64) {
        self.record(DriverCommand::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.record(DriverCommand::SetVolume(volume));
    }

    fn current_time(&self) -> f64 {
        0.0
    }

    fn duration(&self) -> f64 {
        0.0
    }

    fn release(&mut self) {
        self.record(DriverCommand::Release);
    }
}

/// 每次创建新的记录设备，并保留句柄供断言
#[derive(Clone, Default)]
pub struct RecordingDriverFactory {
    created: Arc<Mutex<Vec<RecordingDriver>>>,
}

impl RecordingDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<RecordingDriver> {
        self.created.lock().clone()
    }
}

impl OutputDriverFactoryPort for RecordingDriverFactory {
    fn create(&self) -> Box<dyn OutputDriverPort> {
        let driver = RecordingDriver::new();
        self.created.lock().push(driver.clone());
        Box::new(driver)
    }
}

pub struct FixedAdSource {
    asset: AdAsset,
}

impl FixedAdSource {
    pub fn new() -> Self {
        Self {
            asset: AdAsset {
                id: "house".to_string(),
                audio: AudioResourceRef::ad("http://ads/house.mp3").with_duration(15.0),
                display: AdDisplayMeta {
                    title: "House ad".to_string(),
                    advertiser: None,
                },
            },
        }
    }
}

impl AdSourcePort for FixedAdSource {
    fn next_ad(&self, _context: &AdContext) -> AdAsset {
        self.asset.clone()
    }
}

/// 按版本开关的解析器，URL 使用书名构造
#[derive(Clone)]
pub struct MapResolver {
    enabled: Arc<Mutex<HashSet<ContentVersion>>>,
}

impl MapResolver {
    pub fn all_versions() -> Self {
        Self::only(&ContentVersion::ALL)
    }

    pub fn only(versions: &[ContentVersion]) -> Self {
        Self {
            enabled: Arc::new(Mutex::new(versions.iter().copied().collect())),
        }
    }

    pub fn disable(&self, version: ContentVersion) {
        self.enabled.lock().remove(&version);
    }
}

impl ContentResolverPort for MapResolver {
    fn resolve(&self, book: &Book, version: ContentVersion) -> Result<AudioResourceRef, ResolveError> {
        if !self.enabled.lock().contains(&version) {
            return Err(ResolveError::VersionUnavailable {
                book_id: book.id(),
                version,
            });
        }
        Ok(AudioResourceRef::book(format!(
            "http://books/{}/{}.mp3",
            book.title(),
            version
        )))
    }
}
