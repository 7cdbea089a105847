//! Simulated Output Driver - 定时器驱动的虚拟播放设备
//!
//! 没有真实声卡的服务端环境下模拟设备行为：加载延迟、按 tick 推进播放位置、
//! 不支持的地址解码失败，以及首次 play 被自动播放策略拒绝。

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::ports::{
    DriverEvent, DriverEventKind, DriverEventReceiver, DriverEventSender, DriverFailure,
    Generation, OutputDriverFactoryPort, OutputDriverPort,
};
use crate::domain::session::AudioResourceRef;

/// 虚拟设备配置
#[derive(Debug, Clone)]
pub struct SimulatedDriverConfig {
    /// load 到 Ready 的延迟
    pub load_latency: Duration,
    /// 时间推进间隔
    pub tick: Duration,
    /// 每秒真实时间对应的播放秒数
    pub time_scale: f64,
    /// 资源没有时长提示时使用
    pub default_duration_secs: f64,
    /// 拒绝每个设备的第一次 play
    pub autoplay_locked: bool,
    /// 可解码的 URL scheme
    pub supported_schemes: Vec<String>,
}

impl Default for SimulatedDriverConfig {
    fn default() -> Self {
        Self {
            load_latency: Duration::from_millis(50),
            tick: Duration::from_millis(250),
            time_scale: 1.0,
            default_duration_secs: 600.0,
            autoplay_locked: false,
            supported_schemes: vec!["http".to_string(), "https".to_string(), "sim".to_string()],
        }
    }
}

#[derive(Default)]
struct DeviceState {
    generation: Generation,
    resource: Option<AudioResourceRef>,
    ready: bool,
    /// Ready 之前收到的 play
    play_requested: bool,
    playing: bool,
    position: f64,
    duration: f64,
    volume: f32,
    autoplay_locked: bool,
    released: bool,
    sender: Option<DriverEventSender>,
}

impl DeviceState {
    fn emit(&self, kind: DriverEventKind) {
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send(DriverEvent::new(self.generation, kind));
        }
    }
}

/// 虚拟设备
pub struct SimulatedOutputDriver {
    config: SimulatedDriverConfig,
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedOutputDriver {
    pub fn new(config: SimulatedDriverConfig) -> Self {
        let state = DeviceState {
            volume: 1.0,
            autoplay_locked: config.autoplay_locked,
            ..DeviceState::default()
        };
        Self {
            config,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn scheme_supported(&self, url: &str) -> bool {
        url.split_once("://")
            .map(|(scheme, _)| {
                self.config
                    .supported_schemes
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(scheme))
            })
            .unwrap_or(false)
    }

    /// 启动时钟任务，设备释放或订阅端关闭后退出
    fn spawn_clock(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No tokio runtime, simulated device clock not started");
            return;
        };

        let weak = Arc::downgrade(&self.state);
        let tick = self.config.tick.max(Duration::from_millis(1));
        let step = tick.as_secs_f64() * self.config.time_scale;

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else { break };
                let mut device = shared.lock();
                let subscribed = device
                    .sender
                    .as_ref()
                    .map(|s| !s.is_closed())
                    .unwrap_or(false);
                if device.released || !subscribed {
                    break;
                }
                if !device.playing {
                    continue;
                }

                device.position = (device.position + step).min(device.duration);
                let position = device.position;
                device.emit(DriverEventKind::TimeUpdate(position));

                if position >= device.duration {
                    device.playing = false;
                    device.play_requested = false;
                    device.emit(DriverEventKind::Finished);
                }
            }
        });
    }

    /// 延迟后把资源标记为可播放，期间被替换则放弃
    fn spawn_ready(&self, generation: Generation) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.finish_loading(generation);
            return;
        };

        let weak = Arc::downgrade(&self.state);
        let latency = self.config.load_latency;
        runtime.spawn(async move {
            tokio::time::sleep(latency).await;
            if let Some(shared) = weak.upgrade() {
                Self::mark_ready(&mut shared.lock(), generation);
            }
        });
    }

    fn finish_loading(&self, generation: Generation) {
        Self::mark_ready(&mut self.state.lock(), generation);
    }

    fn mark_ready(device: &mut DeviceState, generation: Generation) {
        if device.generation != generation || device.resource.is_none() || device.ready {
            return;
        }
        device.ready = true;
        let duration = device.duration;
        device.emit(DriverEventKind::DurationKnown(duration));
        device.emit(DriverEventKind::Ready);
        if device.play_requested {
            device.playing = true;
        }
    }
}

impl OutputDriverPort for SimulatedOutputDriver {
    fn subscribe(&mut self) -> DriverEventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().sender = Some(tx);
        self.spawn_clock();
        rx
    }

    fn load(&mut self, resource: &AudioResourceRef, generation: Generation) {
        let supported = self.scheme_supported(&resource.url);
        {
            let mut device = self.state.lock();
            if device.released {
                return;
            }
            device.generation = generation;
            device.ready = false;
            device.play_requested = false;
            device.playing = false;
            device.position = 0.0;

            if !supported {
                device.resource = None;
                device.duration = 0.0;
                device.emit(DriverEventKind::Failed(DriverFailure::Decode(format!(
                    "unsupported source: {}",
                    resource.url
                ))));
                return;
            }

            device.resource = Some(resource.clone());
            device.duration = resource
                .duration_hint
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(self.config.default_duration_secs);
        }

        tracing::trace!(url = %resource.url, generation = %generation, "Simulated load");
        self.spawn_ready(generation);
    }

    fn play(&mut self) {
        let mut device = self.state.lock();
        if device.released || device.resource.is_none() {
            return;
        }
        if device.autoplay_locked {
            device.autoplay_locked = false;
            device.emit(DriverEventKind::Failed(DriverFailure::NotAllowed));
            return;
        }
        if device.ready {
            device.playing = true;
        } else {
            device.play_requested = true;
        }
    }

    fn pause(&mut self) {
        let mut device = self.state.lock();
        device.playing = false;
        device.play_requested = false;
    }

    fn stop(&mut self, generation: Generation) {
        let mut device = self.state.lock();
        device.generation = generation;
        device.resource = None;
        device.ready = false;
        device.play_requested = false;
        device.playing = false;
        device.position = 0.0;
        device.duration = 0.0;
        device.emit(DriverEventKind::Emptied);
    }

    fn seek(&mut self, position: f64) {
        let mut device = self.state.lock();
        if device.resource.is_none() {
            return;
        }
        device.position = position.clamp(0.0, device.duration);
        let position = device.position;
        device.emit(DriverEventKind::TimeUpdate(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn current_time(&self) -> f64 {
        let device = self.state.lock();
        if device.resource.is_some() {
            device.position
        } else {
            0.0
        }
    }

    fn duration(&self) -> f64 {
        let device = self.state.lock();
        if device.resource.is_some() {
            device.duration
        } else {
            0.0
        }
    }

    fn release(&mut self) {
        let mut device = self.state.lock();
        device.released = true;
        device.resource = None;
        device.playing = false;
        device.sender = None;
        tracing::trace!("Simulated device released");
    }
}

/// 虚拟设备工厂
pub struct SimulatedDriverFactory {
    config: SimulatedDriverConfig,
}

impl SimulatedDriverFactory {
    pub fn new(config: SimulatedDriverConfig) -> Self {
        Self { config }
    }
}

impl OutputDriverFactoryPort for SimulatedDriverFactory {
    fn create(&self) -> Box<dyn OutputDriverPort> {
        Box::new(SimulatedOutputDriver::new(self.config.clone()))
    }
}
