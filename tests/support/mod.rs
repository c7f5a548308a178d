#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use vimeo_bridge::remote::script::PlayerDocument;
use vimeo_bridge::remote::{EventListener, PlayerError, VideoPlayer};
use vimeo_bridge::{
    inbound_channel, BridgeConfig, EventKind, HeadlessWebView, PlayerHandle, PlayerView,
    Transport, TransportError,
};

pub const VIDEO_URL: &str = "https://vimeo.com/76979871";
pub const STUB_PLAYER_JS: &str = include_str!("../fixtures/stub_player.js");

/// In-memory player that records every call it receives.
pub struct StubPlayer {
    pub calls: Vec<String>,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub fullscreen: bool,
    pub destroyed: bool,
    pub broken: bool,
    listeners: HashMap<EventKind, EventListener>,
}

impl Default for StubPlayer {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            current_time: 0.0,
            duration: 120.5,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            fullscreen: false,
            destroyed: false,
            broken: false,
            listeners: HashMap::new(),
        }
    }
}

impl StubPlayer {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Invoke the registered listener for `kind`. Returns whether one existed.
    pub fn fire(&mut self, kind: EventKind, payload: Value) -> bool {
        match self.listeners.get_mut(&kind) {
            Some(listener) => {
                listener(payload);
                true
            }
            None => false,
        }
    }

    pub fn listening(&self, kind: EventKind) -> bool {
        self.listeners.contains_key(&kind)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn record(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }

    fn check(&self) -> Result<(), PlayerError> {
        if self.destroyed {
            return Err(PlayerError::Destroyed);
        }
        if self.broken {
            return Err(PlayerError::Failed("player is broken".into()));
        }
        Ok(())
    }
}

impl VideoPlayer for StubPlayer {
    fn play(&mut self) -> Result<(), PlayerError> {
        self.check()?;
        self.record("play");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.check()?;
        self.record("pause");
        Ok(())
    }

    fn unload(&mut self) -> Result<(), PlayerError> {
        self.check()?;
        self.record("unload");
        Ok(())
    }

    fn set_current_time(&mut self, seconds: f64) -> Result<f64, PlayerError> {
        self.check()?;
        if seconds < 0.0 {
            return Err(PlayerError::OutOfRange {
                name: "seconds",
                value: seconds,
            });
        }
        self.record(format!("setCurrentTime({seconds})"));
        self.current_time = seconds;
        Ok(seconds)
    }

    fn set_volume(&mut self, volume: f64) -> Result<f64, PlayerError> {
        self.check()?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlayerError::OutOfRange {
                name: "volume",
                value: volume,
            });
        }
        self.record(format!("setVolume({volume})"));
        self.volume = volume;
        Ok(volume)
    }

    fn set_muted(&mut self, muted: bool) -> Result<bool, PlayerError> {
        self.check()?;
        self.record(format!("setMuted({muted})"));
        self.muted = muted;
        Ok(muted)
    }

    fn current_time(&self) -> Result<f64, PlayerError> {
        self.check()?;
        Ok(self.current_time)
    }

    fn duration(&self) -> Result<f64, PlayerError> {
        self.check()?;
        Ok(self.duration)
    }

    fn set_playback_rate(&mut self, rate: f64) -> Result<f64, PlayerError> {
        self.check()?;
        self.record(format!("setPlaybackRate({rate})"));
        self.playback_rate = rate;
        Ok(rate)
    }

    fn playback_rate(&self) -> Result<f64, PlayerError> {
        self.check()?;
        Ok(self.playback_rate)
    }

    fn video_id(&self) -> Result<u64, PlayerError> {
        self.check()?;
        Ok(76979871)
    }

    fn video_title(&self) -> Result<String, PlayerError> {
        self.check()?;
        Ok("Sintel".into())
    }

    fn video_width(&self) -> Result<u32, PlayerError> {
        self.check()?;
        Ok(1280)
    }

    fn video_height(&self) -> Result<u32, PlayerError> {
        self.check()?;
        Ok(720)
    }

    fn video_url(&self) -> Result<String, PlayerError> {
        self.check()?;
        Ok(VIDEO_URL.into())
    }

    fn request_fullscreen(&mut self) -> Result<(), PlayerError> {
        self.check()?;
        self.record("requestFullscreen");
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlayerError> {
        self.check()?;
        self.record("exitFullscreen");
        self.fullscreen = false;
        Ok(())
    }

    fn fullscreen(&self) -> Result<bool, PlayerError> {
        self.check()?;
        Ok(self.fullscreen)
    }

    fn destroy(&mut self) -> Result<(), PlayerError> {
        self.record("destroy");
        self.destroyed = true;
        Ok(())
    }

    fn on(&mut self, event: EventKind, listener: EventListener) {
        self.listeners.insert(event, listener);
    }

    fn off(&mut self, event: EventKind) {
        self.listeners.remove(&event);
    }
}

/// Transport that records what it is asked to do and answers nothing.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: RefCell<Vec<String>>,
    pub loads: Cell<usize>,
    pub closed: Cell<bool>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn load(&self, _document: &PlayerDocument) -> Result<(), TransportError> {
        self.loads.set(self.loads.get() + 1);
        Ok(())
    }

    fn send(&self, payload: &str) -> Result<(), TransportError> {
        if self.closed.get() {
            return Err(TransportError::Closed);
        }
        self.sent.borrow_mut().push(payload.to_string());
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.get()
    }
}

pub fn handle() -> PlayerHandle {
    PlayerHandle::from_url(VIDEO_URL, Default::default())
}

/// A view over a QuickJS context with the stub player API preloaded.
pub fn headless_view(handle: &PlayerHandle) -> (PlayerView, Rc<HeadlessWebView>) {
    let (sender, receiver) = inbound_channel();
    let web = Rc::new(HeadlessWebView::new(sender).expect("headless web view"));
    web.preload(STUB_PLAYER_JS, "stub_player.js")
        .expect("stub player api");
    let view = PlayerView::new(
        handle.clone(),
        web.clone(),
        receiver,
        BridgeConfig::default(),
    );
    (view, web)
}

/// A view over a recording transport, made ready by a synthetic `onReady`.
pub fn ready_recording_view(handle: &PlayerHandle) -> (PlayerView, Rc<RecordingTransport>) {
    let (_sender, receiver) = inbound_channel();
    let transport = Rc::new(RecordingTransport::default());
    let mut view = PlayerView::new(
        handle.clone(),
        transport.clone(),
        receiver,
        BridgeConfig::default(),
    );
    view.mount().expect("mount");
    view.handle_message(r#"{"type":"onReady","data":null}"#);
    (view, transport)
}
