//! Remote side of the bridge.
//!
//! [`script`] generates the JavaScript injected into a real web view.
//! [`dispatcher`] and [`emitter`] are the same dispatcher and event forwarder
//! expressed over the [`VideoPlayer`] trait, which [`local::LocalRemote`] and
//! the direct controller drive without a script engine. [`headless`] runs the
//! generated script itself inside QuickJS.

pub mod dispatcher;
pub mod emitter;
pub mod engine;
pub mod headless;
pub mod local;
pub mod script;

use serde_json::Value;
use thiserror::Error;

use crate::types::EventKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    #[error("{0}")]
    Failed(String),
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("player has been destroyed")]
    Destroyed,
    #[error("player is busy")]
    Busy,
}

pub type EventListener = Box<dyn FnMut(Value)>;

/// The operations of an embedded video player, named after its command table.
///
/// Setters return the value the player actually applied.
pub trait VideoPlayer {
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn unload(&mut self) -> Result<(), PlayerError>;
    fn set_current_time(&mut self, seconds: f64) -> Result<f64, PlayerError>;
    fn set_volume(&mut self, volume: f64) -> Result<f64, PlayerError>;
    fn set_muted(&mut self, muted: bool) -> Result<bool, PlayerError>;
    fn current_time(&self) -> Result<f64, PlayerError>;
    fn duration(&self) -> Result<f64, PlayerError>;
    fn set_playback_rate(&mut self, rate: f64) -> Result<f64, PlayerError>;
    fn playback_rate(&self) -> Result<f64, PlayerError>;
    fn video_id(&self) -> Result<u64, PlayerError>;
    fn video_title(&self) -> Result<String, PlayerError>;
    fn video_width(&self) -> Result<u32, PlayerError>;
    fn video_height(&self) -> Result<u32, PlayerError>;
    fn video_url(&self) -> Result<String, PlayerError>;
    fn request_fullscreen(&mut self) -> Result<(), PlayerError>;
    fn exit_fullscreen(&mut self) -> Result<(), PlayerError>;
    fn fullscreen(&self) -> Result<bool, PlayerError>;
    fn destroy(&mut self) -> Result<(), PlayerError>;

    /// Register the single forwarding listener for `event`, replacing any
    /// previous one.
    fn on(&mut self, event: EventKind, listener: EventListener);
    fn off(&mut self, event: EventKind);
}
