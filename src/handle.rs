use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{self, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bus::{EventBus, Subscription};
use crate::controller::{CommandError, CommandFuture, Controller, ControllerStats};
use crate::protocol::Command;
use crate::source::{parse_source, PlayerSource};
use crate::types::{EmbedOptions, EventKind};

/// Where a handle's commands go.
pub(crate) enum ControllerSlot {
    Detached,
    Attached(Rc<dyn Controller>),
    Disposed,
}

struct HandleInner {
    source: PlayerSource,
    options: EmbedOptions,
    bus: EventBus,
    slot: RefCell<ControllerSlot>,
}

/// The object application code holds to drive one player.
///
/// A handle exists before any remote context does; the view that renders it
/// attaches a controller once the remote side is ready. Until then, and after
/// [`PlayerHandle::dispose`], getters resolve to their defaults (`0`, `""`,
/// `false`) and actions do nothing. Clones share the same player.
#[derive(Clone)]
pub struct PlayerHandle {
    inner: Rc<HandleInner>,
}

impl PlayerHandle {
    pub fn new(source: PlayerSource, options: EmbedOptions) -> Self {
        Self {
            inner: Rc::new(HandleInner {
                source,
                options,
                bus: EventBus::new(),
                slot: RefCell::new(ControllerSlot::Detached),
            }),
        }
    }

    pub fn from_url(url: &str, options: EmbedOptions) -> Self {
        Self::new(parse_source(Some(url)), options)
    }

    pub fn source(&self) -> &PlayerSource {
        &self.inner.source
    }

    pub fn options(&self) -> &EmbedOptions {
        &self.inner.options
    }

    pub fn is_connected(&self) -> bool {
        self.controller()
            .is_some_and(|controller| !controller.is_disposed())
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.inner.slot.borrow(), ControllerSlot::Disposed)
    }

    pub fn stats(&self) -> Option<ControllerStats> {
        self.controller().map(|controller| controller.stats())
    }

    /// Issue a raw command. Unlike the typed methods this surfaces remote
    /// failures as errors; without a controller it resolves to `Value::Null`.
    pub fn call(&self, command: Command) -> CommandFuture {
        match self.controller() {
            Some(controller) => controller.call(command),
            None => {
                tracing::debug!(target: "bridge", command = %command.name(), "no controller attached");
                future::ready(Ok(Value::Null)).boxed_local()
            }
        }
    }

    pub fn play(&self) {
        self.fire(Command::Play);
    }

    pub fn pause(&self) {
        self.fire(Command::Pause);
    }

    pub fn unload(&self) {
        self.fire(Command::Unload);
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.fire(Command::SetCurrentTime(seconds));
    }

    pub fn set_volume(&self, volume: f64) {
        self.fire(Command::SetVolume(volume));
    }

    pub fn set_muted(&self, muted: bool) {
        self.fire(Command::SetMuted(muted));
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.fire(Command::SetPlaybackRate(rate));
    }

    pub fn request_fullscreen(&self) {
        self.fire(Command::RequestFullscreen);
    }

    pub fn exit_fullscreen(&self) {
        self.fire(Command::ExitFullscreen);
    }

    pub fn destroy(&self) {
        self.fire(Command::Destroy);
    }

    /// Stop the remote side from forwarding `event` at all.
    pub fn off(&self, event: EventKind) {
        self.fire(Command::Off(event));
    }

    pub fn current_time(&self) -> impl Future<Output = f64> + 'static {
        self.query(Command::GetCurrentTime, 0.0)
    }

    pub fn duration(&self) -> impl Future<Output = f64> + 'static {
        self.query(Command::GetDuration, 0.0)
    }

    pub fn playback_rate(&self) -> impl Future<Output = f64> + 'static {
        self.query(Command::GetPlaybackRate, 0.0)
    }

    pub fn video_id(&self) -> impl Future<Output = u64> + 'static {
        self.query(Command::GetVideoId, 0)
    }

    pub fn video_title(&self) -> impl Future<Output = String> + 'static {
        self.query(Command::GetVideoTitle, String::new())
    }

    pub fn video_width(&self) -> impl Future<Output = u32> + 'static {
        self.query(Command::GetVideoWidth, 0)
    }

    pub fn video_height(&self) -> impl Future<Output = u32> + 'static {
        self.query(Command::GetVideoHeight, 0)
    }

    pub fn video_url(&self) -> impl Future<Output = String> + 'static {
        self.query(Command::GetVideoUrl, String::new())
    }

    pub fn fullscreen(&self) -> impl Future<Output = bool> + 'static {
        self.query(Command::GetFullscreen, false)
    }

    pub fn subscribe<F>(&self, event: EventKind, listener: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        self.inner.bus.subscribe(event, listener)
    }

    /// Subscribe with the payload decoded into `T`. Payloads that do not
    /// decode are skipped.
    pub fn subscribe_typed<T, F>(&self, event: EventKind, listener: F) -> Subscription
    where
        T: DeserializeOwned,
        F: Fn(T) + 'static,
    {
        self.inner
            .bus
            .subscribe(event, move |data| match T::deserialize(data) {
                Ok(payload) => listener(payload),
                Err(err) => {
                    tracing::debug!(target: "bridge", %event, %err, "skipping undecodable payload");
                }
            })
    }

    pub fn emit(&self, event: EventKind, data: &Value) -> usize {
        self.inner.bus.emit(event, data)
    }

    pub fn has_listeners(&self, event: EventKind) -> bool {
        self.inner.bus.has_listeners(event)
    }

    pub fn listener_count(&self, event: EventKind) -> usize {
        self.inner.bus.listener_count(event)
    }

    /// Clear every listener and release the controller. Permanent.
    pub fn dispose(&self) {
        let previous = self.inner.slot.replace(ControllerSlot::Disposed);
        if let ControllerSlot::Attached(controller) = previous {
            controller.dispose();
        }
        self.inner.bus.clear();
    }

    /// Attach the controller for a freshly ready remote context, replacing
    /// (and disposing) any previous one. Refused once the handle is disposed.
    pub(crate) fn attach(&self, controller: Rc<dyn Controller>) -> bool {
        let previous = {
            let mut slot = self.inner.slot.borrow_mut();
            if matches!(*slot, ControllerSlot::Disposed) {
                return false;
            }
            std::mem::replace(&mut *slot, ControllerSlot::Attached(controller))
        };
        if let ControllerSlot::Attached(previous) = previous {
            tracing::debug!(target: "bridge", "replacing attached controller");
            previous.dispose();
        }
        true
    }

    pub(crate) fn detach(&self) {
        let mut slot = self.inner.slot.borrow_mut();
        if matches!(*slot, ControllerSlot::Attached(_)) {
            *slot = ControllerSlot::Detached;
        }
    }

    fn controller(&self) -> Option<Rc<dyn Controller>> {
        match &*self.inner.slot.borrow() {
            ControllerSlot::Attached(controller) => Some(Rc::clone(controller)),
            _ => None,
        }
    }

    fn fire(&self, command: Command) {
        // Fire-and-forget futures are already complete.
        drop(self.call(command));
    }

    fn query<T>(&self, command: Command, default: T) -> impl Future<Output = T> + 'static
    where
        T: DeserializeOwned + 'static,
    {
        let name = command.name();
        let reply = self.call(command);
        async move {
            match reply.await {
                Ok(Value::Null) => default,
                Ok(value) => serde_json::from_value(value).unwrap_or_else(|err| {
                    tracing::debug!(target: "bridge", command = %name, %err, "unexpected reply shape");
                    default
                }),
                Err(CommandError::Remote(error)) => {
                    tracing::warn!(target: "bridge", command = %name, %error, "command failed remotely");
                    default
                }
                Err(err) => {
                    tracing::warn!(target: "bridge", command = %name, %err, "command failed");
                    default
                }
            }
        }
    }
}
