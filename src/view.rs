//! Readiness gate between a handle and its remote context.
//!
//! A view renders the handle's document into a transport, demultiplexes
//! everything that comes back, and attaches a fresh controller to the handle
//! each time the remote context announces readiness.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::controller::{CommandIds, Controller, ControllerStats, DirectController, WebViewController};
use crate::handle::PlayerHandle;
use crate::protocol::{BridgeMessage, RemoteError};
use crate::remote::emitter::Emitter;
use crate::remote::script::{render_document, PlayerDocument};
use crate::remote::{PlayerError, VideoPlayer};
use crate::transport::{InboundReceiver, Transport, TransportError};
use crate::types::EventKind;

pub struct PlayerView {
    handle: PlayerHandle,
    transport: Rc<dyn Transport>,
    inbound: InboundReceiver,
    config: BridgeConfig,
    document: PlayerDocument,
    ids: Rc<CommandIds>,
    controller: Option<Rc<WebViewController>>,
    session: Uuid,
}

impl PlayerView {
    pub fn new(
        handle: PlayerHandle,
        transport: Rc<dyn Transport>,
        inbound: InboundReceiver,
        config: BridgeConfig,
    ) -> Self {
        let document = render_document(handle.source(), handle.options(), &config);
        Self {
            handle,
            transport,
            inbound,
            config,
            document,
            ids: Rc::new(CommandIds::new()),
            controller: None,
            session: Uuid::new_v4(),
        }
    }

    pub fn handle(&self) -> &PlayerHandle {
        &self.handle
    }

    pub fn document(&self) -> &PlayerDocument {
        &self.document
    }

    /// Render the document into the transport. Readiness arrives later as
    /// an `onReady` message.
    pub fn mount(&mut self) -> Result<(), TransportError> {
        tracing::debug!(target: "bridge", session = %self.session, playable = self.document.is_playable(), "mounting player");
        self.transport.load(&self.document)
    }

    /// Tear down the current remote context and load a new one. Commands
    /// issued until the new context is ready resolve to defaults.
    pub fn reload(&mut self) -> Result<(), TransportError> {
        self.teardown();
        self.session = Uuid::new_v4();
        self.mount()
    }

    pub fn is_ready(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|controller| !controller.is_disposed())
    }

    pub fn stats(&self) -> Option<ControllerStats> {
        self.controller.as_ref().map(|controller| controller.stats())
    }

    /// Route one raw inbound message. Malformed input is dropped.
    pub fn handle_message(&mut self, raw: &str) {
        let message = match BridgeMessage::decode(raw) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(target: "bridge", %err, "dropping malformed message");
                return;
            }
        };

        match message {
            BridgeMessage::Ready => self.on_ready(),
            BridgeMessage::CommandResult { id, data } => self.settle(&id, Ok(data)),
            BridgeMessage::CommandError { id, error } => self.settle(&id, Err(error)),
            BridgeMessage::Event { kind, data } => self.dispatch_event(kind, &data),
        }
    }

    /// Deliver every message already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(raw) = self.inbound.try_recv() {
            self.handle_message(&raw);
            handled += 1;
        }
        handled
    }

    /// Wait for messages until the remote context is ready. Returns `false`
    /// as soon as readiness can no longer happen.
    pub async fn ready(&mut self) -> bool {
        loop {
            if self.is_ready() {
                return true;
            }
            if !self.can_become_ready() {
                tracing::debug!(target: "bridge", session = %self.session, "player can never become ready");
                return false;
            }
            match self.inbound.recv().await {
                Some(raw) => self.handle_message(&raw),
                None => return false,
            }
        }
    }

    /// Deliver messages until every sender is gone.
    pub async fn run(&mut self) {
        while let Some(raw) = self.inbound.recv().await {
            self.handle_message(&raw);
        }
        tracing::debug!(target: "bridge", session = %self.session, "inbound channel closed");
    }

    /// Dispose the current controller and detach it from the handle. The
    /// handle keeps its listeners. Messages still queued from the old
    /// context are discarded.
    pub fn teardown(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.dispose();
            self.handle.detach();
            tracing::debug!(target: "bridge", session = %self.session, "remote context torn down");
        }

        let mut stale = 0;
        while self.inbound.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::debug!(target: "bridge", session = %self.session, stale, "discarded messages from the old context");
        }
    }

    fn can_become_ready(&self) -> bool {
        !self.handle.is_disposed() && self.document.is_playable()
    }

    fn on_ready(&mut self) {
        if let Some(previous) = self.controller.take() {
            tracing::info!(target: "bridge", session = %self.session, "remote context restarted");
            previous.dispose();
        }

        let controller = Rc::new(WebViewController::new(
            Rc::clone(&self.transport),
            Rc::clone(&self.ids),
            self.config.command_timeout(),
        ));
        if self.handle.attach(controller.clone()) {
            tracing::info!(target: "bridge", session = %self.session, "player ready");
            self.controller = Some(controller);
        } else {
            tracing::debug!(target: "bridge", "handle disposed, ignoring readiness");
            controller.dispose();
        }
    }

    fn settle(&mut self, id: &str, outcome: Result<Value, RemoteError>) {
        match &self.controller {
            Some(controller) => {
                controller.settle(id, outcome);
            }
            None => {
                tracing::debug!(target: "bridge", id, "reply arrived without a controller");
            }
        }
    }

    fn dispatch_event(&self, kind: EventKind, data: &Value) {
        if self.handle.has_listeners(kind) {
            self.handle.emit(kind, data);
        }
    }
}

impl Drop for PlayerView {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Binds a handle to a player living in the same context.
///
/// The player is ready as soon as it is attached. Its events are queued and
/// delivered by [`DirectPlayerView::pump`], so listeners may call back into
/// the player.
pub struct DirectPlayerView {
    handle: PlayerHandle,
    controller: Option<Rc<dyn Controller>>,
    events: mpsc::UnboundedReceiver<BridgeMessage>,
}

impl DirectPlayerView {
    pub fn attach<P>(handle: PlayerHandle, player: Rc<RefCell<P>>) -> Result<Self, PlayerError>
    where
        P: VideoPlayer + 'static,
    {
        let (sender, events) = mpsc::unbounded_channel();
        {
            let mut player = player.try_borrow_mut().map_err(|_| PlayerError::Busy)?;
            Emitter::new(sender).install(&mut *player);
        }

        let controller: Rc<dyn Controller> = Rc::new(DirectController::new(player));
        let controller = handle.attach(Rc::clone(&controller)).then_some(controller);
        Ok(Self {
            handle,
            controller,
            events,
        })
    }

    pub fn handle(&self) -> &PlayerHandle {
        &self.handle
    }

    pub fn is_ready(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|controller| !controller.is_disposed())
    }

    pub fn stats(&self) -> Option<ControllerStats> {
        self.controller.as_ref().map(|controller| controller.stats())
    }

    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.events.try_recv() {
            if let BridgeMessage::Event { kind, data } = message {
                if self.handle.has_listeners(kind) {
                    self.handle.emit(kind, &data);
                }
            }
            handled += 1;
        }
        handled
    }

    /// Destroys the player and detaches it from the handle.
    pub fn teardown(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.dispose();
            self.handle.detach();
        }
    }
}

impl Drop for DirectPlayerView {
    fn drop(&mut self) {
        self.teardown();
    }
}
