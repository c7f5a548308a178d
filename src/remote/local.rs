use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::dispatcher::dispatch;
use super::emitter::{Emitter, LayoutHook, MessageSink};
use super::script::PlayerDocument;
use super::VideoPlayer;
use crate::protocol::CommandEnvelope;
use crate::transport::{InboundSender, Transport, TransportError};
use crate::types::EventKind;

/// Remote context backed by a Rust [`VideoPlayer`], speaking the same JSON
/// wire format as the injected script.
pub struct LocalRemote<P> {
    player: Rc<RefCell<P>>,
    outbound: InboundSender,
    layout: RefCell<Option<LayoutHook>>,
    open: Cell<bool>,
}

impl<P> LocalRemote<P>
where
    P: VideoPlayer + 'static,
{
    pub fn new(player: Rc<RefCell<P>>, outbound: InboundSender) -> Self {
        Self {
            player,
            outbound,
            layout: RefCell::new(None),
            open: Cell::new(true),
        }
    }

    /// Hook run before the first `loaded` event of the next load.
    pub fn with_layout(self, hook: LayoutHook) -> Self {
        *self.layout.borrow_mut() = Some(hook);
        self
    }

    pub fn close(&self) {
        self.open.set(false);
    }
}

impl<P> Transport for LocalRemote<P>
where
    P: VideoPlayer + 'static,
{
    fn load(&self, document: &PlayerDocument) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }
        if !document.is_playable() {
            tracing::debug!(target: "bridge", "document has no player, nothing to install");
            return Ok(());
        }

        let mut player = self
            .player
            .try_borrow_mut()
            .map_err(|_| TransportError::Busy)?;
        for kind in EventKind::ALL {
            player.off(kind);
        }

        let mut emitter = Emitter::new(self.outbound.clone());
        if let Some(hook) = self.layout.borrow_mut().take() {
            emitter = emitter.with_layout(hook);
        }
        emitter.install(&mut *player);
        emitter.announce_ready();
        Ok(())
    }

    fn send(&self, payload: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Closed);
        }

        let envelope = match CommandEnvelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::debug!(target: "bridge", %err, "dropping malformed envelope");
                return Ok(());
            }
        };

        let reply = {
            let mut player = self
                .player
                .try_borrow_mut()
                .map_err(|_| TransportError::Busy)?;
            dispatch(&mut *player, &envelope)
        };
        if let Some(reply) = reply {
            self.outbound.post(reply);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.get() && !self.outbound.is_closed()
    }
}
