use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use super::VideoPlayer;
use crate::protocol::BridgeMessage;
use crate::types::EventKind;

/// Somewhere remote to host messages can be posted.
pub trait MessageSink {
    /// Returns `false` once the receiving side is gone.
    fn post(&self, message: BridgeMessage) -> bool;
}

impl MessageSink for UnboundedSender<String> {
    fn post(&self, message: BridgeMessage) -> bool {
        self.send(message.encode()).is_ok()
    }
}

impl MessageSink for UnboundedSender<BridgeMessage> {
    fn post(&self, message: BridgeMessage) -> bool {
        self.send(message).is_ok()
    }
}

/// Runs once, right before the first `loaded` event is forwarded.
pub type LayoutHook = Box<dyn FnOnce()>;

/// Forwards every player event onto a sink as an event message.
pub struct Emitter<S> {
    sink: S,
    layout: Rc<RefCell<Option<LayoutHook>>>,
}

impl<S> Emitter<S>
where
    S: MessageSink + Clone + 'static,
{
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            layout: Rc::new(RefCell::new(None)),
        }
    }

    pub fn with_layout(self, hook: LayoutHook) -> Self {
        *self.layout.borrow_mut() = Some(hook);
        self
    }

    /// Register exactly one forwarding listener per event name.
    pub fn install<P>(&self, player: &mut P)
    where
        P: VideoPlayer + ?Sized,
    {
        for kind in EventKind::ALL {
            let sink = self.sink.clone();
            let layout = (kind == EventKind::Loaded).then(|| Rc::clone(&self.layout));
            player.on(
                kind,
                Box::new(move |data: Value| {
                    let data = if kind.carries_payload() { data } else { Value::Null };
                    if let Some(layout) = &layout {
                        let hook = layout.borrow_mut().take();
                        if let Some(hook) = hook {
                            hook();
                        }
                    }
                    if !sink.post(BridgeMessage::Event { kind, data }) {
                        tracing::debug!(target: "bridge", event = %kind, "host is gone, event dropped");
                    }
                }),
            );
        }
    }

    pub fn announce_ready(&self) -> bool {
        self.sink.post(BridgeMessage::Ready)
    }
}
