use thiserror::Error;
use tokio::sync::mpsc;

use crate::remote::script::PlayerDocument;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("remote script failed: {0}")]
    Script(String),
    #[error("remote context is busy")]
    Busy,
}

/// Outbound half of the channel between host and remote context.
///
/// The host environment implements this for whatever surface it renders the
/// player into. Everything the remote context says travels back as strings on
/// the channel returned by [`inbound_channel`], never through a return value,
/// so implementations must not deliver replies from inside [`Transport::send`].
pub trait Transport {
    /// Render the player document into the surface. Calling it again
    /// recreates the remote context.
    fn load(&self, document: &PlayerDocument) -> Result<(), TransportError>;

    /// Deliver one serialized command envelope.
    fn send(&self, payload: &str) -> Result<(), TransportError>;

    fn is_open(&self) -> bool {
        true
    }
}

pub type InboundSender = mpsc::UnboundedSender<String>;
pub type InboundReceiver = mpsc::UnboundedReceiver<String>;

/// Channel carrying raw remote to host messages.
pub fn inbound_channel() -> (InboundSender, InboundReceiver) {
    mpsc::unbounded_channel()
}
