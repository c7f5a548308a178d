//! Command/event bridge between a host application and an embedded Vimeo
//! player running in a context it can only reach through messages.

pub mod bus;
pub mod config;
pub mod controller;
pub mod handle;
pub mod oembed;
pub mod protocol;
pub mod remote;
pub mod source;
pub mod transport;
pub mod types;
pub mod view;

pub use bus::{EventBus, Subscription};
pub use config::BridgeConfig;
pub use controller::{CommandError, Controller, ControllerStats};
pub use handle::PlayerHandle;
pub use protocol::{BridgeMessage, Command, CommandEnvelope, CommandName, RemoteError};
pub use remote::headless::HeadlessWebView;
pub use remote::local::LocalRemote;
pub use remote::{PlayerError, VideoPlayer};
pub use source::{parse_source, PlayerSource};
pub use transport::{inbound_channel, Transport, TransportError};
pub use types::{EmbedOptions, EventKind};
pub use view::{DirectPlayerView, PlayerView};
