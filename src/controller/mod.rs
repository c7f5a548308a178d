//! Host-side command execution.
//!
//! A [`Controller`] turns typed commands into futures. The web view
//! controller correlates replies by id over a transport; the direct
//! controller calls a [`VideoPlayer`](crate::remote::VideoPlayer) in place.

pub mod direct;
pub mod webview;

use std::cell::Cell;

use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{Command, RemoteError};
use crate::remote::PlayerError;
use crate::transport::TransportError;

pub use direct::DirectController;
pub use webview::WebViewController;

/// Resolves when the command settles.
///
/// The command is already on its way when this is returned; dropping the
/// future only gives up on the reply.
pub type CommandFuture = LocalBoxFuture<'static, Result<Value, CommandError>>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Player(#[from] PlayerError),
}

pub trait Controller {
    /// Issue `command`. Replies only matter for commands that expect one;
    /// everything else resolves to `Value::Null` right away.
    fn call(&self, command: Command) -> CommandFuture;

    /// Release the controller. Pending commands resolve to `Value::Null` and
    /// later calls resolve to `Value::Null` without sending anything.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn stats(&self) -> ControllerStats {
        ControllerStats::default()
    }
}

/// Counters describing how commands settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub sent: u64,
    pub replied: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Replies whose command had already timed out, been abandoned or been
    /// disposed.
    pub late_replies: u64,
}

/// Monotonic correlation ids, shared by every controller a view creates so
/// ids are never reused across remote context recreations.
#[derive(Debug, Default)]
pub struct CommandIds {
    last: Cell<u64>,
}

impl CommandIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> String {
        let id = self.last.get() + 1;
        self.last.set(id);
        id.to_string()
    }
}
