use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::future::{self, FutureExt};
use serde_json::Value;

use super::{CommandError, CommandFuture, Controller, ControllerStats};
use crate::protocol::Command;
use crate::remote::dispatcher::execute;
use crate::remote::{PlayerError, VideoPlayer};
use crate::types::EventKind;

/// Controller that owns a handle to a player living in the same context.
///
/// Commands run synchronously when called; the returned future is already
/// complete. Setters resolve to the value the player applied. Failures of
/// fire-and-forget commands are logged and resolve to `Value::Null`, the
/// same as over a transport.
pub struct DirectController<P> {
    player: Rc<RefCell<P>>,
    stats: Cell<ControllerStats>,
    disposed: Cell<bool>,
}

impl<P> DirectController<P>
where
    P: VideoPlayer + 'static,
{
    pub fn new(player: Rc<RefCell<P>>) -> Self {
        Self {
            player,
            stats: Cell::new(ControllerStats::default()),
            disposed: Cell::new(false),
        }
    }

    fn record(&self, update: impl FnOnce(&mut ControllerStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    fn run(&self, command: &Command) -> Result<Value, PlayerError> {
        let mut player = self.player.try_borrow_mut().map_err(|_| PlayerError::Busy)?;
        execute(&mut *player, command)
    }
}

impl<P> Controller for DirectController<P>
where
    P: VideoPlayer + 'static,
{
    fn call(&self, command: Command) -> CommandFuture {
        if self.disposed.get() {
            return future::ready(Ok(Value::Null)).boxed_local();
        }

        self.record(|stats| stats.sent += 1);
        let outcome = self.run(&command);
        let result = match outcome {
            Ok(value) => {
                self.record(|stats| stats.replied += 1);
                Ok(value)
            }
            Err(err) => {
                self.record(|stats| stats.failed += 1);
                tracing::warn!(target: "bridge", command = %command.name(), %err, "player command failed");
                if command.expects_reply() {
                    Err(CommandError::Player(err))
                } else {
                    Ok(Value::Null)
                }
            }
        };
        future::ready(result).boxed_local()
    }

    /// Unhooks every listener and destroys the player.
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        match self.player.try_borrow_mut() {
            Ok(mut player) => {
                for kind in EventKind::ALL {
                    player.off(kind);
                }
                if let Err(err) = player.destroy() {
                    tracing::warn!(target: "bridge", %err, "error destroying player");
                }
            }
            Err(_) => {
                tracing::warn!(target: "bridge", "player busy during dispose, not destroyed");
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn stats(&self) -> ControllerStats {
        self.stats.get()
    }
}
