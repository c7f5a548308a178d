use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::future::{self, FutureExt};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::{CommandError, CommandFuture, CommandIds, Controller, ControllerStats};
use crate::protocol::{Command, CommandEnvelope, CommandName, RemoteError};
use crate::transport::{Transport, TransportError};

enum Settlement {
    Replied(Value),
    Failed(RemoteError),
    Disposed,
}

#[derive(Default)]
struct Shared {
    pending: RefCell<HashMap<String, oneshot::Sender<Settlement>>>,
    stats: Cell<ControllerStats>,
    disposed: Cell<bool>,
}

impl Shared {
    fn record(&self, update: impl FnOnce(&mut ControllerStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

/// Controller that reaches the player through a [`Transport`] and matches
/// replies to commands by correlation id.
///
/// Each command that expects a reply is `Sent` until it is `Resolved` by a
/// matching message or `TimedOut`; whichever happens first removes the
/// pending entry, so the other becomes a no-op.
pub struct WebViewController {
    transport: Rc<dyn Transport>,
    ids: Rc<CommandIds>,
    timeout: Duration,
    shared: Rc<Shared>,
}

impl WebViewController {
    pub fn new(transport: Rc<dyn Transport>, ids: Rc<CommandIds>, timeout: Duration) -> Self {
        Self {
            transport,
            ids,
            timeout,
            shared: Rc::new(Shared::default()),
        }
    }

    /// Settle the pending command `id`. Returns `false` when nothing was
    /// waiting, which is counted as a late reply.
    pub fn settle(&self, id: &str, outcome: Result<Value, RemoteError>) -> bool {
        let waiter = self.shared.pending.borrow_mut().remove(id);
        let Some(waiter) = waiter else {
            self.shared.record(|stats| stats.late_replies += 1);
            tracing::debug!(target: "bridge", id, "dropping reply for unknown command id");
            return false;
        };

        let settlement = match outcome {
            Ok(data) => {
                self.shared.record(|stats| stats.replied += 1);
                Settlement::Replied(data)
            }
            Err(error) => {
                self.shared.record(|stats| stats.failed += 1);
                tracing::warn!(target: "bridge", id, code = error.code, message = %error.message, "remote command failed");
                Settlement::Failed(error)
            }
        };

        if waiter.send(settlement).is_err() {
            self.shared.record(|stats| stats.late_replies += 1);
            tracing::debug!(target: "bridge", id, "caller stopped waiting before the reply");
        }
        true
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    fn send(&self, envelope: &CommandEnvelope) -> Result<(), TransportError> {
        let payload = envelope.encode()?;
        self.transport.send(&payload)?;
        self.shared.record(|stats| stats.sent += 1);
        Ok(())
    }

    fn connected(&self) -> bool {
        !self.shared.disposed.get() && self.transport.is_open()
    }
}

impl Controller for WebViewController {
    fn call(&self, command: Command) -> CommandFuture {
        let name = command.name();
        if !self.connected() {
            tracing::debug!(target: "bridge", command = %name, "not connected, resolving to default");
            return future::ready(Ok(Value::Null)).boxed_local();
        }

        if !command.expects_reply() {
            if let Err(err) = self.send(&command.to_envelope(None)) {
                tracing::warn!(target: "bridge", command = %name, %err, "failed to send command");
            }
            return future::ready(Ok(Value::Null)).boxed_local();
        }

        let id = self.ids.next();
        let (tx, rx) = oneshot::channel();
        self.shared.pending.borrow_mut().insert(id.clone(), tx);

        if let Err(err) = self.send(&command.to_envelope(Some(id.clone()))) {
            self.shared.pending.borrow_mut().remove(&id);
            return future::ready(Err(CommandError::from(err))).boxed_local();
        }

        let deadline = Instant::now() + self.timeout;
        let guard = PendingGuard {
            shared: Rc::downgrade(&self.shared),
            id,
        };
        async move { guard.wait(name, rx, deadline).await }.boxed_local()
    }

    fn dispose(&self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        let drained: Vec<_> = self.shared.pending.borrow_mut().drain().collect();
        if !drained.is_empty() {
            tracing::debug!(target: "bridge", count = drained.len(), "settling pending commands on dispose");
        }
        for (_, waiter) in drained {
            let _ = waiter.send(Settlement::Disposed);
        }
    }

    fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }

    fn stats(&self) -> ControllerStats {
        self.shared.stats.get()
    }
}

/// Owns a pending entry for as long as its caller waits on it.
struct PendingGuard {
    shared: Weak<Shared>,
    id: String,
}

impl PendingGuard {
    async fn wait(
        self,
        name: CommandName,
        rx: oneshot::Receiver<Settlement>,
        deadline: Instant,
    ) -> Result<Value, CommandError> {
        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(Settlement::Replied(data))) => Ok(data),
            Ok(Ok(Settlement::Failed(error))) => Err(CommandError::Remote(error)),
            Ok(Ok(Settlement::Disposed)) | Ok(Err(_)) => Ok(Value::Null),
            Err(_) => {
                if let Some(shared) = self.shared.upgrade() {
                    if shared.pending.borrow_mut().remove(&self.id).is_some() {
                        shared.record(|stats| stats.timed_out += 1);
                    }
                }
                tracing::warn!(target: "bridge", command = %name, id = %self.id, "command timed out");
                Ok(Value::Null)
            }
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.pending.borrow_mut().remove(&self.id);
        }
    }
}
