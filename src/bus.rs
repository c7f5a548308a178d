//! Host-side publish/subscribe registry keyed by event name.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::types::EventKind;

pub type Listener = Rc<dyn Fn(&Value)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(u64, Listener)>>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&Value) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Rc::new(listener)));

        Subscription {
            registry: Rc::downgrade(&self.registry),
            kind,
            id,
            active: Cell::new(true),
        }
    }

    /// Invoke every listener registered for `kind`, in registration order.
    ///
    /// The listener set is snapshotted first, so listeners may subscribe or
    /// unsubscribe from inside a callback. A panicking listener is logged and
    /// skipped. Returns how many listeners ran to completion.
    pub fn emit(&self, kind: EventKind, data: &Value) -> usize {
        let snapshot: Vec<Listener> = match self.registry.borrow().listeners.get(&kind) {
            Some(listeners) => listeners.iter().map(|(_, f)| Rc::clone(f)).collect(),
            None => return 0,
        };

        let mut completed = 0;
        for listener in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(data))) {
                Ok(()) => completed += 1,
                Err(payload) => {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(target: "bridge", event = %kind, %reason, "event listener panicked");
                }
            }
        }
        completed
    }

    pub fn has_listeners(&self, kind: EventKind) -> bool {
        self.registry.borrow().listeners.contains_key(&kind)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .listeners
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Event names that currently have at least one listener.
    pub fn event_names(&self) -> Vec<EventKind> {
        let mut names: Vec<_> = self.registry.borrow().listeners.keys().copied().collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.registry.borrow_mut().listeners.clear();
    }
}

/// Revocation handle returned by [`EventBus::subscribe`].
///
/// Dropping it keeps the listener registered.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    kind: EventKind,
    id: u64,
    active: Cell<bool>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Remove exactly this listener. Idempotent, and a no-op once the bus is
    /// gone or cleared. Returns whether a listener was removed.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.replace(false) {
            return false;
        }
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let Some(listeners) = registry.listeners.get_mut(&self.kind) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            registry.listeners.remove(&self.kind);
        }
        removed
    }
}
