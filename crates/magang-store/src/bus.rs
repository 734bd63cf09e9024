//! In-process change notification.
//!
//! Every mutating store operation publishes a [`ChangeEvent`] for the
//! collection it touched. Subscribers register a callback per collection
//! name and are invoked *synchronously, before the mutating call
//! returns* — consumers re-read the collection themselves; the store
//! pushes no diffs.
//!
//! Events are wrapped in [`Arc`] so delivering to multiple subscribers
//! does not clone the record payload.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tracing::{trace, warn};

/// A change to a collection, delivered to its subscribers.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// A record was created or updated; carries the stamped record.
    Upserted(Arc<Value>),
    /// A record was deleted.
    Removed {
        /// Id of the removed record.
        id: String,
    },
    /// The whole collection was replaced (bulk reseed). Subscribers
    /// should re-read rather than patch.
    Reloaded,
}

type Callback = Arc<dyn Fn(&str, &ChangeEvent) + Send + Sync>;

/// Per-collection synchronous publish/subscribe registry.
///
/// Cheaply cloneable (`Arc`-backed); one bus serves every collection of
/// a store context.
#[derive(Clone, Default)]
pub(crate) struct ChangeBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    state: Mutex<BusState>,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscribers: HashMap<String, Vec<(u64, Callback)>>,
}

impl BusInner {
    fn unsubscribe(&self, name: &str, id: u64) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(subs) = state.subscribers.get_mut(name) {
            subs.retain(|(sub_id, _)| *sub_id != id);
            if subs.is_empty() {
                state.subscribers.remove(name);
            }
        }
        trace!(collection = name, id, "change subscriber removed");
    }
}

impl ChangeBus {
    /// Register `callback` for changes to `name`.
    ///
    /// The returned [`Subscription`] keeps the registration alive;
    /// dropping it unsubscribes.
    pub(crate) fn subscribe(
        &self,
        name: &str,
        callback: impl Fn(&str, &ChangeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
            let id = state.next_id;
            state.next_id += 1;
            state
                .subscribers
                .entry(name.to_string())
                .or_default()
                .push((id, Arc::new(callback)));
            id
        };
        trace!(collection = name, id, "change subscriber registered");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            name: name.to_string(),
            id,
        }
    }

    /// Deliver `event` to every subscriber of `name`, in registration
    /// order, on the caller's thread.
    ///
    /// Callbacks are cloned out of the lock before being invoked, so a
    /// callback may itself call back into the store.
    pub(crate) fn publish(&self, name: &str, event: &ChangeEvent) {
        let targets: Vec<Callback> = {
            let state = match self.inner.state.lock() {
                Ok(state) => state,
                Err(err) => {
                    warn!(collection = name, error = %err, "change bus lock poisoned, dropping event");
                    return;
                }
            };
            state
                .subscribers
                .get(name)
                .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        trace!(collection = name, receivers = targets.len(), "change published");
        for callback in targets {
            callback(name, event);
        }
    }

    /// Number of active subscribers for `name`.
    pub(crate) fn subscriber_count(&self, name: &str) -> usize {
        let state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        state.subscribers.get(name).map_or(0, Vec::len)
    }
}

/// Handle for an active change subscription.
///
/// Unsubscribes when dropped; [`Subscription::unsubscribe`] makes the
/// intent explicit at call sites.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    bus: Weak<BusInner>,
    name: String,
    id: u64,
}

impl Subscription {
    /// Remove this subscriber from the bus.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    /// The collection name this subscription listens on.
    pub fn collection(&self) -> &str {
        &self.name
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(&self.name, self.id);
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────
