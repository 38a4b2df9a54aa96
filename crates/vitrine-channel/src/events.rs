// SPDX-FileCopyrightText: 2026 Vitrine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire frame format and the explicit event subscription registry.
//!
//! Subscriptions are explicit: a consumer receives only events it asked
//! for, identified by name. A handler panic-free contract is on the
//! handler itself; the registry just fans frames out.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Outbound heartbeat probe.
pub const EVENT_PING: &str = "ping";
/// Inbound heartbeat reply.
pub const EVENT_PONG: &str = "pong";
/// New dashboard payload pushed by the backend.
pub const EVENT_DASHBOARD_UPDATE: &str = "dashboard:update";
/// Profile switch, pushed by the backend or broadcast by this client.
pub const EVENT_PROFILE_CHANGED: &str = "profile:changed";
/// Backend connection acknowledgement.
pub const EVENT_CONNECTION: &str = "connection";
/// Synthetic local event emitted on every connection state transition.
/// Never sent over the wire.
pub const EVENT_STATE_CHANGE: &str = "state:change";

/// One JSON frame on the wire: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WireFrame {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
        }
    }
}

/// Token returned by [`HandlerRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Event-name-keyed handler registry.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Mutex<HashMap<String, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for frames named `event`. Multiple handlers per
    /// event are delivered in subscription order.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove the handler registered under `id`. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut handlers = self.lock();
        for list in handlers.values_mut() {
            list.retain(|(sid, _)| *sid != id);
        }
        handlers.retain(|_, list| !list.is_empty());
    }

    /// Deliver `data` to every handler subscribed to `event`. Returns how
    /// many handlers completed. Events nobody subscribed to are dropped.
    ///
    /// A panicking handler is caught and logged; it never takes down the
    /// remaining handlers or the dispatching task.
    pub fn dispatch(&self, event: &str, data: &Value) -> usize {
        let handlers: Vec<Handler> = {
            let guard = self.lock();
            match guard.get(event) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };
        if handlers.is_empty() {
            debug!(event, "no subscribers for event");
            return 0;
        }
        let mut completed = 0;
        for handler in &handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(data))).is_ok() {
                completed += 1;
            } else {
                warn!(event, "event handler panicked, skipping it");
            }
        }
        completed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<(SubscriptionId, Handler)>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn wire_frame_roundtrips() {
        let frame = WireFrame::new(EVENT_DASHBOARD_UPDATE, serde_json::json!({"mode": "x"}));
        let json = serde_json::to_string(&frame).unwrap();
        let back: WireFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event, "dashboard:update");
        assert_eq!(back.data["mode"], "x");
    }

    #[test]
    fn frame_without_data_defaults_to_null() {
        let frame: WireFrame = serde_json::from_str(r#"{"event": "pong"}"#).unwrap();
        assert_eq!(frame.event, "pong");
        assert!(frame.data.is_null());
    }

    #[test]
    fn dispatch_reaches_all_subscribers_of_the_event() {
        let registry = HandlerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            registry.subscribe("a", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        registry.subscribe("b", |_| panic!("wrong event must not fire"));

        let delivered = registry.dispatch("a", &Value::Null);
        assert_eq!(delivered, 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let registry = HandlerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let id = {
            let count = Arc::clone(&count);
            registry.subscribe("a", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        registry.dispatch("a", &Value::Null);
        registry.unsubscribe(id);
        registry.dispatch("a", &Value::Null);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_handler_does_not_stop_the_others() {
        let registry = HandlerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        registry.subscribe("a", |_| panic!("handler blew up"));
        {
            let count = Arc::clone(&count);
            registry.subscribe("a", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        let completed = registry.dispatch("a", &Value::Null);
        assert_eq!(completed, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_without_subscribers_is_a_noop() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.dispatch("nobody:listens", &Value::Null), 0);
    }
}
