// src/core/events.rs

//! The client-side event bus: lifecycle, topology, and subscription events
//! with stable string names, fanned out to any number of async listeners.

use crate::core::errors::ClientError;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::EnumDiscriminants;
use tracing::{debug, warn};

/// An event emitted by the client.
///
/// The generated [`EventKind`] enum identifies each variant without its
/// payload; its `Display` form is the stable event name callers subscribe
/// with (`"ready"`, `"node:added"`, `"subscriber:end"`, ...). Events from
/// the dedicated subscriber connection carry the `subscriber:` prefix so
/// they are never mistaken for primary-connection transitions.
#[derive(Debug, Clone, EnumDiscriminants)]
#[strum_discriminants(
    name(EventKind),
    derive(Hash, strum_macros::Display, strum_macros::EnumString),
    strum(serialize_all = "lowercase")
)]
pub enum ClientEvent {
    /// The primary connection established its transport.
    Connect,
    /// The primary connection finished its handshake and accepts commands.
    Ready,
    /// A connection-level error from the primary connection.
    Error(ClientError),
    /// The primary connection's transport closed.
    Close,
    /// The driver is re-establishing the primary connection.
    Reconnecting,
    /// Terminal: the primary connection is gone for good.
    End,

    /// Cluster only: a node joined the topology.
    #[strum_discriminants(strum(serialize = "node:added"))]
    NodeAdded(String),
    /// Cluster only: a node left the topology.
    #[strum_discriminants(strum(serialize = "node:removed"))]
    NodeRemoved(String),
    /// Cluster only: a node-level error, with the failing node's address.
    #[strum_discriminants(strum(serialize = "node:error"))]
    NodeError { error: ClientError, address: String },

    #[strum_discriminants(strum(serialize = "subscriber:connect"))]
    SubscriberConnect,
    #[strum_discriminants(strum(serialize = "subscriber:ready"))]
    SubscriberReady,
    #[strum_discriminants(strum(serialize = "subscriber:error"))]
    SubscriberError(ClientError),
    #[strum_discriminants(strum(serialize = "subscriber:close"))]
    SubscriberClose,
    #[strum_discriminants(strum(serialize = "subscriber:reconnecting"))]
    SubscriberReconnecting,
    /// Terminal for the subscriber connection; the subscription registry is
    /// cleared right after this is emitted.
    #[strum_discriminants(strum(serialize = "subscriber:end"))]
    SubscriberEnd,

    /// A channel subscribe handshake succeeded. Carries the number of
    /// channels now active on the subscriber connection.
    #[strum_discriminants(strum(serialize = "subscription:ready"))]
    SubscriptionReady(usize),
    /// A channel subscribe handshake failed; no handler was registered.
    #[strum_discriminants(strum(serialize = "subscription:error"))]
    SubscriptionError(ClientError),
    /// A pattern subscribe handshake succeeded. Carries the number of
    /// patterns now active on the subscriber connection.
    #[strum_discriminants(strum(serialize = "psubscription:ready"))]
    PsubscriptionReady(usize),
    /// A pattern subscribe handshake failed; no handler was registered.
    #[strum_discriminants(strum(serialize = "psubscription:error"))]
    PsubscriptionError(ClientError),
}

impl ClientEvent {
    /// The kind (and thereby the stable name) of this event.
    pub fn kind(&self) -> EventKind {
        EventKind::from(self)
    }
}

/// An async callback invoked with every emitted event of the kind it was
/// registered for.
pub type EventListener =
    Arc<dyn Fn(ClientEvent) -> BoxFuture<'static, Result<(), ClientError>> + Send + Sync>;

/// `EventBus` is the fan-out point for all client events.
///
/// Emission is best-effort: every listener of the event's kind runs, in
/// registration order, even when an earlier one fails. A failing listener is
/// logged and otherwise ignored.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<EventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn on(&self, kind: EventKind, listener: EventListener) {
        self.listeners.lock().entry(kind).or_default().push(listener);
    }

    /// Emits `event`, awaiting each of its kind's listeners in turn.
    pub async fn emit(&self, event: ClientEvent) {
        let kind = event.kind();
        // Snapshot outside the lock; listeners may re-enter the bus.
        let snapshot: Vec<EventListener> = self
            .listeners
            .lock()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        if snapshot.is_empty() {
            debug!("Emitted '{kind}' with no active listeners.");
            return;
        }

        for listener in snapshot {
            if let Err(e) = listener(event.clone()).await {
                warn!("Listener for '{kind}' failed: {e}");
            }
        }
    }

    /// Drops every registered listener of every kind.
    pub fn remove_all_listeners(&self) {
        self.listeners.lock().clear();
    }

    /// The number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }
}
