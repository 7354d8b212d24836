// src/connection/proxy.rs

//! Forwards a connection's native events onto the `EventBus` under the
//! client's stable event names.

use crate::connection::driver::{NativeEvent, RawConnection, Topology};
use crate::core::events::{ClientEvent, EventBus};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Which connection a proxied event originated from.
///
/// Subscriber-connection lifecycle events carry the `subscriber:` name
/// prefix so callers can always tell the two connections apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRole {
    Primary,
    Subscriber,
}

/// Maps a native lifecycle event to its bus event for `role`.
///
/// Returns `None` for everything that is not a plain lifecycle transition:
/// `end` (terminal teardown is owned by the caller), message delivery
/// (routed to the subscription registry instead), and node-topology events
/// on anything but a primary cluster connection.
pub(super) fn translate(
    role: ConnectionRole,
    topology: Topology,
    event: &NativeEvent,
) -> Option<ClientEvent> {
    use ConnectionRole::{Primary, Subscriber};

    match (role, event) {
        (Primary, NativeEvent::Connect) => Some(ClientEvent::Connect),
        (Primary, NativeEvent::Ready) => Some(ClientEvent::Ready),
        (Primary, NativeEvent::Error(e)) => Some(ClientEvent::Error(e.clone())),
        (Primary, NativeEvent::Close) => Some(ClientEvent::Close),
        (Primary, NativeEvent::Reconnecting) => Some(ClientEvent::Reconnecting),

        (Subscriber, NativeEvent::Connect) => Some(ClientEvent::SubscriberConnect),
        (Subscriber, NativeEvent::Ready) => Some(ClientEvent::SubscriberReady),
        (Subscriber, NativeEvent::Error(e)) => Some(ClientEvent::SubscriberError(e.clone())),
        (Subscriber, NativeEvent::Close) => Some(ClientEvent::SubscriberClose),
        (Subscriber, NativeEvent::Reconnecting) => Some(ClientEvent::SubscriberReconnecting),

        (Primary, NativeEvent::NodeAdded(node)) if topology == Topology::Cluster => {
            Some(ClientEvent::NodeAdded(node.clone()))
        }
        (Primary, NativeEvent::NodeRemoved(node)) if topology == Topology::Cluster => {
            Some(ClientEvent::NodeRemoved(node.clone()))
        }
        (Primary, NativeEvent::NodeError { error, address }) if topology == Topology::Cluster => {
            Some(ClientEvent::NodeError {
                error: error.clone(),
                address: address.clone(),
            })
        }

        _ => None,
    }
}

/// Wires the primary connection's native events into the bus and owns the
/// teardown sequence for its terminal `end` event.
pub struct ConnectionEventProxy {
    bus: Arc<EventBus>,
}

impl ConnectionEventProxy {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// Registers the forwarding listener on `connection`.
    ///
    /// On the native `end` event the listener first removes every native
    /// listener from the connection, then emits `end` on the bus while
    /// listeners can still hear it, and only then silences the bus itself.
    pub fn attach(&self, connection: &Arc<dyn RawConnection>) {
        let topology = connection.topology();
        let bus = Arc::clone(&self.bus);
        // The connection owns this listener; a Weak reference back avoids
        // the cycle.
        let conn: Weak<dyn RawConnection> = Arc::downgrade(connection);

        connection.register_listener(Arc::new(move |event| {
            let bus = Arc::clone(&bus);
            let conn = conn.clone();
            Box::pin(async move {
                match event {
                    NativeEvent::End => {
                        if let Some(conn) = conn.upgrade() {
                            conn.remove_all_listeners();
                        }
                        bus.emit(ClientEvent::End).await;
                        bus.remove_all_listeners();
                        debug!("Primary connection ended, all listeners cleared.");
                    }
                    other => {
                        if let Some(mapped) = translate(ConnectionRole::Primary, topology, &other) {
                            bus.emit(mapped).await;
                        }
                    }
                }
            })
        }));
        debug!("Primary connection events proxied onto the bus.");
    }
}
