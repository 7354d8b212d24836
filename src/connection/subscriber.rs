// src/connection/subscriber.rs

//! Owns the lazily-created connection dedicated to subscription traffic and
//! the subscribe/unsubscribe flows running over it.

use crate::connection::driver::{ConnectionFactory, NativeEvent, RawConnection};
use crate::connection::proxy::{ConnectionRole, translate};
use crate::core::errors::ClientError;
use crate::core::events::{ClientEvent, EventBus};
use crate::core::pubsub::{ChannelHandler, PatternHandler, SubscriptionRegistry};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Manages the dedicated subscriber connection: created on the first
/// `subscribe`/`psubscribe`, shared by every subsequent one, and torn down
/// when the underlying connection reports termination.
pub struct SubscriberManager {
    factory: Arc<dyn ConnectionFactory>,
    bus: Arc<EventBus>,
    registry: Arc<SubscriptionRegistry>,
    /// Presence slot for the subscriber connection. The lock is held across
    /// the async create so concurrent callers cannot race a second
    /// connection into existence.
    connection: Mutex<Option<Arc<dyn RawConnection>>>,
}

impl SubscriberManager {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        bus: Arc<EventBus>,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self {
            factory,
            bus,
            registry,
            connection: Mutex::new(None),
        }
    }

    /// Returns the subscriber connection, creating and connecting it on
    /// first use. Idempotent: an existing connection is returned as-is.
    pub async fn ensure(self: &Arc<Self>) -> Result<Arc<dyn RawConnection>, ClientError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let conn = self.factory.create().await?;
        self.attach(&conn);
        // Listeners are in place before the transport opens, so the initial
        // subscriber:connect / subscriber:ready reach the bus.
        conn.connect().await?;
        *slot = Some(Arc::clone(&conn));
        debug!("Subscriber connection created.");
        Ok(conn)
    }

    /// Whether the subscriber connection currently exists.
    pub async fn is_active(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// The current subscriber connection, if any.
    pub(crate) async fn current(&self) -> Option<Arc<dyn RawConnection>> {
        self.connection.lock().await.clone()
    }

    /// Registers the single native listener for the subscriber connection:
    /// message routing into the registry, `subscriber:`-prefixed lifecycle
    /// proxying, and terminal cleanup.
    fn attach(self: &Arc<Self>, connection: &Arc<dyn RawConnection>) {
        let topology = connection.topology();
        let manager: Weak<SubscriberManager> = Arc::downgrade(self);
        let conn: Weak<dyn RawConnection> = Arc::downgrade(connection);

        connection.register_listener(Arc::new(move |event| {
            let manager = manager.clone();
            let conn = conn.clone();
            Box::pin(async move {
                let Some(manager) = manager.upgrade() else {
                    return;
                };
                match event {
                    NativeEvent::Message { channel, payload } => {
                        manager.registry.dispatch_message(&channel, payload);
                    }
                    NativeEvent::PatternMessage {
                        pattern,
                        channel,
                        payload,
                    } => {
                        manager
                            .registry
                            .dispatch_pattern_message(&pattern, &channel, payload);
                    }
                    NativeEvent::End => {
                        // Empty the presence slot first: a subscribe racing
                        // this teardown must build a fresh connection.
                        let ended = manager.connection.lock().await.take();
                        if let Some(conn) = ended.or_else(|| conn.upgrade()) {
                            conn.remove_all_listeners();
                        }
                        manager.bus.emit(ClientEvent::SubscriberEnd).await;
                        manager.registry.clear();
                        debug!("Subscriber connection ended, registry cleared.");
                    }
                    other => {
                        if let Some(mapped) =
                            translate(ConnectionRole::Subscriber, topology, &other)
                        {
                            manager.bus.emit(mapped).await;
                        }
                    }
                }
            })
        }));
    }

    /// Subscribes `handler` to `channel`.
    ///
    /// Fails fast with `DuplicateSubscription` (the driver is not touched)
    /// when the channel already has a handler. The handshake outcome is
    /// reported on the bus: `subscription:ready` with the driver's
    /// active-channel count, or `subscription:error` with the failure.
    pub async fn subscribe(
        self: &Arc<Self>,
        channel: &str,
        handler: ChannelHandler,
    ) -> Result<(), ClientError> {
        let conn = self.ensure().await?;
        if self.registry.contains_channel(channel) {
            return Err(ClientError::DuplicateSubscription(channel.to_string()));
        }

        match conn.subscribe(channel).await {
            Ok(count) => match self.registry.register_channel(channel, handler) {
                Ok(()) => self.bus.emit(ClientEvent::SubscriptionReady(count)).await,
                // A concurrent subscribe for the same channel won the
                // handshake race; its handler stays active.
                Err(e) => {
                    warn!("Subscription to '{channel}' raced an existing handler.");
                    self.bus.emit(ClientEvent::SubscriptionError(e)).await;
                }
            },
            Err(e) => {
                warn!("Subscribe handshake for '{channel}' failed: {e}");
                self.bus.emit(ClientEvent::SubscriptionError(e)).await;
            }
        }
        Ok(())
    }

    /// Unsubscribes from `channel`.
    ///
    /// The handler is removed before the protocol round-trip resolves; a
    /// message still in flight is dropped by the registry's no-handler
    /// policy.
    pub async fn unsubscribe(&self, channel: &str) -> Result<(), ClientError> {
        self.registry.unregister_channel(channel);
        if let Some(conn) = self.current().await {
            conn.unsubscribe(channel).await?;
        }
        Ok(())
    }

    /// Pattern counterpart of [`SubscriberManager::subscribe`], reporting on
    /// `psubscription:ready` / `psubscription:error`.
    pub async fn psubscribe(
        self: &Arc<Self>,
        pattern: &str,
        handler: PatternHandler,
    ) -> Result<(), ClientError> {
        let conn = self.ensure().await?;
        if self.registry.contains_pattern(pattern) {
            return Err(ClientError::DuplicateSubscription(pattern.to_string()));
        }

        match conn.psubscribe(pattern).await {
            Ok(count) => match self.registry.register_pattern(pattern, handler) {
                Ok(()) => self.bus.emit(ClientEvent::PsubscriptionReady(count)).await,
                Err(e) => {
                    warn!("Subscription to pattern '{pattern}' raced an existing handler.");
                    self.bus.emit(ClientEvent::PsubscriptionError(e)).await;
                }
            },
            Err(e) => {
                warn!("Psubscribe handshake for '{pattern}' failed: {e}");
                self.bus.emit(ClientEvent::PsubscriptionError(e)).await;
            }
        }
        Ok(())
    }

    /// Pattern counterpart of [`SubscriberManager::unsubscribe`].
    pub async fn punsubscribe(&self, pattern: &str) -> Result<(), ClientError> {
        self.registry.unregister_pattern(pattern);
        if let Some(conn) = self.current().await {
            conn.punsubscribe(pattern).await?;
        }
        Ok(())
    }
}
