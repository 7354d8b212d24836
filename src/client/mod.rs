// src/client/mod.rs

//! The caller-facing client facade, tying together the event bus, the
//! subscription registry, the subscriber connection, and shutdown control.

use crate::config::ClientConfig;
use crate::connection::driver::{ConnectionFactory, RawConnection};
use crate::connection::{ConnectionEventProxy, LifecycleController, SubscriberManager};
use crate::core::errors::ClientError;
use crate::core::events::{EventBus, EventKind, EventListener};
use crate::core::pubsub::{ChannelHandler, PatternHandler, SubscriptionRegistry};
use std::sync::Arc;
use tracing::debug;

/// A client over a SpinelDB-style broker, standalone or cluster.
///
/// The client owns exactly one primary connection for its whole lifetime and
/// at most one lazily-created subscriber connection dedicated to Pub/Sub
/// traffic. Lifecycle transitions of both, cluster topology changes, and
/// subscription handshake outcomes are observable through
/// [`SpinelClient::on`].
pub struct SpinelClient {
    config: ClientConfig,
    primary: Arc<dyn RawConnection>,
    bus: Arc<EventBus>,
    registry: Arc<SubscriptionRegistry>,
    subscriber: Arc<SubscriberManager>,
    lifecycle: LifecycleController,
}

impl SpinelClient {
    /// Builds a client over an existing primary connection.
    ///
    /// The primary's lifecycle events are proxied onto the bus immediately;
    /// the transport itself is opened by [`SpinelClient::connect`]. `factory`
    /// is used once, to create the subscriber connection on the first
    /// `subscribe`/`psubscribe` call.
    pub fn new(
        primary: Arc<dyn RawConnection>,
        factory: Arc<dyn ConnectionFactory>,
        config: ClientConfig,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let registry = Arc::new(SubscriptionRegistry::new());
        let subscriber = Arc::new(SubscriberManager::new(
            factory,
            Arc::clone(&bus),
            Arc::clone(&registry),
        ));
        ConnectionEventProxy::new(Arc::clone(&bus)).attach(&primary);
        let lifecycle = LifecycleController::new(Arc::clone(&primary), Arc::clone(&subscriber));

        debug!(client = %config.name, "Client constructed.");
        Self {
            config,
            primary,
            bus,
            registry,
            subscriber,
            lifecycle,
        }
    }

    /// The configured name of this client, as used in its log statements.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Opens the primary connection's transport.
    pub async fn connect(&self) -> Result<(), ClientError> {
        debug!(client = %self.config.name, "Connecting primary connection.");
        self.primary.connect().await
    }

    /// Registers an async listener for events of `kind`.
    pub fn on(&self, kind: EventKind, listener: EventListener) {
        self.bus.on(kind, listener);
    }

    /// Subscribes `handler` to messages published on `channel`.
    ///
    /// Creates the subscriber connection on first use. Returns
    /// `DuplicateSubscription` when the channel already has a handler; the
    /// handshake outcome arrives via `subscription:ready` /
    /// `subscription:error`.
    pub async fn subscribe(
        &self,
        channel: &str,
        handler: ChannelHandler,
    ) -> Result<(), ClientError> {
        self.subscriber.subscribe(channel, handler).await
    }

    /// Drops the handler for `channel` and issues the protocol-level
    /// unsubscribe. Idempotent.
    pub async fn unsubscribe(&self, channel: &str) -> Result<(), ClientError> {
        self.subscriber.unsubscribe(channel).await
    }

    /// Subscribes `handler` to messages on channels matching the glob-style
    /// `pattern`. Outcome arrives via `psubscription:ready` /
    /// `psubscription:error`.
    pub async fn psubscribe(
        &self,
        pattern: &str,
        handler: PatternHandler,
    ) -> Result<(), ClientError> {
        self.subscriber.psubscribe(pattern, handler).await
    }

    /// Drops the handler for `pattern` and issues the protocol-level
    /// unsubscribe. Idempotent.
    pub async fn punsubscribe(&self, pattern: &str) -> Result<(), ClientError> {
        self.subscriber.punsubscribe(pattern).await
    }

    /// Gracefully shuts down the primary connection, then the subscriber
    /// connection when one exists. Safe to call repeatedly.
    pub async fn quit(&self) -> Result<(), ClientError> {
        debug!(client = %self.config.name, "Client quitting.");
        self.lifecycle.quit().await
    }

    /// Forcefully shuts down both connections, abandoning in-flight
    /// operations. Safe to call repeatedly.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        debug!(client = %self.config.name, "Client disconnecting.");
        self.lifecycle.disconnect().await
    }

    /// The number of channels and patterns with an active handler.
    pub fn subscription_count(&self) -> usize {
        self.registry.channel_count() + self.registry.pattern_count()
    }

    /// Returns a list of all channels with an active handler.
    pub fn active_channels(&self) -> Vec<String> {
        self.registry.active_channels()
    }

    /// Returns a list of all patterns with an active handler.
    pub fn active_patterns(&self) -> Vec<String> {
        self.registry.active_patterns()
    }

    /// Whether the dedicated subscriber connection currently exists.
    pub async fn is_subscriber_active(&self) -> bool {
        self.subscriber.is_active().await
    }
}
