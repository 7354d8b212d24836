// src/connection/driver.rs

//! The seam to the wire driver.
//!
//! The driver owns RESP encoding, request pipelining, cluster slot routing,
//! and its own reconnection policy. This crate consumes it purely through
//! the operations and native events declared here. Native events are
//! delivered from the driver's own read loop, one at a time, with every
//! registered listener awaited before the next event is delivered.

use crate::core::errors::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The topology a connection speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// A single node.
    Standalone,
    /// A cluster client multiplexing over several nodes. Only cluster
    /// connections deliver the `NodeAdded`/`NodeRemoved`/`NodeError` events.
    Cluster,
}

/// An event delivered natively by a driver connection.
#[derive(Debug, Clone)]
pub enum NativeEvent {
    Connect,
    Ready,
    Error(ClientError),
    Close,
    Reconnecting,
    /// Terminal: the connection emits nothing after this.
    End,
    /// A message published on a directly subscribed channel.
    Message { channel: String, payload: Bytes },
    /// A message on a channel matched by a subscribed pattern.
    PatternMessage {
        pattern: String,
        channel: String,
        payload: Bytes,
    },
    /// Cluster only: a node joined the topology.
    NodeAdded(String),
    /// Cluster only: a node left the topology.
    NodeRemoved(String),
    /// Cluster only: a node-level error, with the failing node's address.
    NodeError { error: ClientError, address: String },
}

/// An async callback registered on a connection. The driver awaits each
/// listener in registration order when delivering an event.
pub type NativeListener = Arc<dyn Fn(NativeEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// A live connection handle provided by the driver, standalone or cluster.
#[async_trait]
pub trait RawConnection: Send + Sync {
    /// The topology this connection speaks to.
    fn topology(&self) -> Topology;

    /// Establishes the transport. Idempotent on an already-open connection.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Gracefully terminates the connection, letting in-flight operations
    /// complete. A no-op on an already-terminated connection.
    async fn quit(&self) -> Result<(), ClientError>;

    /// Forcefully terminates the connection, abandoning in-flight
    /// operations. A no-op on an already-terminated connection.
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Subscribes to `channel`, resolving with the number of channels this
    /// connection has active once the handshake completes.
    async fn subscribe(&self, channel: &str) -> Result<usize, ClientError>;

    /// Issues the protocol-level unsubscribe for `channel`.
    async fn unsubscribe(&self, channel: &str) -> Result<(), ClientError>;

    /// Subscribes to the glob-style `pattern`, resolving with the number of
    /// patterns this connection has active once the handshake completes.
    async fn psubscribe(&self, pattern: &str) -> Result<usize, ClientError>;

    /// Issues the protocol-level unsubscribe for `pattern`.
    async fn punsubscribe(&self, pattern: &str) -> Result<(), ClientError>;

    /// Adds `listener` to this connection's native fan-out list.
    fn register_listener(&self, listener: NativeListener);

    /// Drops every registered listener. Tolerates an empty list.
    fn remove_all_listeners(&self);
}

/// Creates the dedicated subscriber connection on demand.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Builds a new, not-yet-connected connection with the same target and
    /// topology as the primary.
    async fn create(&self) -> Result<Arc<dyn RawConnection>, ClientError>;
}
