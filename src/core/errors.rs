// src/core/errors.rs

//! Defines the primary error type for the client.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all failures surfaced by this crate.
/// Using `thiserror` allows for clean error definitions and automatic `From`
/// trait implementations.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// IO failure reported by the driver. Wrapped in an `Arc` so the enum
    /// stays cheaply cloneable (events carry errors to every listener).
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// A handler is already registered for this channel or pattern.
    #[error("Already subscribed to '{0}'")]
    DuplicateSubscription(String),

    /// The subscribe/unsubscribe protocol exchange failed. Reported through
    /// `subscription:error` / `psubscription:error` events, never returned
    /// from the subscribing call itself.
    #[error("Subscription handshake failed: {0}")]
    Handshake(String),

    /// A connection-level failure reported by the driver, re-emitted
    /// verbatim on the `error` / `node:error` events.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl PartialEq for ClientError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ClientError::Io(e1), ClientError::Io(e2)) => e1.to_string() == e2.to_string(),
            (ClientError::DuplicateSubscription(s1), ClientError::DuplicateSubscription(s2)) => {
                s1 == s2
            }
            (ClientError::Handshake(s1), ClientError::Handshake(s2)) => s1 == s2,
            (ClientError::Connection(s1), ClientError::Connection(s2)) => s1 == s2,
            _ => false,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(Arc::new(e))
    }
}
