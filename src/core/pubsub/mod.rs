// src/core/pubsub/mod.rs

//! The client-side subscription registry.
//! It maps channels and patterns to their message handlers, enforcing a
//! single handler per key.

use crate::core::errors::ClientError;
use bytes::Bytes;
use dashmap::{DashMap, Entry};
use std::sync::Arc;
use tracing::debug;

/// Handler invoked with the payload of each message on a subscribed channel.
pub type ChannelHandler = Arc<dyn Fn(Bytes) + Send + Sync>;

/// Handler invoked with the concrete channel and the payload of each message
/// matching a subscribed pattern.
pub type PatternHandler = Arc<dyn Fn(&str, Bytes) + Send + Sync>;

/// `SubscriptionRegistry` holds the channel and pattern handler maps.
/// It uses `DashMap` for thread-safe registration and dispatch.
#[derive(Default)]
pub struct SubscriptionRegistry {
    /// A map from a channel name to its handler.
    channels: DashMap<String, ChannelHandler>,
    /// A map from a glob-style pattern to its handler.
    patterns: DashMap<String, PatternHandler>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers the handler for `channel`. At most one handler may exist
    /// per channel; a second registration is rejected.
    pub fn register_channel(
        &self,
        channel: &str,
        handler: ChannelHandler,
    ) -> Result<(), ClientError> {
        match self.channels.entry(channel.to_string()) {
            Entry::Occupied(_) => Err(ClientError::DuplicateSubscription(channel.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    /// Registers the handler for `pattern`, with the same uniqueness rule as
    /// [`SubscriptionRegistry::register_channel`].
    pub fn register_pattern(
        &self,
        pattern: &str,
        handler: PatternHandler,
    ) -> Result<(), ClientError> {
        match self.patterns.entry(pattern.to_string()) {
            Entry::Occupied(_) => Err(ClientError::DuplicateSubscription(pattern.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    /// Removes the handler for `channel`. A no-op when absent.
    pub fn unregister_channel(&self, channel: &str) {
        self.channels.remove(channel);
    }

    /// Removes the handler for `pattern`. A no-op when absent.
    pub fn unregister_pattern(&self, pattern: &str) {
        self.patterns.remove(pattern);
    }

    /// Invokes the handler registered for exactly `channel` with `payload`.
    ///
    /// A message without a handler is dropped: the broker keeps delivering
    /// on a channel whose unsubscribe acknowledgement is still in flight.
    pub fn dispatch_message(&self, channel: &str, payload: Bytes) {
        let handler = self.channels.get(channel).map(|entry| entry.value().clone());
        match handler {
            Some(handler) => handler(payload),
            None => debug!("Dropped message for unsubscribed channel '{channel}'."),
        }
    }

    /// Invokes the handler registered for exactly `pattern` with the
    /// concrete `channel` the message arrived on and its `payload`.
    pub fn dispatch_pattern_message(&self, pattern: &str, channel: &str, payload: Bytes) {
        let handler = self.patterns.get(pattern).map(|entry| entry.value().clone());
        match handler {
            Some(handler) => handler(channel, payload),
            None => debug!("Dropped message for unsubscribed pattern '{pattern}'."),
        }
    }

    /// Empties both maps. Used when the subscriber connection terminates.
    pub fn clear(&self) {
        self.channels.clear();
        self.patterns.clear();
    }

    /// Whether `channel` currently has a handler.
    pub fn contains_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Whether `pattern` currently has a handler.
    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.patterns.contains_key(pattern)
    }

    /// The number of channels with a registered handler.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// The number of patterns with a registered handler.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns a list of all channels with a registered handler.
    pub fn active_channels(&self) -> Vec<String> {
        self.channels.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns a list of all patterns with a registered handler.
    pub fn active_patterns(&self) -> Vec<String> {
        self.patterns.iter().map(|entry| entry.key().clone()).collect()
    }

    /// True when neither map holds a handler.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.patterns.is_empty()
    }
}
