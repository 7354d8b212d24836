// tests/support/mock.rs

//! Shared test doubles for the driver seam, plus recording helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use spineldb_client::SpinelClient;
use spineldb_client::config::ClientConfig;
use spineldb_client::connection::driver::{
    ConnectionFactory, NativeEvent, NativeListener, RawConnection, Topology,
};
use spineldb_client::core::pubsub::{ChannelHandler, PatternHandler};
use spineldb_client::core::{ClientError, ClientEvent, EventListener};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Driver double: records calls, lets tests inject native events, and
/// reports the handshake counts a live driver would.
pub struct MockConnection {
    topology: Topology,
    listeners: Mutex<Vec<NativeListener>>,
    channels: Mutex<BTreeSet<String>>,
    patterns: Mutex<BTreeSet<String>>,
    /// When set, the next subscribe/psubscribe handshake fails.
    pub fail_subscribe: AtomicBool,
    /// Emit the native `end` event from quit/disconnect, the way a live
    /// driver does once its transport closes.
    pub end_on_terminate: AtomicBool,
    pub connect_calls: AtomicUsize,
    pub quit_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    terminated: AtomicBool,
    journal: Mutex<Option<(String, Arc<Mutex<Vec<String>>>)>>,
}

impl MockConnection {
    pub fn standalone() -> Arc<Self> {
        Arc::new(Self::new(Topology::Standalone))
    }

    pub fn cluster() -> Arc<Self> {
        Arc::new(Self::new(Topology::Cluster))
    }

    fn new(topology: Topology) -> Self {
        Self {
            topology,
            listeners: Mutex::new(Vec::new()),
            channels: Mutex::new(BTreeSet::new()),
            patterns: Mutex::new(BTreeSet::new()),
            fail_subscribe: AtomicBool::new(false),
            end_on_terminate: AtomicBool::new(true),
            connect_calls: AtomicUsize::new(0),
            quit_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            terminated: AtomicBool::new(false),
            journal: Mutex::new(None),
        }
    }

    /// Tags this connection in a shared operation journal, for asserting
    /// cross-connection ordering.
    pub fn attach_journal(&self, label: &str, journal: Arc<Mutex<Vec<String>>>) {
        *self.journal.lock() = Some((label.to_string(), journal));
    }

    fn record(&self, op: &str) {
        if let Some((label, journal)) = self.journal.lock().as_ref() {
            journal.lock().push(format!("{label}.{op}"));
        }
    }

    /// Delivers a native event to every registered listener, awaiting each
    /// in turn.
    pub async fn fire(&self, event: NativeEvent) {
        let snapshot: Vec<NativeListener> = self.listeners.lock().clone();
        for listener in snapshot {
            listener(event.clone()).await;
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn subscribed_channels(&self) -> Vec<String> {
        self.channels.lock().iter().cloned().collect()
    }

    pub fn subscribed_patterns(&self) -> Vec<String> {
        self.patterns.lock().iter().cloned().collect()
    }

    async fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.end_on_terminate.load(Ordering::SeqCst) {
            self.fire(NativeEvent::End).await;
        }
    }
}

#[async_trait]
impl RawConnection for MockConnection {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn connect(&self) -> Result<(), ClientError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.record("connect");
        self.fire(NativeEvent::Connect).await;
        self.fire(NativeEvent::Ready).await;
        Ok(())
    }

    async fn quit(&self) -> Result<(), ClientError> {
        self.quit_calls.fetch_add(1, Ordering::SeqCst);
        self.record("quit");
        self.terminate().await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.record("disconnect");
        self.terminate().await;
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<usize, ClientError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ClientError::Handshake(format!(
                "forced failure for '{channel}'"
            )));
        }
        let mut channels = self.channels.lock();
        channels.insert(channel.to_string());
        Ok(channels.len())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<(), ClientError> {
        self.channels.lock().remove(channel);
        Ok(())
    }

    async fn psubscribe(&self, pattern: &str) -> Result<usize, ClientError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ClientError::Handshake(format!(
                "forced failure for '{pattern}'"
            )));
        }
        let mut patterns = self.patterns.lock();
        patterns.insert(pattern.to_string());
        Ok(patterns.len())
    }

    async fn punsubscribe(&self, pattern: &str) -> Result<(), ClientError> {
        self.patterns.lock().remove(pattern);
        Ok(())
    }

    fn register_listener(&self, listener: NativeListener) {
        self.listeners.lock().push(listener);
    }

    fn remove_all_listeners(&self) {
        self.listeners.lock().clear();
    }
}

/// Factory double handing out `MockConnection`s and recording each one.
pub struct MockFactory {
    topology: Topology,
    pub created: Mutex<Vec<Arc<MockConnection>>>,
    pub fail_create: AtomicBool,
}

impl MockFactory {
    pub fn standalone() -> Arc<Self> {
        Arc::new(Self {
            topology: Topology::Standalone,
            created: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
        })
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// The most recently created connection. Panics when none exists yet.
    pub fn last(&self) -> Arc<MockConnection> {
        Arc::clone(self.created.lock().last().expect("no connection created"))
    }
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn create(&self) -> Result<Arc<dyn RawConnection>, ClientError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::Connection("factory refused".to_string()));
        }
        let conn = Arc::new(MockConnection::new(self.topology));
        self.created.lock().push(Arc::clone(&conn));
        Ok(conn)
    }
}

/// Minimal tracing setup for tests. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// A client over fresh standalone mocks: `(client, primary, factory)`.
pub fn standalone_client() -> (SpinelClient, Arc<MockConnection>, Arc<MockFactory>) {
    init_tracing();
    let primary = MockConnection::standalone();
    let factory = MockFactory::standalone();
    let client = SpinelClient::new(
        Arc::clone(&primary) as Arc<dyn RawConnection>,
        Arc::clone(&factory) as Arc<dyn ConnectionFactory>,
        ClientConfig::default(),
    );
    (client, primary, factory)
}

/// Renders an event as a compact string for assertions.
pub fn render(event: &ClientEvent) -> String {
    match event {
        ClientEvent::Error(e) => format!("error({e})"),
        ClientEvent::NodeAdded(node) => format!("node:added({node})"),
        ClientEvent::NodeRemoved(node) => format!("node:removed({node})"),
        ClientEvent::NodeError { address, .. } => format!("node:error({address})"),
        ClientEvent::SubscriberError(e) => format!("subscriber:error({e})"),
        ClientEvent::SubscriptionReady(count) => format!("subscription:ready({count})"),
        ClientEvent::SubscriptionError(e) => format!("subscription:error({e})"),
        ClientEvent::PsubscriptionReady(count) => format!("psubscription:ready({count})"),
        ClientEvent::PsubscriptionError(e) => format!("psubscription:error({e})"),
        other => other.kind().to_string(),
    }
}

/// An `EventListener` pushing each received event's rendered form into the
/// returned buffer.
pub fn recording_listener() -> (EventListener, Arc<Mutex<Vec<String>>>) {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: EventListener = Arc::new(move |event: ClientEvent| {
        let sink = Arc::clone(&sink);
        Box::pin(async move {
            sink.lock().push(render(&event));
            Ok(())
        })
    });
    (listener, seen)
}

/// An `EventListener` that always fails, for exercising the bus's
/// error-swallowing emission.
pub fn failing_listener() -> EventListener {
    Arc::new(|_event| {
        Box::pin(async { Err(ClientError::Connection("listener exploded".to_string())) })
    })
}

/// A `ChannelHandler` pushing each payload into the returned buffer.
pub fn recording_handler() -> (ChannelHandler, Arc<Mutex<Vec<Bytes>>>) {
    let seen: Arc<Mutex<Vec<Bytes>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: ChannelHandler = Arc::new(move |payload: Bytes| {
        sink.lock().push(payload);
    });
    (handler, seen)
}

/// A `PatternHandler` pushing `(channel, payload)` pairs into the buffer.
pub fn recording_pattern_handler() -> (PatternHandler, Arc<Mutex<Vec<(String, Bytes)>>>) {
    let seen: Arc<Mutex<Vec<(String, Bytes)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: PatternHandler = Arc::new(move |channel: &str, payload: Bytes| {
        sink.lock().push((channel.to_string(), payload));
    });
    (handler, seen)
}
