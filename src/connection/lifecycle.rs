// src/connection/lifecycle.rs

//! Graceful and forceful shutdown across the primary and subscriber
//! connections.

use crate::connection::driver::RawConnection;
use crate::connection::subscriber::SubscriberManager;
use crate::core::errors::ClientError;
use std::sync::Arc;
use tracing::debug;

/// Drives shutdown in a fixed order: the primary connection first, then the
/// subscriber connection when one exists.
///
/// The subscription registry is never touched here. It is cleared solely by
/// the subscriber connection's terminal event, keeping a single source of
/// truth for "subscriptions are gone".
pub struct LifecycleController {
    primary: Arc<dyn RawConnection>,
    subscriber: Arc<SubscriberManager>,
}

impl LifecycleController {
    pub fn new(primary: Arc<dyn RawConnection>, subscriber: Arc<SubscriberManager>) -> Self {
        Self {
            primary,
            subscriber,
        }
    }

    /// Gracefully terminates both connections, letting in-flight operations
    /// complete. Safe to call on already-terminated connections.
    pub async fn quit(&self) -> Result<(), ClientError> {
        debug!("Quitting primary connection.");
        self.primary.quit().await?;
        if let Some(conn) = self.subscriber.current().await {
            debug!("Quitting subscriber connection.");
            conn.quit().await?;
        }
        Ok(())
    }

    /// Forcefully terminates both connections, abandoning in-flight
    /// operations. Safe to call on already-terminated connections.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        debug!("Disconnecting primary connection.");
        self.primary.disconnect().await?;
        if let Some(conn) = self.subscriber.current().await {
            debug!("Disconnecting subscriber connection.");
            conn.disconnect().await?;
        }
        Ok(())
    }
}
