// src/connection/mod.rs

//! Manages the client's two connections: event proxying for the primary,
//! the lazily-created subscriber connection with its message routing, and
//! shutdown control across both.

// Declare the private sub-modules of the `connection` module.
mod lifecycle;
mod proxy;
mod subscriber;

// The driver seam stays public: embedding applications implement these
// traits for their wire driver.
pub mod driver;

// Publicly re-export the primary types from the sub-modules.
pub use lifecycle::LifecycleController;
pub use proxy::{ConnectionEventProxy, ConnectionRole};
pub use subscriber::SubscriberManager;
