// src/config.rs

//! Client configuration.
//!
//! Constructing and injecting the actual connections is the embedding
//! application's concern; this only carries what the client itself needs at
//! runtime.

use serde::{Deserialize, Serialize};

/// Settings for a single client instance.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
    /// Name used to tell this client's log statements apart when an
    /// application runs several clients side by side.
    #[serde(default = "default_client_name")]
    pub name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_client_name(),
        }
    }
}

fn default_client_name() -> String {
    "default".to_string()
}
