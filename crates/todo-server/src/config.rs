//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the todo HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `8080`; `0` auto-assigns, used by tests).
    pub port: u16,
    /// The single origin allowed for cross-origin requests.
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            cors_origin: "http://localhost:5173".into(),
        }
    }
}
