//! Connection settings for the WAPT server.

use std::fmt;
use std::time::Duration;

/// Default WAPT server address (the local backend behind the reverse proxy).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

/// Immutable settings shared by every call the client makes.
#[derive(Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// Base URL of the WAPT server, e.g. `http://127.0.0.1:8080`.
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Upper bound for a single request. `None` leaves it to the HTTP client.
    pub timeout: Option<Duration>,
}

impl InventoryConfig {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, "user", "user")
    }
}

// Keeps the password out of logs.
impl fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
