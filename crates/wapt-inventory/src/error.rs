//! Error types for WAPT API calls.

use thiserror::Error;

/// Result type alias for inventory calls.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Errors that can occur while talking to the WAPT server.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected HTTP status {0}")]
    Status(http::StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("server answered success = false: {msg}")]
    Rejected { msg: String },
}

impl InventoryError {
    /// Whether the server answered with a well-formed envelope but refused the call.
    pub fn is_rejected(&self) -> bool {
        matches!(self, InventoryError::Rejected { .. })
    }
}
