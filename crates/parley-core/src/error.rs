//! Unified error types for the Parley core.
//!
//! This module provides the error types shared by every layer that talks to
//! the gateway. Framework-level errors (like `PatternError`) are defined in
//! parley-framework.

use thiserror::Error;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors that can occur while delivering an outbound operation to the gateway.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway connection is not available.
    #[error("gateway is not connected")]
    NotConnected,

    /// The gateway accepted the request but rejected it.
    #[error("gateway rejected '{method}': {reason}")]
    Rejected {
        /// The outbound method that was rejected (e.g. `chat.postMessage`).
        method: &'static str,
        /// Reason reported by the gateway.
        reason: String,
    },

    /// The operation did not complete in time.
    #[error("gateway call '{method}' timed out")]
    Timeout {
        /// The outbound method that timed out.
        method: &'static str,
    },

    /// Transport-level failure (network, socket closed, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to serialize an outbound payload.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GatewayError {
    /// Creates a rejection error.
    pub fn rejected(method: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            method,
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors returned by collaborator queries such as user profile lookups.
///
/// These are handed to the handler as-is; the framework never retries.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The requested entity does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up (e.g. "user", "usergroup").
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// The lookup call itself failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl LookupError {
    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for outbound gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Result type for lookups.
pub type LookupResult<T> = Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = GatewayError::rejected("chat.postMessage", "channel_not_found");
        assert_eq!(
            err.to_string(),
            "gateway rejected 'chat.postMessage': channel_not_found"
        );
    }

    #[test]
    fn test_lookup_wraps_gateway_error() {
        let err: LookupError = GatewayError::NotConnected.into();
        assert_eq!(err.to_string(), "gateway is not connected");

        let err = LookupError::not_found("user", "U42");
        assert_eq!(err.to_string(), "user 'U42' not found");
    }
}
