//! Shared error type across activity crates.

use thiserror::Error;

/// Stable error codes (for logs, test vectors and caller-facing reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// State accessor used before the handshake completed.
    NotConnected,
    /// Terminal action used before the activity was accepted.
    NotAccepted,
    /// Request could not be decoded.
    MalformedRequest,
    /// `connect` called on a host that already left the unconnected state.
    AlreadyConnected,
    /// Raw transport refused a message.
    Transport,
    /// Invalid configuration.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::NotAccepted => "NOT_ACCEPTED",
            ErrorCode::MalformedRequest => "MALFORMED_REQUEST",
            ErrorCode::AlreadyConnected => "ALREADY_CONNECTED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Config => "CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ActivityError>;

/// Unified error type used by core and host.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("not connected")]
    NotConnected,
    #[error("not accepted")]
    NotAccepted,
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("already connected")]
    AlreadyConnected,
    #[error("transport: {0}")]
    Transport(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ActivityError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ActivityError::NotConnected => ErrorCode::NotConnected,
            ActivityError::NotAccepted => ErrorCode::NotAccepted,
            ActivityError::MalformedRequest(_) => ErrorCode::MalformedRequest,
            ActivityError::AlreadyConnected => ErrorCode::AlreadyConnected,
            ActivityError::Transport(_) => ErrorCode::Transport,
            ActivityError::Config(_) => ErrorCode::Config,
            ActivityError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            ActivityError::Internal(_) => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_guard_wording() {
        assert_eq!(ActivityError::NotConnected.to_string(), "not connected");
        assert_eq!(ActivityError::NotAccepted.to_string(), "not accepted");
        assert_eq!(
            ActivityError::MalformedRequest("x".into()).code().as_str(),
            "MALFORMED_REQUEST"
        );
    }
}
