//! Error types for SDK calls.
//!
//! The SDK is a black box; these variants only distinguish failures the screens
//! react to differently. Everything else is carried as a message.

use thiserror::Error;

use crate::RoomId;

/// Errors surfaced by [`crate::Session`] implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// Room is not known to the local session.
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request did not reach the homeserver.
    #[error("network error: {0}")]
    Network(String),

    /// Homeserver rejected the request.
    #[error("server rejected request: {errcode}: {message}")]
    Server {
        /// Matrix error code (`M_FORBIDDEN`, ...)
        errcode: String,
        /// Human readable error
        message: String,
    },

    /// Event content could not be interpreted.
    #[error("malformed content: {0}")]
    Malformed(String),
}

impl SdkError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Nothing in Trellis retries automatically; callers use this to decide
    /// whether to offer a manual retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
