//! Error types for the chat client.

use thiserror::Error;

use crate::protocol::WireError;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the requested username
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// Failed to reach or keep the connection to the server
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The server sent something the codec could not decode
    #[error("protocol error: {0}")]
    Protocol(#[from] WireError),
}
